// ==========================================
// HPV 疫苗接种追踪系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换下层错误为用户可读的错误消息
// ==========================================

use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Business rule violated: {0}")]
    BusinessRuleViolation(String),

    // ==========================================
    // 导入错误
    // ==========================================
    #[error("Import failed: {0}")]
    ImportError(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("Database error: {0}")]
    DatabaseError(String),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} (id={})", entity, id))
            }
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("duplicate record: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("referenced record missing or in use: {}", msg))
            }
            other => ApiError::DatabaseError(other.to_string()),
        }
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        ApiError::ImportError(err.to_string())
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
