// ==========================================
// HPV 疫苗接种追踪系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 说明: 仅文件级错误走 Err；行级/批次级错误以值的形式累积
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误（整批拒绝）=====
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported file format: {0} (expected .xlsx/.xls/.csv)")]
    UnsupportedFormat(String),

    #[error("Failed to read file: {0}")]
    FileReadError(String),

    #[error("Failed to parse spreadsheet: {0}")]
    ExcelParseError(String),

    #[error("Failed to parse CSV: {0}")]
    CsvParseError(String),

    #[error("File contains no data rows")]
    EmptyFile,

    #[error("Missing required columns: {}", .0.join(", "))]
    MissingHeaders(Vec<String>),

    // ===== 值转换错误（由处理器转为行错误）=====
    #[error("Invalid month: \"{0}\"")]
    InvalidMonth(String),

    #[error("Invalid year: \"{0}\"")]
    InvalidYear(String),

    // ===== 外部协作方错误 =====
    #[error("Failed to load healthcare centers: {0}")]
    CenterLoadError(String),

    #[error("Failed to read config (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },
}

impl ImportError {
    /// 是否属于文件解析阶段的致命错误
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            ImportError::FileNotFound(_)
                | ImportError::UnsupportedFormat(_)
                | ImportError::FileReadError(_)
                | ImportError::ExcelParseError(_)
                | ImportError::CsvParseError(_)
                | ImportError::EmptyFile
                | ImportError::MissingHeaders(_)
        )
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::XlsxError>
impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

// 实现 From<calamine::XlsError>
impl From<calamine::XlsError> for ImportError {
    fn from(err: calamine::XlsError) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_headers_message_lists_all() {
        let err = ImportError::MissingHeaders(vec!["PHC Name".to_string(), "Year".to_string()]);
        assert_eq!(err.to_string(), "Missing required columns: PHC Name, Year");
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_invalid_month_message() {
        let err = ImportError::InvalidMonth("Smarch".to_string());
        assert_eq!(err.to_string(), "Invalid month: \"Smarch\"");
        assert!(!err.is_parse_error());
    }
}
