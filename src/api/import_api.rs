// ==========================================
// HPV 疫苗接种追踪系统 - 月报导入 API
// ==========================================
// 职责: 封装月报批量导入，输出面向调用方的结果摘要
// ==========================================

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::domain::report::{ImportOutcome, ImportResult, RowError};
use crate::importer::{ReportImporter, ReportImporterImpl};
use crate::repository::{CenterRepositoryImpl, ReportRepositoryImpl};

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportApiResponse {
    /// 批次ID
    pub batch_id: String,
    /// 非空数据行数
    pub total_rows: usize,
    /// 转换成功的月报数
    pub processed: usize,
    /// 实际落库的月报数
    pub saved: usize,
    /// 是否进入了落库阶段
    pub persisted: bool,
    /// 行级错误
    pub row_errors: Vec<RowError>,
    /// 未匹配的中心名称（已去重）
    pub unmatched_centers: Vec<String>,
    /// 失败批次说明
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub persist_errors: Vec<String>,
    /// 导入耗时（毫秒）
    pub elapsed_ms: i64,
}

impl From<ImportOutcome> for ImportApiResponse {
    fn from(outcome: ImportOutcome) -> Self {
        let (persisted, saved, persist_errors) = match outcome.persisted {
            Some(p) => (true, p.saved_count, p.errors),
            None => (false, 0, Vec::new()),
        };

        Self {
            batch_id: outcome.batch_id,
            total_rows: outcome.total_rows,
            processed: outcome.result.processed_reports.len(),
            saved,
            persisted,
            row_errors: outcome.result.errors,
            unmatched_centers: outcome.result.unmatched_centers,
            persist_errors,
            elapsed_ms: outcome.elapsed_ms,
        }
    }
}

/// 导入API
pub struct ImportApi {
    importer: Arc<dyn ReportImporter>,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    pub fn new(importer: Arc<dyn ReportImporter>) -> Self {
        Self { importer }
    }

    /// 基于共享连接装配默认导入器（SQLite 仓储 + config_kv 配置）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        let center_repo = CenterRepositoryImpl::from_connection(conn.clone())?;
        let report_repo = ReportRepositoryImpl::from_connection(conn.clone())?;
        let config = ConfigManager::from_connection(conn)?;

        let importer = ReportImporterImpl::new(center_repo, report_repo, config);
        Ok(Self::new(Arc::new(importer)))
    }

    /// 导入月报文件
    ///
    /// # 参数
    /// - file_path: 文件路径（.xlsx / .xls / .csv）
    /// - acting_user_id: 操作人
    ///
    /// # 返回
    /// - Ok(ImportApiResponse): 导入摘要（行错误不视为 Err）
    /// - Err(ApiError): 文件无法解析、缺少必填表头等
    pub async fn import_reports(
        &self,
        file_path: &str,
        acting_user_id: &str,
    ) -> ApiResult<ImportApiResponse> {
        let acting_user_id = require_user(acting_user_id)?;
        if file_path.trim().is_empty() {
            return Err(ApiError::InvalidInput("file path is required".to_string()));
        }

        let outcome = self
            .importer
            .import_file(Path::new(file_path), acting_user_id)
            .await?;
        Ok(outcome.into())
    }

    /// 导入上传的文件内容
    pub async fn import_upload(
        &self,
        bytes: &[u8],
        acting_user_id: &str,
    ) -> ApiResult<ImportApiResponse> {
        let acting_user_id = require_user(acting_user_id)?;
        if bytes.is_empty() {
            return Err(ApiError::InvalidInput("uploaded file is empty".to_string()));
        }

        let outcome = self.importer.import_bytes(bytes, acting_user_id).await?;
        Ok(outcome.into())
    }

    /// 预检月报文件（不落库）
    pub async fn preview_reports(
        &self,
        file_path: &str,
        acting_user_id: &str,
    ) -> ApiResult<ImportResult> {
        let acting_user_id = require_user(acting_user_id)?;
        if file_path.trim().is_empty() {
            return Err(ApiError::InvalidInput("file path is required".to_string()));
        }

        Ok(self
            .importer
            .preview_file(Path::new(file_path), acting_user_id)
            .await?)
    }
}

fn require_user(acting_user_id: &str) -> ApiResult<&str> {
    let trimmed = acting_user_id.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput("acting user id is required".to_string()));
    }
    Ok(trimmed)
}
