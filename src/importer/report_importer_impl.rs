// ==========================================
// HPV 疫苗接种追踪系统 - 月报导入器实现
// ==========================================
// 职责: 整合导入流程，从文件到数据库
// 流程: 解析 → 中心快照 → 行处理 → 门禁 → 分批落库
// 门禁: 存在行错误或未匹配中心时整批不落库
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::report::{ImportOutcome, ImportResult};
use crate::importer::batch_persister::BatchPersister;
use crate::importer::center_matcher::CenterMatcher;
use crate::importer::error::ImportError;
use crate::importer::file_parser::{ParsedSheet, UniversalFileParser};
use crate::importer::report_importer_trait::{FileParser, ReportImporter};
use crate::importer::report_processor::ReportProcessor;
use crate::importer::value_coercer::ValueCoercer;
use crate::repository::{CenterRepository, ReportRepository};
use async_trait::async_trait;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// ReportImporterImpl - 月报导入器实现
// ==========================================
pub struct ReportImporterImpl<C, R, K>
where
    C: CenterRepository,
    R: ReportRepository,
    K: ImportConfigReader,
{
    // 数据访问层
    center_repo: C,
    report_repo: R,

    // 配置读取器
    config: K,

    // 导入组件
    file_parser: Box<dyn FileParser>,
}

impl<C, R, K> ReportImporterImpl<C, R, K>
where
    C: CenterRepository,
    R: ReportRepository,
    K: ImportConfigReader,
{
    /// 创建新的 ReportImporter 实例（使用通用文件解析器）
    pub fn new(center_repo: C, report_repo: R, config: K) -> Self {
        Self::with_parser(center_repo, report_repo, config, Box::new(UniversalFileParser))
    }

    /// 指定文件解析器
    pub fn with_parser(
        center_repo: C,
        report_repo: R,
        config: K,
        file_parser: Box<dyn FileParser>,
    ) -> Self {
        Self {
            center_repo,
            report_repo,
            config,
            file_parser,
        }
    }

    /// 中心快照 + 行处理（不落库）
    async fn process_sheet(
        &self,
        sheet: ParsedSheet,
        acting_user_id: &str,
    ) -> Result<ImportResult, ImportError> {
        let matcher = CenterMatcher::load(&self.center_repo).await?;
        if matcher.is_empty() {
            warn!("中心列表为空，所有行都将无法匹配");
        }

        let year_pivot = self.config.get_year_pivot().await?;
        let processor = ReportProcessor::new(ValueCoercer::new(year_pivot));

        Ok(processor.process(sheet.into_rows(), &matcher, acting_user_id))
    }

    /// 解析后的完整导入
    async fn import_sheet(
        &self,
        batch_id: String,
        started: Instant,
        sheet: ParsedSheet,
        acting_user_id: &str,
    ) -> Result<ImportOutcome, ImportError> {
        let total_rows = sheet.len();
        info!(batch_id = %batch_id, total_rows = total_rows, "文件解析完成");

        let result = self.process_sheet(sheet, acting_user_id).await?;

        // 门禁: 仅在全部行有效时落库
        let persisted = if !result.is_clean() {
            warn!(
                batch_id = %batch_id,
                errors = result.errors.len(),
                unmatched = result.unmatched_centers.len(),
                "存在行错误或未匹配中心，跳过落库"
            );
            None
        } else if result.processed_reports.is_empty() {
            debug!(batch_id = %batch_id, "无可落库月报");
            None
        } else {
            let batch_size = self.config.get_upsert_batch_size().await?;
            let persister = BatchPersister::with_batch_size(&self.report_repo, batch_size);
            Some(
                persister
                    .persist(&result.processed_reports, acting_user_id)
                    .await,
            )
        };

        let elapsed_ms = started.elapsed().as_millis() as i64;
        info!(
            batch_id = %batch_id,
            processed = result.processed_reports.len(),
            saved = persisted.as_ref().map(|p| p.saved_count).unwrap_or(0),
            elapsed_ms = elapsed_ms,
            "月报导入结束"
        );

        Ok(ImportOutcome {
            batch_id,
            total_rows,
            result,
            persisted,
            elapsed_ms,
        })
    }
}

#[async_trait]
impl<C, R, K> ReportImporter for ReportImporterImpl<C, R, K>
where
    C: CenterRepository,
    R: ReportRepository,
    K: ImportConfigReader,
{
    #[instrument(skip(self, file_path))]
    async fn preview_file(
        &self,
        file_path: &Path,
        acting_user_id: &str,
    ) -> Result<ImportResult, ImportError> {
        let sheet = self.file_parser.parse_file(file_path).map_err(|e| {
            error!(error = %e, "文件解析失败");
            e
        })?;
        self.process_sheet(sheet, acting_user_id).await
    }

    #[instrument(skip(self, file_path), fields(batch_id))]
    async fn import_file(
        &self,
        file_path: &Path,
        acting_user_id: &str,
    ) -> Result<ImportOutcome, ImportError> {
        let started = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());
        info!(file_path = %file_path.display(), "开始导入月报");

        let sheet = self.file_parser.parse_file(file_path).map_err(|e| {
            error!(error = %e, "文件解析失败");
            e
        })?;

        self.import_sheet(batch_id, started, sheet, acting_user_id)
            .await
    }

    #[instrument(skip(self, bytes), fields(batch_id, size = bytes.len()))]
    async fn import_bytes(
        &self,
        bytes: &[u8],
        acting_user_id: &str,
    ) -> Result<ImportOutcome, ImportError> {
        let started = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("batch_id", batch_id.as_str());
        info!("开始导入上传月报");

        let sheet = self.file_parser.parse_bytes(bytes).map_err(|e| {
            error!(error = %e, "文件解析失败");
            e
        })?;

        self.import_sheet(batch_id, started, sheet, acting_user_id)
            .await
    }
}
