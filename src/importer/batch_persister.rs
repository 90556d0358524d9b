// ==========================================
// HPV 疫苗接种追踪系统 - 分批落库
// ==========================================
// 职责: 标准化月报 → 审计戳 → 按批 upsert
// 规则: 批次顺序执行；失败批次记录错误后继续下一批
// 红线: 不回滚已提交批次（部分成功由 PersistResult 如实反映）
// ==========================================

use crate::domain::report::{CanonicalReport, PersistResult, ReportRecord};
use crate::repository::ReportRepository;
use chrono::Utc;
use tracing::{debug, info, instrument, warn};

/// 默认每批 upsert 行数
pub const DEFAULT_UPSERT_BATCH_SIZE: usize = 100;

pub struct BatchPersister<'a, R>
where
    R: ReportRepository + ?Sized,
{
    report_repo: &'a R,
    batch_size: usize,
}

impl<'a, R> BatchPersister<'a, R>
where
    R: ReportRepository + ?Sized,
{
    pub fn new(report_repo: &'a R) -> Self {
        Self::with_batch_size(report_repo, DEFAULT_UPSERT_BATCH_SIZE)
    }

    /// batch_size 为 0 时按 1 处理
    pub fn with_batch_size(report_repo: &'a R, batch_size: usize) -> Self {
        Self {
            report_repo,
            batch_size: batch_size.max(1),
        }
    }

    /// 分批 upsert
    ///
    /// # 说明
    /// - 全部记录使用同一个 created_at
    /// - saved_count 只统计整批成功的行
    /// - 空输入: success = true, saved_count = 0
    #[instrument(skip(self, reports), fields(report_count = reports.len(), batch_size = self.batch_size))]
    pub async fn persist(&self, reports: &[CanonicalReport], acting_user_id: &str) -> PersistResult {
        let now = Utc::now();
        let mut result = PersistResult::default();

        for (idx, chunk) in reports.chunks(self.batch_size).enumerate() {
            let batch_number = idx + 1;
            let records: Vec<ReportRecord> = chunk
                .iter()
                .cloned()
                .map(|report| ReportRecord::stamp(report, acting_user_id, now))
                .collect();

            match self.report_repo.upsert_reports(records).await {
                Ok(_) => {
                    result.saved_count += chunk.len();
                    debug!(batch = batch_number, rows = chunk.len(), "批次写入成功");
                }
                Err(e) => {
                    warn!(batch = batch_number, error = %e, "批次写入失败");
                    result.errors.push(format!("Batch {}: {}", batch_number, e));
                }
            }
        }

        result.success = result.errors.is_empty();
        info!(
            saved = result.saved_count,
            failed_batches = result.errors.len(),
            "分批落库完成"
        );
        result
    }
}
