// ==========================================
// HPV 疫苗接种追踪系统 - 月报 API
// ==========================================
// 职责: 单条月报提交、查询、删除
// 规则: total_doses 始终派生；同一 (中心, 月份) 覆盖写入
// ==========================================

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::report::{CanonicalReport, ReportRecord, ReportSubmission};
use crate::repository::{CenterRepository, ReportRepository};

// ==========================================
// ReportApi - 月报 API
// ==========================================
pub struct ReportApi {
    center_repo: Arc<dyn CenterRepository>,
    report_repo: Arc<dyn ReportRepository>,
}

impl ReportApi {
    /// 创建新的ReportApi实例
    pub fn new(
        center_repo: Arc<dyn CenterRepository>,
        report_repo: Arc<dyn ReportRepository>,
    ) -> Self {
        Self {
            center_repo,
            report_repo,
        }
    }

    /// 提交单条月报
    ///
    /// # 返回
    /// - Ok(ReportRecord): 已落库记录（含审计戳）
    /// - Err(ApiError::InvalidInput): 月份/数值非法
    /// - Err(ApiError::NotFound): 中心不存在
    pub async fn submit_report(
        &self,
        submission: ReportSubmission,
        acting_user_id: &str,
    ) -> ApiResult<ReportRecord> {
        if acting_user_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("acting user id is required".to_string()));
        }

        let report_month = month_start(submission.year, submission.month)?;
        let stock_beginning = non_negative("stock_beginning", submission.stock_beginning)?;
        let stock_end = non_negative("stock_end", submission.stock_end)?;
        let fixed_doses = non_negative("fixed_doses", submission.fixed_doses)?;
        let outreach_doses = non_negative("outreach_doses", submission.outreach_doses)?;
        let total_doses = fixed_doses
            .checked_add(outreach_doses)
            .ok_or_else(|| ApiError::InvalidInput("total doses out of range".to_string()))?;

        let center = self
            .center_repo
            .find_center(&submission.center_id)
            .await?
            .ok_or_else(|| {
                ApiError::NotFound(format!("healthcare center {}", submission.center_id))
            })?;

        let report = CanonicalReport {
            center_id: center.center.id,
            center_name: center.center.name,
            report_month,
            in_stock: submission.in_stock,
            stock_beginning,
            stock_end,
            shortage: submission.shortage,
            shortage_response: optional_text(submission.shortage_response),
            outreach: submission.outreach,
            fixed_doses,
            outreach_doses,
            total_doses,
            misinformation: optional_text(submission.misinformation),
            dhis_check: submission.dhis_check,
        };

        let record = ReportRecord::stamp(report, acting_user_id, Utc::now());
        self.report_repo.upsert_reports(vec![record.clone()]).await?;

        info!(
            center_id = %record.report.center_id,
            report_month = %record.report.report_month,
            "月报提交成功"
        );
        Ok(record)
    }

    /// 查询中心全部月报（按月份升序）
    pub async fn list_reports_for_center(&self, center_id: &str) -> ApiResult<Vec<ReportRecord>> {
        Ok(self.report_repo.list_reports_by_center(center_id).await?)
    }

    /// 删除指定月份月报
    pub async fn delete_report(&self, center_id: &str, year: i32, month: u32) -> ApiResult<()> {
        let report_month = month_start(year, month)?;
        if !self.report_repo.delete_report(center_id, report_month).await? {
            return Err(ApiError::NotFound(format!(
                "monthly report {} {}",
                center_id, report_month
            )));
        }

        info!(center_id = %center_id, report_month = %report_month, "月报已删除");
        Ok(())
    }
}

fn month_start(year: i32, month: u32) -> ApiResult<NaiveDate> {
    if !(1..=12).contains(&month) {
        return Err(ApiError::InvalidInput(format!("invalid month: {}", month)));
    }
    NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ApiError::InvalidInput(format!("invalid year: {}", year)))
}

fn non_negative(field: &str, value: i64) -> ApiResult<u32> {
    u32::try_from(value).map_err(|_| {
        ApiError::InvalidInput(format!("{} must be a non-negative integer, got {}", field, value))
    })
}

fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
