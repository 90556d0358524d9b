// ==========================================
// HPV 疫苗接种追踪系统 - 驾驶舱 API
// ==========================================
// 职责: 区间汇总统计与按月剂次趋势
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::dashboard::{DashboardSummary, MonthlyDoseTrend};
use crate::repository::{CenterRepository, ReportRepository};

// ==========================================
// DashboardApi - 驾驶舱 API
// ==========================================
pub struct DashboardApi {
    center_repo: Arc<dyn CenterRepository>,
    report_repo: Arc<dyn ReportRepository>,
}

impl DashboardApi {
    /// 创建新的DashboardApi实例
    pub fn new(
        center_repo: Arc<dyn CenterRepository>,
        report_repo: Arc<dyn ReportRepository>,
    ) -> Self {
        Self {
            center_repo,
            report_repo,
        }
    }

    /// 汇总统计
    ///
    /// # 参数
    /// - month_from / month_to: 月份区间（含边界，None 表示不限）
    pub async fn get_summary(
        &self,
        month_from: Option<NaiveDate>,
        month_to: Option<NaiveDate>,
    ) -> ApiResult<DashboardSummary> {
        validate_range(month_from, month_to)?;

        let mut summary = self
            .report_repo
            .summarize_reports(month_from, month_to)
            .await?;
        summary.total_centers = self.center_repo.count_centers().await?;
        Ok(summary)
    }

    /// 按月剂次趋势（月份升序）
    pub async fn get_monthly_trend(
        &self,
        month_from: Option<NaiveDate>,
        month_to: Option<NaiveDate>,
    ) -> ApiResult<Vec<MonthlyDoseTrend>> {
        validate_range(month_from, month_to)?;
        Ok(self
            .report_repo
            .monthly_dose_trend(month_from, month_to)
            .await?)
    }
}

fn validate_range(month_from: Option<NaiveDate>, month_to: Option<NaiveDate>) -> ApiResult<()> {
    if let (Some(from), Some(to)) = (month_from, month_to) {
        if from > to {
            return Err(ApiError::InvalidInput(format!(
                "month range start {} is after end {}",
                from, to
            )));
        }
    }
    Ok(())
}
