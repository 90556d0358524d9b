// ==========================================
// HPV 疫苗接种追踪系统 - 驾驶舱统计模型
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// DashboardSummary - 汇总统计
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub month_from: Option<NaiveDate>, // 含
    pub month_to: Option<NaiveDate>,   // 含
    pub total_centers: i64,            // 已登记中心数
    pub reporting_centers: i64,        // 区间内有月报的中心数
    pub report_count: i64,
    pub fixed_doses: i64,
    pub outreach_doses: i64,
    pub total_doses: i64,
    pub shortage_reports: i64,
    pub in_stock_reports: i64,
    pub dhis_checked_reports: i64,
}

// ==========================================
// MonthlyDoseTrend - 按月剂次趋势
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyDoseTrend {
    pub report_month: NaiveDate,
    pub report_count: i64,
    pub fixed_doses: i64,
    pub outreach_doses: i64,
    pub total_doses: i64,
}
