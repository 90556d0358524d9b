// ==========================================
// HPV 疫苗接种追踪系统 - 月报领域模型
// ==========================================
// 对齐: monthly_reports 表
// 自然键: (center_id, report_month)，每中心每月至多一条
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// CanonicalReport - 标准化月报
// ==========================================
// 不变量: total_doses = fixed_doses + outreach_doses（始终派生）
// 要么完整构造，要么整行拒绝
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalReport {
    pub center_id: String,
    pub center_name: String,
    pub report_month: NaiveDate, // 月初日期（YYYY-MM-01）

    // ===== 库存 =====
    pub in_stock: bool,
    pub stock_beginning: u32,
    pub stock_end: u32,
    pub shortage: bool,
    pub shortage_response: Option<String>,

    // ===== 接种 =====
    pub outreach: bool,
    pub fixed_doses: u32,
    pub outreach_doses: u32,
    pub total_doses: u32,

    // ===== 其他 =====
    pub misinformation: Option<String>,
    pub dhis_check: bool,
}

impl CanonicalReport {
    /// 自然键（center_id, "YYYY-MM-01"）
    pub fn natural_key(&self) -> (String, String) {
        (self.center_id.clone(), self.report_month.to_string())
    }
}

// ==========================================
// ReportRecord - 落库记录（带审计戳）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRecord {
    #[serde(flatten)]
    pub report: CanonicalReport,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl ReportRecord {
    pub fn stamp(report: CanonicalReport, acting_user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            report,
            created_by: acting_user_id.to_string(),
            created_at: now,
        }
    }
}

// ==========================================
// RowError - 行级错误
// ==========================================
// 只累积，不中断批次
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize, // 1 起始的数据行序号
    pub message: String,
}

// ==========================================
// ImportResult - 行处理结果
// ==========================================
// 调用方据此决定是否进入落库
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportResult {
    pub processed_reports: Vec<CanonicalReport>,
    pub errors: Vec<RowError>,
    pub unmatched_centers: Vec<String>, // 已去重
}

impl ImportResult {
    /// 无行错误且无未匹配中心
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.unmatched_centers.is_empty()
    }
}

// ==========================================
// PersistResult - 分批落库结果
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistResult {
    pub success: bool,
    pub saved_count: usize, // 仅统计整批成功的行
    pub errors: Vec<String>, // 每个失败批次一条
}

// ==========================================
// ImportOutcome - 完整导入结果
// ==========================================
// persisted 为 None 表示因行错误/未匹配中心而未落库
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub batch_id: String,
    pub total_rows: usize,
    pub result: ImportResult,
    pub persisted: Option<PersistResult>,
    pub elapsed_ms: i64,
}

// ==========================================
// ReportSubmission - 单条月报表单
// ==========================================
// 用途: 人工逐条提交（非批量导入）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSubmission {
    pub center_id: String,
    pub year: i32,
    pub month: u32,
    pub in_stock: bool,
    pub stock_beginning: i64,
    pub stock_end: i64,
    pub shortage: bool,
    pub shortage_response: Option<String>,
    pub outreach: bool,
    pub fixed_doses: i64,
    pub outreach_doses: i64,
    pub misinformation: Option<String>,
    pub dhis_check: bool,
}
