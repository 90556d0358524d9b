// ==========================================
// HPV 疫苗接种追踪系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体与导入中间结构
// 红线: 不含数据访问逻辑,不含导入规则
// ==========================================

pub mod center;
pub mod dashboard;
pub mod report;
pub mod row;

// 重导出核心类型
pub use center::{HealthcareCenter, HealthcareCenterRef, NewCenterRequest};
pub use dashboard::{DashboardSummary, MonthlyDoseTrend};
pub use report::{
    CanonicalReport, ImportOutcome, ImportResult, PersistResult, ReportRecord, ReportSubmission,
    RowError,
};
pub use row::{CellValue, RawRow};
