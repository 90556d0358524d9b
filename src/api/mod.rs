// ==========================================
// HPV 疫苗接种追踪系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供命令行或上层服务调用
// ==========================================

pub mod center_api;
pub mod dashboard_api;
pub mod error;
pub mod import_api;
pub mod report_api;

// 重导出核心类型
pub use center_api::CenterApi;
pub use dashboard_api::DashboardApi;
pub use error::{ApiError, ApiResult};
pub use import_api::{ImportApi, ImportApiResponse};
pub use report_api::ReportApi;
