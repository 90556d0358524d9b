// ==========================================
// HPV 疫苗接种追踪系统 - 应用层
// ==========================================
// 职责: 组装仓储与 API，供命令行入口使用
// ==========================================

pub mod state;

pub use crate::db::get_default_db_path;
pub use state::AppState;
