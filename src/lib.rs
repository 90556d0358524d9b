// ==========================================
// HPV 疫苗接种追踪系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 基层医疗中心 HPV 疫苗月报批量导入与统计
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    CanonicalReport, CellValue, DashboardSummary, HealthcareCenterRef, ImportOutcome,
    ImportResult, PersistResult, RawRow, ReportRecord, RowError,
};

// 导入器
pub use importer::{ImportError, ReportImporter, ReportImporterImpl};

// API
pub use api::{CenterApi, DashboardApi, ImportApi, ReportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "HPV Vaccination Tracker";
