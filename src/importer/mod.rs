// ==========================================
// HPV 疫苗接种追踪系统 - 导入层
// ==========================================
// 职责: 月报表格批量导入
// 支持: Excel (.xlsx/.xls), CSV
// ==========================================

// 模块声明
pub mod batch_persister;
pub mod center_matcher;
pub mod column_resolver;
pub mod error;
pub mod file_parser;
pub mod report_importer_impl;
pub mod report_importer_trait;
pub mod report_processor;
pub mod value_coercer;

// 重导出核心类型
pub use batch_persister::{BatchPersister, DEFAULT_UPSERT_BATCH_SIZE};
pub use center_matcher::{normalize_center_name, CenterMatcher};
pub use column_resolver::ColumnResolver;
pub use error::ImportError;
pub use file_parser::{CsvParser, ExcelParser, ParsedSheet, UniversalFileParser};
pub use report_importer_impl::ReportImporterImpl;
pub use report_processor::ReportProcessor;
pub use value_coercer::{ValueCoercer, DEFAULT_YEAR_PIVOT};

// 重导出 Trait 接口
pub use report_importer_trait::{FileParser, ReportImporter};
