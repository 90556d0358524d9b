// ==========================================
// HPV 疫苗接种追踪系统 - 月报导入 Trait
// ==========================================
// 职责: 定义导入接口（不包含实现）
// ==========================================

use crate::domain::report::{ImportOutcome, ImportResult};
use crate::importer::error::ImportError;
use crate::importer::file_parser::ParsedSheet;
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// ReportImporter Trait
// ==========================================
// 用途: 月报批量导入主接口
// 实现者: ReportImporterImpl
#[async_trait]
pub trait ReportImporter: Send + Sync {
    /// 预检文件（解析 + 匹配 + 转换，不落库）
    ///
    /// # 返回
    /// - Ok(ImportResult): 标准化月报 + 行错误 + 未匹配中心
    /// - Err: 文件无法解析、必填表头缺失、中心列表加载失败
    async fn preview_file(
        &self,
        file_path: &Path,
        acting_user_id: &str,
    ) -> Result<ImportResult, ImportError>;

    /// 从文件导入月报
    ///
    /// # 导入流程
    /// 1. 文件读取与解析
    /// 2. 加载中心列表（单次快照）
    /// 3. 逐行解析、匹配、转换
    /// 4. 无行错误且无未匹配中心时分批 upsert
    async fn import_file(
        &self,
        file_path: &Path,
        acting_user_id: &str,
    ) -> Result<ImportOutcome, ImportError>;

    /// 从上传字节导入月报（格式按文件头识别）
    async fn import_bytes(
        &self,
        bytes: &[u8],
        acting_user_id: &str,
    ) -> Result<ImportOutcome, ImportError>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: CsvParser, ExcelParser, UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 解析字节流为行记录（首行为表头）
    ///
    /// # 返回
    /// - Ok(ParsedSheet): 非空行记录
    /// - Err: 无法解码、无数据行、必填表头缺失
    fn parse_bytes(&self, bytes: &[u8]) -> Result<ParsedSheet, ImportError>;

    /// 解析文件为行记录
    fn parse_file(&self, file_path: &Path) -> Result<ParsedSheet, ImportError>;
}
