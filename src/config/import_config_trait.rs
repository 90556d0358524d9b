// ==========================================
// HPV 疫苗接种追踪系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::importer::batch_persister::DEFAULT_UPSERT_BATCH_SIZE;
use crate::importer::error::ImportError;
use crate::importer::value_coercer::DEFAULT_YEAR_PIVOT;
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（config_kv 表）、StaticImportConfig（固定值）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取每批 upsert 行数
    ///
    /// # 默认值
    /// - 100
    async fn get_upsert_batch_size(&self) -> Result<usize, ImportError>;

    /// 获取两位年份的世纪分界点
    ///
    /// # 说明
    /// - yy < pivot → 20yy；否则 19yy
    ///
    /// # 默认值
    /// - 50
    async fn get_year_pivot(&self) -> Result<i32, ImportError>;
}

// ==========================================
// StaticImportConfig - 固定配置
// ==========================================
// 用途: 测试与无数据库场景
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticImportConfig {
    pub upsert_batch_size: usize,
    pub year_pivot: i32,
}

impl Default for StaticImportConfig {
    fn default() -> Self {
        Self {
            upsert_batch_size: DEFAULT_UPSERT_BATCH_SIZE,
            year_pivot: DEFAULT_YEAR_PIVOT,
        }
    }
}

#[async_trait]
impl ImportConfigReader for StaticImportConfig {
    async fn get_upsert_batch_size(&self) -> Result<usize, ImportError> {
        Ok(self.upsert_batch_size)
    }

    async fn get_year_pivot(&self) -> Result<i32, ImportError> {
        Ok(self.year_pivot)
    }
}
