// ==========================================
// HPV 疫苗接种追踪系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::open_sqlite_connection;
use crate::importer::batch_persister::DEFAULT_UPSERT_BATCH_SIZE;
use crate::importer::error::ImportError;
use crate::importer::value_coercer::DEFAULT_YEAR_PIVOT;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::warn;

/// 全局配置作用域
const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(format!("{}: {}", db_path, e)))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }

        Ok(Self { conn })
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.lock()?;

        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 从 config_kv 表读取配置值，带默认值
    pub fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global 配置（存在则覆盖）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        Ok(())
    }

    fn read_for_import(&self, key: &str, default: &str) -> Result<String, ImportError> {
        self.get_config_or_default(key, default)
            .map_err(|e| ImportError::ConfigReadError {
                key: key.to_string(),
                message: e.to_string(),
            })
    }
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_upsert_batch_size(&self) -> Result<usize, ImportError> {
        let default = DEFAULT_UPSERT_BATCH_SIZE.to_string();
        let value = self.read_for_import(config_keys::UPSERT_BATCH_SIZE, &default)?;

        match value.trim().parse::<usize>() {
            Ok(size) if size > 0 => Ok(size),
            _ => {
                warn!(value = %value, "upsert_batch_size 配置无效，使用默认值");
                Ok(DEFAULT_UPSERT_BATCH_SIZE)
            }
        }
    }

    async fn get_year_pivot(&self) -> Result<i32, ImportError> {
        let default = DEFAULT_YEAR_PIVOT.to_string();
        let value = self.read_for_import(config_keys::YEAR_PIVOT, &default)?;

        match value.trim().parse::<i32>() {
            Ok(pivot) if (0..=100).contains(&pivot) => Ok(pivot),
            _ => {
                warn!(value = %value, "year_pivot 配置无效，使用默认值");
                Ok(DEFAULT_YEAR_PIVOT)
            }
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 落库
    pub const UPSERT_BATCH_SIZE: &str = "upsert_batch_size";

    // 值转换
    pub const YEAR_PIVOT: &str = "year_pivot";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};

    fn create_manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_unset() {
        let manager = create_manager();
        assert_eq!(manager.get_upsert_batch_size().await.unwrap(), 100);
        assert_eq!(manager.get_year_pivot().await.unwrap(), 50);
    }

    #[tokio::test]
    async fn test_override_and_overwrite() {
        let manager = create_manager();
        manager.set_config_value(config_keys::UPSERT_BATCH_SIZE, "25").unwrap();
        assert_eq!(manager.get_upsert_batch_size().await.unwrap(), 25);

        manager.set_config_value(config_keys::UPSERT_BATCH_SIZE, "40").unwrap();
        assert_eq!(manager.get_upsert_batch_size().await.unwrap(), 40);
    }

    #[tokio::test]
    async fn test_invalid_values_fall_back() {
        let manager = create_manager();
        manager.set_config_value(config_keys::UPSERT_BATCH_SIZE, "0").unwrap();
        manager.set_config_value(config_keys::YEAR_PIVOT, "abc").unwrap();

        assert_eq!(manager.get_upsert_batch_size().await.unwrap(), 100);
        assert_eq!(manager.get_year_pivot().await.unwrap(), 50);
    }
}
