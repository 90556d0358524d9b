// ==========================================
// HPV 疫苗接种追踪系统 - 医疗中心 Repository
// ==========================================
// 职责: healthcare_centers 表 CRUD
// 红线: Repository 不含业务规则
// ==========================================

use crate::db::configure_sqlite_connection;
use crate::domain::center::{HealthcareCenter, HealthcareCenterRef};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// CenterRepository Trait
// ==========================================
// 用途: 中心参考数据访问（导入时作为时点快照读取）
// 实现者: CenterRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait CenterRepository: Send + Sync {
    /// 查询全部中心（按名称排序）
    async fn list_centers(&self) -> RepositoryResult<Vec<HealthcareCenterRef>>;

    /// 插入中心
    async fn insert_center(&self, center: &HealthcareCenter) -> RepositoryResult<()>;

    /// 按 ID 查询中心
    async fn find_center(&self, center_id: &str) -> RepositoryResult<Option<HealthcareCenter>>;

    /// 删除中心
    ///
    /// # 返回
    /// - Ok(true): 已删除
    /// - Ok(false): 不存在
    /// - Err(ForeignKeyViolation): 仍有月报引用
    async fn delete_center(&self, center_id: &str) -> RepositoryResult<bool>;

    /// 统计中心数量
    async fn count_centers(&self) -> RepositoryResult<i64>;
}

// ==========================================
// CenterRepositoryImpl
// ==========================================
pub struct CenterRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl CenterRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(format!("{}: {}", db_path, e)))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（与其他仓储共享连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_center(row: &Row<'_>) -> rusqlite::Result<HealthcareCenter> {
        Ok(HealthcareCenter {
            center: HealthcareCenterRef {
                id: row.get(0)?,
                name: row.get(1)?,
                state: row.get(2)?,
                lga: row.get(3)?,
            },
            created_at: row.get(4)?,
        })
    }
}

#[async_trait]
impl CenterRepository for CenterRepositoryImpl {
    async fn list_centers(&self) -> RepositoryResult<Vec<HealthcareCenterRef>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT id, name, state, lga FROM healthcare_centers ORDER BY name, id")?;

        let centers = stmt
            .query_map([], |row| {
                Ok(HealthcareCenterRef {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    state: row.get(2)?,
                    lga: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(centers)
    }

    async fn insert_center(&self, center: &HealthcareCenter) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO healthcare_centers (id, name, state, lga, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                center.center.id,
                center.center.name,
                center.center.state,
                center.center.lga,
                center.created_at,
            ],
        )?;
        Ok(())
    }

    async fn find_center(&self, center_id: &str) -> RepositoryResult<Option<HealthcareCenter>> {
        let conn = self.lock()?;
        let center = conn
            .query_row(
                "SELECT id, name, state, lga, created_at FROM healthcare_centers WHERE id = ?1",
                params![center_id],
                Self::map_center,
            )
            .optional()?;
        Ok(center)
    }

    async fn delete_center(&self, center_id: &str) -> RepositoryResult<bool> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "DELETE FROM healthcare_centers WHERE id = ?1",
            params![center_id],
        )?;
        Ok(affected > 0)
    }

    async fn count_centers(&self) -> RepositoryResult<i64> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM healthcare_centers", [], |row| row.get(0))?;
        Ok(count)
    }
}
