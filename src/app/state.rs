// ==========================================
// HPV 疫苗接种追踪系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 连接: 所有仓储共享同一个 SQLite 连接
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::{ApiError, CenterApi, DashboardApi, ImportApi, ReportApi};
use crate::config::ConfigManager;
use crate::db::{init_schema, open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::repository::{CenterRepositoryImpl, ReportRepositoryImpl};

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 导入API
    pub import_api: Arc<ImportApi>,

    /// 中心API
    pub center_api: Arc<CenterApi>,

    /// 月报API
    pub report_api: Arc<ReportApi>,

    /// 驾驶舱API
    pub dashboard_api: Arc<DashboardApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建AppState实例（打开数据库并建表）
    pub fn new(db_path: String) -> Result<Self, ApiError> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| ApiError::DatabaseError(format!("cannot open database: {}", e)))?;
        init_schema(&conn)
            .map_err(|e| ApiError::DatabaseError(format!("cannot initialise schema: {}", e)))?;

        match read_schema_version(&conn) {
            Ok(Some(v)) if v != CURRENT_SCHEMA_VERSION => {
                tracing::warn!(
                    found = v,
                    expected = CURRENT_SCHEMA_VERSION,
                    "schema_version 与当前代码不一致"
                );
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("读取 schema_version 失败: {}", e),
        }

        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================
        let center_repo = Arc::new(CenterRepositoryImpl::from_connection(conn.clone())?);
        let report_repo = Arc::new(ReportRepositoryImpl::from_connection(conn.clone())?);
        let config_manager = Arc::new(ConfigManager::from_connection(conn.clone())?);

        // ==========================================
        // 初始化API层
        // ==========================================
        let import_api = Arc::new(ImportApi::from_connection(conn)?);
        let center_api = Arc::new(CenterApi::new(center_repo.clone(), report_repo.clone()));
        let report_api = Arc::new(ReportApi::new(center_repo.clone(), report_repo.clone()));
        let dashboard_api = Arc::new(DashboardApi::new(center_repo, report_repo));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            import_api,
            center_api,
            report_api,
            dashboard_api,
            config_manager,
        })
    }
}
