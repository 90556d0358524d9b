// ==========================================
// HPV 疫苗接种追踪系统 - SQLite 连接与建库
// ==========================================
// 职责:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 建表（幂等）与 schema_version 记录
// - 默认数据库路径解析
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::path::PathBuf;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "HPV_TRACKER_DB_PATH";

/// 默认数据库文件名
pub const DEFAULT_DB_FILE: &str = "hpv_tracker.db";

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS healthcare_centers (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    state TEXT NOT NULL,
    lga TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS monthly_reports (
    center_id TEXT NOT NULL REFERENCES healthcare_centers(id),
    center_name TEXT NOT NULL,
    report_month TEXT NOT NULL,
    in_stock INTEGER NOT NULL,
    stock_beginning INTEGER NOT NULL CHECK (stock_beginning >= 0),
    stock_end INTEGER NOT NULL CHECK (stock_end >= 0),
    shortage INTEGER NOT NULL,
    shortage_response TEXT,
    outreach INTEGER NOT NULL,
    fixed_doses INTEGER NOT NULL CHECK (fixed_doses >= 0),
    outreach_doses INTEGER NOT NULL CHECK (outreach_doses >= 0),
    total_doses INTEGER NOT NULL CHECK (total_doses >= 0),
    misinformation TEXT,
    dhis_check INTEGER NOT NULL,
    created_by TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE (center_id, report_month)
);

CREATE INDEX IF NOT EXISTS idx_monthly_reports_month ON monthly_reports(report_month);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：foreign_keys 与 busy_timeout 均需“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等），并在首次建库时写入 schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;

    if read_schema_version(conn)?.is_none() {
        conn.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [CURRENT_SCHEMA_VERSION],
        )?;
    }
    Ok(())
}

/// 读取 schema_version（若表不存在或为空则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 默认数据库路径
///
/// 优先级: 环境变量 HPV_TRACKER_DB_PATH > 系统数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    if let Some(data_dir) = dirs::data_dir() {
        let app_dir: PathBuf = data_dir.join("hpv-tracker");
        if std::fs::create_dir_all(&app_dir).is_ok() {
            return app_dir.join(DEFAULT_DB_FILE).to_string_lossy().to_string();
        }
    }

    format!("./{}", DEFAULT_DB_FILE)
}
