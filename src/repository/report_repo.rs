// ==========================================
// HPV 疫苗接种追踪系统 - 月报 Repository
// ==========================================
// 职责: monthly_reports 表 upsert / 查询 / 聚合
// 自然键: (center_id, report_month)，冲突时覆盖
// 红线: Repository 不含业务规则
// ==========================================

use crate::db::configure_sqlite_connection;
use crate::domain::dashboard::{DashboardSummary, MonthlyDoseTrend};
use crate::domain::report::{CanonicalReport, ReportRecord};
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// ReportRepository Trait
// ==========================================
// 用途: 月报数据访问
// 实现者: ReportRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// 批量 upsert（单事务；任一行失败整批回滚）
    ///
    /// # 返回
    /// - Ok(usize): 写入行数
    /// - Err: 数据库错误（整批未提交）
    async fn upsert_reports(&self, records: Vec<ReportRecord>) -> RepositoryResult<usize>;

    /// 按自然键查询
    async fn find_report(
        &self,
        center_id: &str,
        report_month: NaiveDate,
    ) -> RepositoryResult<Option<ReportRecord>>;

    /// 查询中心全部月报（按月份升序）
    async fn list_reports_by_center(&self, center_id: &str) -> RepositoryResult<Vec<ReportRecord>>;

    /// 按自然键删除
    async fn delete_report(&self, center_id: &str, report_month: NaiveDate) -> RepositoryResult<bool>;

    /// 统计月报总数
    async fn count_reports(&self) -> RepositoryResult<usize>;

    /// 区间汇总（含边界；None 表示不限）
    ///
    /// 说明: total_centers 由中心仓储填充，此处为 0
    async fn summarize_reports(
        &self,
        month_from: Option<NaiveDate>,
        month_to: Option<NaiveDate>,
    ) -> RepositoryResult<DashboardSummary>;

    /// 按月剂次趋势（月份升序）
    async fn monthly_dose_trend(
        &self,
        month_from: Option<NaiveDate>,
        month_to: Option<NaiveDate>,
    ) -> RepositoryResult<Vec<MonthlyDoseTrend>>;
}

const REPORT_COLUMNS: &str = "center_id, center_name, report_month, in_stock, stock_beginning, \
     stock_end, shortage, shortage_response, outreach, fixed_doses, outreach_doses, total_doses, \
     misinformation, dhis_check, created_by, created_at";

// ==========================================
// ReportRepositoryImpl
// ==========================================
pub struct ReportRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl ReportRepositoryImpl {
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

    fn map_record(row: &Row<'_>) -> rusqlite::Result<ReportRecord> {
        Ok(ReportRecord {
            report: CanonicalReport {
                center_id: row.get(0)?,
                center_name: row.get(1)?,
                report_month: row.get(2)?,
                in_stock: row.get(3)?,
                stock_beginning: row.get(4)?,
                stock_end: row.get(5)?,
                shortage: row.get(6)?,
                shortage_response: row.get(7)?,
                outreach: row.get(8)?,
                fixed_doses: row.get(9)?,
                outreach_doses: row.get(10)?,
                total_doses: row.get(11)?,
                misinformation: row.get(12)?,
                dhis_check: row.get(13)?,
            },
            created_by: row.get(14)?,
            created_at: row.get(15)?,
        })
    }

    /// 在事务中批量 upsert
    fn upsert_reports_tx(
        tx: &rusqlite::Transaction<'_>,
        records: &[ReportRecord],
    ) -> rusqlite::Result<usize> {
        let mut stmt = tx.prepare(
            r#"
            INSERT INTO monthly_reports (
                center_id, center_name, report_month, in_stock, stock_beginning,
                stock_end, shortage, shortage_response, outreach, fixed_doses,
                outreach_doses, total_doses, misinformation, dhis_check,
                created_by, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16
            )
            ON CONFLICT(center_id, report_month) DO UPDATE SET
                center_name = excluded.center_name,
                in_stock = excluded.in_stock,
                stock_beginning = excluded.stock_beginning,
                stock_end = excluded.stock_end,
                shortage = excluded.shortage,
                shortage_response = excluded.shortage_response,
                outreach = excluded.outreach,
                fixed_doses = excluded.fixed_doses,
                outreach_doses = excluded.outreach_doses,
                total_doses = excluded.total_doses,
                misinformation = excluded.misinformation,
                dhis_check = excluded.dhis_check,
                created_by = excluded.created_by,
                created_at = excluded.created_at
            "#,
        )?;

        let mut count = 0;
        for record in records {
            let r = &record.report;
            stmt.execute(params![
                r.center_id,
                r.center_name,
                r.report_month,
                r.in_stock,
                r.stock_beginning,
                r.stock_end,
                r.shortage,
                r.shortage_response,
                r.outreach,
                r.fixed_doses,
                r.outreach_doses,
                r.total_doses,
                r.misinformation,
                r.dhis_check,
                record.created_by,
                record.created_at,
            ])?;
            count += 1;
        }

        Ok(count)
    }
}

#[async_trait]
impl ReportRepository for ReportRepositoryImpl {
    async fn upsert_reports(&self, records: Vec<ReportRecord>) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let count = Self::upsert_reports_tx(&tx, &records)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(count)
    }

    async fn find_report(
        &self,
        center_id: &str,
        report_month: NaiveDate,
    ) -> RepositoryResult<Option<ReportRecord>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM monthly_reports WHERE center_id = ?1 AND report_month = ?2",
            REPORT_COLUMNS
        );
        let record = conn
            .query_row(&sql, params![center_id, report_month], Self::map_record)
            .optional()?;
        Ok(record)
    }

    async fn list_reports_by_center(&self, center_id: &str) -> RepositoryResult<Vec<ReportRecord>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM monthly_reports WHERE center_id = ?1 ORDER BY report_month ASC",
            REPORT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![center_id], Self::map_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(records)
    }

    async fn delete_report(&self, center_id: &str, report_month: NaiveDate) -> RepositoryResult<bool> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "DELETE FROM monthly_reports WHERE center_id = ?1 AND report_month = ?2",
            params![center_id, report_month],
        )?;
        Ok(affected > 0)
    }

    async fn count_reports(&self) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM monthly_reports", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    async fn summarize_reports(
        &self,
        month_from: Option<NaiveDate>,
        month_to: Option<NaiveDate>,
    ) -> RepositoryResult<DashboardSummary> {
        let conn = self.lock()?;
        let summary = conn.query_row(
            r#"
            SELECT
                COUNT(*),
                COUNT(DISTINCT center_id),
                COALESCE(SUM(fixed_doses), 0),
                COALESCE(SUM(outreach_doses), 0),
                COALESCE(SUM(total_doses), 0),
                COALESCE(SUM(shortage), 0),
                COALESCE(SUM(in_stock), 0),
                COALESCE(SUM(dhis_check), 0)
            FROM monthly_reports
            WHERE (?1 IS NULL OR report_month >= ?1)
              AND (?2 IS NULL OR report_month <= ?2)
            "#,
            params![month_from, month_to],
            |row| {
                Ok(DashboardSummary {
                    month_from,
                    month_to,
                    total_centers: 0,
                    report_count: row.get(0)?,
                    reporting_centers: row.get(1)?,
                    fixed_doses: row.get(2)?,
                    outreach_doses: row.get(3)?,
                    total_doses: row.get(4)?,
                    shortage_reports: row.get(5)?,
                    in_stock_reports: row.get(6)?,
                    dhis_checked_reports: row.get(7)?,
                })
            },
        )?;
        Ok(summary)
    }

    async fn monthly_dose_trend(
        &self,
        month_from: Option<NaiveDate>,
        month_to: Option<NaiveDate>,
    ) -> RepositoryResult<Vec<MonthlyDoseTrend>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT report_month, COUNT(*), SUM(fixed_doses), SUM(outreach_doses), SUM(total_doses)
            FROM monthly_reports
            WHERE (?1 IS NULL OR report_month >= ?1)
              AND (?2 IS NULL OR report_month <= ?2)
            GROUP BY report_month
            ORDER BY report_month ASC
            "#,
        )?;

        let trend = stmt
            .query_map(params![month_from, month_to], |row| {
                Ok(MonthlyDoseTrend {
                    report_month: row.get(0)?,
                    report_count: row.get(1)?,
                    fixed_doses: row.get(2)?,
                    outreach_doses: row.get(3)?,
                    total_doses: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(trend)
    }
}
