// ==========================================
// Repository 集成测试
// ==========================================
// 测试目标: 验证 SQLite 仓储的 upsert、查询、聚合与约束
// ==========================================


use chrono::{NaiveDate, TimeZone, Utc};
use hpv_tracker::domain::{CanonicalReport, ReportRecord};
use hpv_tracker::repository::{
    CenterRepository, CenterRepositoryImpl, RepositoryError, ReportRepository,
    ReportRepositoryImpl,
};
use test_helpers::{create_test_db, open_shared, seed_centers, TEST_CENTERS};

fn month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap()
}

fn record(center_id: &str, report_month: NaiveDate, fixed: u32, outreach: u32) -> ReportRecord {
    ReportRecord {
        report: CanonicalReport {
            center_id: center_id.to_string(),
            center_name: center_id.to_string(),
            report_month,
            in_stock: true,
            stock_beginning: 100,
            stock_end: 50,
            shortage: fixed == 0,
            shortage_response: None,
            outreach: outreach > 0,
            fixed_doses: fixed,
            outreach_doses: outreach,
            total_doses: fixed + outreach,
            misinformation: None,
            dhis_check: true,
        },
        created_by: "user-1".to_string(),
        created_at: Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
    }
}

#[tokio::test]
async fn test_upsert_and_find_round_trip() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    seed_centers(&db_path, TEST_CENTERS).unwrap();
    let repo = ReportRepositoryImpl::new(&db_path).unwrap();

    let original = record("center-kuje", month(2024, 1), 30, 10);
    assert_eq!(repo.upsert_reports(vec![original.clone()]).await.unwrap(), 1);

    let found = repo
        .find_report("center-kuje", month(2024, 1))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found, original);

    assert!(repo
        .find_report("center-kuje", month(2024, 2))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_failed_batch_commits_nothing() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    seed_centers(&db_path, TEST_CENTERS).unwrap();
    let repo = ReportRepositoryImpl::new(&db_path).unwrap();

    // 第二条引用不存在的中心 → 外键失败，整批回滚
    let result = repo
        .upsert_reports(vec![
            record("center-kuje", month(2024, 1), 30, 10),
            record("center-missing", month(2024, 1), 30, 10),
        ])
        .await;

    assert!(matches!(result, Err(RepositoryError::ForeignKeyViolation(_))));
    assert_eq!(repo.count_reports().await.unwrap(), 0);
}

#[tokio::test]
async fn test_summary_and_trend() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    seed_centers(&db_path, TEST_CENTERS).unwrap();
    let conn = open_shared(&db_path);
    let repo = ReportRepositoryImpl::from_connection(conn.clone()).unwrap();
    let centers = CenterRepositoryImpl::from_connection(conn).unwrap();

    repo.upsert_reports(vec![
        record("center-kuje", month(2024, 1), 30, 10),
        record("center-kuje", month(2024, 2), 0, 0),
        record("center-bwari", month(2024, 2), 20, 5),
        record("center-bwari", month(2024, 3), 1, 1),
    ])
    .await
    .unwrap();

    let all = repo.summarize_reports(None, None).await.unwrap();
    assert_eq!(all.report_count, 4);
    assert_eq!(all.reporting_centers, 2);
    assert_eq!(all.fixed_doses, 51);
    assert_eq!(all.outreach_doses, 16);
    assert_eq!(all.total_doses, 67);
    assert_eq!(all.shortage_reports, 1);
    assert_eq!(all.dhis_checked_reports, 4);

    let feb = repo
        .summarize_reports(Some(month(2024, 2)), Some(month(2024, 2)))
        .await
        .unwrap();
    assert_eq!(feb.report_count, 2);
    assert_eq!(feb.total_doses, 25);

    let trend = repo.monthly_dose_trend(Some(month(2024, 2)), None).await.unwrap();
    let months: Vec<NaiveDate> = trend.iter().map(|t| t.report_month).collect();
    assert_eq!(months, vec![month(2024, 2), month(2024, 3)]);
    assert_eq!(trend[0].report_count, 2);
    assert_eq!(trend[0].total_doses, 25);

    assert_eq!(centers.count_centers().await.unwrap(), 3);
}

#[tokio::test]
async fn test_empty_summary_is_zeroed() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let repo = ReportRepositoryImpl::new(&db_path).unwrap();

    let summary = repo.summarize_reports(None, None).await.unwrap();
    assert_eq!(summary.report_count, 0);
    assert_eq!(summary.total_doses, 0);
    assert!(repo.monthly_dose_trend(None, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_and_delete_reports() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    seed_centers(&db_path, TEST_CENTERS).unwrap();
    let repo = ReportRepositoryImpl::new(&db_path).unwrap();

    repo.upsert_reports(vec![
        record("center-kuje", month(2024, 3), 1, 1),
        record("center-kuje", month(2024, 1), 1, 1),
    ])
    .await
    .unwrap();

    let listed = repo.list_reports_by_center("center-kuje").await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].report.report_month, month(2024, 1));

    assert!(repo.delete_report("center-kuje", month(2024, 1)).await.unwrap());
    assert!(!repo.delete_report("center-kuje", month(2024, 1)).await.unwrap());
    assert_eq!(repo.count_reports().await.unwrap(), 1);
}

#[test]
fn test_open_unreachable_path_is_connection_error() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("missing").join("hpv.db");
    let db_path = db_path.to_str().unwrap();

    match CenterRepositoryImpl::new(db_path) {
        Err(RepositoryError::DatabaseConnectionError(msg)) => assert!(msg.contains("hpv.db")),
        Err(other) => panic!("unexpected error: {:?}", other),
        Ok(_) => panic!("opening under a missing directory must fail"),
    }
    assert!(matches!(
        ReportRepositoryImpl::new(db_path),
        Err(RepositoryError::DatabaseConnectionError(_))
    ));
}
