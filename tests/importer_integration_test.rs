// ==========================================
// ReportImporter 集成测试
// ==========================================
// 测试目标: 验证完整的月报导入流程（解析 → 匹配 → 转换 → 落库）
// ==========================================


use chrono::NaiveDate;
use hpv_tracker::config::{ConfigManager, StaticImportConfig};
use hpv_tracker::importer::{ImportError, ReportImporter, ReportImporterImpl};
use hpv_tracker::logging;
use hpv_tracker::repository::{CenterRepositoryImpl, ReportRepository, ReportRepositoryImpl};
use test_helpers::{
    count_report_rows, create_test_db, fixture_path, seed_centers, write_csv, TEST_CENTERS,
};

type TestImporter =
    ReportImporterImpl<CenterRepositoryImpl, ReportRepositoryImpl, StaticImportConfig>;

/// 创建测试用的 ReportImporter 实例
fn create_test_importer(db_path: &str) -> TestImporter {
    let center_repo =
        CenterRepositoryImpl::new(db_path).expect("Failed to create CenterRepository");
    let report_repo =
        ReportRepositoryImpl::new(db_path).expect("Failed to create ReportRepository");

    ReportImporterImpl::new(center_repo, report_repo, StaticImportConfig::default())
}

fn month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap()
}

#[tokio::test]
async fn test_import_fixture_csv() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_centers(&db_path, TEST_CENTERS).expect("Failed to seed centers");
    let importer = create_test_importer(&db_path);

    let outcome = importer
        .import_file(&fixture_path("test_reports.csv"), "user-1")
        .await
        .expect("Import should succeed");

    assert_eq!(outcome.total_rows, 4, "blank line must be skipped");
    assert!(outcome.result.is_clean(), "errors: {:?}", outcome.result.errors);
    assert_eq!(outcome.result.processed_reports.len(), 4);

    let persisted = outcome.persisted.expect("clean import must persist");
    assert!(persisted.success);
    assert_eq!(persisted.saved_count, 4);
    assert_eq!(count_report_rows(&db_path), 4);

    // 名称规范化匹配 + 两位年份 + 千分位
    let report_repo = ReportRepositoryImpl::new(&db_path).unwrap();
    let bwari = report_repo
        .find_report("center-bwari", month(2024, 3))
        .await
        .unwrap()
        .expect("Bwari March 2024 report");
    assert_eq!(bwari.report.center_name, "Bwari Primary Health Centre");
    assert_eq!(bwari.report.stock_beginning, 1000);
    assert_eq!(bwari.report.total_doses, 1000);
    assert!(bwari.report.shortage);
    assert!(!bwari.report.in_stock);
    assert_eq!(bwari.report.shortage_response.as_deref(), Some("Requested resupply"));
    assert_eq!(bwari.created_by, "user-1");

    let kuje_feb = report_repo
        .find_report("center-kuje", month(2024, 2))
        .await
        .unwrap()
        .expect("kuje phc. should match Kuje PHC");
    assert_eq!(kuje_feb.report.center_name, "Kuje PHC");
    assert_eq!(kuje_feb.report.total_doses, 40);
}

#[tokio::test]
async fn test_reimport_overwrites_by_natural_key() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_centers(&db_path, TEST_CENTERS).expect("Failed to seed centers");
    let importer = create_test_importer(&db_path);

    let first = write_csv(
        "PHC Name,Month,Year,Stock Beginning,Stock End,Fixed Doses,Outreach Doses\n\
         Kuje PHC,5,2024,100,90,5,5\n",
    );
    importer.import_file(first.path(), "user-1").await.unwrap();

    let second = write_csv(
        "PHC Name,Month,Year,Stock Beginning,Stock End,Fixed Doses,Outreach Doses\n\
         KUJE PHC,May,2024,100,70,20,10\n",
    );
    let outcome = importer.import_file(second.path(), "user-2").await.unwrap();
    assert_eq!(outcome.persisted.unwrap().saved_count, 1);

    assert_eq!(count_report_rows(&db_path), 1, "same center+month must upsert");

    let report_repo = ReportRepositoryImpl::new(&db_path).unwrap();
    let record = report_repo
        .find_report("center-kuje", month(2024, 5))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(record.report.stock_end, 70);
    assert_eq!(record.report.total_doses, 30);
    assert_eq!(record.created_by, "user-2");
}

#[tokio::test]
async fn test_row_errors_block_persistence() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_centers(&db_path, TEST_CENTERS).expect("Failed to seed centers");
    let importer = create_test_importer(&db_path);

    let csv = write_csv(
        "PHC Name,Month,Year,Stock Beginning,Stock End,Fixed Doses,Outreach Doses\n\
         Kuje PHC,1,2024,10,5,3,2\n\
         ,2,2024,10,5,3,2\n\
         Bwari Primary Health Centre,Smarch,2024,10,5,3,2\n\
         Gwagwalada PHC,4,2024,ten,5,3,2\n",
    );
    let outcome = importer.import_file(csv.path(), "user-1").await.unwrap();

    assert!(outcome.persisted.is_none());
    assert_eq!(outcome.result.processed_reports.len(), 1);

    let messages: Vec<(usize, &str)> = outcome
        .result
        .errors
        .iter()
        .map(|e| (e.row, e.message.as_str()))
        .collect();
    assert_eq!(
        messages,
        vec![
            (2, "Missing PHC name"),
            (3, "Invalid month: \"Smarch\""),
            (4, "Missing or invalid numeric values"),
        ]
    );
    assert_eq!(count_report_rows(&db_path), 0);
}

#[tokio::test]
async fn test_unmatched_centers_block_persistence() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_centers(&db_path, TEST_CENTERS).expect("Failed to seed centers");
    let importer = create_test_importer(&db_path);

    let csv = write_csv(
        "PHC Name,Month,Year,Stock Beginning,Stock End,Fixed Doses,Outreach Doses\n\
         Kuje PHC,1,2024,10,5,3,2\n\
         Ghost Clinic,1,2024,10,5,3,2\n\
         Ghost Clinic,2,2024,10,5,3,2\n",
    );
    let outcome = importer.import_file(csv.path(), "user-1").await.unwrap();

    assert!(outcome.persisted.is_none());
    assert_eq!(outcome.result.unmatched_centers, vec!["Ghost Clinic".to_string()]);
    assert_eq!(outcome.result.errors.len(), 2);
    assert_eq!(outcome.result.errors[0].message, "PHC not found: \"Ghost Clinic\"");
    assert_eq!(count_report_rows(&db_path), 0);
}

#[tokio::test]
async fn test_missing_required_headers_is_fatal() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let importer = create_test_importer(&db_path);

    let csv = write_csv("Center,Fixed Doses\nKuje PHC,3\n");
    let err = importer.import_file(csv.path(), "user-1").await.unwrap_err();

    match err {
        ImportError::MissingHeaders(missing) => {
            assert_eq!(missing, vec!["PHC Name", "Month", "Year"]);
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_import_bytes_and_config_batch_size() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_centers(&db_path, TEST_CENTERS).expect("Failed to seed centers");

    let config = ConfigManager::new(&db_path).unwrap();
    config.set_config_value("upsert_batch_size", "1").unwrap();

    let importer = ReportImporterImpl::new(
        CenterRepositoryImpl::new(&db_path).unwrap(),
        ReportRepositoryImpl::new(&db_path).unwrap(),
        config,
    );

    let bytes = b"PHC Name,Month,Year,Stock Beginning,Stock End,Fixed Doses,Outreach Doses\n\
                  Kuje PHC,1,2024,10,5,3,2\n\
                  Kuje PHC,2,2024,10,5,3,2\n\
                  Gwagwalada PHC,2,2024,10,5,3,2\n";
    let outcome = importer.import_bytes(bytes, "user-1").await.unwrap();

    let persisted = outcome.persisted.unwrap();
    assert!(persisted.success);
    assert_eq!(persisted.saved_count, 3);
    assert_eq!(count_report_rows(&db_path), 3);
}

#[tokio::test]
async fn test_preview_does_not_persist() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_centers(&db_path, TEST_CENTERS).expect("Failed to seed centers");
    let importer = create_test_importer(&db_path);

    let result = importer
        .preview_file(&fixture_path("test_reports.csv"), "user-1")
        .await
        .unwrap();

    assert_eq!(result.processed_reports.len(), 4);
    assert_eq!(count_report_rows(&db_path), 0);
}

#[tokio::test]
async fn test_import_fixture_xlsx() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_centers(&db_path, TEST_CENTERS).expect("Failed to seed centers");
    let importer = create_test_importer(&db_path);

    let outcome = importer
        .import_file(&fixture_path("test_reports.xlsx"), "user-1")
        .await
        .expect("Import should succeed");

    assert_eq!(outcome.total_rows, 2);
    assert!(outcome.result.is_clean(), "errors: {:?}", outcome.result.errors);
    let persisted = outcome.persisted.expect("clean import must persist");
    assert!(persisted.success);
    assert_eq!(persisted.saved_count, 2);

    // 文本月份 + 数字两位年份 + 布尔单元格 + 数字布尔
    let report_repo = ReportRepositoryImpl::new(&db_path).unwrap();
    let kuje = report_repo
        .find_report("center-kuje", month(2024, 3))
        .await
        .unwrap()
        .expect("kuje phc March 2024 report");
    assert_eq!(kuje.report.center_name, "Kuje PHC");
    assert!(!kuje.report.in_stock);
    assert!(kuje.report.dhis_check);
    assert_eq!(kuje.report.stock_beginning, 100);
    assert_eq!(kuje.report.stock_end, 60);
    assert_eq!(kuje.report.total_doses, 40);

    // 数字月份 + 小数截断 + 文本布尔
    let gwagwalada = report_repo
        .find_report("center-gwagwalada", month(2023, 11))
        .await
        .unwrap()
        .expect("Gwagwalada November 2023 report");
    assert!(gwagwalada.report.in_stock);
    assert!(!gwagwalada.report.dhis_check);
    assert_eq!(gwagwalada.report.fixed_doses, 18);
    assert_eq!(gwagwalada.report.total_doses, 30);
}

#[tokio::test]
async fn test_import_bytes_detects_xlsx() {
    logging::init_test();

    let (_temp_file, db_path) = create_test_db().expect("Failed to create test db");
    seed_centers(&db_path, TEST_CENTERS).expect("Failed to seed centers");
    let importer = create_test_importer(&db_path);

    let bytes = std::fs::read(fixture_path("test_reports.xlsx")).expect("read xlsx fixture");
    let outcome = importer.import_bytes(&bytes, "user-1").await.unwrap();

    assert!(outcome.result.is_clean(), "errors: {:?}", outcome.result.errors);
    let reports = &outcome.result.processed_reports;
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0].center_id, "center-kuje");
    assert_eq!(reports[0].report_month, month(2024, 3));
    assert_eq!(reports[0].total_doses, 40);
    assert_eq!(outcome.persisted.unwrap().saved_count, 2);
    assert_eq!(count_report_rows(&db_path), 2);
}
