// ==========================================
// IngestionEngine 集成测试
// ==========================================
// 测试目标: 临时 SQLite + 内存文件存储下的完整导入流程
// ==========================================


use asset_data_import::audit::AuditAction;
use asset_data_import::config::ImportSettings;
use asset_data_import::domain::{
    ErrorCategory, ImportKind, ImportRequest, ImportRun, RunStage, RunStatus, SyncLogFilter,
};
use asset_data_import::importer::PipelineError;
use asset_data_import::logging;
use asset_data_import::repository::SyncLogRepository;
use asset_data_import::storage::InMemoryBlobStore;
use std::sync::Arc;
use std::time::Duration;
use test_helpers::{
    admin, asset_column, asset_location_id, count_rows, seed_branch, seed_country, seed_location, viewer,
    FailingHeartbeatSyncLogs, FlakyReferenceStore, TestHarness,
};

fn request(kind: ImportKind, file_name: &str) -> ImportRequest {
    ImportRequest::new(kind, file_name, admin())
}

async fn all_runs(harness: &TestHarness) -> Vec<ImportRun> {
    harness
        .sync_logs
        .list(&SyncLogFilter::default())
        .await
        .unwrap()
}

async fn only_run(harness: &TestHarness) -> ImportRun {
    let runs = all_runs(harness).await;
    assert_eq!(runs.len(), 1, "应当恰好有一条运行记录");
    runs.into_iter().next().unwrap()
}

// ==========================================
// 正常导入
// ==========================================

#[tokio::test]
async fn test_valid_assets_import_without_errors() {
    logging::init_test();
    let harness = TestHarness::new();
    let location_id = seed_location(&harness.db_path, "Warehouse A");

    harness.upload(
        "assets.csv",
        "name,erp_asset_id,location-name,barcode\n\
         Pump,E1,Warehouse A,111\n\
         Valve,E2,warehouse a,222\n\
         Motor,E3,,333\n",
    );

    let summary = harness
        .engine()
        .run(request(ImportKind::Assets, "assets.csv"))
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.total_rows, 3);
    assert_eq!(summary.success_count, 3);
    assert_eq!(summary.error_count, 0);
    assert_eq!(summary.created_count, 3);
    assert!(summary.errors.is_empty());
    assert_eq!(count_rows(&harness.db_path, "assets"), 3);

    // 大小写不同的位置名同样解析成功
    assert_eq!(asset_location_id(&harness.db_path, "E1"), Some(location_id));
    assert_eq!(asset_location_id(&harness.db_path, "E2"), Some(location_id));
    assert_eq!(asset_location_id(&harness.db_path, "E3"), None);
    assert_eq!(
        asset_column(&harness.db_path, "E2", "status").as_deref(),
        Some("active")
    );

    let run = only_run(&harness).await;
    assert_eq!(run.id, summary.run_id);
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.records_processed, 3);
    assert_eq!(run.records_succeeded, 3);
    assert_eq!(run.errors_count, 0);
    assert_eq!(run.heartbeat_count, 1);
    assert!(run.completed_at.is_some());
    assert!(run.processing_time_ms.is_some());

    // 成功后源文件被清理
    assert!(!harness.blobs.contains("assets.csv"));
}

#[tokio::test]
async fn test_injection_leaders_are_neutralized_before_storage() {
    let harness = TestHarness::new();
    harness.upload(
        "assets.csv",
        "name,erp_asset_id,location-name,barcode,category\n\
         =HYPERLINK(evil),E1,,+123,@cat\n",
    );

    let summary = harness
        .engine()
        .run(request(ImportKind::Assets, "assets.csv"))
        .await
        .unwrap();

    assert_eq!(summary.success_count, 1);
    assert_eq!(
        asset_column(&harness.db_path, "E1", "name").as_deref(),
        Some("'=HYPERLINK(evil)")
    );
    assert_eq!(
        asset_column(&harness.db_path, "E1", "barcode").as_deref(),
        Some("'+123")
    );
    assert_eq!(
        asset_column(&harness.db_path, "E1", "category").as_deref(),
        Some("'@cat")
    );
}

#[tokio::test]
async fn test_rerun_same_file_creates_nothing_new() {
    let harness = TestHarness::new();
    seed_location(&harness.db_path, "Yard");
    let csv = "name,erp_asset_id,location-name\nPump,E1,Yard\nValve,E2,Yard\n";

    harness.upload("assets.csv", csv);
    let first = harness
        .engine()
        .run(request(ImportKind::Assets, "assets.csv"))
        .await
        .unwrap();
    assert_eq!(first.created_count, 2);

    harness.upload("assets.csv", csv);
    let second = harness
        .engine()
        .run(request(ImportKind::Assets, "assets.csv"))
        .await
        .unwrap();

    assert_eq!(second.success_count, 2);
    assert_eq!(second.created_count, 0);
    assert_eq!(second.unchanged_count, 2);
    assert_eq!(count_rows(&harness.db_path, "assets"), 2);
    assert_eq!(all_runs(&harness).await.len(), 2);
}

#[tokio::test]
async fn test_changed_row_is_reported_as_update() {
    let harness = TestHarness::new();

    harness.upload("a.csv", "name,erp_asset_id,location-name\nPump,E1,\n");
    harness
        .engine()
        .run(request(ImportKind::Assets, "a.csv"))
        .await
        .unwrap();

    harness.upload("a.csv", "name,erp_asset_id,location-name\nBig Pump,E1,\n");
    let summary = harness
        .engine()
        .run(request(ImportKind::Assets, "a.csv"))
        .await
        .unwrap();

    assert_eq!(summary.updated_count, 1);
    assert_eq!(
        asset_column(&harness.db_path, "E1", "name").as_deref(),
        Some("Big Pump")
    );
}

#[tokio::test]
async fn test_quoted_field_keeps_embedded_comma() {
    let harness = TestHarness::new();
    harness.upload(
        "assets.csv",
        "name,erp_asset_id,location-name,barcode\n\"Acme, Inc.\",code1,,123\n",
    );

    let summary = harness
        .engine()
        .run(request(ImportKind::Assets, "assets.csv"))
        .await
        .unwrap();

    assert_eq!(summary.success_count, 1);
    assert_eq!(
        asset_column(&harness.db_path, "code1", "name").as_deref(),
        Some("Acme, Inc.")
    );
    assert_eq!(
        asset_column(&harness.db_path, "code1", "barcode").as_deref(),
        Some("123")
    );
}

#[tokio::test]
async fn test_header_aliases_and_bom_are_accepted() {
    let harness = TestHarness::new();
    harness.upload(
        "assets.csv",
        "\u{feff}Asset_Name,ERP-Asset-ID,Location,Unused Column\r\nPump,E1,,ignored\r\n",
    );

    let summary = harness
        .engine()
        .run(request(ImportKind::Assets, "assets.csv"))
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.success_count, 1);
}

// ==========================================
// 行级错误
// ==========================================

#[tokio::test]
async fn test_row_errors_are_categorized_and_counted() {
    let harness = TestHarness::new();
    seed_location(&harness.db_path, "Yard");
    harness.upload(
        "assets.csv",
        "name,erp_asset_id,location-name\n\
         Pump,E1,Yard\n\
         Valve,E2\n\
         ,E3,Yard\n\
         Motor,E4,Nowhere\n\
         \n\
         Fan,E5,yard\n",
    );

    let summary = harness
        .engine()
        .run(request(ImportKind::Assets, "assets.csv"))
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::CompletedWithErrors);
    assert_eq!(summary.total_rows, 5);
    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.valid_records, 3);
    assert_eq!(summary.error_count, summary.total_rows - summary.success_count);
    assert_eq!(summary.error_breakdown.parsing_errors, 1);
    assert_eq!(summary.error_breakdown.required_field_errors, 1);
    assert_eq!(summary.error_breakdown.lookup_errors, 1);
    assert_eq!(summary.error_breakdown.total(), summary.error_count);

    // 按行号排序，行号为物理行号（表头为第 1 行）
    let rows: Vec<usize> = summary.errors.iter().map(|e| e.row_number).collect();
    assert_eq!(rows, vec![3, 4, 5]);
    assert_eq!(summary.errors[0].category, ErrorCategory::Parsing);
    assert_eq!(
        summary.errors[0].message,
        "Row 3: column mismatch: expected 3 columns, got 2"
    );
    assert_eq!(summary.errors[1].message, "Row 4: name is required");
    assert_eq!(
        summary.errors[2].message,
        "Row 5: Location \"Nowhere\" not found"
    );
    assert_eq!(summary.samples.sample_lookup_errors.len(), 1);

    let run = only_run(&harness).await;
    assert_eq!(run.status, RunStatus::CompletedWithErrors);
    assert_eq!(run.records_processed, 5);
    assert_eq!(run.errors_count, 3);
    assert_eq!(run.error_samples.len(), 3);
}

#[tokio::test]
async fn test_locations_with_unknown_branch() {
    let harness = TestHarness::new();
    seed_branch(&harness.db_path, "US", "West", "North");
    harness.upload(
        "locations.csv",
        "name,branch-name,description\n\
         Dock 1,North,Main dock\n\
         Dock 2,,\n\
         Dock 3,South,Overflow\n",
    );

    let summary = harness
        .engine()
        .run(request(ImportKind::Locations, "locations.csv"))
        .await
        .unwrap();

    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.error_count, 1);
    assert_eq!(summary.status, RunStatus::CompletedWithErrors);
    assert_eq!(summary.errors[0].category, ErrorCategory::LocationLookup);
    assert_eq!(summary.errors[0].message, "Row 4: Branch \"South\" not found");
    assert_eq!(count_rows(&harness.db_path, "locations"), 2);
}

#[tokio::test]
async fn test_regions_create_region_and_branch() {
    let harness = TestHarness::new();
    seed_country(&harness.db_path, "US", "United States");
    harness.upload(
        "regions.csv",
        "region-name,country-code,branch-name\n\
         West,us,North\n\
         West,US,North\n\
         East,XX,\n\
         South,USA1,\n",
    );

    let summary = harness
        .engine()
        .run(request(ImportKind::Regions, "regions.csv"))
        .await
        .unwrap();

    assert_eq!(summary.total_rows, 4);
    assert_eq!(summary.success_count, 2);
    assert_eq!(summary.created_count, 1);
    assert_eq!(summary.unchanged_count, 1);
    assert_eq!(summary.error_breakdown.lookup_errors, 1);
    assert_eq!(summary.error_breakdown.validation_errors, 1);
    assert_eq!(summary.errors[0].message, "Row 4: Country \"XX\" not found");
    assert_eq!(count_rows(&harness.db_path, "regions"), 1);
    assert_eq!(count_rows(&harness.db_path, "branches"), 1);
}

#[tokio::test]
async fn test_response_errors_are_capped() {
    let harness = TestHarness::new();
    let mut csv = String::from("name,erp_asset_id,location-name\n");
    for i in 0..30 {
        csv.push_str(&format!("Pump {},E{},Missing\n", i, i));
    }
    harness.upload("assets.csv", &csv);

    let summary = harness
        .engine()
        .run(request(ImportKind::Assets, "assets.csv"))
        .await
        .unwrap();

    assert_eq!(summary.error_count, 30);
    assert_eq!(summary.errors.len(), 20);
    assert_eq!(summary.samples.sample_lookup_errors.len(), 5);
    assert_eq!(summary.error_breakdown.lookup_errors, 30);
}

// ==========================================
// 心跳
// ==========================================

#[tokio::test]
async fn test_heartbeat_every_n_batches_and_final_batch() {
    let harness = TestHarness::new();
    let mut csv = String::from("name,erp_asset_id,location-name\n");
    for i in 0..7 {
        csv.push_str(&format!("Pump {},E{},\n", i, i));
    }
    harness.upload("assets.csv", &csv);

    let settings = ImportSettings {
        batch_size: 2,
        heartbeat_every_batches: 3,
        ..Default::default()
    };
    // 4 个批次: 第 3 批 + 最后一批
    harness
        .engine_with(settings)
        .run(request(ImportKind::Assets, "assets.csv"))
        .await
        .unwrap();

    let run = only_run(&harness).await;
    assert_eq!(run.heartbeat_count, 2);
    assert!(run.last_heartbeat_at.is_some());
    assert_eq!(run.records_processed, 7);
}

// ==========================================
// 致命错误
// ==========================================

#[tokio::test]
async fn test_row_ceiling_fails_before_any_write() {
    let harness = TestHarness::new();
    harness.upload(
        "assets.csv",
        "name,erp_asset_id,location-name\nA,E1,\nB,E2,\nC,E3,\n",
    );

    let settings = ImportSettings {
        max_rows: 2,
        ..Default::default()
    };
    let err = harness
        .engine_with(settings)
        .run(request(ImportKind::Assets, "assets.csv"))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::TooManyRows { rows: 3, limit: 2 }));
    assert_eq!(count_rows(&harness.db_path, "assets"), 0);

    let run = only_run(&harness).await;
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.heartbeat_count, 0);
    assert_eq!(run.failed_stage, Some(RunStage::Downloaded));
    assert!(run.failure_reason.is_some());

    let actions = harness.audit.actions();
    assert!(actions.contains(&AuditAction::OversizedFileAttempt));
    assert!(actions.contains(&AuditAction::CsvProcessingError));
    // 失败时不删除源文件
    assert!(harness.blobs.contains("assets.csv"));
}

#[tokio::test]
async fn test_file_size_ceiling() {
    let harness = TestHarness::new();
    harness.upload("assets.csv", "name,erp_asset_id,location-name\nA,E1,\n");

    let settings = ImportSettings {
        max_file_bytes: 10,
        ..Default::default()
    };
    let err = harness
        .engine_with(settings)
        .run(request(ImportKind::Assets, "assets.csv"))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::FileTooLarge { limit: 10, .. }));
    assert_eq!(only_run(&harness).await.status, RunStatus::Failed);
}

#[tokio::test]
async fn test_missing_headers_fail_the_run() {
    let harness = TestHarness::new();
    harness.upload("assets.csv", "name,barcode\nPump,1\n");

    let err = harness
        .engine()
        .run(request(ImportKind::Assets, "assets.csv"))
        .await
        .unwrap_err();

    match err {
        PipelineError::MissingHeaders(missing) => {
            assert_eq!(missing, vec!["erp_asset_id", "location-name"])
        }
        other => panic!("unexpected error: {:?}", other),
    }
    let run = only_run(&harness).await;
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(count_rows(&harness.db_path, "assets"), 0);
}

#[tokio::test]
async fn test_header_only_file_is_empty() {
    let harness = TestHarness::new();
    harness.upload("assets.csv", "name,erp_asset_id,location-name\n\n");

    let err = harness
        .engine()
        .run(request(ImportKind::Assets, "assets.csv"))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::EmptyFile));
    assert_eq!(only_run(&harness).await.status, RunStatus::Failed);
}

#[tokio::test]
async fn test_invalid_utf8_fails() {
    let harness = TestHarness::new();
    harness
        .blobs
        .put("assets.csv", vec![0x6e, 0x61, 0xff, 0xfe, 0x0a])
        .unwrap();

    let err = harness
        .engine()
        .run(request(ImportKind::Assets, "assets.csv"))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::InvalidEncoding(_)));
    assert_eq!(only_run(&harness).await.status, RunStatus::Failed);
}

#[tokio::test]
async fn test_missing_file_fails_the_run() {
    let harness = TestHarness::new();

    let err = harness
        .engine()
        .run(request(ImportKind::Assets, "absent.csv"))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::FileNotFound(_)));
    let run = only_run(&harness).await;
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.failed_stage, Some(RunStage::Authorized));
}

#[tokio::test]
async fn test_download_timeout_fails_the_run() {
    let harness =
        TestHarness::with_blobs(InMemoryBlobStore::new().with_download_delay(Duration::from_millis(500)));
    harness.upload("assets.csv", "name,erp_asset_id,location-name\nA,E1,\n");

    let settings = ImportSettings {
        download_timeout: Duration::from_millis(20),
        ..Default::default()
    };
    let err = harness
        .engine_with(settings)
        .run(request(ImportKind::Assets, "assets.csv"))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::DownloadTimeout { timeout_ms: 20 }));
    assert_eq!(only_run(&harness).await.status, RunStatus::Failed);
}

// ==========================================
// 前置检查（不创建运行记录）
// ==========================================

#[tokio::test]
async fn test_unauthenticated_caller_is_rejected_without_run() {
    let harness = TestHarness::new();
    harness.upload("assets.csv", "name,erp_asset_id,location-name\nA,E1,\n");

    let err = harness
        .engine()
        .run(ImportRequest::new(ImportKind::Assets, "assets.csv", None))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Unauthenticated));
    assert!(all_runs(&harness).await.is_empty());
    assert_eq!(
        harness.audit.actions(),
        vec![AuditAction::UnauthorizedAccessAttempt]
    );
}

#[tokio::test]
async fn test_unprivileged_caller_is_forbidden() {
    let harness = TestHarness::new();
    harness.upload("assets.csv", "name,erp_asset_id,location-name\nA,E1,\n");

    let err = harness
        .engine()
        .run(ImportRequest::new(ImportKind::Assets, "assets.csv", viewer()))
        .await
        .unwrap_err();

    assert!(matches!(err, PipelineError::Forbidden(_)));
    assert!(all_runs(&harness).await.is_empty());
    assert_eq!(
        harness.audit.actions(),
        vec![AuditAction::UnauthorizedRoleAccess]
    );
}

#[tokio::test]
async fn test_suspicious_file_names_are_rejected() {
    let harness = TestHarness::new();

    for name in ["../secrets.csv", "a b.csv", "x..csv", "report;rm.csv"] {
        let err = harness
            .engine()
            .run(request(ImportKind::Assets, name))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidFileName(_)), "{}", name);
    }

    let err = harness
        .engine()
        .run(request(ImportKind::Assets, "  "))
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::MissingFileName));

    assert!(all_runs(&harness).await.is_empty());
    let suspicious = harness
        .audit
        .actions()
        .into_iter()
        .filter(|a| *a == AuditAction::SuspiciousFilename)
        .count();
    assert_eq!(suspicious, 4);
}

#[tokio::test]
async fn test_audit_trail_for_successful_run() {
    let harness = TestHarness::new();
    harness.upload("assets.csv", "name,erp_asset_id,location-name\nA,E1,\n");

    harness
        .engine()
        .run(request(ImportKind::Assets, "assets.csv"))
        .await
        .unwrap();

    assert_eq!(
        harness.audit.actions(),
        vec![
            AuditAction::CsvProcessingStarted,
            AuditAction::CsvProcessingCompleted
        ]
    );
    let completed = harness.audit.events().pop().unwrap();
    assert_eq!(completed.details["successCount"], 1);
    assert_eq!(completed.user_id.as_deref(), Some("admin-1"));
}

#[tokio::test]
async fn test_directory_prefix_checks_base_name_only() {
    let harness = TestHarness::new();
    harness.upload("uploads/2024/locations.csv", "name\nDock 1\n");

    let summary = harness
        .engine()
        .run(request(ImportKind::Locations, "uploads/2024/locations.csv"))
        .await
        .unwrap();
    assert_eq!(summary.success_count, 1);
    assert_eq!(only_run(&harness).await.file_name, "uploads/2024/locations.csv");

    for name in ["uploads/a b.csv", "/etc/locations.csv", "uploads//a.csv", "uploads/", "up\\a.csv"] {
        let err = harness
            .engine()
            .run(request(ImportKind::Locations, name))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::InvalidFileName(_)), "{}", name);
    }
}

// ==========================================
// 写库故障
// ==========================================

fn fast_retry_settings() -> ImportSettings {
    ImportSettings {
        retry_backoff: Duration::from_millis(1),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_row_write_failure_does_not_stop_the_batch() {
    let harness = TestHarness::new();
    harness.upload(
        "assets.csv",
        "name,erp_asset_id,location-name\n\
         Pump,E1,\n\
         Valve,E2,\n\
         Motor,E3,\n\
         Fan,E4,\n",
    );
    let store = Arc::new(
        FlakyReferenceStore::new(harness.store.clone())
            .fail_asset("E2")
            .busy_asset("E3", 2),
    );

    let summary = harness
        .engine_over(store.clone(), harness.sync_logs.clone(), fast_retry_settings())
        .run(request(ImportKind::Assets, "assets.csv"))
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::CompletedWithErrors);
    assert_eq!(summary.success_count, 3);
    assert_eq!(summary.errors.len(), 1);
    let err = &summary.errors[0];
    assert_eq!(err.row_number, 3);
    assert_eq!(err.category, ErrorCategory::StoreWrite);
    assert_eq!(
        err.message,
        "Row 3: failed to write asset \"E2\": conflicts with an existing record"
    );

    // 永久失败不重试；瞬时失败重试两次后成功
    assert_eq!(store.attempts("E2"), 1);
    assert_eq!(store.attempts("E3"), 3);
    assert_eq!(count_rows(&harness.db_path, "assets"), 3);
    assert!(asset_column(&harness.db_path, "E4", "name").is_some());

    let run = only_run(&harness).await;
    assert_eq!(run.status, RunStatus::CompletedWithErrors);
    assert_eq!(run.errors_count, 1);
}

#[tokio::test]
async fn test_busy_beyond_retry_budget_becomes_row_error() {
    let harness = TestHarness::new();
    harness.upload("assets.csv", "name,erp_asset_id,location-name\nPump,E1,\nValve,E2,\n");
    let store = Arc::new(FlakyReferenceStore::new(harness.store.clone()).busy_asset("E1", 5));

    let summary = harness
        .engine_over(store.clone(), harness.sync_logs.clone(), fast_retry_settings())
        .run(request(ImportKind::Assets, "assets.csv"))
        .await
        .unwrap();

    assert_eq!(store.attempts("E1"), 3);
    assert_eq!(summary.success_count, 1);
    assert_eq!(summary.errors[0].category, ErrorCategory::StoreWrite);
    assert!(summary.errors[0].message.ends_with("database is busy"));
}

#[tokio::test]
async fn test_panic_during_ingest_fails_the_run() {
    let harness = TestHarness::new();
    harness.upload("assets.csv", "name,erp_asset_id,location-name\nPump,E1,\nValve,E2,\n");
    let store = Arc::new(FlakyReferenceStore::new(harness.store.clone()).panic_on_asset("E2"));

    let err = harness
        .engine_over(store, harness.sync_logs.clone(), fast_retry_settings())
        .run(request(ImportKind::Assets, "assets.csv"))
        .await
        .unwrap_err();

    match &err {
        PipelineError::Internal(detail) => assert!(detail.contains("injected panic")),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(err.public_message(), asset_data_import::importer::GENERIC_FAILURE_MESSAGE);

    let run = only_run(&harness).await;
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.failed_stage, Some(RunStage::Ingesting));
    assert!(run.completed_at.is_some());
    assert!(harness
        .audit
        .actions()
        .contains(&AuditAction::CsvProcessingError));
}

#[tokio::test]
async fn test_heartbeat_write_failure_is_ignored() {
    let harness = TestHarness::new();
    harness.upload("assets.csv", "name,erp_asset_id,location-name\nPump,E1,\nValve,E2,\nMotor,E3,\n");
    let sync_logs = Arc::new(FailingHeartbeatSyncLogs::new(harness.sync_logs.clone()));
    let settings = ImportSettings {
        batch_size: 1,
        heartbeat_every_batches: 1,
        ..Default::default()
    };

    let summary = harness
        .engine_over(harness.store.clone(), sync_logs.clone(), settings)
        .run(request(ImportKind::Assets, "assets.csv"))
        .await
        .unwrap();

    assert_eq!(summary.status, RunStatus::Completed);
    assert_eq!(summary.success_count, 3);
    assert_eq!(sync_logs.heartbeat_attempts(), 3);

    let run = only_run(&harness).await;
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.heartbeat_count, 0);
    assert_eq!(run.records_succeeded, 3);
}

// ==========================================
// 并发
// ==========================================

#[tokio::test]
async fn test_concurrent_runs_share_the_store() {
    let harness = TestHarness::new();
    seed_location(&harness.db_path, "Yard");
    harness.upload(
        "first.csv",
        "name,erp_asset_id,location-name\nA,E1,Yard\nB,E2,Yard\n",
    );
    harness.upload(
        "second.csv",
        "name,erp_asset_id,location-name\nB,E2,Yard\nC,E3,Yard\n",
    );

    let engine_a = harness.engine();
    let engine_b = harness.engine();
    let (a, b) = tokio::join!(
        engine_a.run(request(ImportKind::Assets, "first.csv")),
        engine_b.run(request(ImportKind::Assets, "second.csv")),
    );

    assert_eq!(a.unwrap().success_count, 2);
    assert_eq!(b.unwrap().success_count, 2);
    assert_eq!(count_rows(&harness.db_path, "assets"), 3);
    assert_eq!(all_runs(&harness).await.len(), 2);
}
