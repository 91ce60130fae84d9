//! Store-layer integration tests against an in-memory sqlite database.

use std::collections::BTreeMap;

use sqlx::SqlitePool;

use dailyqueue_tui::queue::{
    CommitOutcome, DefaultFilterPolicy, GridRow, LoadMode, QueueGridController, SortPolicy,
    DEFAULT_STATUS,
};
use dailyqueue_tui::store::{db, QueueStore, R26Store, SdReportStore};

async fn r26_pool() -> SqlitePool {
    let pool = db::connect_memory().await.unwrap();
    sqlx::query(
        r#"
        CREATE TABLE r26_daily_queue (
            r26queueuid INTEGER PRIMARY KEY,
            companyuid INTEGER NOT NULL,
            companyname TEXT,
            patnumber INTEGER,
            patfname TEXT,
            patlname TEXT,
            appttype TEXT,
            reason TEXT,
            providername TEXT,
            botname TEXT,
            status TEXT CHECK (status IS NULL OR length(status) <= 20),
            createdate TEXT,
            modifieddate TEXT
        )
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();

    for (uid, company_uid, company, pat, status) in [
        (1_i64, 10_i64, Some("Texashvi"), Some(10001_i64), Some("Completed")),
        (2, 10, Some("Texashvi"), Some(10002), Some("Error")),
        (3, 20, None, None, None),
    ] {
        sqlx::query(
            "INSERT INTO r26_daily_queue \
             (r26queueuid, companyuid, companyname, patnumber, patfname, patlname, status, createdate) \
             VALUES (?, ?, ?, ?, 'Ann', 'Example', ?, '2026-08-01 08:00:00')",
        )
        .bind(uid)
        .bind(company_uid)
        .bind(company)
        .bind(pat)
        .bind(status)
        .execute(&pool)
        .await
        .unwrap();
    }

    pool
}

#[tokio::test]
async fn r26_fetch_maps_fallbacks_and_order() {
    let pool = r26_pool().await;
    let store = R26Store::new(pool);

    let rows = store.fetch_all().await.unwrap();
    assert_eq!(rows.len(), 3);
    // Newest queue id first.
    assert_eq!(rows[0].queue_uid, 3);
    // Missing company name falls back to a synthesized one.
    assert_eq!(rows[0].company_name, "Company 20");
    // Null status surfaces as empty; the controller maps it to the default.
    assert_eq!(rows[0].status, "");
    assert_eq!(rows[2].company_name, "Texashvi");
    assert_eq!(rows[2].status, "Completed");
}

#[tokio::test]
async fn r26_distinct_statuses_skip_null_and_sort() {
    let pool = r26_pool().await;
    let store = R26Store::new(pool);

    let statuses = store.fetch_distinct_statuses().await.unwrap();
    assert_eq!(statuses, vec!["Completed".to_string(), "Error".to_string()]);
}

#[tokio::test]
async fn r26_updates_apply_and_stamp_modified() {
    let pool = r26_pool().await;
    let store = R26Store::new(pool.clone());

    let mut edits = BTreeMap::new();
    edits.insert(1, "Reprocess".to_string());
    edits.insert(2, "Completed".to_string());

    let count = store.apply_status_updates(&edits, "tester").await.unwrap();
    assert_eq!(count, 2);

    let rows = store.fetch_all().await.unwrap();
    let row1 = rows.iter().find(|r| r.queue_uid == 1).unwrap();
    assert_eq!(row1.status, "Reprocess");
    assert!(row1.modified_date.is_some());
}

#[tokio::test]
async fn r26_failed_batch_changes_nothing() {
    let pool = r26_pool().await;
    let store = R26Store::new(pool.clone());

    let mut edits = BTreeMap::new();
    edits.insert(1, "Reprocess".to_string());
    // Violates the status length check, so the whole batch must roll back.
    edits.insert(2, "X".repeat(64));

    let err = store.apply_status_updates(&edits, "tester").await;
    assert!(err.is_err());

    let rows = store.fetch_all().await.unwrap();
    let row1 = rows.iter().find(|r| r.queue_uid == 1).unwrap();
    assert_eq!(row1.status, "Completed");
}

#[tokio::test]
async fn controller_round_trip_against_sqlite() {
    let pool = r26_pool().await;
    let store = R26Store::new(pool);

    let mut controller: QueueGridController<_> = QueueGridController::new(
        "tester",
        DefaultFilterPolicy::None,
        SortPolicy::SnapshotOrder,
    );

    let summary = controller.load(&store, LoadMode::Initial).await.unwrap();
    assert_eq!(summary.total, 3);
    assert_eq!(controller.visible()[0].status(), DEFAULT_STATUS);

    controller.edit_status(1, "Error").unwrap();
    let outcome = controller.commit_individual(&store).await.unwrap();
    assert!(matches!(
        outcome,
        CommitOutcome::Applied { count: 1, .. }
    ));
    assert_eq!(controller.pending_count(), 0);

    // The post-commit refresh picked up the stored value.
    let row = controller
        .visible()
        .into_iter()
        .find(|r| r.id() == 1)
        .unwrap()
        .clone();
    assert_eq!(row.status, "Error");
}

#[tokio::test]
async fn sd_report_update_records_actor() {
    let pool = db::connect_memory().await.unwrap();
    sqlx::query(
        r#"
        CREATE TABLE sd_report_process_schedule_queue (
            sdreportschedulequeueuid INTEGER PRIMARY KEY,
            companyuid INTEGER NOT NULL,
            companyname TEXT,
            sdrawreportuid INTEGER,
            scheduledate TEXT,
            scheduletime TEXT,
            executionduration TEXT,
            rawfilepath TEXT,
            processedfilepath TEXT,
            slacomplianceflag TEXT,
            status TEXT,
            createddate TEXT,
            createdby TEXT,
            modifieddate TEXT,
            modifiedby TEXT
        )
        "#,
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query(
        "INSERT INTO sd_report_process_schedule_queue \
         (sdreportschedulequeueuid, companyuid, companyname, status) \
         VALUES (7, 30, 'Acme Health', 'Scheduled')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let store = SdReportStore::new(pool);
    let mut edits = BTreeMap::new();
    edits.insert(7, "Delivered".to_string());
    let count = store.apply_status_updates(&edits, "svc-queues").await.unwrap();
    assert_eq!(count, 1);

    let rows = store.fetch_all().await.unwrap();
    assert_eq!(rows[0].status, "Delivered");
    assert_eq!(rows[0].modified_by.as_deref(), Some("svc-queues"));
}
