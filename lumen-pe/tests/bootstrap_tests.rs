//! Bootstrap against real databases and failing stores

mod helpers;

use std::sync::Arc;

use helpers::{course, scenario_catalog, TestEngine};
use lumen_common::db::init_database;
use lumen_common::{EntityKind, Status};
use lumen_pe::{Catalog, Error, MemoryStatusStore, ProgressionEngine, SqliteStatusStore};
use tempfile::TempDir;

#[tokio::test]
async fn test_progress_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("lumen.db");

    {
        let pool = init_database(&db_path).await.unwrap();
        let engine = ProgressionEngine::new(
            Arc::new(SqliteStatusStore::new(pool.clone())),
            Arc::new(scenario_catalog()),
        );
        engine.bootstrap_validate().await.unwrap();
        engine.complete_chapter(10).await.unwrap();
        pool.close().await;
    }

    // Reopen with an extra course appended to the catalog
    let pool = init_database(&db_path).await.unwrap();
    let mut courses = scenario_catalog().courses().to_vec();
    courses.push(course(3, &[30], &[], 300));
    let engine = ProgressionEngine::new(
        Arc::new(SqliteStatusStore::new(pool)),
        Arc::new(Catalog::new(courses).unwrap()),
    );

    let report = engine.bootstrap_validate().await.unwrap();
    assert_eq!(report.courses, 1);
    assert_eq!(report.chapters, 1);
    assert_eq!(report.exams, 1);

    assert_eq!(
        engine.status(EntityKind::Chapter, 10).await.unwrap(),
        Status::Completed
    );
    assert_eq!(engine.status(EntityKind::Course, 3).await.unwrap(), Status::Locked);
    assert_eq!(engine.store().seeded_course_count().await.unwrap(), 3);
}

#[tokio::test]
async fn test_store_failure_surfaces_as_bootstrap_error() {
    let store = Arc::new(MemoryStatusStore::new());
    store.fail_writes_after(5);
    let t = TestEngine::with_store(store, scenario_catalog());

    let err = t.engine.bootstrap_validate().await.unwrap_err();
    assert!(matches!(err, Error::Bootstrap(_)));
}

#[tokio::test]
async fn test_reset_failure_is_reported() {
    let store = Arc::new(MemoryStatusStore::new());
    let t = TestEngine::with_store(store.clone(), scenario_catalog())
        .bootstrapped()
        .await;

    t.engine.complete_chapter(10).await.unwrap();

    store.fail_writes_after(0);
    let err = t.engine.reset_progress().await.unwrap_err();
    assert!(err.is_store_io());
    assert!(!t.engine.barrier().is_pending());

    // Nothing was deleted
    assert_eq!(
        t.engine.status(EntityKind::Chapter, 10).await.unwrap(),
        Status::Completed
    );
    assert_eq!(t.engine.store().seeded_course_count().await.unwrap(), 2);
}

#[tokio::test]
async fn test_reset_interrupted_before_reseed_keeps_first_course_open() {
    let store = Arc::new(MemoryStatusStore::new());
    let t = TestEngine::with_store(store.clone(), scenario_catalog())
        .bootstrapped()
        .await;

    // Clear succeeds, re-seeding fails on the first course
    store.fail_writes_after(1);
    let err = t.engine.reset_progress().await.unwrap_err();
    assert!(matches!(err, Error::Bootstrap(_)));
    assert_eq!(t.engine.store().seeded_course_count().await.unwrap(), 0);

    store.clear_faults();
    t.engine.bootstrap_validate().await.unwrap();
    assert_eq!(t.engine.status(EntityKind::Course, 1).await.unwrap(), Status::Unlocked);
    assert_eq!(t.engine.status(EntityKind::Course, 2).await.unwrap(), Status::Locked);
}

#[tokio::test]
async fn test_empty_catalog_bootstraps_nothing() {
    let t = TestEngine::in_memory(Catalog::new(Vec::new()).unwrap());
    let report = t.engine.bootstrap_validate().await.unwrap();
    assert!(report.is_noop());
}
