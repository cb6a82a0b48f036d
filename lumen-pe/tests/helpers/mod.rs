//! Test helpers for lumen-pe integration tests
//!
//! Provides engines wired to a manual clock and a recording notifier, over
//! either the in-memory store or a SQLite database in a temp directory.

#![allow(dead_code)]

use std::sync::Arc;

use lumen_common::db::init_database;
use lumen_pe::catalog::{CourseEntry, ExamEntry};
use lumen_pe::clock::ManualClock;
use lumen_pe::notify::RecordingScheduler;
use lumen_pe::{Catalog, MemoryStatusStore, ProgressionEngine, SqliteStatusStore, StatusStore};
use tempfile::TempDir;

/// Fixed start time for every test clock
pub const T0: i64 = 1_700_000_000;

pub fn course(id: i64, chapters: &[i64], tasks: &[i64], exam_id: i64) -> CourseEntry {
    CourseEntry {
        id,
        title: format!("Course {}", id),
        chapter_ids: chapters.to_vec(),
        task_ids: tasks.to_vec(),
        exam: ExamEntry {
            id: exam_id,
            display_name: format!("Exam {}", exam_id),
            question_amount: 5,
            time_limit_minutes: 10,
        },
    }
}

/// Course 1 (chapters 10, 11; exam 100) and course 2 (chapter 20; exam 200)
pub fn scenario_catalog() -> Catalog {
    Catalog::new(vec![
        course(1, &[10, 11], &[1000], 100),
        course(2, &[20], &[2000], 200),
    ])
    .unwrap()
}

/// Engine plus handles to the pieces tests need to poke at
pub struct TestEngine {
    pub engine: ProgressionEngine,
    pub clock: Arc<ManualClock>,
    pub notifier: Arc<RecordingScheduler>,
    /// Keeps an on-disk database alive for the test's duration
    pub _dir: Option<TempDir>,
}

impl TestEngine {
    /// Engine over an in-memory store, not yet bootstrapped
    pub fn in_memory(catalog: Catalog) -> Self {
        Self::over(Arc::new(MemoryStatusStore::new()), catalog, None)
    }

    /// Engine over a given store, not yet bootstrapped
    pub fn with_store(store: Arc<dyn StatusStore>, catalog: Catalog) -> Self {
        Self::over(store, catalog, None)
    }

    /// Engine over a SQLite file in a fresh temp directory
    pub async fn on_disk(catalog: Catalog) -> Self {
        let dir = TempDir::new().unwrap();
        let pool = init_database(&dir.path().join("lumen.db")).await.unwrap();
        Self::over(Arc::new(SqliteStatusStore::new(pool)), catalog, Some(dir))
    }

    fn over(store: Arc<dyn StatusStore>, catalog: Catalog, dir: Option<TempDir>) -> Self {
        let clock = Arc::new(ManualClock::new(T0));
        let notifier = Arc::new(RecordingScheduler::new());
        let engine = ProgressionEngine::new(store, Arc::new(catalog))
            .with_clock(clock.clone())
            .with_notifier(notifier.clone());

        Self {
            engine,
            clock,
            notifier,
            _dir: dir,
        }
    }

    pub async fn bootstrapped(self) -> Self {
        self.engine.bootstrap_validate().await.unwrap();
        self
    }
}
