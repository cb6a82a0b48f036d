//! Progression engine
//!
//! Owns every status transition: chapter completion and its unlock cascade,
//! task toggling, exam attempts and their cooldown, bootstrap and reset.
//! Read-only queries go through the engine as well so that display reads can
//! honour the cascade barrier.
//!
//! Counters and flags live on the engine instance. Two engines over two
//! stores are fully independent.

mod chapters;
mod exams;
mod tasks;

pub use chapters::CascadeOutcome;
pub use exams::{AttemptTicket, ExamOutcome, ExamOverview};

use crate::barrier::CascadeBarrier;
use crate::bootstrap::{BootstrapReport, BootstrapValidator};
use crate::catalog::{Catalog, NextChapter};
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::notify::{NotificationScheduler, TracingScheduler};
use crate::store::{CheckedStore, StatusStore};
use lumen_common::db::StatusRecord;
use lumen_common::events::{EventBus, ProgressEvent};
use lumen_common::{EntityKind, Status};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// Engine construction options
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Developer override: ignore exam locks and cooldowns
    pub debug_override: bool,
    /// Capacity of the progress event channel
    pub event_capacity: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            debug_override: false,
            event_capacity: 256,
        }
    }
}

/// Completion summary for one course
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseProgress {
    pub course_id: i64,
    pub status: Status,
    pub chapters_completed: usize,
    pub chapters_total: usize,
    pub tasks_completed: usize,
    pub tasks_total: usize,
    pub exam_status: Status,
}

impl CourseProgress {
    pub fn all_chapters_completed(&self) -> bool {
        self.chapters_completed == self.chapters_total
    }
}

/// Curriculum progression engine
pub struct ProgressionEngine {
    store: CheckedStore,
    catalog: Arc<Catalog>,
    notifier: Arc<dyn NotificationScheduler>,
    clock: Arc<dyn Clock>,
    events: EventBus,
    barrier: CascadeBarrier,
    debug_override: AtomicBool,
}

impl ProgressionEngine {
    /// Engine with the system clock and a log-only notifier
    pub fn new(store: Arc<dyn StatusStore>, catalog: Arc<Catalog>) -> Self {
        Self::with_options(store, catalog, EngineOptions::default())
    }

    pub fn with_options(
        store: Arc<dyn StatusStore>,
        catalog: Arc<Catalog>,
        options: EngineOptions,
    ) -> Self {
        Self {
            store: CheckedStore::new(store),
            catalog,
            notifier: Arc::new(TracingScheduler),
            clock: Arc::new(SystemClock),
            events: EventBus::new(options.event_capacity),
            barrier: CascadeBarrier::new(),
            debug_override: AtomicBool::new(options.debug_override),
        }
    }

    /// Replace the notification scheduler
    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationScheduler>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Replace the time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &CheckedStore {
        &self.store
    }

    pub fn barrier(&self) -> &CascadeBarrier {
        &self.barrier
    }

    /// Subscribe to progress events emitted after each committed transition
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.events.subscribe()
    }

    pub fn debug_override(&self) -> bool {
        self.debug_override.load(Ordering::SeqCst)
    }

    pub fn set_debug_override(&self, enabled: bool) {
        self.debug_override.store(enabled, Ordering::SeqCst);
        info!("Debug override {}", if enabled { "enabled" } else { "disabled" });
    }

    fn now(&self) -> i64 {
        self.clock.now_epoch_seconds()
    }

    fn emit(&self, event: ProgressEvent) {
        self.events.emit_lossy(event);
    }

    /// Seed missing status rows for the whole catalog
    pub async fn bootstrap_validate(&self) -> Result<BootstrapReport> {
        BootstrapValidator::new(&self.store, &self.catalog)
            .validate()
            .await
    }

    /// Delete all progress and seed defaults again
    ///
    /// Rows and the seeded-course counter are cleared in one store write, so
    /// a failed reset leaves either the old progress or an empty store that
    /// the next bootstrap seeds with fresh defaults. Display readers wait for
    /// the reset to finish, as they would for a cascade.
    pub async fn reset_progress(&self) -> Result<BootstrapReport> {
        let _guard = self.barrier.enter();

        self.store.reset_all().await?;

        let report = self.bootstrap_validate().await?;
        info!("Progress reset; {} rows re-seeded", report.total());

        self.emit(ProgressEvent::ProgressReset {
            timestamp: lumen_common::time::now(),
        });
        Ok(report)
    }

    /// Stored status of any entity
    pub async fn status(&self, kind: EntityKind, id: i64) -> Result<Status> {
        self.store.status(kind, id).await
    }

    /// Full stored record of any entity
    pub async fn record(&self, kind: EntityKind, id: i64) -> Result<StatusRecord> {
        self.store.require(kind, id).await
    }

    /// Exam status for painting the exam icon
    ///
    /// Waits for in-flight cascades so a chapter completion that is about to
    /// unlock the exam is never shown as still locked.
    pub async fn exam_status_for_display(&self, exam_id: i64) -> Result<Status> {
        self.barrier.wait_clear().await;
        self.store.status(EntityKind::Exam, exam_id).await
    }

    /// False when the entity is locked, unless the debug override is set
    pub async fn is_accessible(&self, kind: EntityKind, id: i64) -> Result<bool> {
        if self.debug_override() {
            return Ok(true);
        }
        let status = if kind == EntityKind::Exam {
            self.exam_status_for_display(id).await?
        } else {
            self.store.status(kind, id).await?
        };
        Ok(!status.is_locked())
    }

    pub async fn course_progress(&self, course_id: i64) -> Result<CourseProgress> {
        let course = self.catalog.course(course_id)?;

        let mut chapters_completed = 0;
        for &chapter_id in &course.chapter_ids {
            if self.store.status(EntityKind::Chapter, chapter_id).await?.is_completed() {
                chapters_completed += 1;
            }
        }

        let mut tasks_completed = 0;
        for &task_id in &course.task_ids {
            if self.store.status(EntityKind::Task, task_id).await?.is_completed() {
                tasks_completed += 1;
            }
        }

        Ok(CourseProgress {
            course_id,
            status: self.store.status(EntityKind::Course, course_id).await?,
            chapters_completed,
            chapters_total: course.chapter_ids.len(),
            tasks_completed,
            tasks_total: course.task_ids.len(),
            exam_status: self.exam_status_for_display(course.exam.id).await?,
        })
    }

    /// Progress for every course, ascending by id
    pub async fn curriculum_progress(&self) -> Result<Vec<CourseProgress>> {
        let mut progress = Vec::with_capacity(self.catalog.courses().len());
        for course_id in self.catalog.course_ids() {
            progress.push(self.course_progress(course_id).await?);
        }
        Ok(progress)
    }

    /// Navigation target after `chapter_id`
    pub fn next_chapter(&self, chapter_id: i64) -> Result<NextChapter> {
        self.catalog.next_chapter(chapter_id)
    }
}
