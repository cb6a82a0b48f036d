//! Bootstrap validation
//!
//! Makes sure every catalog entity has a status row before the engine serves
//! requests. Courses are seeded first and in ascending id order, because the
//! first course ever seeded into an empty store is the one that starts
//! unlocked. The persisted seeded-course counter (not the number of rows
//! present) decides "first", so adding a course to an existing catalog never
//! unlocks it by accident. Each course row lands together with its counter
//! bump in one store write, so an interrupted run cannot leave a course row
//! that the counter does not account for.
//!
//! Running the validator again is a no-op for entities that already have a
//! row: stored statuses are never touched.

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::rules;
use crate::store::CheckedStore;
use lumen_common::db::StatusRecord;
use lumen_common::EntityKind;
use serde::Serialize;
use tracing::{debug, info};

/// Rows inserted by one validation run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BootstrapReport {
    pub courses: usize,
    pub chapters: usize,
    pub tasks: usize,
    pub exams: usize,
}

impl BootstrapReport {
    pub fn total(&self) -> usize {
        self.courses + self.chapters + self.tasks + self.exams
    }

    pub fn is_noop(&self) -> bool {
        self.total() == 0
    }
}

/// Seeds missing status rows with their defaults
pub struct BootstrapValidator<'a> {
    store: &'a CheckedStore,
    catalog: &'a Catalog,
}

impl<'a> BootstrapValidator<'a> {
    pub fn new(store: &'a CheckedStore, catalog: &'a Catalog) -> Self {
        Self { store, catalog }
    }

    /// Seed every entity lacking a row
    ///
    /// Any failure aborts the run and is reported as [`Error::Bootstrap`]
    /// wrapping the cause. Rows inserted before the failure stay in place;
    /// a later run picks up where this one stopped.
    pub async fn validate(&self) -> Result<BootstrapReport> {
        let report = self
            .seed()
            .await
            .map_err(|e| Error::Bootstrap(Box::new(e)))?;

        if report.is_noop() {
            debug!("Bootstrap validation: all status rows present");
        } else {
            info!(
                "Bootstrap validation seeded {} courses, {} chapters, {} tasks, {} exams",
                report.courses, report.chapters, report.tasks, report.exams
            );
        }

        Ok(report)
    }

    async fn seed(&self) -> Result<BootstrapReport> {
        let mut report = BootstrapReport::default();

        // Courses first, ascending (catalog keeps them sorted)
        let mut seeded_courses = self.store.seeded_course_count().await?;
        for course_id in self.catalog.course_ids() {
            if self.store.get(EntityKind::Course, course_id).await?.is_some() {
                continue;
            }
            let status = rules::default_course_status(seeded_courses == 0);
            self.store
                .put_seeded_course(StatusRecord::new(course_id, status), seeded_courses + 1)
                .await?;
            seeded_courses += 1;
            debug!("Seeded course {} as {}", course_id, status);
            report.courses += 1;
        }

        for chapter_id in self.catalog.chapter_ids() {
            if self.seed_missing(EntityKind::Chapter, chapter_id, || {
                StatusRecord::new(chapter_id, rules::default_chapter_status())
            })
            .await?
            {
                report.chapters += 1;
            }
        }

        for task_id in self.catalog.task_ids() {
            if self.seed_missing(EntityKind::Task, task_id, || {
                StatusRecord::new(task_id, rules::default_task_status())
            })
            .await?
            {
                report.tasks += 1;
            }
        }

        for exam_id in self.catalog.exam_ids() {
            if self
                .seed_missing(EntityKind::Exam, exam_id, || rules::default_exam_record(exam_id))
                .await?
            {
                report.exams += 1;
            }
        }

        Ok(report)
    }

    /// Insert the default record when no row exists; true if inserted
    async fn seed_missing<F>(&self, kind: EntityKind, id: i64, default: F) -> Result<bool>
    where
        F: FnOnce() -> StatusRecord,
    {
        if self.store.get(kind, id).await?.is_some() {
            return Ok(false);
        }
        self.store.put(kind, default()).await?;
        Ok(true)
    }
}
