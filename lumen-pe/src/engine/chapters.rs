//! Chapter completion and the exam unlock cascade

use super::ProgressionEngine;
use crate::error::Result;
use crate::rules;
use lumen_common::events::ProgressEvent;
use lumen_common::{EntityKind, Status};
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

/// What a chapter completion changed beyond the chapter itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CascadeOutcome {
    /// Last open chapter of the course; its exam moved Locked -> Unlocked
    ExamUnlocked { exam_id: i64 },
    NoChange,
}

impl ProgressionEngine {
    /// Mark a chapter completed and unlock the course exam when it was the
    /// last open chapter
    ///
    /// Idempotent: completing a completed chapter re-runs the cascade check
    /// and changes nothing. The cascade barrier is held for the whole call,
    /// error paths included.
    pub async fn complete_chapter(&self, chapter_id: i64) -> Result<CascadeOutcome> {
        let _guard = self.barrier.enter();

        let course = self.catalog.course_for_chapter(chapter_id)?;

        let chapter = self.store.require(EntityKind::Chapter, chapter_id).await?;
        if !chapter.status.is_completed() {
            self.store
                .update(EntityKind::Chapter, chapter.with_status(Status::Completed))
                .await?;
            info!("Chapter {} completed (course {})", chapter_id, course.id);
            self.emit(ProgressEvent::ChapterCompleted {
                chapter_id,
                course_id: course.id,
                timestamp: lumen_common::time::now(),
            });
        }

        let exam = self.store.require(EntityKind::Exam, course.exam.id).await?;
        if !exam.status.is_locked() {
            debug!(
                "Exam {} already {}; no cascade for chapter {}",
                exam.id, exam.status, chapter_id
            );
            return Ok(CascadeOutcome::NoChange);
        }

        let mut statuses = HashMap::with_capacity(course.chapter_ids.len());
        for &id in &course.chapter_ids {
            let status = self.store.status(EntityKind::Chapter, id).await?;
            statuses.insert(id, status);
            if !status.is_completed() {
                break;
            }
        }

        if !rules::all_chapters_completed(&course.chapter_ids, |id| statuses.get(&id).copied()) {
            return Ok(CascadeOutcome::NoChange);
        }

        self.store
            .update(EntityKind::Exam, exam.with_status(Status::Unlocked))
            .await?;
        info!(
            "All chapters of course {} completed; exam {} unlocked",
            course.id, exam.id
        );
        self.emit(ProgressEvent::ExamUnlocked {
            exam_id: exam.id,
            course_id: course.id,
            timestamp: lumen_common::time::now(),
        });

        Ok(CascadeOutcome::ExamUnlocked { exam_id: exam.id })
    }
}
