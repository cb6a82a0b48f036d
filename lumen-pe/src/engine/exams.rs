//! Exam attempts, scoring and the course completion cascade

use super::ProgressionEngine;
use crate::catalog::CourseEntry;
use crate::cooldown;
use crate::error::{Error, Result};
use crate::rules;
use lumen_common::db::StatusRecord;
use lumen_common::events::ProgressEvent;
use lumen_common::{EntityKind, Status};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Handed out when an exam screen loads
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttemptTicket {
    pub exam_id: i64,
    pub started_at: i64,
    /// Epoch second at which the time limit runs out
    pub deadline: i64,
    pub question_amount: u32,
}

/// Result of scoring one attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExamOutcome {
    pub exam_id: i64,
    pub percentage: u32,
    pub passed: bool,
    /// Best correct count after this attempt
    pub top_score: i64,
    pub top_score_improved: bool,
    pub course_completed: bool,
    pub next_course_unlocked: Option<i64>,
    /// Set when a failed attempt armed the retry cooldown
    pub cooldown_expires_at: Option<i64>,
}

/// Everything the exam card shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExamOverview {
    pub exam_id: i64,
    pub display_name: String,
    pub status: Status,
    pub last_started_at: i64,
    pub top_score: i64,
    pub question_amount: u32,
    pub time_limit_minutes: u32,
    pub on_cooldown: bool,
    pub seconds_remaining: i64,
}

impl ProgressionEngine {
    /// Record the start of an attempt
    ///
    /// `last_started_at` is stamped here, when the exam screen loads, whatever
    /// the attempt's result turns out to be.
    pub async fn begin_exam_attempt(&self, exam_id: i64) -> Result<AttemptTicket> {
        let entry = self.catalog.exam(exam_id)?;
        let exam = self.store.require(EntityKind::Exam, exam_id).await?;
        let debug_override = self.debug_override();
        let now = self.now();

        if exam.status.is_locked() && !debug_override {
            return Err(Error::ExamLocked(exam_id));
        }
        if cooldown::is_on_cooldown(&exam, now, debug_override) {
            return Err(Error::ExamOnCooldown {
                exam_id,
                seconds_remaining: cooldown::seconds_remaining(&exam, now),
            });
        }

        let started = StatusRecord {
            last_started_at: now,
            ..exam
        };
        self.store.update(EntityKind::Exam, started).await?;
        info!("Exam {} attempt started at {}", exam_id, now);

        self.emit(ProgressEvent::ExamAttemptStarted {
            exam_id,
            started_at: now,
            timestamp: lumen_common::time::now(),
        });

        Ok(AttemptTicket {
            exam_id,
            started_at: now,
            deadline: now + i64::from(entry.time_limit_minutes) * 60,
            question_amount: entry.question_amount,
        })
    }

    /// Score an attempt
    ///
    /// A pass completes the exam and its course and unlocks the next course.
    /// A fail leaves the status alone and schedules a notification for when
    /// the cooldown expires. Finishing a completed exam updates the top score
    /// and finishes any course cascade an earlier pass left half done.
    pub async fn finish_exam(
        &self,
        exam_id: i64,
        correct_count: u32,
        total_count: u32,
        pass_threshold_percent: u32,
    ) -> Result<ExamOutcome> {
        let percentage = rules::exam_percentage(correct_count, total_count)?;
        let passed = percentage >= pass_threshold_percent;

        let course = self.catalog.course_for_exam(exam_id)?;
        let mut exam = self.store.require(EntityKind::Exam, exam_id).await?;

        if exam.status.is_locked() && !self.debug_override() {
            return Err(Error::InvalidState(format!(
                "exam {} finished while locked",
                exam_id
            )));
        }

        if exam.status.is_completed() {
            let improved = self.apply_top_score(&mut exam, correct_count).await?;
            debug!("Completed exam {} re-attempted ({}%)", exam_id, percentage);
            let (course_completed, next_course_unlocked) = self.settle_pass(course).await?;
            return Ok(self.finished(
                exam,
                percentage,
                passed,
                improved,
                course_completed,
                next_course_unlocked,
                None,
            ));
        }

        // Attempts finished without a recorded start still arm the cooldown
        if !exam.has_started() {
            exam.last_started_at = self.now();
        }
        let improved = match rules::improved_top_score(exam.top_score, correct_count) {
            Some(score) => {
                exam.top_score = score;
                true
            }
            None => false,
        };

        if !passed {
            self.store.update(EntityKind::Exam, exam).await?;
            info!(
                "Exam {} failed with {}% (needs {}%)",
                exam_id, percentage, pass_threshold_percent
            );

            let fire_at = cooldown::expiry_at(&exam);
            if let Some(fire_at) = fire_at {
                if let Err(e) = self
                    .notifier
                    .schedule_cooldown_expiry(&course.exam.display_name, fire_at)
                    .await
                {
                    warn!("Failed to schedule cooldown notification for exam {}: {}", exam_id, e);
                }
            }

            return Ok(self.finished(exam, percentage, false, improved, false, None, fire_at));
        }

        exam.status = Status::Completed;
        self.store.update(EntityKind::Exam, exam).await?;
        info!("Exam {} passed with {}%", exam_id, percentage);

        let (course_completed, next_course_unlocked) = self.settle_pass(course).await?;

        Ok(self.finished(
            exam,
            percentage,
            true,
            improved,
            course_completed,
            next_course_unlocked,
            None,
        ))
    }

    /// Update only the top score of an exam
    ///
    /// Refused while the exam is locked or on cooldown. Returns the top score
    /// after the update.
    pub async fn record_attempt(&self, exam_id: i64, correct_count: u32) -> Result<i64> {
        let mut exam = self.store.require(EntityKind::Exam, exam_id).await?;
        let debug_override = self.debug_override();
        let now = self.now();

        if exam.status.is_locked() && !debug_override {
            return Err(Error::ExamLocked(exam_id));
        }
        if cooldown::is_on_cooldown(&exam, now, debug_override) {
            return Err(Error::ExamOnCooldown {
                exam_id,
                seconds_remaining: cooldown::seconds_remaining(&exam, now),
            });
        }

        self.apply_top_score(&mut exam, correct_count).await?;
        Ok(exam.top_score)
    }

    /// Exam record with its cooldown state as of now
    pub async fn exam_overview(&self, exam_id: i64) -> Result<ExamOverview> {
        self.exam_overview_at(exam_id, self.now()).await
    }

    pub async fn exam_overview_at(&self, exam_id: i64, now: i64) -> Result<ExamOverview> {
        let entry = self.catalog.exam(exam_id)?;
        self.barrier.wait_clear().await;
        let exam = self.store.require(EntityKind::Exam, exam_id).await?;

        let on_cooldown = cooldown::is_on_cooldown(&exam, now, self.debug_override());
        Ok(ExamOverview {
            exam_id,
            display_name: entry.display_name.clone(),
            status: exam.status,
            last_started_at: exam.last_started_at,
            top_score: exam.top_score,
            question_amount: entry.question_amount,
            time_limit_minutes: entry.time_limit_minutes,
            on_cooldown,
            seconds_remaining: if on_cooldown {
                cooldown::seconds_remaining(&exam, now)
            } else {
                0
            },
        })
    }

    /// Complete the course of a passed exam and unlock the next course
    ///
    /// Writes only what is still missing, so it also repairs a cascade that
    /// stopped part way. Returns whether the course was completed now and
    /// which course, if any, was unlocked now.
    async fn settle_pass(&self, course: &CourseEntry) -> Result<(bool, Option<i64>)> {
        let course_record = self.store.require(EntityKind::Course, course.id).await?;
        let course_completed = !course_record.status.is_completed();
        if course_completed {
            self.store
                .update(EntityKind::Course, course_record.with_status(Status::Completed))
                .await?;
            info!("Course {} completed", course.id);
            self.emit(ProgressEvent::CourseCompleted {
                course_id: course.id,
                timestamp: lumen_common::time::now(),
            });
        }

        let mut next_course_unlocked = None;
        if let Some(next) = self.catalog.next_course(course.id)? {
            let next_record = self.store.require(EntityKind::Course, next.id).await?;
            if next_record.status.is_locked() {
                self.store
                    .update(EntityKind::Course, next_record.with_status(Status::Unlocked))
                    .await?;
                info!("Course {} unlocked", next.id);
                self.emit(ProgressEvent::CourseUnlocked {
                    course_id: next.id,
                    timestamp: lumen_common::time::now(),
                });
                next_course_unlocked = Some(next.id);
            }
        }

        Ok((course_completed, next_course_unlocked))
    }

    /// Persist a better top score; true if one was written
    async fn apply_top_score(&self, exam: &mut StatusRecord, correct_count: u32) -> Result<bool> {
        match rules::improved_top_score(exam.top_score, correct_count) {
            Some(score) => {
                exam.top_score = score;
                self.store.update(EntityKind::Exam, *exam).await?;
                debug!("Exam {} top score now {}", exam.id, score);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn finished(
        &self,
        exam: StatusRecord,
        percentage: u32,
        passed: bool,
        top_score_improved: bool,
        course_completed: bool,
        next_course_unlocked: Option<i64>,
        cooldown_expires_at: Option<i64>,
    ) -> ExamOutcome {
        self.emit(ProgressEvent::ExamFinished {
            exam_id: exam.id,
            percentage,
            passed,
            top_score: exam.top_score,
            timestamp: lumen_common::time::now(),
        });

        ExamOutcome {
            exam_id: exam.id,
            percentage,
            passed,
            top_score: exam.top_score,
            top_score_improved,
            course_completed,
            next_course_unlocked,
            cooldown_expires_at,
        }
    }
}
