//! Task checkboxes

use super::ProgressionEngine;
use crate::error::{Error, Result};
use lumen_common::events::ProgressEvent;
use lumen_common::{EntityKind, Status};
use tracing::debug;

impl ProgressionEngine {
    /// Tick or untick a task; returns the new status
    ///
    /// Unticking always goes back to `Unlocked`. Tasks take no part in the
    /// unlock cascade and do not touch the barrier.
    pub async fn set_task_completed(&self, task_id: i64, completed: bool) -> Result<Status> {
        let course = self.catalog.course_for_task(task_id)?;
        let task = self.store.require(EntityKind::Task, task_id).await?;

        if task.status.is_locked() {
            return Err(Error::InvalidState(format!("task {} is locked", task_id)));
        }

        let target = if completed {
            Status::Completed
        } else {
            Status::Unlocked
        };
        if task.status == target {
            return Ok(target);
        }

        self.store
            .update(EntityKind::Task, task.with_status(target))
            .await?;
        debug!("Task {} set to {}", task_id, target);

        self.emit(ProgressEvent::TaskToggled {
            task_id,
            course_id: course.id,
            status: target,
            timestamp: lumen_common::time::now(),
        });
        Ok(target)
    }
}
