//! Cooldown-expiry notification seam
//!
//! The engine decides *when* a learner should be told an exam is available
//! again; delivery belongs to the platform. [`TracingScheduler`] only logs,
//! [`RecordingScheduler`] keeps requests in memory for inspection.

use crate::error::Result;
use async_trait::async_trait;
use lumen_common::time::format_countdown;
use tokio::sync::Mutex;
use tracing::info;

/// Platform notification scheduler
#[async_trait]
pub trait NotificationScheduler: Send + Sync {
    /// Ask the platform to notify the learner at `fire_at_epoch_seconds`
    async fn schedule_cooldown_expiry(
        &self,
        exam_display_name: &str,
        fire_at_epoch_seconds: i64,
    ) -> Result<()>;
}

/// Scheduler that only writes a log line
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingScheduler;

#[async_trait]
impl NotificationScheduler for TracingScheduler {
    async fn schedule_cooldown_expiry(
        &self,
        exam_display_name: &str,
        fire_at_epoch_seconds: i64,
    ) -> Result<()> {
        let remaining = fire_at_epoch_seconds - lumen_common::time::now_epoch_seconds();
        info!(
            exam = exam_display_name,
            fire_at = fire_at_epoch_seconds,
            "Cooldown notification scheduled (in {})",
            format_countdown(remaining)
        );
        Ok(())
    }
}

/// One scheduled notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledNotification {
    pub exam_display_name: String,
    pub fire_at_epoch_seconds: i64,
}

/// Scheduler that records every request
#[derive(Debug, Default)]
pub struct RecordingScheduler {
    scheduled: Mutex<Vec<ScheduledNotification>>,
}

impl RecordingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all requests so far, oldest first
    pub async fn scheduled(&self) -> Vec<ScheduledNotification> {
        self.scheduled.lock().await.clone()
    }
}

#[async_trait]
impl NotificationScheduler for RecordingScheduler {
    async fn schedule_cooldown_expiry(
        &self,
        exam_display_name: &str,
        fire_at_epoch_seconds: i64,
    ) -> Result<()> {
        self.scheduled.lock().await.push(ScheduledNotification {
            exam_display_name: exam_display_name.to_string(),
            fire_at_epoch_seconds,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_scheduler_keeps_order() {
        let scheduler = RecordingScheduler::new();
        scheduler.schedule_cooldown_expiry("First", 10).await.unwrap();
        scheduler.schedule_cooldown_expiry("Second", 20).await.unwrap();

        let scheduled = scheduler.scheduled().await;
        assert_eq!(scheduled.len(), 2);
        assert_eq!(scheduled[0].exam_display_name, "First");
        assert_eq!(scheduled[1].fire_at_epoch_seconds, 20);
    }

    #[tokio::test]
    async fn test_tracing_scheduler_succeeds() {
        TracingScheduler
            .schedule_cooldown_expiry("Exam", 0)
            .await
            .unwrap();
    }
}
