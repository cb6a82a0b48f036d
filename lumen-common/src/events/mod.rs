//! Event types for the Lumen progression event system
//!
//! Provides the shared event definitions and EventBus. The progression engine
//! emits events after each committed transition; UI layers subscribe to
//! repaint lock/unlock icons without polling the store.

use crate::status::{EntityKind, Status};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Progression event types
///
/// Events are broadcast via EventBus and can be serialized for transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ProgressEvent {
    /// A chapter reached `Completed`
    ChapterCompleted {
        chapter_id: i64,
        course_id: i64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A task checkbox was toggled
    TaskToggled {
        task_id: i64,
        course_id: i64,
        /// Status after the toggle (`Completed` or `Unlocked`)
        status: Status,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// All chapters of a course completed; its exam moved Locked -> Unlocked
    ExamUnlocked {
        exam_id: i64,
        course_id: i64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An exam attempt began (exam screen loaded)
    ExamAttemptStarted {
        exam_id: i64,
        started_at: i64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An exam attempt was scored
    ExamFinished {
        exam_id: i64,
        percentage: u32,
        passed: bool,
        top_score: i64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A course moved to `Completed` because its exam was passed
    CourseCompleted {
        course_id: i64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A course moved Locked -> Unlocked because the previous course was completed
    CourseUnlocked {
        course_id: i64,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// All progress was deleted and defaults re-seeded
    ProgressReset {
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl ProgressEvent {
    /// Entity whose status this event reports, if any
    pub fn subject(&self) -> Option<(EntityKind, i64)> {
        match self {
            ProgressEvent::ChapterCompleted { chapter_id, .. } => {
                Some((EntityKind::Chapter, *chapter_id))
            }
            ProgressEvent::TaskToggled { task_id, .. } => Some((EntityKind::Task, *task_id)),
            ProgressEvent::ExamUnlocked { exam_id, .. }
            | ProgressEvent::ExamAttemptStarted { exam_id, .. }
            | ProgressEvent::ExamFinished { exam_id, .. } => Some((EntityKind::Exam, *exam_id)),
            ProgressEvent::CourseCompleted { course_id, .. }
            | ProgressEvent::CourseUnlocked { course_id, .. } => {
                Some((EntityKind::Course, *course_id))
            }
            ProgressEvent::ProgressReset { .. } => None,
        }
    }
}

/// Central event distribution bus
///
/// Thin wrapper over a tokio broadcast channel. Slow subscribers lag and
/// lose the oldest events rather than blocking the engine.
pub struct EventBus {
    tx: broadcast::Sender<ProgressEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// ```
    /// use lumen_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(100);
    /// assert_eq!(event_bus.capacity(), 100);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<ProgressEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: ProgressEvent,
    ) -> Result<usize, broadcast::error::SendError<ProgressEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: ProgressEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
