//! Database models

use crate::status::{Status, NEVER_STARTED};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

/// One row of the `progress_status` table
///
/// The attempt fields only carry meaning for exams; other kinds keep the
/// `NEVER_STARTED` sentinel in both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub id: i64,
    pub status: Status,
    /// Epoch seconds of the most recent exam attempt start
    pub last_started_at: i64,
    /// Best correct-answer count over all attempts
    pub top_score: i64,
}

impl StatusRecord {
    /// Record with no attempt history
    pub fn new(id: i64, status: Status) -> Self {
        Self {
            id,
            status,
            last_started_at: NEVER_STARTED,
            top_score: NEVER_STARTED,
        }
    }

    /// Same record with a different status
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn has_started(&self) -> bool {
        self.last_started_at != NEVER_STARTED
    }

    pub fn has_score(&self) -> bool {
        self.top_score != NEVER_STARTED
    }
}
