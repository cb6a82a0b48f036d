//! Progression status model
//!
//! Every Course, Chapter, Task and Exam carries one [`Status`]. Statuses are
//! persisted as lowercase text in the `progress_status` table.
//!
//! `NotQueried` is the in-memory default for a value that has not been
//! round-tripped through the store yet. It is never a persisted value:
//! [`Status::parse`] rejects it, so a successful store read always yields
//! `Locked`, `Unlocked` or `Completed`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel for exam attempt fields (`last_started_at`, `top_score`) that
/// have never been written
pub const NEVER_STARTED: i64 = -1;

/// Kind of curriculum entity tracked by the progression engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Course,
    Chapter,
    Task,
    Exam,
}

impl EntityKind {
    /// All kinds, in bootstrap seeding order (courses first)
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Course,
        EntityKind::Chapter,
        EntityKind::Task,
        EntityKind::Exam,
    ];

    /// Database representation
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Course => "course",
            EntityKind::Chapter => "chapter",
            EntityKind::Task => "task",
            EntityKind::Exam => "exam",
        }
    }

    /// Parse the database representation
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "course" => Some(EntityKind::Course),
            "chapter" => Some(EntityKind::Chapter),
            "task" => Some(EntityKind::Task),
            "exam" => Some(EntityKind::Exam),
            _ => None,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progression status of a single entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Not yet read from the store (never persisted)
    #[default]
    NotQueried,
    /// Prerequisites not met
    Locked,
    /// Accessible, not finished
    Unlocked,
    /// Finished
    Completed,
}

impl Status {
    /// Database / display representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::NotQueried => "not_queried",
            Status::Locked => "locked",
            Status::Unlocked => "unlocked",
            Status::Completed => "completed",
        }
    }

    /// Parse a persisted status
    ///
    /// Returns `None` for unknown text and for `not_queried`, which is not a
    /// storable value.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "locked" => Some(Status::Locked),
            "unlocked" => Some(Status::Unlocked),
            "completed" => Some(Status::Completed),
            _ => None,
        }
    }

    /// True for the three statuses a store may hold
    pub fn is_persistable(&self) -> bool {
        !matches!(self, Status::NotQueried)
    }

    pub fn is_locked(&self) -> bool {
        matches!(self, Status::Locked)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Status::Completed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
