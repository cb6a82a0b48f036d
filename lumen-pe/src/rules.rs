//! Status rules
//!
//! Pure functions: default statuses for newly seeded entities, the
//! chapter-completion cascade condition and exam scoring.

use crate::error::{Error, Result};
use lumen_common::db::StatusRecord;
use lumen_common::{Status, NEVER_STARTED};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default status for a course being seeded
///
/// Only the first course seeded into an empty store is unlocked; the caller
/// decides "first" from the persisted seeded-course counter.
pub fn default_course_status(is_first_seeded: bool) -> Status {
    if is_first_seeded {
        Status::Unlocked
    } else {
        Status::Locked
    }
}

/// Chapters start unlocked; gating happens at the course level.
pub fn default_chapter_status() -> Status {
    Status::Unlocked
}

/// Tasks start unlocked; gating happens at the course level.
pub fn default_task_status() -> Status {
    Status::Unlocked
}

/// Exams start locked with no attempt on record.
pub fn default_exam_record(exam_id: i64) -> StatusRecord {
    StatusRecord::new(exam_id, Status::Locked)
}

/// True iff every id in `chapter_ids` maps to `Completed`
///
/// Stops at the first chapter that is not completed (including ids the
/// lookup does not know). An empty list is trivially complete.
pub fn all_chapters_completed<F>(chapter_ids: &[i64], status_lookup: F) -> bool
where
    F: Fn(i64) -> Option<Status>,
{
    chapter_ids
        .iter()
        .all(|&id| status_lookup(id) == Some(Status::Completed))
}

/// Exam score as a whole percentage, rounded half up
pub fn exam_percentage(correct_count: u32, total_count: u32) -> Result<u32> {
    if total_count == 0 {
        return Err(Error::InvalidInput("exam has no questions".to_string()));
    }
    if correct_count > total_count {
        return Err(Error::InvalidInput(format!(
            "correct count {} exceeds question count {}",
            correct_count, total_count
        )));
    }

    // Integer form of round(100 * correct / total)
    let correct = u64::from(correct_count);
    let total = u64::from(total_count);
    Ok(((200 * correct + total) / (2 * total)) as u32)
}

/// New top score if `correct_count` beats the stored one
pub fn improved_top_score(stored_top_score: i64, correct_count: u32) -> Option<i64> {
    let candidate = i64::from(correct_count);
    if stored_top_score == NEVER_STARTED || candidate > stored_top_score {
        Some(candidate)
    } else {
        None
    }
}

/// Exam difficulty chosen in settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    /// Minimum percentage that passes an exam
    pub fn pass_threshold_percent(&self) -> u32 {
        match self {
            Difficulty::Easy => 50,
            Difficulty::Normal => 60,
            Difficulty::Hard => 80,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            other => Err(Error::InvalidInput(format!("unknown difficulty '{}'", other))),
        }
    }
}
