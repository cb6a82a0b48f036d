//! Exam retry cooldown
//!
//! After an attempt starts, the exam cannot be retried until
//! [`COOLDOWN_SECONDS`] have elapsed since `last_started_at`. The boundary is
//! inclusive in the learner's favour: exactly one full day elapsed means the
//! exam is available again.

use lumen_common::db::StatusRecord;
use lumen_common::Status;

/// Wait between exam attempts (24 hours)
pub const COOLDOWN_SECONDS: i64 = 86_400;

/// True while a retry of this exam is rate limited
pub fn is_on_cooldown(exam: &StatusRecord, now: i64, debug_override: bool) -> bool {
    if debug_override {
        return false;
    }
    if exam.status == Status::Completed {
        return false;
    }
    if !exam.has_started() {
        return false;
    }
    now - exam.last_started_at < COOLDOWN_SECONDS
}

/// Whole seconds until the cooldown expires
///
/// Only meaningful while [`is_on_cooldown`] is true; clamped to zero otherwise.
pub fn seconds_remaining(exam: &StatusRecord, now: i64) -> i64 {
    if !exam.has_started() {
        return 0;
    }
    (COOLDOWN_SECONDS - (now - exam.last_started_at)).max(0)
}

/// Epoch second at which the cooldown of the latest attempt expires
pub fn expiry_at(exam: &StatusRecord) -> Option<i64> {
    exam.has_started()
        .then_some(exam.last_started_at + COOLDOWN_SECONDS)
}
