//! # Lumen Progression Engine Library (lumen-pe)
//!
//! Curriculum progression for self-paced courses.
//!
//! **Purpose:** Decide per learner which courses, chapters, tasks and exams
//! are Locked, Unlocked or Completed; cascade chapter completion into exam
//! unlocking and exam passes into course completion; rate-limit exam retries.
//!
//! **Architecture:** [`ProgressionEngine`] over a [`StatusStore`] seam
//! (SQLite via sqlx, or in memory), driven by an immutable [`Catalog`].

pub mod barrier;
pub mod bootstrap;
pub mod catalog;
pub mod clock;
pub mod cooldown;
pub mod db;
pub mod engine;
pub mod error;
pub mod notify;
pub mod rules;
pub mod store;

pub use bootstrap::{BootstrapReport, BootstrapValidator};
pub use catalog::{Catalog, NextChapter};
pub use engine::{CascadeOutcome, EngineOptions, ExamOutcome, ProgressionEngine};
pub use error::{Error, Result};
pub use store::{CheckedStore, MemoryStatusStore, SqliteStatusStore, StatusStore};
