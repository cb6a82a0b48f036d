//! # Lumen Common Library
//!
//! Shared code for the Lumen learning application crates including:
//! - Status model (entity kinds, status values, attempt sentinels)
//! - Database initialization and schema
//! - Progression event types (ProgressEvent enum) and EventBus
//! - Configuration loading
//! - Time helpers

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod status;
pub mod time;

pub use error::{Error, Result};
pub use status::{EntityKind, Status, NEVER_STARTED};
