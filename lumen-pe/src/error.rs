//! Error types for lumen-pe
//!
//! Store failures (`Database`, `Io`) are propagated unchanged and never
//! retried by the engine. `NotFound` and `Integrity` signal a catalog/store
//! desync and are fatal to the triggering operation.

use lumen_common::EntityKind;
use thiserror::Error;

/// Main error type for the progression engine
#[derive(Error, Debug)]
pub enum Error {
    /// Backing store query failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// File or store I/O failed
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Content catalog is malformed
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// A status row expected to exist after bootstrap is missing
    #[error("No status row for {kind} {id}")]
    NotFound { kind: EntityKind, id: i64 },

    /// A relationship between catalog and store could not be resolved
    #[error("Integrity error: {0}")]
    Integrity(String),

    /// Bootstrap validation aborted; the store may be partially seeded
    #[error("Bootstrap failed: {0}")]
    Bootstrap(#[source] Box<Error>),

    /// Exam is still locked behind its course's chapters
    #[error("Exam {0} is locked")]
    ExamLocked(i64),

    /// Exam retry is rate limited
    #[error("Exam {exam_id} is on cooldown for another {seconds_remaining}s")]
    ExamOnCooldown { exam_id: i64, seconds_remaining: i64 },

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Invalid request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Other errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for transient failures of the backing store
    ///
    /// Callers own the retry policy for these; the engine never retries.
    pub fn is_store_io(&self) -> bool {
        matches!(self, Error::Database(_) | Error::Io(_))
    }

    /// True for catalog/store desync errors
    pub fn is_integrity(&self) -> bool {
        matches!(self, Error::NotFound { .. } | Error::Integrity(_))
    }
}

impl From<lumen_common::Error> for Error {
    fn from(err: lumen_common::Error) -> Self {
        match err {
            lumen_common::Error::Database(e) => Error::Database(e),
            lumen_common::Error::Io(e) => Error::Io(e),
            lumen_common::Error::Config(msg) => Error::Config(msg),
            lumen_common::Error::NotFound(msg) => Error::Integrity(msg),
            lumen_common::Error::InvalidInput(msg) => Error::InvalidInput(msg),
            lumen_common::Error::Internal(msg) => Error::Internal(msg),
        }
    }
}

/// Convenience Result type using lumen-pe Error
pub type Result<T> = std::result::Result<T, Error>;
