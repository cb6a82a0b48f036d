//! Status persistence
//!
//! [`StatusStore`] is the seam between the engine and whatever durably holds
//! progress rows. Two backends ship with the crate: [`SqliteStatusStore`] for
//! real databases and [`MemoryStatusStore`] for tests and simulations.
//!
//! Backends report absence as `Ok(None)`. The engine never talks to a backend
//! directly; it goes through [`CheckedStore`], which turns a missing row into
//! [`Error::NotFound`] and refuses to persist `NotQueried`.

mod memory;
mod sqlite;

pub use memory::MemoryStatusStore;
pub use sqlite::SqliteStatusStore;

use crate::error::{Error, Result};
use async_trait::async_trait;
use lumen_common::db::StatusRecord;
use lumen_common::{EntityKind, Status};
use std::sync::Arc;

/// Durable per-entity status storage
///
/// Each call is individually atomic: a concurrent `get` observes a record
/// either before or after an `update`, never in between.
#[async_trait]
pub trait StatusStore: Send + Sync {
    /// Stored record, or `None` when the entity has never been seeded
    async fn get(&self, kind: EntityKind, id: i64) -> Result<Option<StatusRecord>>;

    /// Insert a new record; fails with `Integrity` if the id already exists
    async fn put(&self, kind: EntityKind, record: StatusRecord) -> Result<()>;

    /// Replace an existing record; fails with `NotFound` if the id is absent
    async fn update(&self, kind: EntityKind, record: StatusRecord) -> Result<()>;

    /// All records of one kind, ascending by id
    async fn list_all(&self, kind: EntityKind) -> Result<Vec<StatusRecord>>;

    async fn delete_all(&self, kind: EntityKind) -> Result<()>;

    /// Number of courses that have received a bootstrap default so far
    async fn seeded_course_count(&self) -> Result<i64>;

    async fn set_seeded_course_count(&self, count: i64) -> Result<()>;

    /// Insert a new course record and store the seeded-course counter in
    /// one atomic write: either both land or neither does
    async fn put_seeded_course(&self, record: StatusRecord, seeded_course_count: i64)
        -> Result<()>;

    /// Delete every record of every kind and zero the seeded-course counter
    /// in one atomic write
    async fn reset_all(&self) -> Result<()>;
}

/// Store wrapper enforcing the status invariants at the boundary
#[derive(Clone)]
pub struct CheckedStore {
    inner: Arc<dyn StatusStore>,
}

impl CheckedStore {
    pub fn new(inner: Arc<dyn StatusStore>) -> Self {
        Self { inner }
    }

    /// Underlying backend
    pub fn inner(&self) -> &Arc<dyn StatusStore> {
        &self.inner
    }

    pub async fn get(&self, kind: EntityKind, id: i64) -> Result<Option<StatusRecord>> {
        self.inner.get(kind, id).await
    }

    /// Stored record; a missing row is an integrity failure
    pub async fn require(&self, kind: EntityKind, id: i64) -> Result<StatusRecord> {
        self.inner
            .get(kind, id)
            .await?
            .ok_or(Error::NotFound { kind, id })
    }

    /// Status of a stored record
    pub async fn status(&self, kind: EntityKind, id: i64) -> Result<Status> {
        Ok(self.require(kind, id).await?.status)
    }

    pub async fn put(&self, kind: EntityKind, record: StatusRecord) -> Result<()> {
        ensure_persistable(kind, &record)?;
        self.inner.put(kind, record).await
    }

    pub async fn update(&self, kind: EntityKind, record: StatusRecord) -> Result<()> {
        ensure_persistable(kind, &record)?;
        self.inner.update(kind, record).await
    }

    pub async fn list_all(&self, kind: EntityKind) -> Result<Vec<StatusRecord>> {
        self.inner.list_all(kind).await
    }

    pub async fn delete_all(&self, kind: EntityKind) -> Result<()> {
        self.inner.delete_all(kind).await
    }

    pub async fn seeded_course_count(&self) -> Result<i64> {
        self.inner.seeded_course_count().await
    }

    pub async fn set_seeded_course_count(&self, count: i64) -> Result<()> {
        if count < 0 {
            return Err(Error::InvalidInput(format!(
                "seeded course count cannot be negative ({})",
                count
            )));
        }
        self.inner.set_seeded_course_count(count).await
    }

    pub async fn put_seeded_course(
        &self,
        record: StatusRecord,
        seeded_course_count: i64,
    ) -> Result<()> {
        ensure_persistable(EntityKind::Course, &record)?;
        if seeded_course_count < 1 {
            return Err(Error::InvalidInput(format!(
                "seeded course count must count course {} ({})",
                record.id, seeded_course_count
            )));
        }
        self.inner
            .put_seeded_course(record, seeded_course_count)
            .await
    }

    pub async fn reset_all(&self) -> Result<()> {
        self.inner.reset_all().await
    }
}

fn ensure_persistable(kind: EntityKind, record: &StatusRecord) -> Result<()> {
    if record.status.is_persistable() {
        Ok(())
    } else {
        Err(Error::InvalidState(format!(
            "refusing to store {} for {} {}",
            record.status, kind, record.id
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checked() -> CheckedStore {
        CheckedStore::new(Arc::new(MemoryStatusStore::new()))
    }

    #[tokio::test]
    async fn test_require_missing_is_not_found() {
        let store = checked();
        let err = store.require(EntityKind::Chapter, 10).await.unwrap_err();
        assert!(matches!(
            err,
            Error::NotFound {
                kind: EntityKind::Chapter,
                id: 10
            }
        ));
    }

    #[tokio::test]
    async fn test_not_queried_never_written() {
        let store = checked();
        let record = StatusRecord::new(1, Status::NotQueried);

        let err = store.put(EntityKind::Course, record).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        assert!(store.get(EntityKind::Course, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_seeded_course_put_writes_row_and_counter() {
        let store = checked();
        store
            .put_seeded_course(StatusRecord::new(1, Status::Unlocked), 1)
            .await
            .unwrap();

        assert_eq!(store.status(EntityKind::Course, 1).await.unwrap(), Status::Unlocked);
        assert_eq!(store.seeded_course_count().await.unwrap(), 1);
        assert!(store
            .put_seeded_course(StatusRecord::new(2, Status::Locked), 0)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_negative_seeded_count_rejected() {
        let store = checked();
        assert!(store.set_seeded_course_count(-1).await.is_err());
        assert_eq!(store.seeded_course_count().await.unwrap(), 0);
    }
}
