//! In-memory status store
//!
//! Holds rows in a `HashMap` behind a tokio `RwLock`. Besides plain storage
//! it can inject write failures after a number of successful writes and slow
//! every write down, which lets tests reproduce store outages and widen the
//! cascade window.

use super::StatusStore;
use crate::error::{Error, Result};
use async_trait::async_trait;
use lumen_common::db::StatusRecord;
use lumen_common::EntityKind;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct MemoryState {
    rows: HashMap<(EntityKind, i64), StatusRecord>,
    seeded_course_count: i64,
}

/// Status store kept entirely in process memory
#[derive(Debug)]
pub struct MemoryStatusStore {
    state: RwLock<MemoryState>,
    writes: AtomicUsize,
    /// Writes allowed before injected failures start (`usize::MAX` = never)
    fail_after_writes: AtomicUsize,
    write_delay: Option<Duration>,
}

impl MemoryStatusStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MemoryState::default()),
            writes: AtomicUsize::new(0),
            fail_after_writes: AtomicUsize::new(usize::MAX),
            write_delay: None,
        }
    }

    /// Sleep for `delay` before applying each write
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    /// Let `allowed` more writes succeed, then fail every write with an I/O error
    pub fn fail_writes_after(&self, allowed: usize) {
        let already = self.writes.load(Ordering::SeqCst);
        self.fail_after_writes
            .store(already.saturating_add(allowed), Ordering::SeqCst);
    }

    /// Stop injecting failures
    pub fn clear_faults(&self) {
        self.fail_after_writes.store(usize::MAX, Ordering::SeqCst);
    }

    /// Write attempts so far, failed ones included
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Number of stored rows across all kinds
    pub async fn row_count(&self) -> usize {
        self.state.read().await.rows.len()
    }

    async fn begin_write(&self) -> Result<()> {
        let attempt = self.writes.fetch_add(1, Ordering::SeqCst);
        if attempt >= self.fail_after_writes.load(Ordering::SeqCst) {
            return Err(Error::Io(std::io::Error::other(format!(
                "injected store failure on write #{}",
                attempt + 1
            ))));
        }
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }
}

impl Default for MemoryStatusStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatusStore for MemoryStatusStore {
    async fn get(&self, kind: EntityKind, id: i64) -> Result<Option<StatusRecord>> {
        Ok(self.state.read().await.rows.get(&(kind, id)).copied())
    }

    async fn put(&self, kind: EntityKind, record: StatusRecord) -> Result<()> {
        self.begin_write().await?;
        let mut state = self.state.write().await;
        if state.rows.contains_key(&(kind, record.id)) {
            return Err(Error::Integrity(format!(
                "{} {} already has a status row",
                kind, record.id
            )));
        }
        state.rows.insert((kind, record.id), record);
        Ok(())
    }

    async fn update(&self, kind: EntityKind, record: StatusRecord) -> Result<()> {
        self.begin_write().await?;
        let mut state = self.state.write().await;
        match state.rows.get_mut(&(kind, record.id)) {
            Some(existing) => {
                *existing = record;
                Ok(())
            }
            None => Err(Error::NotFound {
                kind,
                id: record.id,
            }),
        }
    }

    async fn list_all(&self, kind: EntityKind) -> Result<Vec<StatusRecord>> {
        let state = self.state.read().await;
        let mut records: Vec<StatusRecord> = state
            .rows
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|(_, record)| *record)
            .collect();
        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    async fn delete_all(&self, kind: EntityKind) -> Result<()> {
        self.begin_write().await?;
        self.state.write().await.rows.retain(|(k, _), _| *k != kind);
        Ok(())
    }

    async fn seeded_course_count(&self) -> Result<i64> {
        Ok(self.state.read().await.seeded_course_count)
    }

    async fn set_seeded_course_count(&self, count: i64) -> Result<()> {
        self.begin_write().await?;
        self.state.write().await.seeded_course_count = count;
        Ok(())
    }

    async fn put_seeded_course(
        &self,
        record: StatusRecord,
        seeded_course_count: i64,
    ) -> Result<()> {
        self.begin_write().await?;
        let mut state = self.state.write().await;
        if state.rows.contains_key(&(EntityKind::Course, record.id)) {
            return Err(Error::Integrity(format!(
                "course {} already has a status row",
                record.id
            )));
        }
        state.rows.insert((EntityKind::Course, record.id), record);
        state.seeded_course_count = seeded_course_count;
        Ok(())
    }

    async fn reset_all(&self) -> Result<()> {
        self.begin_write().await?;
        let mut state = self.state.write().await;
        state.rows.clear();
        state.seeded_course_count = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_common::Status;

    #[tokio::test]
    async fn test_put_then_update() {
        let store = MemoryStatusStore::new();
        store
            .put(EntityKind::Task, StatusRecord::new(1000, Status::Unlocked))
            .await
            .unwrap();
        store
            .update(EntityKind::Task, StatusRecord::new(1000, Status::Completed))
            .await
            .unwrap();

        let task = store.get(EntityKind::Task, 1000).await.unwrap().unwrap();
        assert_eq!(task.status, Status::Completed);
    }

    #[tokio::test]
    async fn test_duplicate_put_and_missing_update() {
        let store = MemoryStatusStore::new();
        let record = StatusRecord::new(1, Status::Unlocked);

        store.put(EntityKind::Course, record).await.unwrap();
        assert!(matches!(
            store.put(EntityKind::Course, record).await,
            Err(Error::Integrity(_))
        ));
        assert!(matches!(
            store.update(EntityKind::Exam, record).await,
            Err(Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_injected_failure_after_n_writes() {
        let store = MemoryStatusStore::new();
        store.fail_writes_after(1);

        store
            .put(EntityKind::Chapter, StatusRecord::new(10, Status::Unlocked))
            .await
            .unwrap();
        let err = store
            .put(EntityKind::Chapter, StatusRecord::new(11, Status::Unlocked))
            .await
            .unwrap_err();
        assert!(err.is_store_io());
        assert_eq!(store.row_count().await, 1);

        store.clear_faults();
        store
            .put(EntityKind::Chapter, StatusRecord::new(11, Status::Unlocked))
            .await
            .unwrap();
        assert_eq!(store.write_count(), 3);
    }

    #[tokio::test]
    async fn test_failed_seeded_course_put_writes_nothing() {
        let store = MemoryStatusStore::new();
        store.fail_writes_after(0);

        assert!(store
            .put_seeded_course(StatusRecord::new(1, Status::Unlocked), 1)
            .await
            .is_err());
        assert_eq!(store.row_count().await, 0);
        assert_eq!(store.seeded_course_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reset_all_clears_rows_and_counter() {
        let store = MemoryStatusStore::new();
        store
            .put_seeded_course(StatusRecord::new(1, Status::Unlocked), 1)
            .await
            .unwrap();
        store
            .put(EntityKind::Chapter, StatusRecord::new(10, Status::Completed))
            .await
            .unwrap();

        store.reset_all().await.unwrap();
        assert_eq!(store.row_count().await, 0);
        assert_eq!(store.seeded_course_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_all_sorted_and_filtered() {
        let store = MemoryStatusStore::new();
        for id in [3, 1, 2] {
            store
                .put(EntityKind::Exam, StatusRecord::new(id, Status::Locked))
                .await
                .unwrap();
        }
        store
            .put(EntityKind::Course, StatusRecord::new(9, Status::Locked))
            .await
            .unwrap();

        let ids: Vec<i64> = store
            .list_all(EntityKind::Exam)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);

        store.delete_all(EntityKind::Exam).await.unwrap();
        assert_eq!(store.row_count().await, 1);
    }
}
