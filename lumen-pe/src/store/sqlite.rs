//! SQLite-backed status store

use super::StatusStore;
use crate::db::settings;
use crate::error::{Error, Result};
use async_trait::async_trait;
use lumen_common::db::StatusRecord;
use lumen_common::{EntityKind, Status};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

/// Status store over the `progress_status` table
#[derive(Debug, Clone)]
pub struct SqliteStatusStore {
    pool: SqlitePool,
}

impl SqliteStatusStore {
    /// Wrap a pool whose schema was created by `lumen_common::db::init_database`
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

type StatusRow = (i64, String, i64, i64);

/// Insert one row, mapping a primary-key clash to `Integrity`
async fn insert_record<'e, E>(db: E, kind: EntityKind, record: StatusRecord) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO progress_status (kind, entity_id, status, last_started_at, top_score)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(kind.as_str())
    .bind(record.id)
    .bind(record.status.as_str())
    .bind(record.last_started_at)
    .bind(record.top_score)
    .execute(db)
    .await;

    match result {
        Ok(_) => {
            debug!("Inserted {} {} as {}", kind, record.id, record.status);
            Ok(())
        }
        Err(e)
            if e.as_database_error()
                .is_some_and(|db_err| db_err.is_unique_violation()) =>
        {
            Err(Error::Integrity(format!(
                "{} {} already has a status row",
                kind, record.id
            )))
        }
        Err(e) => Err(e.into()),
    }
}

fn row_to_record(kind: EntityKind, row: StatusRow) -> Result<StatusRecord> {
    let (id, status, last_started_at, top_score) = row;
    let status = Status::parse(&status).ok_or_else(|| {
        Error::Integrity(format!(
            "{} {} has unreadable status '{}'",
            kind, id, status
        ))
    })?;

    Ok(StatusRecord {
        id,
        status,
        last_started_at,
        top_score,
    })
}

#[async_trait]
impl StatusStore for SqliteStatusStore {
    async fn get(&self, kind: EntityKind, id: i64) -> Result<Option<StatusRecord>> {
        let row: Option<StatusRow> = sqlx::query_as(
            r#"
            SELECT entity_id, status, last_started_at, top_score
            FROM progress_status
            WHERE kind = ? AND entity_id = ?
            "#,
        )
        .bind(kind.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| row_to_record(kind, row)).transpose()
    }

    async fn put(&self, kind: EntityKind, record: StatusRecord) -> Result<()> {
        insert_record(&self.pool, kind, record).await
    }

    async fn update(&self, kind: EntityKind, record: StatusRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE progress_status
            SET status = ?, last_started_at = ?, top_score = ?, updated_at = CURRENT_TIMESTAMP
            WHERE kind = ? AND entity_id = ?
            "#,
        )
        .bind(record.status.as_str())
        .bind(record.last_started_at)
        .bind(record.top_score)
        .bind(kind.as_str())
        .bind(record.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::NotFound {
                kind,
                id: record.id,
            });
        }

        debug!("Updated {} {} to {}", kind, record.id, record.status);
        Ok(())
    }

    async fn list_all(&self, kind: EntityKind) -> Result<Vec<StatusRecord>> {
        let rows: Vec<StatusRow> = sqlx::query_as(
            r#"
            SELECT entity_id, status, last_started_at, top_score
            FROM progress_status
            WHERE kind = ?
            ORDER BY entity_id
            "#,
        )
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| row_to_record(kind, row))
            .collect()
    }

    async fn delete_all(&self, kind: EntityKind) -> Result<()> {
        let result = sqlx::query("DELETE FROM progress_status WHERE kind = ?")
            .bind(kind.as_str())
            .execute(&self.pool)
            .await?;

        debug!("Deleted {} {} rows", result.rows_affected(), kind);
        Ok(())
    }

    async fn seeded_course_count(&self) -> Result<i64> {
        settings::load_seeded_course_count(&self.pool).await
    }

    async fn set_seeded_course_count(&self, count: i64) -> Result<()> {
        settings::save_seeded_course_count(&self.pool, count).await
    }

    async fn put_seeded_course(
        &self,
        record: StatusRecord,
        seeded_course_count: i64,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        insert_record(&mut *tx, EntityKind::Course, record).await?;
        settings::save_seeded_course_count(&mut *tx, seeded_course_count).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn reset_all(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query("DELETE FROM progress_status")
            .execute(&mut *tx)
            .await?;
        settings::save_seeded_course_count(&mut *tx, 0).await?;
        tx.commit().await?;

        debug!("Reset progress: deleted {} rows", result.rows_affected());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_common::db::init_memory_database;

    async fn store() -> SqliteStatusStore {
        SqliteStatusStore::new(init_memory_database().await.unwrap())
    }

    #[tokio::test]
    async fn test_put_get_update() {
        let store = store().await;

        store
            .put(EntityKind::Exam, StatusRecord::new(100, Status::Locked))
            .await
            .unwrap();

        let mut exam = store.get(EntityKind::Exam, 100).await.unwrap().unwrap();
        assert_eq!(exam.status, Status::Locked);
        assert!(!exam.has_started());

        exam.status = Status::Unlocked;
        exam.last_started_at = 1_700_000_000;
        exam.top_score = 3;
        store.update(EntityKind::Exam, exam).await.unwrap();

        let reread = store.get(EntityKind::Exam, 100).await.unwrap().unwrap();
        assert_eq!(reread, exam);
    }

    #[tokio::test]
    async fn test_kinds_are_separate_namespaces() {
        let store = store().await;

        store
            .put(EntityKind::Course, StatusRecord::new(1, Status::Unlocked))
            .await
            .unwrap();
        store
            .put(EntityKind::Chapter, StatusRecord::new(1, Status::Completed))
            .await
            .unwrap();

        assert_eq!(
            store.get(EntityKind::Course, 1).await.unwrap().unwrap().status,
            Status::Unlocked
        );
        assert_eq!(
            store.get(EntityKind::Chapter, 1).await.unwrap().unwrap().status,
            Status::Completed
        );
        assert!(store.get(EntityKind::Task, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_put_is_integrity_error() {
        let store = store().await;
        let record = StatusRecord::new(10, Status::Unlocked);

        store.put(EntityKind::Chapter, record).await.unwrap();
        let err = store.put(EntityKind::Chapter, record).await.unwrap_err();
        assert!(matches!(err, Error::Integrity(_)));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = store().await;
        let err = store
            .update(EntityKind::Task, StatusRecord::new(7, Status::Completed))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { id: 7, .. }));
    }

    #[tokio::test]
    async fn test_list_and_delete_all() {
        let store = store().await;
        for id in [12, 10, 11] {
            store
                .put(EntityKind::Chapter, StatusRecord::new(id, Status::Unlocked))
                .await
                .unwrap();
        }
        store
            .put(EntityKind::Course, StatusRecord::new(1, Status::Unlocked))
            .await
            .unwrap();

        let ids: Vec<i64> = store
            .list_all(EntityKind::Chapter)
            .await
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![10, 11, 12]);

        store.delete_all(EntityKind::Chapter).await.unwrap();
        assert!(store.list_all(EntityKind::Chapter).await.unwrap().is_empty());
        assert_eq!(store.list_all(EntityKind::Course).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_status_is_integrity_error() {
        let store = store().await;

        // Bypass the CHECK constraint the way a foreign writer might
        sqlx::query("PRAGMA ignore_check_constraints = ON")
            .execute(store.pool())
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO progress_status (kind, entity_id, status) VALUES ('task', 5, 'bogus')",
        )
        .execute(store.pool())
        .await
        .unwrap();

        let err = store.get(EntityKind::Task, 5).await.unwrap_err();
        assert!(matches!(err, Error::Integrity(_)));
    }

    #[tokio::test]
    async fn test_rejected_seeded_course_leaves_counter() {
        let store = store().await;
        store
            .put_seeded_course(StatusRecord::new(1, Status::Unlocked), 1)
            .await
            .unwrap();

        // Duplicate row rolls the counter write back with it
        let err = store
            .put_seeded_course(StatusRecord::new(1, Status::Locked), 2)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Integrity(_)));
        assert_eq!(store.seeded_course_count().await.unwrap(), 1);
        assert_eq!(
            store.get(EntityKind::Course, 1).await.unwrap().unwrap().status,
            Status::Unlocked
        );
    }

    #[tokio::test]
    async fn test_reset_all_clears_rows_and_counter() {
        let store = store().await;
        store
            .put_seeded_course(StatusRecord::new(1, Status::Unlocked), 1)
            .await
            .unwrap();
        store
            .put(EntityKind::Exam, StatusRecord::new(100, Status::Completed))
            .await
            .unwrap();

        store.reset_all().await.unwrap();
        for kind in EntityKind::ALL {
            assert!(store.list_all(kind).await.unwrap().is_empty());
        }
        assert_eq!(store.seeded_course_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_seeded_course_count_persists() {
        let store = store().await;
        assert_eq!(store.seeded_course_count().await.unwrap(), 0);
        store.set_seeded_course_count(3).await.unwrap();
        assert_eq!(store.seeded_course_count().await.unwrap(), 3);
    }
}
