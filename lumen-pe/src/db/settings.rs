//! Settings database access
//!
//! Read/write runtime settings from the settings table (key-value store):
//! exam difficulty, the developer debug override and the persisted
//! seeded-course counter.

use crate::error::{Error, Result};
use crate::rules::Difficulty;
use lumen_common::db::{DEBUG_OVERRIDE_KEY, EXAM_DIFFICULTY_KEY, SEEDED_COURSE_COUNT_KEY};
use sqlx::{Executor, Pool, Sqlite};
use std::str::FromStr;

/// Get exam difficulty (default: normal)
pub async fn get_difficulty(db: &Pool<Sqlite>) -> Result<Difficulty> {
    match get_setting::<String>(db, EXAM_DIFFICULTY_KEY).await? {
        Some(value) => value.parse(),
        None => Ok(Difficulty::default()),
    }
}

pub async fn set_difficulty(db: &Pool<Sqlite>, difficulty: Difficulty) -> Result<()> {
    set_setting(db, EXAM_DIFFICULTY_KEY, difficulty.as_str()).await
}

/// Pass threshold derived from the configured difficulty
pub async fn get_pass_threshold_percent(db: &Pool<Sqlite>) -> Result<u32> {
    Ok(get_difficulty(db).await?.pass_threshold_percent())
}

/// Get developer debug override (default: false)
pub async fn get_debug_override(db: &Pool<Sqlite>) -> Result<bool> {
    Ok(get_setting::<bool>(db, DEBUG_OVERRIDE_KEY)
        .await?
        .unwrap_or(false))
}

pub async fn set_debug_override(db: &Pool<Sqlite>, enabled: bool) -> Result<()> {
    set_setting(db, DEBUG_OVERRIDE_KEY, enabled).await
}

/// Number of courses that have received a bootstrap default
pub async fn load_seeded_course_count(db: &Pool<Sqlite>) -> Result<i64> {
    Ok(get_setting::<i64>(db, SEEDED_COURSE_COUNT_KEY)
        .await?
        .unwrap_or(0))
}

/// Persist the seeded-course counter
///
/// Accepts any executor so the store can write it inside a transaction.
pub async fn save_seeded_course_count<'e, E>(db: E, count: i64) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    set_setting(db, SEEDED_COURSE_COUNT_KEY, count).await
}

/// Generic setting getter
///
/// Returns None if the key doesn't exist or holds NULL.
/// Parses value from string using FromStr trait.
pub async fn get_setting<T: FromStr>(db: &Pool<Sqlite>, key: &str) -> Result<Option<T>> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(db)
            .await?;

    match value.flatten() {
        Some(s) => match s.parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => Err(Error::Config(format!(
                "Failed to parse setting '{}' value: {}",
                key, s
            ))),
        },
        None => Ok(None),
    }
}

/// Generic setting setter
///
/// Inserts or updates setting in database.
pub async fn set_setting<'e, E, T>(db: E, key: &str, value: T) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
    T: ToString,
{
    let value_str = value.to_string();

    sqlx::query(
        r#"
        INSERT INTO settings (key, value)
        VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key.to_string())
    .bind(value_str)
    .execute(db)
    .await?;

    Ok(())
}
