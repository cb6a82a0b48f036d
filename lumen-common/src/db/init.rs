//! Database initialization
//!
//! Opens (or creates) the SQLite database, creates the progression schema and
//! seeds runtime settings with their defaults. Every step is idempotent, so
//! calling [`init_database`] on an existing database is safe.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::{info, warn};

/// Settings key holding the persisted seeded-course counter
pub const SEEDED_COURSE_COUNT_KEY: &str = "seeded_course_count";

/// Settings key holding the exam difficulty (drives the pass threshold)
pub const EXAM_DIFFICULTY_KEY: &str = "exam_difficulty";

/// Settings key holding the developer debug override
pub const DEBUG_OVERRIDE_KEY: &str = "debug_override";

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .min_connections(1)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Open a private in-memory database with the full schema
///
/// Uses a single connection: every pooled `sqlite::memory:` connection would
/// otherwise see its own empty database.
pub async fn init_memory_database() -> Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables, run migrations and seed default settings
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_settings_table(pool).await?;
    create_progress_status_table(pool).await?;

    crate::db::migrations::run_migrations(pool).await?;

    init_default_settings(pool).await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the settings table
///
/// Stores runtime configuration and the seeded-course counter as key-value pairs.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the progress_status table
///
/// One row per (kind, entity_id). `not_queried` is deliberately absent from
/// the status CHECK: it is never a stored value.
pub async fn create_progress_status_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS progress_status (
            kind TEXT NOT NULL CHECK (kind IN ('course', 'chapter', 'task', 'exam')),
            entity_id INTEGER NOT NULL,
            status TEXT NOT NULL CHECK (status IN ('locked', 'unlocked', 'completed')),
            last_started_at INTEGER NOT NULL DEFAULT -1,
            top_score INTEGER NOT NULL DEFAULT -1,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (kind, entity_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Initialize or repair default settings
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    ensure_setting(pool, SEEDED_COURSE_COUNT_KEY, "0").await?;
    ensure_setting(pool, EXAM_DIFFICULTY_KEY, "normal").await?;
    ensure_setting(pool, DEBUG_OVERRIDE_KEY, "false").await?;

    info!("Default settings initialized");
    Ok(())
}

/// Ensure a setting exists with the specified default value
///
/// If the setting doesn't exist, it will be created with the default.
/// If the setting exists but has a NULL value, it will be reset to the default.
async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    let value: Option<Option<String>> =
        sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
            .bind(key)
            .fetch_optional(pool)
            .await?;

    match value {
        None => {
            // INSERT OR IGNORE: concurrent initializers may both pass the check
            sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
                .bind(key)
                .bind(default_value)
                .execute(pool)
                .await?;

            info!("Initialized setting '{}' with default value: {}", key, default_value);
        }
        Some(None) => {
            sqlx::query("UPDATE settings SET value = ? WHERE key = ?")
                .bind(default_value)
                .bind(key)
                .execute(pool)
                .await?;

            warn!("Setting '{}' was NULL, reset to default: {}", key, default_value);
        }
        Some(Some(_)) => {}
    }

    Ok(())
}
