//! Database initialization
//!
//! Opens (or creates) the SQLite database and makes sure the camp, speaker
//! and talk tables exist. Safe to run on every startup.

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;

/// Current schema version recorded in `schema_version`
pub const SCHEMA_VERSION: i64 = 1;

/// Open the database at `db_path`, creating the file and tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Foreign keys must be on for every pooled connection, not just the first,
    // so they are set through the connect options rather than a PRAGMA query.
    let options = SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    init_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables (idempotent)
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_camps_table(pool).await?;
    create_speakers_table(pool).await?;
    create_talks_table(pool).await?;

    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(SCHEMA_VERSION)
        .execute(pool)
        .await?;

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

/// Camps with their embedded location columns
///
/// Monikers compare case-insensitively, so `atl2018` collides with `ATL2018`.
async fn create_camps_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS camps (
            camp_id INTEGER PRIMARY KEY AUTOINCREMENT,
            moniker TEXT NOT NULL UNIQUE COLLATE NOCASE,
            name TEXT NOT NULL,
            event_date TEXT NOT NULL,
            length INTEGER NOT NULL DEFAULT 1,
            venue_name TEXT,
            address1 TEXT,
            address2 TEXT,
            address3 TEXT,
            city_town TEXT,
            state_province TEXT,
            postal_code TEXT,
            country TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_camps_event_date ON camps(event_date)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_speakers_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS speakers (
            speaker_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            bio TEXT,
            web_site TEXT,
            company TEXT,
            company_url TEXT,
            job_title TEXT,
            twitter TEXT,
            git_hub TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Talks belong to exactly one camp (cascade on camp delete) and one speaker
async fn create_talks_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS talks (
            talk_id INTEGER PRIMARY KEY AUTOINCREMENT,
            camp_id INTEGER NOT NULL REFERENCES camps(camp_id) ON DELETE CASCADE,
            speaker_id INTEGER NOT NULL REFERENCES speakers(speaker_id),
            title TEXT NOT NULL,
            abstract TEXT NOT NULL,
            level INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_talks_camp_id ON talks(camp_id)")
        .execute(pool)
        .await?;

    Ok(())
}
