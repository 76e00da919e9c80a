//! SQLite backing for the persistent store
//!
//! The diary keeps everything in one key-value table. This module opens the
//! database file, brings its schema up to date and hands out the pool the
//! [`Repository`] runs on.

pub mod models;
pub mod repository;
pub mod schema;

pub use models::*;
pub use repository::Repository;
pub use schema::initialize_database;

use crate::error::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;

/// Connections the application pool may open
const POOL_SIZE: u32 = 5;

fn connect_options(db_path: &Path) -> SqliteConnectOptions {
    SqliteConnectOptions::new()
        .filename(db_path)
        .create_if_missing(true)
        .busy_timeout(Duration::from_secs(5))
        .journal_mode(SqliteJournalMode::Wal)
}

/// Open (creating if needed) the store database at `db_path`.
///
/// The schema is migrated over a single throwaway connection first; the
/// returned pool only opens connections once the schema is final.
pub async fn create_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let migration_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(connect_options(db_path))
        .await?;
    let applied = initialize_database(&migration_pool).await?;
    migration_pool.close().await;

    let pool = SqlitePoolOptions::new()
        .max_connections(POOL_SIZE)
        .connect_with(connect_options(db_path))
        .await?;

    tracing::info!(
        "Opened store at {} ({} migrations applied)",
        db_path.display(),
        applied
    );
    Ok(pool)
}
