//! Store schema
//!
//! The persistent store needs a single `kv_store` table. Schema changes are
//! numbered SQL scripts recorded in `migrations`, applied once each, in order.

use crate::error::Result;
use sqlx::sqlite::SqlitePool;

/// Numbered migration scripts, oldest first
const MIGRATIONS: &[(i64, &str)] = &[(1, include_str!("migrations/001_initial_schema.sql"))];

/// Bring the schema up to date. Returns how many migrations ran.
pub async fn initialize_database(pool: &SqlitePool) -> Result<usize> {
    sqlx::query("PRAGMA journal_mode = WAL").execute(pool).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    let schema_version: i64 =
        sqlx::query_scalar("SELECT COALESCE(MAX(version), 0) FROM migrations")
            .fetch_one(pool)
            .await?;

    let pending: Vec<_> = MIGRATIONS
        .iter()
        .filter(|(version, _)| *version > schema_version)
        .collect();

    if pending.is_empty() {
        tracing::debug!("Store schema at version {}", schema_version);
        return Ok(0);
    }

    for (version, script) in &pending {
        run_migration(pool, *version, script).await?;
    }

    tracing::info!(
        "Store schema migrated from version {} to {}",
        schema_version,
        pending.last().map(|(v, _)| *v).unwrap_or(schema_version)
    );
    Ok(pending.len())
}

/// Run one script and record it, all or nothing
async fn run_migration(pool: &SqlitePool, version: i64, script: &str) -> Result<()> {
    let mut tx = pool.begin().await?;

    for statement in script.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        sqlx::query(statement).execute(&mut *tx).await?;
    }

    sqlx::query("INSERT INTO migrations (version) VALUES (?)")
        .bind(version)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    tracing::debug!("Applied store migration {}", version);
    Ok(())
}
