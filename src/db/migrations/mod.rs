//! Versioned schema migrations.
//!
//! Each version has an `up` script that brings the schema from `N-1` to `N` and a `down` script
//! that reverses it. The scripts live next to this file as `migration_NN_up.sql` and
//! `migration_NN_down.sql`. The current version is kept in the single-row `schema_version` table.

use anyhow::{bail, Context};
use sqlx::{Executor, SqlitePool};
use tracing::debug;

use crate::Result;

/// The schema version this build of the program expects.
pub(crate) const LATEST: i32 = 1;

struct Migration {
    version: i32,
    up_sql: &'static str,
    down_sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    up_sql: include_str!("migration_01_up.sql"),
    down_sql: include_str!("migration_01_down.sql"),
}];

/// Creates the `schema_version` table at version 0 if the database does not have one yet.
pub(crate) async fn bootstrap(pool: &SqlitePool) -> Result<()> {
    sqlx::query("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)")
        .execute(pool)
        .await
        .context("Failed to create schema_version table")?;

    let rows: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM schema_version")
        .fetch_one(pool)
        .await
        .context("Failed to count schema_version rows")?;
    if rows.0 == 0 {
        sqlx::query("INSERT INTO schema_version (version) VALUES (0)")
            .execute(pool)
            .await
            .context("Failed to insert initial schema version")?;
    }
    Ok(())
}

/// Reads the schema version recorded in the database.
pub(crate) async fn version(pool: &SqlitePool) -> Result<i32> {
    let row: (i32,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await
        .context("Failed to query schema version")?;
    Ok(row.0)
}

/// Reads the schema version of a database that is expected to have been created by pocket.
/// Returns `None` when there is no `schema_version` table or it holds no version.
pub(crate) async fn existing_version(pool: &SqlitePool) -> Result<Option<i32>> {
    let tables: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'schema_version'",
    )
    .fetch_one(pool)
    .await
    .context("Failed to look for the schema_version table")?;
    if tables.0 == 0 {
        return Ok(None);
    }
    let row: (Option<i32>,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
        .fetch_one(pool)
        .await
        .context("Failed to query schema version")?;
    Ok(row.0)
}

/// Brings the schema from whatever version it is at to `target`, going up or down one version at
/// a time. A database from a newer build (version above `LATEST`) is refused.
pub(crate) async fn migrate(pool: &SqlitePool, target: i32) -> Result<()> {
    let current = version(pool).await?;
    if current > LATEST {
        bail!(
            "The database schema is at version {current} but this program only knows up to \
            version {LATEST}. Is a newer version of pocket available?"
        );
    }
    run(pool, current, target).await
}

async fn run(pool: &SqlitePool, current: i32, target: i32) -> Result<()> {
    if current == target {
        debug!("Database already at schema version {target}");
        return Ok(());
    }
    check_available(current, target)?;

    if current < target {
        for version in (current + 1)..=target {
            debug!("Running migration {version:02} (up)");
            apply(pool, find(version)?.up_sql, version).await?;
        }
    } else {
        for version in ((target + 1)..=current).rev() {
            debug!("Running migration {version:02} (down)");
            apply(pool, find(version)?.down_sql, version - 1).await?;
        }
    }

    debug!("Schema is now at version {target}");
    Ok(())
}

fn find(version: i32) -> Result<&'static Migration> {
    MIGRATIONS
        .iter()
        .find(|m| m.version == version)
        .with_context(|| format!("Migration {version} not found"))
}

/// Runs `sql` and records `new_version` in one transaction.
async fn apply(pool: &SqlitePool, sql: &str, new_version: i32) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .context("Failed to begin migration transaction")?;

    tx.execute(sql)
        .await
        .context("Failed to execute migration SQL")?;

    sqlx::query("UPDATE schema_version SET version = ?")
        .bind(new_version)
        .execute(&mut *tx)
        .await
        .context("Failed to update schema_version")?;

    tx.commit()
        .await
        .context("Failed to commit migration transaction")
}

/// Every version between `current` and `target` needs a migration before any of them run.
fn check_available(current: i32, target: i32) -> Result<()> {
    let (start, end) = if current < target {
        (current + 1, target)
    } else {
        (target + 1, current)
    };

    if let Some(missing) = (start..=end).find(|v| !MIGRATIONS.iter().any(|m| m.version == *v)) {
        bail!("Migration {missing} is required to go from version {current} to {target}");
    }
    Ok(())
}
