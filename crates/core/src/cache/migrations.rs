//! Schema migrations for the cache database.
//!
//! Applied versions are recorded in `schema_migrations`. Each pending
//! migration runs in its own transaction together with its bookkeeping row,
//! so a failed step leaves the schema at the previous version.

use tokio_rusqlite::rusqlite::Connection as SqliteConnection;
use tokio_rusqlite::{Connection, params};

use super::Error;

struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] =
    &[Migration { version: 1, name: "caches", sql: include_str!("../../migrations/001_caches.sql") }];

/// Bring the schema up to date and return the resulting version.
pub async fn apply(conn: &Connection) -> Result<i64, Error> {
    conn.call(|conn| -> Result<i64, Error> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at TEXT NOT NULL
            )",
        )?;

        let applied = current_version(conn)?;
        let mut version = applied;
        for migration in MIGRATIONS.iter().filter(|m| m.version > applied) {
            if migration.version != version + 1 {
                return Err(Error::MigrationFailed(format!(
                    "gap before migration {} ({}), schema is at {version}",
                    migration.version, migration.name
                )));
            }

            let tx = conn.transaction()?;
            tx.execute_batch(migration.sql)
                .map_err(|e| Error::MigrationFailed(format!("{}: {e}", migration.name)))?;
            tx.execute(
                "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
                params![migration.version, migration.name, chrono::Utc::now().to_rfc3339()],
            )?;
            tx.commit()?;

            version = migration.version;
            tracing::info!(version, name = migration.name, "applied cache migration");
        }

        Ok(version)
    })
    .await
    .map_err(Error::from)
}

/// Highest applied migration, 0 for a fresh database.
pub async fn schema_version(conn: &Connection) -> Result<i64, Error> {
    conn.call(|conn| -> Result<i64, Error> { current_version(conn) })
        .await
        .map_err(Error::from)
}

fn current_version(conn: &SqliteConnection) -> Result<i64, Error> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_migrations')",
        [],
        |row| row.get(0),
    )?;
    if !exists {
        return Ok(0);
    }
    Ok(conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_migrations", [], |row| row.get(0))?)
}
