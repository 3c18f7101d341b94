//! Schema migrations for the partition store.
//!
//! Applied versions are recorded in `_migrations`; each pending migration
//! runs inside its own transaction together with its bookkeeping row.

use super::Error;
use tokio_rusqlite::{Connection, params, rusqlite};

/// One schema step.
struct Migration {
    version: i64,
    name: &'static str,
    sql: &'static str,
}

/// Ordered by version; never edit an entry once released.
const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "partitions",
    sql: include_str!("../../migrations/001_partitions.sql"),
}];

fn applied_version(conn: &rusqlite::Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COALESCE(MAX(version), 0) FROM _migrations", [], |row| row.get(0))
}

/// Bring the schema up to the latest version.
///
/// # Errors
///
/// Returns `MIGRATION_FAILED` naming the step whose SQL was rejected; earlier
/// steps stay applied.
pub async fn run(conn: &Connection) -> Result<(), Error> {
    let applied = conn
        .call(|conn| -> Result<Vec<i64>, Error> {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS _migrations (
                    version INTEGER PRIMARY KEY,
                    name TEXT NOT NULL,
                    applied_at TEXT NOT NULL
                )",
            )?;

            let current = applied_version(conn)?;
            let mut applied = Vec::new();

            for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
                let tx = conn.transaction()?;
                tx.execute_batch(migration.sql)
                    .map_err(|e| Error::MigrationFailed(format!("{:03}_{}: {e}", migration.version, migration.name)))?;
                tx.execute(
                    "INSERT INTO _migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
                    params![migration.version, migration.name, chrono::Utc::now().to_rfc3339()],
                )?;
                tx.commit()?;
                applied.push(migration.version);
            }

            Ok(applied)
        })
        .await?;

    if !applied.is_empty() {
        tracing::info!(?applied, "applied cache schema migrations");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn version(conn: &Connection) -> i64 {
        conn.call(|conn| applied_version(conn)).await.unwrap()
    }

    #[tokio::test]
    async fn test_fresh_database_reaches_latest() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();

        let latest = MIGRATIONS.last().map(|m| m.version).unwrap();
        assert_eq!(version(&conn).await, latest);

        let tables: Vec<String> = conn
            .call(|conn| {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master
                     WHERE type='table' AND name IN ('partitions', 'entries') ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect::<rusqlite::Result<Vec<String>>>()
            })
            .await
            .unwrap();
        assert_eq!(tables, vec!["entries".to_string(), "partitions".to_string()]);
    }

    #[tokio::test]
    async fn test_rerun_applies_nothing() {
        let conn = Connection::open_in_memory().await.unwrap();
        run(&conn).await.unwrap();
        run(&conn).await.unwrap();

        let count: i64 = conn
            .call(|conn| conn.query_row("SELECT COUNT(*) FROM _migrations", [], |row| row.get(0)))
            .await
            .unwrap();
        assert_eq!(count, MIGRATIONS.len() as i64);
    }

    #[test]
    fn test_versions_strictly_increase() {
        assert!(MIGRATIONS.windows(2).all(|w| w[0].version < w[1].version));
    }
}
