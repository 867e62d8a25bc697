//! Schema version management using `PRAGMA user_version`.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Current schema version.
const CURRENT_VERSION: u32 = 2;

/// Runs database migrations up to `CURRENT_VERSION`.
///
/// # Errors
///
/// Returns an error if any SQL statement fails.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    let version: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .context("failed to read user_version")?;

    if version < 1 {
        migrate_v1(conn).context("migration to v1 failed")?;
    }
    if version < 2 {
        migrate_v2(conn).context("migration to v2 failed")?;
    }

    conn.pragma_update(None, "user_version", CURRENT_VERSION)
        .context("failed to update user_version")?;

    Ok(())
}

/// Migration to v1: one row per normalized search term.
fn migrate_v1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS searches (
            search_term  TEXT PRIMARY KEY,
            count        INTEGER NOT NULL DEFAULT 0,
            movie_id     INTEGER NOT NULL,
            title        TEXT NOT NULL,
            poster_path  TEXT
        );",
    )
    .context("failed to create searches table")?;

    Ok(())
}

/// Migration to v2: track when a term was last searched and index by count.
fn migrate_v2(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "ALTER TABLE searches ADD COLUMN updated_at TEXT NOT NULL DEFAULT '1970-01-01 00:00:00';
         CREATE INDEX IF NOT EXISTS idx_searches_count ON searches(count DESC, updated_at DESC);",
    )
    .context("failed to add updated_at column")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn user_version(conn: &Connection) -> u32 {
        conn.pragma_query_value(None, "user_version", |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_migrations_idempotent() {
        // Arrange
        let conn = Connection::open_in_memory().unwrap();

        // Act
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        // Assert
        assert_eq!(user_version(&conn), CURRENT_VERSION);
    }

    #[test]
    fn test_v1_to_v2_keeps_rows() {
        // Arrange: a v1 database with one row
        let conn = Connection::open_in_memory().unwrap();
        migrate_v1(&conn).unwrap();
        conn.pragma_update(None, "user_version", 1u32).unwrap();
        conn.execute(
            "INSERT INTO searches (search_term, count, movie_id, title) VALUES ('heat', 3, 949, 'Heat')",
            [],
        )
        .unwrap();

        // Act
        run_migrations(&conn).unwrap();

        // Assert
        assert_eq!(user_version(&conn), 2);
        let (count, updated_at): (u64, String) = conn
            .query_row(
                "SELECT count, updated_at FROM searches WHERE search_term = 'heat'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .unwrap();
        assert_eq!(count, 3);
        assert_eq!(updated_at, "1970-01-01 00:00:00");
    }
}
