//! Opening the analytics database.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::debug;

use super::migrations::run_migrations;

/// Database file name.
const DB_FILE: &str = "cinefind.db";

/// How long a writer waits on a locked database before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Opens (or creates) the analytics database and brings its schema up to date.
///
/// - `Some(dir)` stores the file at `{dir}/cinefind.db`.
/// - `None` stores it at `~/.local/share/cinefind/cinefind.db`.
///
/// # Errors
///
/// Returns an error if the directory cannot be created, the file cannot be
/// opened, or a migration fails.
pub fn open_db(dir: Option<&Path>) -> Result<Connection> {
    let db_path = db_path(dir)?;

    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }

    let conn = Connection::open(&db_path)
        .with_context(|| format!("failed to open database {}", db_path.display()))?;
    conn.busy_timeout(BUSY_TIMEOUT)
        .context("failed to set busy timeout")?;
    run_migrations(&conn).context("database migration failed")?;

    debug!(path = %db_path.display(), "opened analytics database");
    Ok(conn)
}

/// Opens a private in-memory database with the current schema.
///
/// # Errors
///
/// Returns an error if a migration fails.
pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("failed to open in-memory database")?;
    run_migrations(&conn).context("database migration failed")?;
    Ok(conn)
}

fn db_path(dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = dir {
        return Ok(dir.join(DB_FILE));
    }

    let home = std::env::var("HOME").context("HOME environment variable is not set")?;
    Ok(PathBuf::from(home)
        .join(".local/share/cinefind")
        .join(DB_FILE))
}
