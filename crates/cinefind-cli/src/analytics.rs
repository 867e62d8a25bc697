//! Search analytics backed by the local SQLite database.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Result, anyhow};
use cinefind_browse::{SearchAnalytics, SearchHit, TrendingMovie};
use cinefind_db::{TopMovie, load_trending, open_db, record_search};
use rusqlite::Connection;
use tracing::debug;

/// Counts searches in SQLite and serves the trending list from it.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct SqliteAnalytics {
    conn: Mutex<Connection>,
}

impl SqliteAnalytics {
    /// Wraps an open, migrated connection.
    pub const fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Opens the analytics database under `dir` (or the default data directory).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(dir: Option<&Path>) -> Result<Self> {
        Ok(Self::new(open_db(dir)?))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("analytics database lock poisoned"))
    }
}

impl SearchAnalytics for SqliteAnalytics {
    async fn record_search(&self, hit: &SearchHit) -> Result<()> {
        let top = TopMovie {
            movie_id: hit.top.id,
            title: hit.top.title.clone(),
            poster_path: hit.top.poster_path.clone(),
        };
        let count = record_search(&*self.lock()?, &hit.query, &top)?;
        debug!(query = %hit.query, count, "search counted");
        Ok(())
    }

    async fn trending(&self, limit: usize) -> Result<Vec<TrendingMovie>> {
        let records = load_trending(&*self.lock()?, limit)?;
        Ok(records
            .into_iter()
            .map(|record| TrendingMovie {
                search_term: record.search_term,
                count: record.count,
                movie_id: record.top.movie_id,
                title: record.top.title,
                poster_path: record.top.poster_path,
            })
            .collect())
    }
}
