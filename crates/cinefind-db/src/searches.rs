//! Search count operations.

use anyhow::{Context, Result, ensure};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

/// The movie a search led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopMovie {
    /// TMDB movie ID.
    pub movie_id: u64,
    /// Movie title.
    pub title: String,
    /// Poster path, if any.
    pub poster_path: Option<String>,
}

/// A stored search term.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRecord {
    /// Normalized term (trimmed, lower case).
    pub search_term: String,
    /// How many times the term was searched.
    pub count: u64,
    /// Movie the latest search led to.
    pub top: TopMovie,
    /// UTC timestamp of the latest search (`YYYY-MM-DD HH:MM:SS`).
    pub updated_at: String,
}

/// Normalizes a query into the key searches are counted under.
#[must_use]
pub fn normalize_term(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Counts one search for `query` and remembers `top` as its result.
///
/// Returns the new count for the term.
///
/// # Errors
///
/// Returns an error if the normalized term is empty or the write fails.
pub fn record_search(conn: &Connection, query: &str, top: &TopMovie) -> Result<u64> {
    let term = normalize_term(query);
    ensure!(!term.is_empty(), "search term is empty");

    conn.execute(
        "INSERT INTO searches (search_term, count, movie_id, title, poster_path, updated_at)
         VALUES (?1, 1, ?2, ?3, ?4, datetime('now'))
         ON CONFLICT(search_term) DO UPDATE SET
             count       = count + 1,
             movie_id    = excluded.movie_id,
             title       = excluded.title,
             poster_path = excluded.poster_path,
             updated_at  = excluded.updated_at",
        params![term, top.movie_id, top.title, top.poster_path],
    )
    .with_context(|| format!("failed to record search {term:?}"))?;

    let count: Option<u64> = conn
        .query_row(
            "SELECT count FROM searches WHERE search_term = ?1",
            params![term],
            |row| row.get(0),
        )
        .optional()
        .context("failed to read search count")?;
    let count = count.with_context(|| format!("search {term:?} vanished after upsert"))?;

    debug!(term, count, movie_id = top.movie_id, "recorded search");
    Ok(count)
}

/// Loads up to `limit` terms, most searched first.
///
/// Ties are broken by the most recent search, then alphabetically.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub fn load_trending(conn: &Connection, limit: usize) -> Result<Vec<SearchRecord>> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let mut stmt = conn
        .prepare(
            "SELECT search_term, count, movie_id, title, poster_path, updated_at
             FROM searches
             ORDER BY count DESC, updated_at DESC, search_term ASC
             LIMIT ?1",
        )
        .context("failed to prepare trending query")?;

    let rows = stmt
        .query_map(params![limit], |row| {
            Ok(SearchRecord {
                search_term: row.get(0)?,
                count: row.get(1)?,
                top: TopMovie {
                    movie_id: row.get(2)?,
                    title: row.get(3)?,
                    poster_path: row.get(4)?,
                },
                updated_at: row.get(5)?,
            })
        })
        .context("failed to query searches")?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .context("failed to read searches rows")
}
