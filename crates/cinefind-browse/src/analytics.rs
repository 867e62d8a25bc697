//! `SearchAnalytics` trait definition.
#![allow(clippy::future_not_send)]

use anyhow::Result;
use cinefind_api::tmdb::MovieSummary;

/// A successful search worth recording: the query and its top result.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// Trimmed query text.
    pub query: String,
    /// First result returned for the query.
    pub top: MovieSummary,
}

/// A frequently searched query with the movie it last led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrendingMovie {
    /// Normalized search term.
    pub search_term: String,
    /// Number of times the term was searched.
    pub count: u64,
    /// TMDB ID of the top result.
    pub movie_id: u64,
    /// Title of the top result.
    pub title: String,
    /// Poster path of the top result.
    pub poster_path: Option<String>,
}

/// Search analytics collaborator.
///
/// Uses `trait_variant::make` to generate a `Send`-bound async trait so
/// reports can run on a detached task.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(SearchAnalytics: Send)]
pub trait LocalSearchAnalytics {
    /// Increments the count for `hit.query` and remembers its top result.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be persisted.
    async fn record_search(&self, hit: &SearchHit) -> Result<()>;

    /// Returns up to `limit` terms, most searched first.
    ///
    /// # Errors
    ///
    /// Returns an error if the records cannot be read.
    async fn trending(&self, limit: usize) -> Result<Vec<TrendingMovie>>;
}
