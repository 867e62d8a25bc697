//! Observable state of the list slot and the rules that mutate it.
//!
//! [`BrowseSession`] is synchronous: it decides what a fetch should do
//! ([`BrowseSession::begin`]) and applies its result
//! ([`BrowseSession::complete`]). The async orchestration around it lives in
//! [`crate::orchestrator`].

use cinefind_api::tmdb::{CancelReason, CatalogError, MoviePage, MovieSummary};
use tracing::{debug, error};

use crate::analytics::{SearchHit, TrendingMovie};
use crate::cache::ResultCache;
use crate::fallback::fallback_movies;
use crate::pagination::{Pagination, PaginationPhase};
use crate::query::{CacheKey, FetchMode, SearchQuery};

/// Permission to commit one network result, issued by [`BrowseSession::begin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    key: CacheKey,
    mode: FetchMode,
}

impl Ticket {
    /// Page to request.
    #[must_use]
    pub const fn key(&self) -> &CacheKey {
        &self.key
    }

    /// How the result will be applied.
    #[must_use]
    pub const fn mode(&self) -> FetchMode {
        self.mode
    }
}

/// Decision taken when a fetch starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Begin {
    /// Served from the cache; state is already updated.
    Cached,
    /// A network request is needed; commit it with the ticket.
    Pending(Ticket),
    /// Append request that does not continue the current query.
    Ignored,
}

/// What [`BrowseSession::complete`] did with a result.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The page became visible. Carries a search worth reporting, if any.
    Committed(Option<SearchHit>),
    /// The error was surfaced to the user.
    Failed(CatalogError),
    /// The ticket was superseded; nothing changed.
    Discarded,
}

/// Read-only copy of what the rendering surface shows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BrowseState {
    /// Query the visible list belongs to.
    pub query: SearchQuery,
    /// Visible movies, in upstream order.
    pub movies: Vec<MovieSummary>,
    /// Pagination phase.
    pub phase: PaginationPhase,
    /// First-page load in flight.
    pub is_loading: bool,
    /// Next-page load in flight.
    pub is_loading_more: bool,
    /// Last committed page.
    pub page: u32,
    /// Total pages of the current query.
    pub total_pages: u32,
    /// Whether the scroll sentinel may load more.
    pub has_more: bool,
    /// User-facing error, if the last fetch failed.
    pub error_message: Option<String>,
    /// Most searched terms.
    pub trending: Vec<TrendingMovie>,
}

/// Mutable list-slot state guarded by a generation counter.
#[derive(Debug, Default)]
pub struct BrowseSession {
    cache: ResultCache,
    query: SearchQuery,
    movies: Vec<MovieSummary>,
    pagination: Pagination,
    error_message: Option<String>,
    trending: Vec<TrendingMovie>,
    generation: u64,
}

impl BrowseSession {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fetch of `page` of `query`.
    ///
    /// A replace that hits the cache is applied immediately. Every other
    /// accepted fetch advances the generation, which invalidates the ticket
    /// of any request still in flight.
    ///
    /// An append is only accepted for the page right after the last
    /// committed one of the same query, while nothing is loading.
    pub fn begin(&mut self, query: SearchQuery, page: u32, mode: FetchMode) -> Begin {
        if mode == FetchMode::Append
            && (query != self.query || self.pagination.next_page() != Some(page))
        {
            debug!(query = %query, page, "ignoring append that does not continue the list");
            return Begin::Ignored;
        }

        let key = query.key(page);
        self.generation = self.generation.wrapping_add(1);
        self.error_message = None;

        if mode == FetchMode::Replace {
            self.query = query;
            if let Some(cached) = self.cache.get(&key).cloned() {
                debug!(?key, "serving page from cache");
                self.movies = cached.results;
                self.pagination.commit(cached.page, cached.total_pages);
                return Begin::Cached;
            }
            self.pagination.begin_reset();
        } else {
            self.pagination.begin_more();
        }

        Begin::Pending(Ticket {
            generation: self.generation,
            key,
            mode,
        })
    }

    /// Applies the result of the request `ticket` was issued for.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        result: Result<MoviePage, CatalogError>,
    ) -> Completion {
        if ticket.generation != self.generation {
            debug!(key = ?ticket.key, "discarding superseded response");
            return Completion::Discarded;
        }

        match result {
            Ok(page) => self.commit(ticket, page),
            Err(err) => {
                self.fail(ticket.mode, &err);
                Completion::Failed(err)
            }
        }
    }

    /// Page to load when the scroll sentinel is visible.
    #[must_use]
    pub fn next_page(&self) -> Option<u32> {
        self.pagination.next_page()
    }

    /// Query the visible list belongs to.
    #[must_use]
    pub const fn query(&self) -> &SearchQuery {
        &self.query
    }

    /// Replaces the trending list.
    pub fn set_trending(&mut self, trending: Vec<TrendingMovie>) {
        self.trending = trending;
    }

    /// Number of cached pages.
    #[must_use]
    pub fn cached_pages(&self) -> usize {
        self.cache.len()
    }

    /// Copies the observable state.
    #[must_use]
    pub fn snapshot(&self) -> BrowseState {
        let phase = self.pagination.phase();
        BrowseState {
            query: self.query.clone(),
            movies: self.movies.clone(),
            phase,
            is_loading: phase == PaginationPhase::Loading,
            is_loading_more: phase == PaginationPhase::LoadingMore,
            page: self.pagination.page(),
            total_pages: self.pagination.total_pages(),
            has_more: self.pagination.has_more(),
            error_message: self.error_message.clone(),
            trending: self.trending.clone(),
        }
    }

    fn commit(&mut self, ticket: Ticket, page: MoviePage) -> Completion {
        self.cache.put(ticket.key.clone(), page.clone());
        self.pagination.commit(page.page, page.total_pages);

        let hit = match (&ticket.key, ticket.mode, page.results.first()) {
            (CacheKey::Search { query, page: 1 }, FetchMode::Replace, Some(top)) => {
                Some(SearchHit {
                    query: query.clone(),
                    top: top.clone(),
                })
            }
            _ => None,
        };

        match ticket.mode {
            FetchMode::Replace => self.movies = page.results,
            FetchMode::Append => self.movies.extend(page.results),
        }
        Completion::Committed(hit)
    }

    fn fail(&mut self, mode: FetchMode, err: &CatalogError) {
        self.error_message = describe_error(err);
        if err.is_timeout() {
            self.movies = fallback_movies();
            self.pagination.exhaust();
        } else if mode == FetchMode::Replace {
            self.pagination.exhaust();
        } else {
            self.pagination.fail();
        }
    }
}

/// Maps a catalog error to the message shown above the list.
///
/// Returns `None` for a superseded request, which the user never sees.
#[must_use]
pub fn describe_error(err: &CatalogError) -> Option<String> {
    let message = match err {
        CatalogError::Cancelled(CancelReason::Superseded) => return None,
        CatalogError::Cancelled(CancelReason::TimedOut) => {
            String::from("Request timed out. Showing popular picks instead. Please try again.")
        }
        CatalogError::Http { status: 401, .. } => {
            String::from("Invalid API credential. Please check your TMDB token.")
        }
        CatalogError::Http { status: 404, .. } => String::from("API endpoint not found."),
        CatalogError::Http { status, .. } => {
            format!("Error fetching movies (HTTP {status}). Please try again later.")
        }
        CatalogError::Network(_) => {
            String::from("Network error. Please check your connection and try again.")
        }
        CatalogError::Auth => String::from("TMDB credential is not configured."),
        CatalogError::Unknown(detail) => {
            error!(detail = %detail, "unexpected catalog failure");
            String::from("Error fetching movies. Please try again later.")
        }
    };
    Some(message)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn movie(id: u64) -> MovieSummary {
        MovieSummary {
            id,
            title: format!("Movie {id}"),
            vote_average: Some(7.0),
            poster_path: None,
            release_date: None,
            original_language: String::from("en"),
        }
    }

    fn page(n: u32, total_pages: u32, ids: &[u64]) -> MoviePage {
        MoviePage {
            page: n,
            results: ids.iter().copied().map(movie).collect(),
            total_pages,
            total_results: 0,
        }
    }

    fn pending(begin: Begin) -> Ticket {
        match begin {
            Begin::Pending(ticket) => ticket,
            other => panic!("expected a pending fetch, got {other:?}"),
        }
    }

    fn ids(state: &BrowseState) -> Vec<u64> {
        state.movies.iter().map(|m| m.id).collect()
    }

    #[test]
    fn test_replace_enters_loading() {
        // Arrange
        let mut session = BrowseSession::new();

        // Act
        let ticket = pending(session.begin(SearchQuery::default(), 1, FetchMode::Replace));

        // Assert
        assert_eq!(ticket.key(), &CacheKey::Discover { page: 1 });
        let state = session.snapshot();
        assert!(state.is_loading);
        assert!(!state.is_loading_more);
    }

    #[test]
    fn test_commit_replaces_and_reports_search() {
        // Arrange
        let mut session = BrowseSession::new();
        let ticket = pending(session.begin(SearchQuery::new("batman"), 1, FetchMode::Replace));

        // Act
        let completion = session.complete(ticket, Ok(page(1, 3, &[272, 268])));

        // Assert
        let Completion::Committed(Some(hit)) = completion else {
            panic!("expected a reported hit");
        };
        assert_eq!(hit.query, "batman");
        assert_eq!(hit.top.id, 272);
        let state = session.snapshot();
        assert_eq!(ids(&state), vec![272, 268]);
        assert!(state.has_more);
        assert_eq!(state.phase, PaginationPhase::Idle);
    }

    #[test]
    fn test_discover_and_empty_results_are_not_reported() {
        // Arrange
        let mut session = BrowseSession::new();
        let discover = pending(session.begin(SearchQuery::default(), 1, FetchMode::Replace));
        let completion = session.complete(discover, Ok(page(1, 5, &[1])));
        assert_eq!(completion, Completion::Committed(None));

        // Act
        let empty = pending(session.begin(SearchQuery::new("zzzz"), 1, FetchMode::Replace));
        let completion = session.complete(empty, Ok(page(1, 0, &[])));

        // Assert
        assert_eq!(completion, Completion::Committed(None));
        assert_eq!(session.snapshot().phase, PaginationPhase::Exhausted);
    }

    #[test]
    fn test_cache_hit_skips_loading() {
        // Arrange
        let mut session = BrowseSession::new();
        let ticket = pending(session.begin(SearchQuery::new("up"), 1, FetchMode::Replace));
        session.complete(ticket, Ok(page(1, 2, &[10, 11])));
        let ticket = pending(session.begin(SearchQuery::new("heat"), 1, FetchMode::Replace));
        session.complete(ticket, Ok(page(1, 1, &[20])));

        // Act
        let begin = session.begin(SearchQuery::new("up"), 1, FetchMode::Replace);

        // Assert
        assert_eq!(begin, Begin::Cached);
        let state = session.snapshot();
        assert_eq!(ids(&state), vec![10, 11]);
        assert!(!state.is_loading);
        assert!(state.has_more);
        assert_eq!(session.cached_pages(), 2);
    }

    #[test]
    fn test_cache_hit_supersedes_in_flight_request() {
        // Arrange
        let mut session = BrowseSession::new();
        let ticket = pending(session.begin(SearchQuery::new("up"), 1, FetchMode::Replace));
        session.complete(ticket, Ok(page(1, 1, &[10])));
        let slow = pending(session.begin(SearchQuery::new("heat"), 1, FetchMode::Replace));
        session.begin(SearchQuery::new("up"), 1, FetchMode::Replace);

        // Act
        let completion = session.complete(slow, Ok(page(1, 1, &[20])));

        // Assert
        assert_eq!(completion, Completion::Discarded);
        assert_eq!(ids(&session.snapshot()), vec![10]);
    }

    #[test]
    fn test_superseded_response_is_discarded_in_either_order() {
        // Arrange
        let mut session = BrowseSession::new();
        let first = pending(session.begin(SearchQuery::new("a"), 1, FetchMode::Replace));
        let second = pending(session.begin(SearchQuery::new("ab"), 1, FetchMode::Replace));

        // Act
        let late = session.complete(second, Ok(page(1, 1, &[2])));
        let stale = session.complete(first, Ok(page(1, 1, &[1])));

        // Assert
        assert!(matches!(late, Completion::Committed(_)));
        assert_eq!(stale, Completion::Discarded);
        assert_eq!(ids(&session.snapshot()), vec![2]);
    }

    #[test]
    fn test_stale_failure_keeps_new_loading_state() {
        // Arrange
        let mut session = BrowseSession::new();
        let first = pending(session.begin(SearchQuery::new("a"), 1, FetchMode::Replace));
        let _second = pending(session.begin(SearchQuery::new("ab"), 1, FetchMode::Replace));

        // Act
        let completion = session.complete(first, Err(CatalogError::Network(String::from("reset"))));

        // Assert
        assert_eq!(completion, Completion::Discarded);
        let state = session.snapshot();
        assert!(state.is_loading);
        assert!(state.error_message.is_none());
    }

    #[test]
    fn test_append_concatenates_in_order() {
        // Arrange
        let mut session = BrowseSession::new();
        let query = SearchQuery::new("batman");
        let ticket = pending(session.begin(query.clone(), 1, FetchMode::Replace));
        session.complete(ticket, Ok(page(1, 3, &[1, 2])));
        let next = session.next_page().unwrap();

        // Act
        let ticket = pending(session.begin(query, next, FetchMode::Append));
        assert!(session.snapshot().is_loading_more);
        let completion = session.complete(ticket, Ok(page(2, 3, &[3, 2])));

        // Assert
        assert_eq!(completion, Completion::Committed(None));
        let state = session.snapshot();
        assert_eq!(ids(&state), vec![1, 2, 3, 2]);
        assert_eq!(state.page, 2);
        assert_eq!(session.next_page(), Some(3));
    }

    #[test]
    fn test_append_requires_same_query_and_page_two_or_more() {
        // Arrange
        let mut session = BrowseSession::new();
        let ticket = pending(session.begin(SearchQuery::new("batman"), 1, FetchMode::Replace));
        session.complete(ticket, Ok(page(1, 3, &[1])));

        // Act & Assert
        assert_eq!(
            session.begin(SearchQuery::new("superman"), 2, FetchMode::Append),
            Begin::Ignored
        );
        assert_eq!(
            session.begin(SearchQuery::new("batman"), 1, FetchMode::Append),
            Begin::Ignored
        );
        assert_eq!(session.snapshot().phase, PaginationPhase::Idle);
    }

    #[test]
    fn test_append_during_pending_reset_is_ignored() {
        // Arrange
        let mut session = BrowseSession::new();
        let ticket = pending(session.begin(SearchQuery::new("alien"), 1, FetchMode::Replace));
        session.complete(ticket, Ok(page(1, 3, &[100, 101])));
        let reset = pending(session.begin(SearchQuery::new("batman"), 1, FetchMode::Replace));

        // Act
        let begin = session.begin(SearchQuery::new("batman"), 5, FetchMode::Append);

        // Assert
        assert_eq!(begin, Begin::Ignored);
        let completion = session.complete(reset, Ok(page(1, 6, &[1, 2])));
        assert!(matches!(completion, Completion::Committed(Some(_))));
        let state = session.snapshot();
        assert_eq!(ids(&state), vec![1, 2]);
        assert_eq!(state.page, 1);
    }

    #[test]
    fn test_append_must_request_the_next_page() {
        // Arrange
        let mut session = BrowseSession::new();
        let query = SearchQuery::new("batman");
        let ticket = pending(session.begin(query.clone(), 1, FetchMode::Replace));
        session.complete(ticket, Ok(page(1, 6, &[1])));

        // Act & Assert
        assert_eq!(
            session.begin(query.clone(), 3, FetchMode::Append),
            Begin::Ignored
        );
        let ticket = pending(session.begin(query.clone(), 2, FetchMode::Append));
        assert_eq!(
            session.begin(query, 3, FetchMode::Append),
            Begin::Ignored
        );
        assert_eq!(session.snapshot().phase, PaginationPhase::LoadingMore);
        session.complete(ticket, Ok(page(2, 6, &[2])));
        assert_eq!(session.snapshot().page, 2);
    }

    #[test]
    fn test_append_never_reads_cache() {
        // Arrange
        let mut session = BrowseSession::new();
        let query = SearchQuery::new("batman");
        let ticket = pending(session.begin(query.clone(), 1, FetchMode::Replace));
        session.complete(ticket, Ok(page(1, 3, &[1])));
        let ticket = pending(session.begin(query.clone(), 2, FetchMode::Append));
        session.complete(ticket, Ok(page(2, 3, &[2])));
        assert_eq!(
            session.begin(query.clone(), 1, FetchMode::Replace),
            Begin::Cached
        );

        // Act
        let begin = session.begin(query, 2, FetchMode::Append);

        // Assert
        assert!(matches!(begin, Begin::Pending(_)));
    }

    #[test]
    fn test_timeout_shows_fallback_and_stops_scrolling() {
        // Arrange
        let mut session = BrowseSession::new();
        let ticket = pending(session.begin(SearchQuery::default(), 1, FetchMode::Replace));

        // Act
        let completion = session.complete(
            ticket,
            Err(CatalogError::Cancelled(CancelReason::TimedOut)),
        );

        // Assert
        assert!(matches!(completion, Completion::Failed(ref err) if err.is_timeout()));
        let state = session.snapshot();
        assert_eq!(state.movies.len(), 3);
        assert!(!state.has_more);
        assert_eq!(state.phase, PaginationPhase::Exhausted);
        assert!(state.error_message.unwrap().contains("timed out"));
        assert_eq!(session.next_page(), None);
    }

    #[test]
    fn test_search_timeout_replaces_list_with_fallback() {
        // Arrange
        let mut session = BrowseSession::new();
        let ticket = pending(session.begin(SearchQuery::default(), 1, FetchMode::Replace));
        session.complete(ticket, Ok(page(1, 10, &[1, 2, 3, 4])));
        let ticket = pending(session.begin(SearchQuery::new("batman"), 1, FetchMode::Replace));

        // Act
        session.complete(
            ticket,
            Err(CatalogError::Cancelled(CancelReason::TimedOut)),
        );

        // Assert
        let state = session.snapshot();
        assert_eq!(state.query.as_str(), "batman");
        assert_eq!(state.movies, fallback_movies());
        assert!(!state.has_more);
        assert_eq!(session.next_page(), None);
        assert_eq!(
            session.begin(SearchQuery::new("batman"), 2, FetchMode::Append),
            Begin::Ignored
        );
    }

    #[test]
    fn test_unauthorized_keeps_existing_list() {
        // Arrange
        let mut session = BrowseSession::new();
        let ticket = pending(session.begin(SearchQuery::default(), 1, FetchMode::Replace));
        session.complete(ticket, Ok(page(1, 10, &[1, 2, 3])));
        let ticket = pending(session.begin(SearchQuery::new("alien"), 1, FetchMode::Replace));

        // Act
        session.complete(
            ticket,
            Err(CatalogError::Http {
                status: 401,
                message: String::from("code=7,message=Invalid API key"),
            }),
        );

        // Assert
        let state = session.snapshot();
        assert_eq!(ids(&state), vec![1, 2, 3]);
        assert_eq!(
            state.error_message.as_deref(),
            Some("Invalid API credential. Please check your TMDB token.")
        );
        assert!(!state.is_loading);
        assert!(!state.has_more);
    }

    #[test]
    fn test_failed_append_allows_retry() {
        // Arrange
        let mut session = BrowseSession::new();
        let query = SearchQuery::new("batman");
        let ticket = pending(session.begin(query.clone(), 1, FetchMode::Replace));
        session.complete(ticket, Ok(page(1, 3, &[1])));
        let ticket = pending(session.begin(query, 2, FetchMode::Append));

        // Act
        session.complete(ticket, Err(CatalogError::Network(String::from("reset"))));

        // Assert
        let state = session.snapshot();
        assert_eq!(ids(&state), vec![1]);
        assert_eq!(state.phase, PaginationPhase::Idle);
        assert_eq!(session.next_page(), Some(2));
    }

    #[test]
    fn test_new_fetch_clears_error() {
        // Arrange
        let mut session = BrowseSession::new();
        let ticket = pending(session.begin(SearchQuery::default(), 1, FetchMode::Replace));
        session.complete(ticket, Err(CatalogError::Auth));
        assert!(session.snapshot().error_message.is_some());

        // Act
        session.begin(SearchQuery::default(), 1, FetchMode::Replace);

        // Assert
        assert!(session.snapshot().error_message.is_none());
    }

    #[test]
    fn test_describe_error_messages() {
        // Arrange
        let http = |status| CatalogError::Http {
            status,
            message: String::new(),
        };

        // Act & Assert
        assert_eq!(describe_error(&CatalogError::Cancelled(CancelReason::Superseded)), None);
        assert_eq!(
            describe_error(&http(404)).as_deref(),
            Some("API endpoint not found.")
        );
        assert_eq!(
            describe_error(&http(503)).as_deref(),
            Some("Error fetching movies (HTTP 503). Please try again later.")
        );
        assert_eq!(
            describe_error(&CatalogError::Network(String::new())).as_deref(),
            Some("Network error. Please check your connection and try again.")
        );
        assert_eq!(
            describe_error(&CatalogError::Auth).as_deref(),
            Some("TMDB credential is not configured.")
        );
        assert_eq!(
            describe_error(&CatalogError::Unknown(String::from("bad json"))).as_deref(),
            Some("Error fetching movies. Please try again later.")
        );
    }
}
