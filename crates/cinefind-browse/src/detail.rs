//! Detail fetcher and the modal state it feeds.
#![allow(clippy::future_not_send)]

use std::time::Duration;

use cinefind_api::tmdb::{CancelReason, CatalogError, LocalCatalogApi, MovieDetail, MovieSummary};
use tokio::sync::Mutex;
use tracing::{debug, error, instrument, warn};

use crate::orchestrator::DEFAULT_TIMEOUT;

/// Message shown in the modal when every transport failed.
pub const DETAIL_ERROR_MESSAGE: &str = "Failed to load movie details";

/// Fetches one movie's details through an ordered list of transports.
///
/// A transport-level failure moves on to the next strategy. Any other
/// failure (an HTTP status, a bad body, a missing credential) is terminal.
/// Results are not cached between calls.
#[derive(Debug)]
pub struct DetailFetcher<A> {
    strategies: Vec<A>,
    timeout: Duration,
}

impl<A: LocalCatalogApi> DetailFetcher<A> {
    /// Creates a fetcher trying `strategies` in order.
    #[must_use]
    pub const fn new(strategies: Vec<A>) -> Self {
        Self {
            strategies,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Fetches `movie_id` with its cast and videos.
    ///
    /// # Errors
    ///
    /// Returns the terminal error, or the last transport error when every
    /// strategy failed at the transport level.
    #[instrument(skip(self))]
    pub async fn fetch(&self, movie_id: u64) -> Result<MovieDetail, CatalogError> {
        let mut last = CatalogError::Unknown(String::from("no detail transport configured"));
        for (attempt, api) in self.strategies.iter().enumerate() {
            let result = tokio::time::timeout(self.timeout, api.movie_details(movie_id))
                .await
                .unwrap_or(Err(CatalogError::Cancelled(CancelReason::TimedOut)));
            match result {
                Ok(detail) => return Ok(detail),
                Err(err) if err.is_transport() => {
                    warn!(attempt, error = %err, "detail transport failed, trying next");
                    last = err;
                }
                Err(err) => return Err(err),
            }
        }
        Err(last)
    }
}

/// Observable modal state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailState {
    /// Whether the modal is shown.
    pub open: bool,
    /// Movie the modal was opened for.
    pub selected: Option<MovieSummary>,
    /// Details request in flight.
    pub loading: bool,
    /// Error scoped to this modal.
    pub error: Option<String>,
    /// Loaded details.
    pub detail: Option<MovieDetail>,
}

#[derive(Debug, Default)]
struct Modal {
    generation: u64,
    state: DetailState,
}

/// Detail modal: each open issues a fresh fetch, stale results are dropped.
#[derive(Debug)]
pub struct DetailView<A> {
    fetcher: DetailFetcher<A>,
    modal: Mutex<Modal>,
}

impl<A: LocalCatalogApi> DetailView<A> {
    /// Creates a closed modal backed by `fetcher`.
    #[must_use]
    pub fn new(fetcher: DetailFetcher<A>) -> Self {
        Self {
            fetcher,
            modal: Mutex::new(Modal::default()),
        }
    }

    /// Opens the modal for `movie` and loads its details.
    ///
    /// Returns `false` when the modal was closed or reopened on another movie
    /// before the response arrived; the response is then discarded.
    #[instrument(skip_all, fields(movie_id = movie.id))]
    pub async fn open(&self, movie: MovieSummary) -> bool {
        let movie_id = movie.id;
        let generation = {
            let mut modal = self.modal.lock().await;
            modal.generation = modal.generation.wrapping_add(1);
            modal.state = DetailState {
                open: true,
                selected: Some(movie),
                loading: true,
                error: None,
                detail: None,
            };
            modal.generation
        };

        let result = self.fetcher.fetch(movie_id).await;

        let mut modal = self.modal.lock().await;
        if modal.generation != generation {
            debug!("discarding details for a closed modal");
            return false;
        }
        modal.state.loading = false;
        match result {
            Ok(detail) => modal.state.detail = Some(detail),
            Err(e) => {
                error!(error = %e, "failed to load movie details");
                modal.state.error = Some(String::from(DETAIL_ERROR_MESSAGE));
            }
        }
        true
    }

    /// Closes the modal and invalidates any in-flight load.
    pub async fn close(&self) {
        let mut modal = self.modal.lock().await;
        modal.generation = modal.generation.wrapping_add(1);
        modal.state = DetailState::default();
    }

    /// Copies the modal state.
    pub async fn snapshot(&self) -> DetailState {
        self.modal.lock().await.state.clone()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use cinefind_api::tmdb::{Credits, MoviePage, SearchMovieParams, Videos};

    use super::*;

    fn summary(id: u64) -> MovieSummary {
        MovieSummary {
            id,
            title: format!("Movie {id}"),
            vote_average: Some(8.0),
            poster_path: None,
            release_date: None,
            original_language: String::from("en"),
        }
    }

    fn detail(id: u64) -> MovieDetail {
        MovieDetail {
            summary: summary(id),
            runtime: Some(120),
            genres: vec![],
            overview: Some(String::from("Overview")),
            backdrop_path: None,
            credits: Credits::default(),
            videos: Videos::default(),
        }
    }

    /// Returns a fixed result after a delay and counts calls.
    struct ScriptedApi {
        delay: Duration,
        result: Result<MovieDetail, CatalogError>,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedApi {
        fn new(result: Result<MovieDetail, CatalogError>, calls: &Arc<AtomicUsize>) -> Self {
            Self {
                delay: Duration::ZERO,
                result,
                calls: Arc::clone(calls),
            }
        }

        const fn delayed(mut self, delay_ms: u64) -> Self {
            self.delay = Duration::from_millis(delay_ms);
            self
        }
    }

    impl LocalCatalogApi for ScriptedApi {
        async fn discover_movies(&self, _page: u32) -> Result<MoviePage, CatalogError> {
            Err(CatalogError::Unknown(String::from("not used by detail tests")))
        }

        async fn search_movies(
            &self,
            _params: &SearchMovieParams,
        ) -> Result<MoviePage, CatalogError> {
            Err(CatalogError::Unknown(String::from("not used by detail tests")))
        }

        async fn movie_details(&self, movie_id: u64) -> Result<MovieDetail, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(self.delay).await;
            self.result.clone().map(|mut d| {
                d.summary.id = movie_id;
                d
            })
        }
    }

    fn network_error() -> CatalogError {
        CatalogError::Network(String::from("connection refused"))
    }

    #[tokio::test]
    async fn test_direct_success_skips_relay() {
        // Arrange
        let direct_calls = Arc::new(AtomicUsize::new(0));
        let relay_calls = Arc::new(AtomicUsize::new(0));
        let fetcher = DetailFetcher::new(vec![
            ScriptedApi::new(Ok(detail(0)), &direct_calls),
            ScriptedApi::new(Ok(detail(0)), &relay_calls),
        ]);

        // Act
        let result = fetcher.fetch(155).await.unwrap();

        // Assert
        assert_eq!(result.summary.id, 155);
        assert_eq!(direct_calls.load(Ordering::SeqCst), 1);
        assert_eq!(relay_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_network_failure_falls_through_once() {
        // Arrange
        let direct_calls = Arc::new(AtomicUsize::new(0));
        let relay_calls = Arc::new(AtomicUsize::new(0));
        let fetcher = DetailFetcher::new(vec![
            ScriptedApi::new(Err(network_error()), &direct_calls),
            ScriptedApi::new(Ok(detail(0)), &relay_calls),
        ]);

        // Act
        let result = fetcher.fetch(155).await;

        // Assert
        assert!(result.is_ok());
        assert_eq!(direct_calls.load(Ordering::SeqCst), 1);
        assert_eq!(relay_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_http_error_is_terminal() {
        // Arrange
        let relay_calls = Arc::new(AtomicUsize::new(0));
        let fetcher = DetailFetcher::new(vec![
            ScriptedApi::new(
                Err(CatalogError::Http {
                    status: 404,
                    message: String::from("code=34,message=not found"),
                }),
                &Arc::new(AtomicUsize::new(0)),
            ),
            ScriptedApi::new(Ok(detail(0)), &relay_calls),
        ]);

        // Act
        let err = fetcher.fetch(1).await.unwrap_err();

        // Assert
        assert_eq!(err.status(), Some(404));
        assert_eq!(relay_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_all_transports_failing_returns_last_error() {
        // Arrange
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = DetailFetcher::new(vec![
            ScriptedApi::new(Err(network_error()), &calls),
            ScriptedApi::new(Err(CatalogError::Network(String::from("relay down"))), &calls),
        ]);

        // Act
        let err = fetcher.fetch(1).await.unwrap_err();

        // Assert
        assert_eq!(err, CatalogError::Network(String::from("relay down")));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout() {
        // Arrange
        let calls = Arc::new(AtomicUsize::new(0));
        let fetcher = DetailFetcher::new(vec![ScriptedApi::new(Ok(detail(0)), &calls).delayed(5_000)])
            .timeout(Duration::from_secs(1));

        // Act
        let err = fetcher.fetch(1).await.unwrap_err();

        // Assert
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_open_loads_details() {
        // Arrange
        let calls = Arc::new(AtomicUsize::new(0));
        let view = DetailView::new(DetailFetcher::new(vec![ScriptedApi::new(
            Ok(detail(0)),
            &calls,
        )]));

        // Act
        let applied = view.open(summary(155)).await;

        // Assert
        assert!(applied);
        let state = view.snapshot().await;
        assert!(state.open);
        assert!(!state.loading);
        assert_eq!(state.selected.unwrap().id, 155);
        assert_eq!(state.detail.unwrap().runtime, Some(120));
    }

    #[tokio::test]
    async fn test_open_failure_sets_modal_error() {
        // Arrange
        let calls = Arc::new(AtomicUsize::new(0));
        let view = DetailView::new(DetailFetcher::new(vec![ScriptedApi::new(
            Err(CatalogError::Auth),
            &calls,
        )]));

        // Act
        view.open(summary(7)).await;

        // Assert
        let state = view.snapshot().await;
        assert_eq!(state.error.as_deref(), Some(DETAIL_ERROR_MESSAGE));
        assert!(state.detail.is_none());
        assert!(!state.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_discards_late_response() {
        // Arrange
        let calls = Arc::new(AtomicUsize::new(0));
        let view = DetailView::new(DetailFetcher::new(vec![
            ScriptedApi::new(Ok(detail(0)), &calls).delayed(200),
        ]));

        // Act
        let (applied, ()) = tokio::join!(view.open(summary(155)), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            view.close().await;
        });

        // Assert
        assert!(!applied);
        assert_eq!(view.snapshot().await, DetailState::default());
    }

    #[tokio::test]
    async fn test_each_open_fetches_again() {
        // Arrange
        let calls = Arc::new(AtomicUsize::new(0));
        let view = DetailView::new(DetailFetcher::new(vec![ScriptedApi::new(
            Ok(detail(0)),
            &calls,
        )]));

        // Act
        view.open(summary(155)).await;
        view.close().await;
        view.open(summary(155)).await;

        // Assert
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
