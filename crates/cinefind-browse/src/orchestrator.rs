//! List fetch orchestration.
#![allow(clippy::future_not_send)]

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use cinefind_api::tmdb::{CancelReason, CatalogError, LocalCatalogApi, MoviePage};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, instrument, warn};

use crate::analytics::{SearchAnalytics, SearchHit};
use crate::query::{CacheKey, FetchMode, SearchQuery};
use crate::session::{Begin, BrowseSession, BrowseState, Completion, Ticket};

/// Default per-request timeout for list fetches.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default number of trending searches to load.
pub const DEFAULT_TRENDING_LIMIT: usize = 5;

/// Result of one [`ListController::fetch`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Answered from the result cache without a network call.
    Served,
    /// Network result committed to the visible list.
    Committed,
    /// Request failed; the user-facing message is set.
    Failed(CatalogError),
    /// A newer fetch superseded this one; its result was dropped.
    Discarded,
    /// Append that does not continue the current list, or nothing to load.
    Ignored,
}

/// Owns the list slot: issues catalog requests and commits the latest one.
#[allow(clippy::module_name_repetitions)]
pub struct ListController<A, S> {
    api: A,
    analytics: Arc<S>,
    session: Mutex<BrowseSession>,
    reports: Mutex<JoinSet<()>>,
    timeout: Duration,
    trending_limit: usize,
}

impl<A, S> fmt::Debug for ListController<A, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListController")
            .field("timeout", &self.timeout)
            .field("trending_limit", &self.trending_limit)
            .finish_non_exhaustive()
    }
}

impl<A, S> ListController<A, S>
where
    A: LocalCatalogApi,
    S: SearchAnalytics + Sync + 'static,
{
    /// Creates a controller with the default timeout and trending limit.
    pub fn new(api: A, analytics: Arc<S>) -> Self {
        Self {
            api,
            analytics,
            session: Mutex::new(BrowseSession::new()),
            reports: Mutex::new(JoinSet::new()),
            timeout: DEFAULT_TIMEOUT,
            trending_limit: DEFAULT_TRENDING_LIMIT,
        }
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets how many trending searches [`Self::load_trending`] keeps.
    #[must_use]
    pub const fn trending_limit(mut self, limit: usize) -> Self {
        self.trending_limit = limit;
        self
    }

    /// Fetches `page` of `query` and applies it in `mode`.
    ///
    /// A replace is served from the cache when possible. Otherwise the
    /// request runs under the configured timeout and its result is
    /// committed only if no newer fetch started in the meantime.
    #[instrument(skip_all, fields(query = %query, page, ?mode))]
    pub async fn fetch(&self, query: SearchQuery, page: u32, mode: FetchMode) -> FetchOutcome {
        let begin = self.session.lock().await.begin(query, page, mode);
        self.drive(begin).await
    }

    /// Loads the next page if the list is idle and more pages exist.
    ///
    /// Safe to call on every visibility event: while a load is in flight or
    /// the list is exhausted it returns [`FetchOutcome::Ignored`].
    #[instrument(skip_all)]
    pub async fn on_sentinel_visible(&self) -> FetchOutcome {
        let begin = {
            let mut session = self.session.lock().await;
            match session.next_page() {
                Some(page) => {
                    let query = session.query().clone();
                    session.begin(query, page, FetchMode::Append)
                }
                None => Begin::Ignored,
            }
        };
        self.drive(begin).await
    }

    /// Refreshes the trending list from the analytics collaborator.
    ///
    /// A failure is logged and leaves the previous list in place.
    #[instrument(skip_all)]
    pub async fn load_trending(&self) {
        match self.analytics.trending(self.trending_limit).await {
            Ok(trending) => {
                debug!(count = trending.len(), "loaded trending searches");
                self.session.lock().await.set_trending(trending);
            }
            Err(e) => warn!(error = %e, "failed to load trending searches"),
        }
    }

    /// Copies the observable list state.
    pub async fn snapshot(&self) -> BrowseState {
        self.session.lock().await.snapshot()
    }

    /// Number of pages held by the result cache.
    pub async fn cached_pages(&self) -> usize {
        self.session.lock().await.cached_pages()
    }

    /// Waits for analytics reports that are still running.
    ///
    /// Fetches never wait on reports; call this before shutting down so
    /// pending writes are not aborted with the runtime.
    pub async fn drain_reports(&self) {
        let mut reports = std::mem::take(&mut *self.reports.lock().await);
        while let Some(joined) = reports.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "analytics report task failed");
            }
        }
    }

    async fn drive(&self, begin: Begin) -> FetchOutcome {
        let ticket = match begin {
            Begin::Cached => return FetchOutcome::Served,
            Begin::Ignored => return FetchOutcome::Ignored,
            Begin::Pending(ticket) => ticket,
        };
        self.run(ticket).await
    }

    async fn run(&self, ticket: Ticket) -> FetchOutcome {
        let result = self.request(ticket.key()).await;
        let completion = self.session.lock().await.complete(ticket, result);
        match completion {
            Completion::Committed(hit) => {
                if let Some(hit) = hit {
                    self.report(hit).await;
                }
                FetchOutcome::Committed
            }
            Completion::Failed(err) => {
                warn!(error = %err, "list fetch failed");
                FetchOutcome::Failed(err)
            }
            Completion::Discarded => FetchOutcome::Discarded,
        }
    }

    async fn request(&self, key: &CacheKey) -> Result<MoviePage, CatalogError> {
        let call = async {
            match key.search_params() {
                Some(params) => self.api.search_movies(&params).await,
                None => self.api.discover_movies(key.page()).await,
            }
        };
        if let Ok(result) = tokio::time::timeout(self.timeout, call).await {
            result
        } else {
            warn!(?key, timeout_secs = self.timeout.as_secs(), "catalog request timed out");
            Err(CatalogError::Cancelled(CancelReason::TimedOut))
        }
    }

    async fn report(&self, hit: SearchHit) {
        let analytics = Arc::clone(&self.analytics);
        let mut reports = self.reports.lock().await;
        while reports.try_join_next().is_some() {}
        reports.spawn(async move {
            if let Err(e) = analytics.record_search(&hit).await {
                warn!(query = %hit.query, error = %e, "failed to record search");
            }
        });
    }
}
