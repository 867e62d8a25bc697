//! Browse core for cinefind.
//!
//! Turns raw search input into catalog requests: debouncing, a
//! process-lifetime result cache, replace/append pagination with
//! supersession by generation token, the timeout fallback list, and the
//! detail view with its ordered transport fallback.

/// Search analytics collaborator interface.
pub mod analytics;
/// Result cache keyed by query and page.
pub mod cache;
/// Session-wide browse configuration.
pub mod config;
/// Input debouncer.
pub mod debounce;
/// Detail fetcher and modal state.
pub mod detail;
/// Fixed fallback dataset.
pub mod fallback;
/// List fetch orchestration.
pub mod orchestrator;
/// Infinite-scroll state machine.
pub mod pagination;
/// Query and cache key types.
pub mod query;
/// List slot state and commit rules.
pub mod session;

pub use analytics::{SearchAnalytics, SearchHit, TrendingMovie};
pub use config::BrowseConfig;
pub use debounce::Debouncer;
pub use detail::{DetailFetcher, DetailState, DetailView};
pub use orchestrator::{FetchOutcome, ListController};
pub use pagination::PaginationPhase;
pub use query::{CacheKey, FetchMode, SearchQuery};
pub use session::{BrowseSession, BrowseState, describe_error};
