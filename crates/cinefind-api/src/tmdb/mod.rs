//! TMDB API client module.
//!
//! Handles HTTP requests to the TMDB API v3 movie endpoints
//! and maps failures onto [`CatalogError`].

mod api;
mod client;
mod error;
mod types;

#[allow(clippy::module_name_repetitions)]
pub use api::{CatalogApi, LocalCatalogApi};
#[allow(clippy::module_name_repetitions)]
pub use client::{CatalogClient, CatalogClientBuilder, DEFAULT_BASE_URL, Transport};
pub use error::{CancelReason, CatalogError};
pub use types::{
    CastMember, Credits, Genre, MovieDetail, MoviePage, MovieSummary, SearchMovieParams, Video,
    Videos,
};
