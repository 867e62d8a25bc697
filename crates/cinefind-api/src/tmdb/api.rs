//! `CatalogApi` trait definition.
#![allow(clippy::future_not_send)]

use super::error::CatalogError;
use super::types::{MovieDetail, MoviePage, SearchMovieParams};

/// Movie catalog API trait.
///
/// Abstracts API operations for mock substitution in tests.
/// Uses `trait_variant::make` to generate a `Send`-bound async trait.
#[allow(clippy::module_name_repetitions)]
#[trait_variant::make(CatalogApi: Send)]
pub trait LocalCatalogApi {
    /// Lists popular movies (`discover/movie` sorted by popularity).
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the request fails or the body cannot be decoded.
    async fn discover_movies(&self, page: u32) -> Result<MoviePage, CatalogError>;

    /// Searches movies by title.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the request fails or the body cannot be decoded.
    async fn search_movies(&self, params: &SearchMovieParams) -> Result<MoviePage, CatalogError>;

    /// Fetches one movie with its `credits` and `videos` sub-resources.
    ///
    /// # Errors
    ///
    /// Returns a [`CatalogError`] if the request fails or the body cannot be decoded.
    async fn movie_details(&self, movie_id: u64) -> Result<MovieDetail, CatalogError>;
}
