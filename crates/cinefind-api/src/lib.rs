//! Catalog client library for cinefind.
//!
//! Talks to the TMDB v3 API either through the cinefind proxy, directly with
//! a client-held credential, or through a CORS relay.

/// TMDB catalog client.
pub mod tmdb;
