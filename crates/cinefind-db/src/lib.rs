//! Database module for search analytics.
//!
//! Uses `rusqlite` (bundled `SQLite`) to count searches per normalized
//! term and remember the top movie each term led to.

mod connection;
mod migrations;
/// Search count CRUD operations.
pub mod searches;

#[allow(clippy::module_name_repetitions)]
pub use connection::{open_db, open_in_memory};
pub use searches::{SearchRecord, TopMovie, load_trending, normalize_term, record_search};
