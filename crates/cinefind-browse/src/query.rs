//! `SearchQuery`, `CacheKey`, and `FetchMode`.

use std::fmt;

use cinefind_api::tmdb::SearchMovieParams;

/// A search string, trimmed. Empty means "no filter, show popular".
///
/// Case is preserved: `"Batman"` and `"batman"` are different queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SearchQuery(String);

impl SearchQuery {
    /// Creates a query from raw input.
    pub fn new(raw: impl AsRef<str>) -> Self {
        Self(String::from(raw.as_ref().trim()))
    }

    /// Returns `true` when no filter is applied.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the query text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Derives the cache key for `page` of this query.
    #[must_use]
    pub fn key(&self, page: u32) -> CacheKey {
        if self.is_empty() {
            CacheKey::Discover { page }
        } else {
            CacheKey::Search {
                query: self.0.clone(),
                page,
            }
        }
    }
}

impl fmt::Display for SearchQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SearchQuery {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Identifies one upstream result page.
///
/// The no-query case has its own variant, so it never collides with a
/// search for any literal string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Popular movies (`discover/movie`).
    Discover {
        /// Page number.
        page: u32,
    },
    /// Title search (`search/movie`).
    Search {
        /// Trimmed query text.
        query: String,
        /// Page number.
        page: u32,
    },
}

impl CacheKey {
    /// Page number of this key.
    #[must_use]
    pub const fn page(&self) -> u32 {
        match self {
            Self::Discover { page } | Self::Search { page, .. } => *page,
        }
    }

    /// Search parameters for a `Search` key.
    #[must_use]
    pub fn search_params(&self) -> Option<SearchMovieParams> {
        match self {
            Self::Discover { .. } => None,
            Self::Search { query, page } => Some(SearchMovieParams::new(query.as_str()).page(*page)),
        }
    }
}

/// How a fetched page is applied to the visible list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchMode {
    /// Overwrite the visible list.
    Replace,
    /// Concatenate onto the visible list (infinite scroll).
    Append,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_query_is_trimmed_but_not_case_folded() {
        // Arrange & Act
        let a = SearchQuery::new("  Batman ");
        let b = SearchQuery::new("batman");

        // Assert
        assert_eq!(a.as_str(), "Batman");
        assert_ne!(a, b);
    }

    #[test]
    fn test_whitespace_only_query_is_empty() {
        // Arrange & Act
        let query = SearchQuery::new("   ");

        // Assert
        assert!(query.is_empty());
        assert_eq!(query.key(1), CacheKey::Discover { page: 1 });
    }

    #[test]
    fn test_keys_differ_by_query_and_page() {
        // Arrange
        let query = SearchQuery::new("alien");

        // Act & Assert
        assert_ne!(query.key(1), query.key(2));
        assert_ne!(query.key(1), SearchQuery::new("aliens").key(1));
        assert_ne!(query.key(1), SearchQuery::default().key(1));
    }

    #[test]
    fn test_search_params_from_key() {
        // Arrange
        let key = SearchQuery::new("heat").key(4);

        // Act
        let params = key.search_params().unwrap();

        // Assert
        assert_eq!(params.query, "heat");
        assert_eq!(params.page, 4);
        assert_eq!(key.page(), 4);
        assert!(CacheKey::Discover { page: 1 }.search_params().is_none());
    }
}
