//! Process-lifetime result cache.

use std::collections::HashMap;

use cinefind_api::tmdb::MoviePage;

use crate::query::CacheKey;

/// Key-value store of upstream pages.
///
/// Entries never expire and are never evicted, so the map grows for the
/// whole session.
#[derive(Debug, Default)]
#[allow(clippy::module_name_repetitions)]
pub struct ResultCache {
    entries: HashMap<CacheKey, MoviePage>,
}

impl ResultCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a page.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<&MoviePage> {
        self.entries.get(key)
    }

    /// Stores a page, replacing any previous entry for `key`.
    pub fn put(&mut self, key: CacheKey, page: MoviePage) {
        self.entries.insert(key, page);
    }

    /// Number of cached pages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
