//! Infinite-scroll state machine.

/// Phase of the list slot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PaginationPhase {
    /// Nothing in flight; more pages may be available.
    #[default]
    Idle,
    /// First page of a new query in flight (full skeleton).
    Loading,
    /// Next page in flight (trailing spinner).
    LoadingMore,
    /// No further pages for this query.
    Exhausted,
}

/// Page counters plus the phase they drive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pagination {
    phase: PaginationPhase,
    page: u32,
    total_pages: u32,
    has_more: bool,
}

impl Pagination {
    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> PaginationPhase {
        self.phase
    }

    /// Last committed page (0 before the first fetch).
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Total pages reported by the last committed response.
    #[must_use]
    pub const fn total_pages(&self) -> u32 {
        self.total_pages
    }

    /// Whether another page exists after `page`.
    #[must_use]
    pub const fn has_more(&self) -> bool {
        self.has_more
    }

    /// Whether any fetch is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(
            self.phase,
            PaginationPhase::Loading | PaginationPhase::LoadingMore
        )
    }

    /// Query change: a page-1 fetch starts.
    pub const fn begin_reset(&mut self) {
        self.phase = PaginationPhase::Loading;
    }

    /// Sentinel trigger: an append fetch starts.
    pub const fn begin_more(&mut self) {
        self.phase = PaginationPhase::LoadingMore;
    }

    /// A response for `page` was committed.
    pub const fn commit(&mut self, page: u32, total_pages: u32) {
        self.page = page;
        self.total_pages = total_pages;
        self.has_more = page < total_pages;
        self.settle();
    }

    /// A fetch failed; counters stay, the phase leaves loading.
    pub const fn fail(&mut self) {
        self.settle();
    }

    /// Disables further appends until the next query change.
    pub const fn exhaust(&mut self) {
        self.has_more = false;
        self.phase = PaginationPhase::Exhausted;
    }

    /// Page to request when the scroll sentinel is visible, if a load may start.
    #[must_use]
    pub fn next_page(&self) -> Option<u32> {
        if self.phase == PaginationPhase::Idle && self.has_more {
            self.page.checked_add(1)
        } else {
            None
        }
    }

    const fn settle(&mut self) {
        self.phase = if self.has_more {
            PaginationPhase::Idle
        } else {
            PaginationPhase::Exhausted
        };
    }
}
