//! Discovery and visit tracking for a single crawl
//!
//! A `CrawlState` is owned by exactly one crawl. It records which URLs have been
//! discovered (queued or visited) and which have been visited, and derives the
//! progress counts reported to observers.

use std::collections::HashSet;
use std::fmt;
use url::Url;

/// A `(visited, discovered)` progress pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressSample {
    /// Pages whose processing has finished (successfully or not)
    pub visited: u64,

    /// URLs discovered so far, including in-flight and not-yet-fetched pages
    pub discovered: u64,
}

impl ProgressSample {
    /// Fraction of discovered pages that have been visited, in `0.0..=1.0`
    pub fn ratio(&self) -> f64 {
        if self.discovered == 0 {
            return 0.0;
        }
        self.visited as f64 / self.discovered as f64
    }
}

impl fmt::Display for ProgressSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.visited, self.discovered)
    }
}

/// Tracks the discovered and visited sets of one crawl
#[derive(Debug, Clone, Default)]
pub struct CrawlState {
    visited: HashSet<Url>,
    discovered: HashSet<Url>,
    visited_count: u64,
}

impl CrawlState {
    /// Creates an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a state with the seed already discovered
    pub fn seeded(seed: &Url) -> Self {
        let mut state = Self::new();
        state.mark_discovered(seed);
        state
    }

    /// Records `url` as discovered
    ///
    /// Returns true iff the URL was neither discovered nor visited before.
    pub fn mark_discovered(&mut self, url: &Url) -> bool {
        if self.visited.contains(url) || self.discovered.contains(url) {
            return false;
        }
        self.discovered.insert(url.clone())
    }

    /// Claims `url` for visiting
    ///
    /// Returns true iff the URL has not been visited before. The caller must not fetch
    /// or process the page when this returns false. A URL visited without a prior
    /// discovery is discovered at the same moment, keeping `visited ⊆ discovered`.
    pub fn try_visit(&mut self, url: &Url) -> bool {
        if !self.visited.insert(url.clone()) {
            return false;
        }
        self.discovered.insert(url.clone());
        true
    }

    /// Marks one claimed page as fully processed
    pub fn complete_visit(&mut self) {
        debug_assert!(self.visited_count < self.visited.len() as u64);
        self.visited_count += 1;
    }

    /// Returns true if `url` has been claimed for visiting
    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url)
    }

    /// Returns true if `url` has been discovered
    pub fn is_discovered(&self, url: &Url) -> bool {
        self.discovered.contains(url)
    }

    /// Number of pages whose processing has finished
    pub fn visited_count(&self) -> u64 {
        self.visited_count
    }

    /// Number of discovered URLs
    pub fn discovered_count(&self) -> u64 {
        self.discovered.len() as u64
    }

    /// Current progress sample
    pub fn progress(&self) -> ProgressSample {
        ProgressSample {
            visited: self.visited_count(),
            discovered: self.discovered_count(),
        }
    }
}
