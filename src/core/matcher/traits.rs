//! Similarity search trait definitions.

use super::{find_similar_with_events, MatchOutcome};
use crate::core::catalog::CatalogItem;
use crate::core::hasher::{Fingerprint, HashAlgorithmKind};
use crate::events::{null_sender, EventSender};

/// Strategy for finding the catalog items closest to a query
///
/// Callers depend on this contract rather than on the scan itself, so an
/// indexed implementation can replace the linear scan for large catalogs.
pub trait SimilaritySearch: Send + Sync {
    /// Ranked matches, best first, at most `max_results`
    fn find_similar(
        &self,
        query: &Fingerprint,
        algorithm: HashAlgorithmKind,
        max_results: usize,
    ) -> MatchOutcome {
        self.find_similar_with_events(query, algorithm, max_results, &null_sender())
    }

    /// Same as `find_similar`, reporting skipped entries through `events`
    fn find_similar_with_events(
        &self,
        query: &Fingerprint,
        algorithm: HashAlgorithmKind,
        max_results: usize,
        events: &EventSender,
    ) -> MatchOutcome;

    /// Number of catalog items searched
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Exhaustive O(N) scan over a borrowed catalog snapshot
pub struct LinearScan<'a> {
    items: &'a [CatalogItem],
}

impl<'a> LinearScan<'a> {
    pub fn new(items: &'a [CatalogItem]) -> Self {
        Self { items }
    }
}

impl SimilaritySearch for LinearScan<'_> {
    fn find_similar_with_events(
        &self,
        query: &Fingerprint,
        algorithm: HashAlgorithmKind,
        max_results: usize,
        events: &EventSender,
    ) -> MatchOutcome {
        find_similar_with_events(query, algorithm, self.items, max_results, events)
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}
