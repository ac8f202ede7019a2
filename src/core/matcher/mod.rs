//! # Matcher Module
//!
//! Ranks catalog items against a query fingerprint.
//!
//! ## Algorithm
//! 1. Decode each item's stored fingerprint; entries that are malformed,
//!    of another width, or made by another algorithm are skipped and
//!    recorded, never fatal
//! 2. Score every remaining item with the distance scorer
//! 3. Stable sort by score, highest first (ties keep catalog order)
//! 4. Keep the top `max_results`
//!
//! The minimum-score filter is a separate step, [`apply_min_score`],
//! applied to the ranked list. The scan is a pure function of the query,
//! the snapshot and the parameters.

mod traits;

pub use traits::{LinearScan, SimilaritySearch};

use crate::core::catalog::CatalogItem;
use crate::core::hasher::{Fingerprint, HashAlgorithmKind};
use crate::core::scorer::score_from_distance;
use crate::error::{FingerprintError, QueryError};
use crate::events::{null_sender, Event, EventSender, MatchEvent};
use serde::{Serialize, Serializer};
use tracing::{debug, trace};

/// Default inclusive score floor
pub const DEFAULT_MIN_SCORE: u8 = 50;

/// Default result cap
pub const DEFAULT_MAX_RESULTS: usize = 24;

/// A catalog item scored against a query
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredMatch {
    /// The matched product
    pub item: CatalogItem,
    /// Similarity score, 0-100
    pub score: u8,
    /// Hamming distance to the query
    pub distance: u32,
}

/// A catalog entry left out of the ranking
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedEntry {
    /// Id of the offending item
    pub id: i64,
    /// Why it could not be scored
    #[serde(serialize_with = "serialize_display")]
    pub error: FingerprintError,
}

fn serialize_display<S: Serializer>(error: &FingerprintError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Result of one catalog scan
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MatchOutcome {
    /// Ranked matches, best first, at most `max_results`
    pub matches: Vec<ScoredMatch>,
    /// Items examined
    pub scanned: usize,
    /// Items that could not be scored
    pub skipped: Vec<SkippedEntry>,
}

/// Validated query parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QueryParams {
    min_score: u8,
    max_results: usize,
}

impl QueryParams {
    /// Validate caller-supplied parameters.
    ///
    /// `min_score` must be within 0..=100 and `max_results` at least 1.
    /// Out-of-range values are rejected, not clamped.
    pub fn new(min_score: i64, max_results: i64) -> Result<Self, QueryError> {
        if !(0..=100).contains(&min_score) {
            return Err(QueryError::InvalidParameter {
                name: "min_score",
                value: min_score,
                expected: "an integer between 0 and 100",
            });
        }

        if max_results <= 0 {
            return Err(QueryError::InvalidParameter {
                name: "max_results",
                value: max_results,
                expected: "a positive integer",
            });
        }

        Ok(Self {
            min_score: min_score as u8,
            max_results: usize::try_from(max_results).unwrap_or(usize::MAX),
        })
    }

    pub fn min_score(&self) -> u8 {
        self.min_score
    }

    pub fn max_results(&self) -> usize {
        self.max_results
    }
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            min_score: DEFAULT_MIN_SCORE,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

/// A query fingerprint together with its parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchQuery {
    pub fingerprint: Fingerprint,
    /// Algorithm the query was hashed with
    pub algorithm: HashAlgorithmKind,
    pub params: QueryParams,
}

impl MatchQuery {
    pub fn new(fingerprint: Fingerprint, algorithm: HashAlgorithmKind, params: QueryParams) -> Self {
        Self {
            fingerprint,
            algorithm,
            params,
        }
    }

    /// Rank `catalog` and apply the score floor
    pub fn run(&self, catalog: &[CatalogItem]) -> MatchOutcome {
        self.run_with_events(catalog, &null_sender())
    }

    /// Rank `catalog` and apply the score floor, reporting progress
    pub fn run_with_events(&self, catalog: &[CatalogItem], events: &EventSender) -> MatchOutcome {
        let mut outcome = find_similar_with_events(
            &self.fingerprint,
            self.algorithm,
            catalog,
            self.params.max_results,
            events,
        );
        outcome.matches = apply_min_score(outcome.matches, self.params.min_score);
        outcome
    }
}

/// Rank `catalog` by similarity to `query`, best first, keeping at most
/// `max_results`.
///
/// Only entries tagged with `algorithm` are comparable to the query.
pub fn find_similar(
    query: &Fingerprint,
    algorithm: HashAlgorithmKind,
    catalog: &[CatalogItem],
    max_results: usize,
) -> MatchOutcome {
    find_similar_with_events(query, algorithm, catalog, max_results, &null_sender())
}

/// [`find_similar`] with skipped entries reported through `events`
pub fn find_similar_with_events(
    query: &Fingerprint,
    algorithm: HashAlgorithmKind,
    catalog: &[CatalogItem],
    max_results: usize,
    events: &EventSender,
) -> MatchOutcome {
    events.send(Event::Match(MatchEvent::Started {
        catalog_size: catalog.len(),
    }));

    let mut matches = Vec::with_capacity(catalog.len());
    let mut skipped = Vec::new();

    for item in catalog {
        match score_item(query, algorithm, item) {
            Ok(scored) => matches.push(scored),
            Err(error) => {
                trace!(id = item.id, error = %error, "Skipping catalog entry");
                events.send(Event::Match(MatchEvent::EntrySkipped {
                    id: item.id,
                    reason: error.to_string(),
                }));
                skipped.push(SkippedEntry { id: item.id, error });
            }
        }
    }

    // Stable: equal scores keep catalog order
    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches.truncate(max_results);

    debug!(
        scanned = catalog.len(),
        ranked = matches.len(),
        skipped = skipped.len(),
        "Catalog scan complete"
    );

    events.send(Event::Match(MatchEvent::Completed {
        ranked: matches.len(),
        skipped: skipped.len(),
    }));

    MatchOutcome {
        matches,
        scanned: catalog.len(),
        skipped,
    }
}

fn score_item(
    query: &Fingerprint,
    algorithm: HashAlgorithmKind,
    item: &CatalogItem,
) -> Result<ScoredMatch, FingerprintError> {
    if !algorithm.matches_tag(&item.algorithm) {
        return Err(FingerprintError::AlgorithmMismatch {
            query: algorithm.as_str().to_string(),
            stored: item.algorithm.clone(),
        });
    }

    let stored = item.decode_fingerprint()?;
    let distance = query.distance(&stored)?;

    Ok(ScoredMatch {
        item: item.clone(),
        score: score_from_distance(distance, query.bit_width()),
        distance,
    })
}

/// Keep matches scoring at least `min_score`, preserving order
pub fn apply_min_score(matches: Vec<ScoredMatch>, min_score: u8) -> Vec<ScoredMatch> {
    matches
        .into_iter()
        .filter(|m| m.score >= min_score)
        .collect()
}
