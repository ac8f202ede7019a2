//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// All events emitted while answering a visual search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Query image ingestion events
    Ingest(IngestEvent),
    /// Catalog matching events
    Match(MatchEvent),
    /// Search-level events
    Search(SearchEvent),
}

/// Events while turning the query image into a fingerprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IngestEvent {
    /// Ingestion has started for a source
    Started { source: String },
    /// A remote image was downloaded
    Fetched { url: String, bytes: usize },
    /// The image was decoded into canonical RGB pixels
    Decoded { width: u32, height: u32 },
    /// The query fingerprint is ready
    Hashed { fingerprint: String },
}

/// Events during the catalog scan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MatchEvent {
    /// Scan has started
    Started { catalog_size: usize },
    /// A catalog entry could not be scored and was left out
    EntrySkipped { id: i64, reason: String },
    /// Scan completed
    Completed { ranked: usize, skipped: usize },
}

/// Search-level events
///
/// Every search gets its own id so events from a parallel batch can be
/// told apart.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SearchEvent {
    /// Search has started
    Started { query_id: Uuid },
    /// Moving to a new phase
    PhaseChanged { query_id: Uuid, phase: SearchPhase },
    /// Search completed successfully
    Completed { summary: SearchSummary },
    /// Search failed; the message is safe to show the caller
    Failed { query_id: Uuid, message: String },
}

/// Phases of a search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchPhase {
    LoadingCatalog,
    Ingesting,
    Matching,
    Filtering,
}

impl std::fmt::Display for SearchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchPhase::LoadingCatalog => write!(f, "Loading catalog"),
            SearchPhase::Ingesting => write!(f, "Reading image"),
            SearchPhase::Matching => write!(f, "Matching"),
            SearchPhase::Filtering => write!(f, "Filtering"),
        }
    }
}

/// Summary of a completed search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSummary {
    /// Id of the search
    pub query_id: Uuid,
    /// Items in the catalog snapshot
    pub catalog_size: usize,
    /// Items that survived ranking (before the min-score filter)
    pub ranked: usize,
    /// Items returned to the caller
    pub returned: usize,
    /// Entries left out because their fingerprint was unusable
    pub skipped: usize,
    /// Wall-clock time in milliseconds
    pub duration_ms: u64,
}
