//! # Core Module
//!
//! The front-end agnostic visual search engine.
//!
//! ## Modules
//! - `hasher` - Computes perceptual fingerprints
//! - `scorer` - Maps fingerprint distance to a 0-100 score
//! - `matcher` - Ranks catalog items against a query
//! - `ingest` - Turns bytes, files and URLs into fingerprints
//! - `catalog` - Stores the products being searched
//! - `search` - Orchestrates the full workflow

pub mod catalog;
pub mod hasher;
pub mod ingest;
pub mod matcher;
pub mod scorer;
pub mod search;

// Re-export commonly used types
pub use catalog::{CatalogItem, CatalogStore, InMemoryCatalog, SqliteCatalog};
pub use hasher::{Fingerprint, HashAlgorithmKind};
pub use ingest::{ImageIngestor, ImageSource};
pub use matcher::{MatchOutcome, QueryParams, ScoredMatch};
pub use scorer::{Similarity, SimilarityBand};
pub use search::{SearchEngine, SearchRequest, SearchResult};
