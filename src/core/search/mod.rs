//! # Search Module
//!
//! Orchestrates a visual search from query image to ranked results.
//!
//! ## Stages
//! 1. **Snapshot** - Read the catalog once (`CatalogError::Unavailable`
//!    stops here, before any download)
//! 2. **Ingest** - Decode the query image and fingerprint it
//! 3. **Match** - Score and rank the snapshot; entries hashed with a
//!    different algorithm than the engine's are skipped
//! 4. **Filter** - Drop matches below the score floor
//!
//! Query parameters are validated when the `QueryParams` is built, before
//! any of this runs.
//!
//! ## Parallelism
//! `search_many` runs independent queries on the rayon pool against one
//! shared read-only snapshot.

mod engine;

pub use engine::{SearchConfig, SearchEngine, SearchEngineBuilder, SearchRequest, SearchResult};
