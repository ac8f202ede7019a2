//! # Error Module
//!
//! Typed failures for the visual search engine.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Scope every failure** - a bad query fails that query, a bad catalog
//!   entry is skipped, nothing takes the process down
//! - **User-friendly messages** - every error maps to a hint a shopper understands

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum LookalikeError {
    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Fingerprint error: {0}")]
    Fingerprint(#[from] FingerprintError),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl LookalikeError {
    /// Short message suitable for showing to the person who made the query.
    pub fn user_message(&self) -> String {
        match self {
            LookalikeError::Ingest(IngestError::DecodeFailure { .. })
            | LookalikeError::Hash(_) => {
                "Could not process the image. Please try a different file or URL.".to_string()
            }
            LookalikeError::Ingest(IngestError::FetchFailure { .. }) => {
                "Could not retrieve the image. Check the URL and try again.".to_string()
            }
            LookalikeError::Ingest(IngestError::Unreadable { path, .. }) => {
                format!("Could not read {}.", path.display())
            }
            LookalikeError::Catalog(CatalogError::Unavailable { .. }) => {
                "Product catalog not found. Add products with `lookalike add` first.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Errors that occur while turning a query image into pixels
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Unrecognized or corrupt image from {origin}: {reason}")]
    DecodeFailure { origin: String, reason: String },

    #[error("Could not fetch {url}: {reason}")]
    FetchFailure { url: String, reason: String },

    #[error("Failed to read image file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur during hash computation
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },

    #[error("Unsupported hash size {size} (use 8, 16 or 32)")]
    UnsupportedHashSize { size: u32 },

    #[error("Hash computation failed: {0}")]
    ComputationFailed(String),
}

/// Errors in the stored or supplied fingerprint data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FingerprintError {
    #[error("Malformed fingerprint {value:?}: {reason}")]
    Malformed { value: String, reason: String },

    #[error("Fingerprint width mismatch: {left} bits vs {right} bits")]
    WidthMismatch { left: u32, right: u32 },

    #[error("Fingerprint made with {stored:?}, query hashed with {query:?}")]
    AlgorithmMismatch { query: String, stored: String },
}

/// Errors in caller-supplied query parameters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("Invalid {name}: {value} (expected {expected})")]
    InvalidParameter {
        name: &'static str,
        value: i64,
        expected: &'static str,
    },
}

/// Errors that occur with the catalog store
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Catalog not found at {location}. Build the catalog (e.g. `lookalike add`) before searching.")]
    Unavailable { location: String },

    #[error("Failed to open catalog at {path}: {reason}")]
    OpenFailed { path: PathBuf, reason: String },

    #[error("Catalog query failed: {0}")]
    QueryFailed(String),

    #[error("Catalog lock poisoned at {location}. Restart the process and try again.")]
    Corrupted { location: String },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, LookalikeError>;
