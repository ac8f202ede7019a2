//! # Catalog Module
//!
//! The product catalog the matcher scans.
//!
//! Each item carries its fingerprint as stored text, tagged with the
//! algorithm that produced it. Decoding happens at match time so one
//! corrupt row never prevents the rest of the catalog from loading.
//!
//! ## Backends
//! - `SqliteCatalog` - Persistent storage using SQLite
//! - `InMemoryCatalog` - For tests and embedding

mod memory;
mod sqlite;
mod traits;

pub use memory::InMemoryCatalog;
pub use sqlite::SqliteCatalog;
pub use traits::CatalogStore;

use crate::core::hasher::{Fingerprint, HashAlgorithmKind};
use crate::error::FingerprintError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A product in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Unique product id
    pub id: i64,
    /// Display name
    pub name: String,
    /// Category label
    pub category: String,
    /// Canonical image reference (URL or path)
    pub image_url: String,
    /// Price in the catalog currency
    pub price: f64,
    /// Fingerprint as stored (lowercase hex)
    pub fingerprint: String,
    /// Algorithm tag as stored; rows without one were written by the
    /// pHash indexer
    #[serde(default = "default_algorithm_tag")]
    pub algorithm: String,
}

fn default_algorithm_tag() -> String {
    HashAlgorithmKind::Perceptual.as_str().to_string()
}

impl CatalogItem {
    /// Create an item from a computed fingerprint
    pub fn new(
        id: i64,
        name: impl Into<String>,
        category: impl Into<String>,
        image_url: impl Into<String>,
        price: f64,
        fingerprint: &Fingerprint,
        algorithm: HashAlgorithmKind,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            category: category.into(),
            image_url: image_url.into(),
            price,
            fingerprint: fingerprint.to_hex(),
            algorithm: algorithm.as_str().to_string(),
        }
    }

    /// Decode the stored fingerprint
    pub fn decode_fingerprint(&self) -> Result<Fingerprint, FingerprintError> {
        Fingerprint::from_hex(&self.fingerprint)
    }
}

/// Default location of the catalog database
pub fn default_catalog_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lookalike")
        .join("products.db")
}
