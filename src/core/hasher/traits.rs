//! Trait definitions for perceptual hashing.

use super::Fingerprint;
use crate::error::HashError;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Available hash algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithmKind {
    /// Perceptual Hash (pHash) - DCT-based, what catalogs are built with
    #[default]
    Perceptual,
    /// Difference Hash (dHash) - Brightness gradients between neighbours
    Difference,
    /// Average Hash (aHash) - Brightness against the mean
    Average,
}

impl HashAlgorithmKind {
    /// Tag stored next to catalog fingerprints
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithmKind::Perceptual => "perceptual",
            HashAlgorithmKind::Difference => "difference",
            HashAlgorithmKind::Average => "average",
        }
    }

    /// Whether a stored tag names this algorithm (case-insensitive)
    pub fn matches_tag(&self, tag: &str) -> bool {
        self.as_str().eq_ignore_ascii_case(tag)
    }
}

impl std::fmt::Display for HashAlgorithmKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashAlgorithmKind::Perceptual => write!(f, "pHash"),
            HashAlgorithmKind::Difference => write!(f, "dHash"),
            HashAlgorithmKind::Average => write!(f, "aHash"),
        }
    }
}

/// Trait for hash algorithm implementations
///
/// Implementations must be pure: the same pixels always give the same
/// fingerprint.
pub trait HashAlgorithm: Send + Sync {
    /// Compute a fingerprint from an already-decoded image
    fn hash_image(&self, image: &DynamicImage) -> Result<Fingerprint, HashError>;

    /// Get the algorithm kind
    fn kind(&self) -> HashAlgorithmKind;

    /// Width of the fingerprints this algorithm produces
    fn bit_width(&self) -> u32;
}
