//! # Scorer Module
//!
//! Turns the Hamming distance between two fingerprints into a 0-100 score.
//!
//! The mapping is linear and pinned: `round(100 * (1 - distance / bits))`,
//! rounding halves to even, clamped to [0, 100]. Minimum-score filtering
//! downstream depends on these exact values.
//!
//! | Distance (64 bits) | Score |
//! |--------------------|-------|
//! | 0                  | 100   |
//! | 8                  | 88    |
//! | 24                 | 62    |
//! | 32                 | 50    |
//! | 64                 | 0     |

use crate::core::hasher::Fingerprint;
use crate::error::FingerprintError;
use serde::{Deserialize, Serialize};

/// Highest possible score
pub const MAX_SCORE: u8 = 100;

/// Hamming distance between two fingerprints of equal width
pub fn distance(a: &Fingerprint, b: &Fingerprint) -> Result<u32, FingerprintError> {
    a.distance(b)
}

/// Map a Hamming distance onto a 0-100 similarity score.
///
/// Computed in integer arithmetic so ties round the same way on every
/// platform (half to even, e.g. 87.5 -> 88 and 62.5 -> 62).
pub fn score_from_distance(distance: u32, bit_width: u32) -> u8 {
    if bit_width == 0 {
        return MAX_SCORE;
    }

    let matching = u64::from(bit_width.saturating_sub(distance));
    let width = u64::from(bit_width);

    let numerator = 100 * matching;
    let quotient = numerator / width;
    let remainder = numerator % width;

    let rounded = match (2 * remainder).cmp(&width) {
        std::cmp::Ordering::Greater => quotient + 1,
        std::cmp::Ordering::Equal => quotient + (quotient & 1),
        std::cmp::Ordering::Less => quotient,
    };

    rounded.min(u64::from(MAX_SCORE)) as u8
}

/// Coarse similarity classes for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimilarityBand {
    /// Score 100
    Identical,
    /// Score 90-99
    NearIdentical,
    /// Score 75-89
    Similar,
    /// Score 50-74
    Weak,
    /// Score below 50
    Unrelated,
}

impl SimilarityBand {
    /// Classify a score
    pub fn from_score(score: u8) -> Self {
        match score {
            100..=u8::MAX => SimilarityBand::Identical,
            90..=99 => SimilarityBand::NearIdentical,
            75..=89 => SimilarityBand::Similar,
            50..=74 => SimilarityBand::Weak,
            _ => SimilarityBand::Unrelated,
        }
    }
}

impl std::fmt::Display for SimilarityBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimilarityBand::Identical => write!(f, "Identical"),
            SimilarityBand::NearIdentical => write!(f, "Near-Identical"),
            SimilarityBand::Similar => write!(f, "Similar"),
            SimilarityBand::Weak => write!(f, "Weak Match"),
            SimilarityBand::Unrelated => write!(f, "Unrelated"),
        }
    }
}

/// Distance and score of one fingerprint pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Similarity {
    pub distance: u32,
    pub bit_width: u32,
    pub score: u8,
    pub band: SimilarityBand,
}

/// Compare two fingerprints
pub fn similarity(a: &Fingerprint, b: &Fingerprint) -> Result<Similarity, FingerprintError> {
    let distance = a.distance(b)?;
    let bit_width = a.bit_width();
    let score = score_from_distance(distance, bit_width);

    Ok(Similarity {
        distance,
        bit_width,
        score,
        band: SimilarityBand::from_score(score),
    })
}
