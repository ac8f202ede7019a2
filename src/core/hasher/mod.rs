//! # Hasher Module
//!
//! Turns decoded images into fixed-width perceptual fingerprints.
//!
//! ## Supported Algorithms
//! - **pHash (Perceptual Hash)** - DCT-based, the catalog default
//! - **dHash (Difference Hash)** - Brightness gradients
//! - **aHash (Average Hash)** - Brightness against the mean
//!
//! ## How It Works
//! 1. Convert to grayscale and resize to a small grid
//! 2. Derive one bit per grid cell (or DCT coefficient)
//! 3. Pack the bits into a [`Fingerprint`], shown as lowercase hex
//!
//! ## Example
//! ```rust,ignore
//! use lookalike::core::hasher::{HasherConfig, HashAlgorithmKind};
//!
//! let hasher = HasherConfig::new()
//!     .algorithm(HashAlgorithmKind::Perceptual)
//!     .build()?;
//!
//! let fingerprint = hasher.hash_image(&image)?;
//! println!("{}", fingerprint); // e.g. "c3d1e0f0b0a09080"
//! ```

mod algorithms;
pub mod fast_resize;
mod fingerprint;
mod traits;

pub use algorithms::{AverageHasher, DifferenceHasher, PerceptualHasher};
pub use fingerprint::Fingerprint;
pub use traits::{HashAlgorithm, HashAlgorithmKind};

use crate::error::HashError;

/// Hash sizes the algorithms support
const SUPPORTED_HASH_SIZES: [u32; 3] = [8, 16, 32];

/// Configuration builder for hashers
#[derive(Debug, Clone)]
pub struct HasherConfig {
    /// Hash size (8, 16, or 32)
    hash_size: u32,
    /// Algorithm to use
    algorithm: HashAlgorithmKind,
}

impl HasherConfig {
    /// Create a new hasher configuration with defaults
    pub fn new() -> Self {
        Self {
            hash_size: 8,
            algorithm: HashAlgorithmKind::Perceptual,
        }
    }

    /// Set the hash size (8, 16, or 32)
    ///
    /// - 8: 64 bits, what catalogs store
    /// - 16: 256 bits
    /// - 32: 1024 bits
    pub fn hash_size(mut self, size: u32) -> Self {
        self.hash_size = size;
        self
    }

    /// Set the hash algorithm
    pub fn algorithm(mut self, algorithm: HashAlgorithmKind) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Build the hasher
    pub fn build(self) -> Result<Box<dyn HashAlgorithm>, HashError> {
        if !SUPPORTED_HASH_SIZES.contains(&self.hash_size) {
            return Err(HashError::UnsupportedHashSize {
                size: self.hash_size,
            });
        }

        match self.algorithm {
            HashAlgorithmKind::Perceptual => Ok(Box::new(PerceptualHasher::new(self.hash_size))),
            HashAlgorithmKind::Difference => Ok(Box::new(DifferenceHasher::new(self.hash_size))),
            HashAlgorithmKind::Average => Ok(Box::new(AverageHasher::new(self.hash_size))),
        }
    }
}

impl Default for HasherConfig {
    fn default() -> Self {
        Self::new()
    }
}
