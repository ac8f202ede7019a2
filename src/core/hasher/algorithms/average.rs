//! Average Hash (aHash) implementation.
//!
//! aHash works by:
//! 1. Resizing the image to hash_size x hash_size
//! 2. Converting to grayscale
//! 3. Computing the average brightness
//! 4. For each pixel: if brighter than average, set bit to 1, else 0
//!
//! The fastest hash but the least robust to edits. Backed by the
//! image_hasher crate's mean hash.

use super::super::traits::{HashAlgorithm, HashAlgorithmKind};
use super::super::Fingerprint;
use crate::error::HashError;
use image::{DynamicImage, GenericImageView};
use image_hasher::{HashAlg, HasherConfig as ImageHasherConfig};

/// Average Hash (aHash) implementation
pub struct AverageHasher {
    hash_size: u32,
    /// Internal hasher from image_hasher crate
    hasher: image_hasher::Hasher,
}

impl AverageHasher {
    /// Create a new aHash hasher
    pub fn new(hash_size: u32) -> Self {
        let hasher = ImageHasherConfig::new()
            .hash_size(hash_size, hash_size)
            .hash_alg(HashAlg::Mean)
            .to_hasher();

        Self { hash_size, hasher }
    }
}

impl HashAlgorithm for AverageHasher {
    fn hash_image(&self, image: &DynamicImage) -> Result<Fingerprint, HashError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(HashError::EmptyImage { width, height });
        }

        let hash = self.hasher.hash_image(image);
        let bytes = hash.as_bytes().to_vec();

        if bytes.len() * 8 != self.bit_width() as usize {
            return Err(HashError::ComputationFailed(format!(
                "mean hash produced {} bytes, expected {}",
                bytes.len(),
                self.bit_width() / 8
            )));
        }

        Ok(Fingerprint::from_bytes(bytes))
    }

    fn kind(&self) -> HashAlgorithmKind {
        HashAlgorithmKind::Average
    }

    fn bit_width(&self) -> u32 {
        self.hash_size * self.hash_size
    }
}
