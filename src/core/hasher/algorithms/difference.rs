//! Difference Hash (dHash) implementation.
//!
//! dHash works by:
//! 1. Resizing the image to (hash_size+1) x hash_size
//! 2. Converting to grayscale
//! 3. Comparing each pixel to the one to its right
//! 4. If left pixel is brighter, set bit to 1, else 0
//!
//! This captures the relative gradient of brightness changes.

use super::super::fast_resize::resize_to_grayscale;
use super::super::traits::{HashAlgorithm, HashAlgorithmKind};
use super::super::Fingerprint;
use super::pack_bits;
use crate::error::HashError;
use fast_image_resize::FilterType;
use image::DynamicImage;

/// Difference Hash (dHash) implementation
pub struct DifferenceHasher {
    /// Size of the hash (width and height of comparison grid)
    hash_size: u32,
}

impl DifferenceHasher {
    /// Create a new dHash hasher
    pub fn new(hash_size: u32) -> Self {
        Self { hash_size }
    }
}

impl HashAlgorithm for DifferenceHasher {
    fn hash_image(&self, image: &DynamicImage) -> Result<Fingerprint, HashError> {
        // One extra column so every cell has a right-hand neighbour
        let gray = resize_to_grayscale(
            image,
            self.hash_size + 1,
            self.hash_size,
            FilterType::Bilinear,
        )?;

        let size = self.hash_size;
        let grid = &gray;
        let bits = (0..size).flat_map(move |y| {
            (0..size).map(move |x| grid.get_pixel(x, y)[0] > grid.get_pixel(x + 1, y)[0])
        });

        Ok(Fingerprint::from_bytes(pack_bits(bits)))
    }

    fn kind(&self) -> HashAlgorithmKind {
        HashAlgorithmKind::Difference
    }

    fn bit_width(&self) -> u32 {
        self.hash_size * self.hash_size
    }
}
