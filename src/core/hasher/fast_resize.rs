//! Grayscale conversion and SIMD-accelerated resizing for the hashers.
//!
//! Grayscale uses the ITU-R 601-2 luma transform in the same fixed-point
//! form as PIL's `convert("L")`, so fingerprints line up with catalogs
//! built by the Python indexer. Resizing uses fast_image_resize, which picks
//! AVX2/NEON when available.

use crate::error::HashError;
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};

/// Fast image resizer using SIMD acceleration
pub struct FastResizer {
    resizer: Resizer,
}

impl FastResizer {
    /// Create a new fast resizer
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }

    /// Convert an image to grayscale and resize it to the given grid.
    ///
    /// Grayscale conversion happens first; it is cheaper than resizing RGB.
    /// An image already at the target size is returned unresampled.
    pub fn resize_to_grayscale(
        &mut self,
        image: &DynamicImage,
        width: u32,
        height: u32,
        filter: FilterType,
    ) -> Result<GrayImage, HashError> {
        let gray = rec601_luma(image);

        let src_width = gray.width();
        let src_height = gray.height();

        if src_width == 0 || src_height == 0 {
            return Err(HashError::EmptyImage {
                width: src_width,
                height: src_height,
            });
        }

        if width == 0 || height == 0 {
            return Err(HashError::ComputationFailed(format!(
                "invalid destination size {}x{}",
                width, height
            )));
        }

        if src_width == width && src_height == height {
            return Ok(gray);
        }

        let src_image = Image::from_vec_u8(src_width, src_height, gray.into_raw(), PixelType::U8)
            .map_err(|e| {
                HashError::ComputationFailed(format!("Failed to create source image: {}", e))
            })?;

        let mut dst_image = Image::new(width, height, PixelType::U8);

        let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(filter));

        self.resizer
            .resize(&src_image, &mut dst_image, &options)
            .map_err(|e| HashError::ComputationFailed(format!("Resize failed: {}", e)))?;

        let result_buffer: ImageBuffer<Luma<u8>, Vec<u8>> =
            ImageBuffer::from_raw(width, height, dst_image.into_vec()).ok_or_else(|| {
                HashError::ComputationFailed("Failed to create result buffer".to_string())
            })?;

        Ok(result_buffer)
    }
}

impl Default for FastResizer {
    fn default() -> Self {
        Self::new()
    }
}

/// 8-bit luma as `(r*19595 + g*38470 + b*7471 + 0x8000) >> 16`.
///
/// Alpha is ignored. This differs from `DynamicImage::to_luma8`, which uses
/// Rec. 709 weights and would move a few bits of every colour fingerprint.
pub fn rec601_luma(image: &DynamicImage) -> GrayImage {
    let rgb = image.to_rgb8();
    let (width, height) = rgb.dimensions();
    let pixels = rgb
        .pixels()
        .map(|p| {
            let [r, g, b] = p.0.map(u32::from);
            ((r * 19595 + g * 38470 + b * 7471 + 0x8000) >> 16) as u8
        })
        .collect();

    ImageBuffer::from_raw(width, height, pixels).unwrap_or_else(|| GrayImage::new(width, height))
}

/// Convenience function for one-off resizing
pub fn resize_to_grayscale(
    image: &DynamicImage,
    width: u32,
    height: u32,
    filter: FilterType,
) -> Result<GrayImage, HashError> {
    let mut resizer = FastResizer::new();
    resizer.resize_to_grayscale(image, width, height, filter)
}
