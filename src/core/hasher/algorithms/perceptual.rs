//! Perceptual Hash (pHash) implementation.
//!
//! pHash uses the Discrete Cosine Transform (DCT) to extract
//! frequency information from the image:
//! 1. Convert to grayscale (601-2 luma) and resize to (4 * hash_size) square
//! 2. Apply a 2-D DCT-II
//! 3. Keep the top-left hash_size x hash_size low-frequency block
//! 4. Set a bit for every coefficient above the block's median
//!
//! Low frequencies describe the overall structure of the picture, so the
//! hash survives scaling, recompression and small brightness changes.

use super::super::fast_resize::resize_to_grayscale;
use super::super::traits::{HashAlgorithm, HashAlgorithmKind};
use super::super::Fingerprint;
use super::pack_bits;
use crate::error::HashError;
use fast_image_resize::FilterType;
use image::DynamicImage;
use std::f64::consts::PI;

/// Oversampling factor between the DCT input and the kept block
const HIGH_FREQUENCY_FACTOR: u32 = 4;

/// Perceptual Hash (pHash) implementation using DCT
pub struct PerceptualHasher {
    /// Side of the kept low-frequency block
    hash_size: u32,
    /// Side of the grayscale sample fed to the DCT
    sample_size: u32,
    /// cos(pi * k * (2i + 1) / 2n), indexed [k * n + i] for k < hash_size
    cosines: Vec<f64>,
}

impl PerceptualHasher {
    /// Create a new pHash hasher
    pub fn new(hash_size: u32) -> Self {
        let sample_size = hash_size * HIGH_FREQUENCY_FACTOR;
        let n = sample_size as usize;
        let keep = hash_size as usize;

        let mut cosines = Vec::with_capacity(keep * n);
        for k in 0..keep {
            for i in 0..n {
                cosines.push((PI * k as f64 * (2 * i + 1) as f64 / (2 * n) as f64).cos());
            }
        }

        Self {
            hash_size,
            sample_size,
            cosines,
        }
    }

    /// Low-frequency DCT-II block of a square grayscale sample, row-major.
    ///
    /// Unnormalized; a positive scale factor does not change the hash.
    fn low_frequency_block(&self, pixels: &[f64]) -> Vec<f64> {
        let n = self.sample_size as usize;
        let keep = self.hash_size as usize;

        // Transform each row, keeping only the first `keep` columns.
        let mut rows = vec![0.0; n * keep];
        for y in 0..n {
            let row = &pixels[y * n..(y + 1) * n];
            for kx in 0..keep {
                let basis = &self.cosines[kx * n..(kx + 1) * n];
                rows[y * keep + kx] = row.iter().zip(basis).map(|(p, c)| p * c).sum();
            }
        }

        // Then each kept column, keeping only the first `keep` rows.
        let mut block = vec![0.0; keep * keep];
        for ky in 0..keep {
            let basis = &self.cosines[ky * n..(ky + 1) * n];
            for kx in 0..keep {
                block[ky * keep + kx] = (0..n).map(|y| rows[y * keep + kx] * basis[y]).sum();
            }
        }

        block
    }
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

impl HashAlgorithm for PerceptualHasher {
    fn hash_image(&self, image: &DynamicImage) -> Result<Fingerprint, HashError> {
        let gray = resize_to_grayscale(
            image,
            self.sample_size,
            self.sample_size,
            FilterType::Lanczos3,
        )?;

        let pixels: Vec<f64> = gray.as_raw().iter().map(|&p| p as f64).collect();
        let block = self.low_frequency_block(&pixels);
        let threshold = median(&block);

        Ok(Fingerprint::from_bytes(pack_bits(
            block.iter().map(|&coefficient| coefficient > threshold),
        )))
    }

    fn kind(&self) -> HashAlgorithmKind {
        HashAlgorithmKind::Perceptual
    }

    fn bit_width(&self) -> u32 {
        self.hash_size * self.hash_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    /// Smooth synthetic scene sampled on a `size` grid covering the same picture
    fn create_texture(size: u32, offset: u8) -> DynamicImage {
        let scale = 256.0 / size as f64;
        let img = ImageBuffer::from_fn(size, size, |x, y| {
            let (fx, fy) = (x as f64 * scale, y as f64 * scale);
            let value = 128.0
                + 40.0 * (fx / 20.0).sin()
                + 30.0 * (fy / 30.0).cos()
                + 20.0 * ((fx + fy) / 25.0).sin();
            let v = (value.round() as u8).saturating_add(offset);
            Rgb([v, v, v])
        });
        DynamicImage::ImageRgb8(img)
    }

    /// Gaussian blobs on a gradient, laid out by a seeded LCG
    fn create_scene(seed: u32, size: u32) -> DynamicImage {
        let mut state = seed.wrapping_mul(2_654_435_761);
        let mut next = || {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            state as f64 / 4_294_967_296.0
        };

        let blobs: Vec<(f64, f64, f64, f64)> = (0..6)
            .map(|_| {
                (
                    next() * 256.0,
                    next() * 256.0,
                    20.0 + next() * 60.0,
                    next() * 200.0 - 100.0,
                )
            })
            .collect();
        let (gx, gy) = (next() * 2.0 - 1.0, next() * 2.0 - 1.0);

        let scale = 256.0 / size as f64;
        let img = ImageBuffer::from_fn(size, size, |x, y| {
            let (fx, fy) = (x as f64 * scale, y as f64 * scale);
            let mut value = 128.0 + gx * 40.0 * (fx / 128.0 - 1.0) + gy * 40.0 * (fy / 128.0 - 1.0);
            for &(cx, cy, radius, amplitude) in &blobs {
                let d2 = ((fx - cx).powi(2) + (fy - cy).powi(2)) / (radius * radius);
                value += amplitude * (-d2).exp();
            }
            let v = value.round().clamp(0.0, 255.0) as u8;
            Rgb([v, v, v])
        });
        DynamicImage::ImageRgb8(img)
    }

    /// Half-opacity white bar in the bottom-right corner
    fn stamp_watermark(image: &DynamicImage) -> DynamicImage {
        let mut rgb = image.to_rgb8();
        for y in 236..248 {
            for x in 208..248 {
                let pixel = rgb.get_pixel_mut(x, y);
                for channel in pixel.0.iter_mut() {
                    *channel = ((*channel as f64 + 255.0) / 2.0).round() as u8;
                }
            }
        }
        DynamicImage::ImageRgb8(rgb)
    }

    fn invert(image: &DynamicImage) -> DynamicImage {
        let mut rgb = image.to_rgb8();
        for pixel in rgb.pixels_mut() {
            for channel in pixel.0.iter_mut() {
                *channel = 255 - *channel;
            }
        }
        DynamicImage::ImageRgb8(rgb)
    }

    #[test]
    fn produces_64_bits_by_default() {
        let hasher = PerceptualHasher::new(8);
        let hash = hasher.hash_image(&create_texture(256, 0)).unwrap();

        assert_eq!(hash.bit_width(), 64);
        assert_eq!(hasher.bit_width(), 64);
    }

    #[test]
    fn identical_images_produce_identical_hash() {
        let hasher = PerceptualHasher::new(8);
        let image = create_texture(256, 0);

        let hash1 = hasher.hash_image(&image).unwrap();
        let hash2 = hasher.hash_image(&image).unwrap();

        assert_eq!(hash1, hash2);
    }

    #[test]
    fn resized_image_produces_similar_hash() {
        let hasher = PerceptualHasher::new(8);

        let large = hasher.hash_image(&create_texture(256, 0)).unwrap();
        let small = hasher.hash_image(&create_texture(128, 0)).unwrap();

        let distance = large.distance(&small).unwrap();
        assert!(distance <= 10, "resize moved {} bits", distance);
    }

    #[test]
    fn minor_crop_produces_similar_hash() {
        let hasher = PerceptualHasher::new(8);

        for seed in [1, 3] {
            let image = create_scene(seed, 256);
            let full = hasher.hash_image(&image).unwrap();
            let cropped = hasher.hash_image(&image.crop_imm(8, 8, 240, 240)).unwrap();

            let distance = full.distance(&cropped).unwrap();
            assert!(distance <= 10, "3% crop moved {} bits (scene {})", distance, seed);
        }
    }

    #[test]
    fn watermark_produces_similar_hash() {
        let hasher = PerceptualHasher::new(8);

        for seed in [1, 3] {
            let image = create_scene(seed, 256);
            let clean = hasher.hash_image(&image).unwrap();
            let marked = hasher.hash_image(&stamp_watermark(&image)).unwrap();

            let distance = clean.distance(&marked).unwrap();
            assert!(distance <= 10, "watermark moved {} bits (scene {})", distance, seed);
        }
    }

    #[test]
    fn unrelated_images_land_mid_range() {
        let hasher = PerceptualHasher::new(8);
        let hashes: Vec<_> = (1..=8)
            .map(|seed| hasher.hash_image(&create_scene(seed, 256)).unwrap())
            .collect();

        let mut distances = Vec::new();
        for i in 0..hashes.len() {
            for j in i + 1..hashes.len() {
                distances.push(hashes[i].distance(&hashes[j]).unwrap());
            }
        }

        let mean = distances.iter().sum::<u32>() as f64 / distances.len() as f64;
        assert!((24.0..=40.0).contains(&mean), "mean unrelated distance {}", mean);
        assert!(
            distances.iter().all(|d| (12..=52).contains(d)),
            "unrelated distances {:?}",
            distances
        );
    }

    #[test]
    fn matches_reference_hash_for_colour_image() {
        // 32x32 input skips resampling, so every bit is pinned down by the
        // luma transform, the DCT and the median threshold.
        let img = ImageBuffer::from_fn(32, 32, |x, y| {
            Rgb([
                ((x * x * 3 + y * 5) % 256) as u8,
                ((x * 11 + y * y * 2) % 256) as u8,
                ((x * y * 13 + 40) % 256) as u8,
            ])
        });
        let hasher = PerceptualHasher::new(8);

        let hash = hasher.hash_image(&DynamicImage::ImageRgb8(img)).unwrap();

        assert_eq!(hash.to_hex(), "800b0b1f1b5eb3f5");
    }

    #[test]
    fn brightness_shift_produces_similar_hash() {
        let hasher = PerceptualHasher::new(8);

        let base = hasher.hash_image(&create_texture(256, 0)).unwrap();
        let brighter = hasher.hash_image(&create_texture(256, 10)).unwrap();

        let distance = base.distance(&brighter).unwrap();
        assert!(distance <= 8, "brightness shift moved {} bits", distance);
    }

    #[test]
    fn inverted_image_produces_distant_hash() {
        let hasher = PerceptualHasher::new(8);
        let image = create_texture(256, 0);

        let original = hasher.hash_image(&image).unwrap();
        let inverted = hasher.hash_image(&invert(&image)).unwrap();

        let distance = original.distance(&inverted).unwrap();
        assert!(distance > 32, "inversion only moved {} bits", distance);
    }

    #[test]
    fn dct_of_constant_signal_is_dc_only() {
        let hasher = PerceptualHasher::new(8);
        let pixels = vec![100.0; 32 * 32];
        let block = hasher.low_frequency_block(&pixels);

        assert!(block[0] > 0.0);
        assert!(block[1..].iter().all(|c| c.abs() < 1e-6));
    }

    #[test]
    fn median_of_even_count_averages_middle_pair() {
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
    }

    #[test]
    fn kind_returns_perceptual() {
        let hasher = PerceptualHasher::new(8);
        assert_eq!(hasher.kind(), HashAlgorithmKind::Perceptual);
    }
}
