//! Image decoding with format-specific fast paths.
//!
//! JPEG goes through zune-jpeg (noticeably faster than the image crate's
//! decoder) and falls back to the image crate when zune rejects the file.
//! Everything else is decoded by the image crate. Every result is
//! canonicalised to 8-bit RGB.

use crate::error::IngestError;
use image::{DynamicImage, GenericImageView, ImageBuffer, ImageFormat, Luma, Rgb, Rgba};
use zune_core::colorspace::ColorSpace;
use zune_core::options::DecoderOptions;
use zune_jpeg::JpegDecoder;

/// Decodes raw bytes into canonical RGB pixels
pub struct ImageDecoder;

impl ImageDecoder {
    /// Decode `bytes` and convert the result to 8-bit RGB.
    ///
    /// `origin` names where the bytes came from and only feeds error
    /// messages.
    pub fn decode(bytes: &[u8], origin: &str) -> Result<DynamicImage, IngestError> {
        let format = image::guess_format(bytes).map_err(|e| IngestError::DecodeFailure {
            origin: origin.to_string(),
            reason: e.to_string(),
        })?;

        let decoded = match format {
            ImageFormat::Jpeg => Self::decode_jpeg(bytes, origin)
                .or_else(|_| Self::decode_fallback(bytes, format, origin))?,
            _ => Self::decode_fallback(bytes, format, origin)?,
        };

        canonicalize(decoded, origin)
    }

    /// Fast JPEG decoding using zune-jpeg
    fn decode_jpeg(bytes: &[u8], origin: &str) -> Result<DynamicImage, IngestError> {
        let options = DecoderOptions::new_fast().jpeg_set_out_colorspace(ColorSpace::RGB);
        let mut decoder = JpegDecoder::new_with_options(bytes, options);

        let pixels = decoder.decode().map_err(|e| IngestError::DecodeFailure {
            origin: origin.to_string(),
            reason: format!("zune-jpeg decode failed: {:?}", e),
        })?;

        let info = decoder.info().ok_or_else(|| IngestError::DecodeFailure {
            origin: origin.to_string(),
            reason: "JPEG header carried no image info".to_string(),
        })?;

        let width = info.width as u32;
        let height = info.height as u32;

        let buffer_error = |kind: &str| IngestError::DecodeFailure {
            origin: origin.to_string(),
            reason: format!("decoded {} buffer does not match {}x{}", kind, width, height),
        };

        // The decoder may ignore the requested colorspace for some inputs
        let image = match decoder.get_output_colorspace().unwrap_or(ColorSpace::RGB) {
            ColorSpace::RGB => DynamicImage::ImageRgb8(
                ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, pixels)
                    .ok_or_else(|| buffer_error("RGB"))?,
            ),
            ColorSpace::RGBA => DynamicImage::ImageRgba8(
                ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, pixels)
                    .ok_or_else(|| buffer_error("RGBA"))?,
            ),
            ColorSpace::Luma => DynamicImage::ImageLuma8(
                ImageBuffer::<Luma<u8>, _>::from_raw(width, height, pixels)
                    .ok_or_else(|| buffer_error("Luma"))?,
            ),
            other => {
                return Err(IngestError::DecodeFailure {
                    origin: origin.to_string(),
                    reason: format!("unsupported JPEG colorspace {:?}", other),
                })
            }
        };

        Ok(image)
    }

    /// Decode with the image crate
    fn decode_fallback(
        bytes: &[u8],
        format: ImageFormat,
        origin: &str,
    ) -> Result<DynamicImage, IngestError> {
        image::load_from_memory_with_format(bytes, format).map_err(|e| {
            IngestError::DecodeFailure {
                origin: origin.to_string(),
                reason: e.to_string(),
            }
        })
    }
}

/// Normalise grayscale, 16-bit, float and alpha-bearing images to 8-bit
/// RGB. Alpha is dropped.
pub fn canonicalize(image: DynamicImage, origin: &str) -> Result<DynamicImage, IngestError> {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(IngestError::DecodeFailure {
            origin: origin.to_string(),
            reason: format!("image has no pixels ({}x{})", width, height),
        });
    }

    Ok(match image {
        DynamicImage::ImageRgb8(_) => image,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    })
}
