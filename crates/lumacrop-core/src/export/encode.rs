//! Encoding RGBA buffers into export formats.
//!
//! Encoding goes through the [`Encoder`] trait so the export pipeline and
//! the live preview can be exercised with any codec. [`CodecEncoder`] is the
//! production implementation, backed by the `image` crate's encoders.
//!
//! # Format notes
//!
//! * PNG and TIFF are written as RGBA8.
//! * JPEG has no alpha channel; alpha is flattened onto black first.
//! * WebP is always lossless: the `image` crate only ships a lossless WebP
//!   encoder. Quality is ignored and the format reports itself as lossless,
//!   so the live preview never fakes a compression round trip for it.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::tiff::TiffEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::format::ExportFormat;

/// Default encoder quality.
pub const DEFAULT_QUALITY: u8 = 92;

/// Errors that can occur during encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Pixel data length doesn't match expected dimensions
    #[error("Invalid pixel data: expected {expected} bytes (width * height * 4), got {actual}")]
    InvalidPixelData { expected: usize, actual: usize },

    /// Width or height is zero
    #[error("Invalid dimensions: width ({width}) and height ({height}) must be non-zero")]
    InvalidDimensions { width: u32, height: u32 },

    /// The codec rejected the image
    #[error("{format} encoding failed: {message}")]
    EncodingFailed {
        format: ExportFormat,
        message: String,
    },
}

/// Parameters for one encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EncodeOptions {
    pub format: ExportFormat,
    /// JPEG quality, 1-100. Ignored by lossless formats, WebP included.
    pub quality: u8,
    /// Lossless WebP flag. WebP is encoded losslessly either way.
    pub lossless: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            quality: DEFAULT_QUALITY,
            lossless: false,
        }
    }
}

/// Turns a flat RGBA buffer into file bytes.
pub trait Encoder {
    /// Encode `pixels` (RGBA8, row-major, `width * height * 4` bytes).
    fn encode(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        options: &EncodeOptions,
    ) -> Result<Vec<u8>, EncodeError>;
}

/// [`Encoder`] backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodecEncoder;

impl Encoder for CodecEncoder {
    fn encode(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        options: &EncodeOptions,
    ) -> Result<Vec<u8>, EncodeError> {
        encode_rgba(pixels, width, height, options)
    }
}

/// Encode RGBA pixel data.
///
/// # Arguments
///
/// * `pixels` - RGBA pixel data (4 bytes per pixel, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `options` - Format, quality (clamped to 1-100) and lossless flag
///
/// # Quality Guidelines
///
/// * 90-100: High quality, suitable for archival or further editing
/// * 80-90: Good quality, recommended for most uses
/// * 60-80: Medium quality, acceptable for web/social media
/// * Below 60: Low quality, visible artifacts
pub fn encode_rgba(
    pixels: &[u8],
    width: u32,
    height: u32,
    options: &EncodeOptions,
) -> Result<Vec<u8>, EncodeError> {
    if width == 0 || height == 0 {
        return Err(EncodeError::InvalidDimensions { width, height });
    }

    let expected_len = (width as usize) * (height as usize) * 4;
    if pixels.len() != expected_len {
        return Err(EncodeError::InvalidPixelData {
            expected: expected_len,
            actual: pixels.len(),
        });
    }

    let format = options.format;
    let failed = |e: image::ImageError| EncodeError::EncodingFailed {
        format,
        message: e.to_string(),
    };

    let mut buffer = Cursor::new(Vec::new());
    match format {
        ExportFormat::Png => PngEncoder::new(&mut buffer)
            .write_image(pixels, width, height, ExtendedColorType::Rgba8)
            .map_err(failed)?,
        ExportFormat::Jpeg => {
            let quality = options.quality.clamp(1, 100);
            let rgb = flatten_onto_black(pixels);
            JpegEncoder::new_with_quality(&mut buffer, quality)
                .write_image(&rgb, width, height, ExtendedColorType::Rgb8)
                .map_err(failed)?
        }
        ExportFormat::WebP => WebPEncoder::new_lossless(&mut buffer)
            .write_image(pixels, width, height, ExtendedColorType::Rgba8)
            .map_err(failed)?,
        ExportFormat::Tiff => TiffEncoder::new(&mut buffer)
            .write_image(pixels, width, height, ExtendedColorType::Rgba8)
            .map_err(failed)?,
    }

    let bytes = buffer.into_inner();
    tracing::debug!(%format, width, height, len = bytes.len(), "Encoded");
    Ok(bytes)
}

/// Drop alpha by compositing over black, as a canvas does for JPEG.
fn flatten_onto_black(pixels: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(pixels.len() / 4 * 3);
    for px in pixels.chunks_exact(4) {
        let a = px[3] as u32;
        for &c in &px[..3] {
            rgb.push(((c as u32 * a + 127) / 255) as u8);
        }
    }
    rgb
}


// ============================================================================
// Property-Based Tests
// ============================================================================
