//! Export: composite at the output resolution, encode, name the file.
//!
//! The output size defaults to the crop size. An optional resize takes its
//! aspect ratio from the crop, never from the source image.

mod encode;
mod format;

pub use encode::{encode_rgba, CodecEncoder, EncodeError, EncodeOptions, Encoder, DEFAULT_QUALITY};
pub use format::{ExportFormat, FormatParseError};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Crop, Size};
use crate::pipeline::{composite, CompositeRequest, ResampleFilter};

/// Base name used when the source has no usable file name.
pub const FALLBACK_BASE_NAME: &str = "image";

/// Errors that can occur during export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Cannot export: no image loaded")]
    NoImage,

    #[error("Cannot export: invalid crop {width}x{height}")]
    InvalidCrop { width: u32, height: u32 },

    #[error("Cannot export: invalid output size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Optional output resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResizeRequest {
    pub enabled: bool,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Derive the missing dimension from the crop aspect ratio
    pub keep_aspect: bool,
}

impl Default for ResizeRequest {
    fn default() -> Self {
        Self {
            enabled: false,
            width: None,
            height: None,
            keep_aspect: true,
        }
    }
}

impl ResizeRequest {
    /// Turning resizing off forgets the targets.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.width = None;
            self.height = None;
        }
    }
}

/// User-facing export settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportSettings {
    #[serde(flatten)]
    pub encode: EncodeOptions,
    pub resize: ResizeRequest,
}

impl ExportSettings {
    pub fn format(&self) -> ExportFormat {
        self.encode.format
    }

    /// Choosing a format other than WebP clears the lossless flag.
    pub fn set_format(&mut self, format: ExportFormat) {
        self.encode.format = format;
        if !format.supports_lossless() {
            self.encode.lossless = false;
        }
    }

    pub fn set_quality(&mut self, quality: u8) {
        self.encode.quality = quality.clamp(1, 100);
    }

    /// Only WebP has a lossless mode; the flag stays off for other formats.
    pub fn set_lossless(&mut self, lossless: bool) {
        self.encode.lossless = lossless && self.encode.format.supports_lossless();
    }

    /// True if encoding with these settings loses information.
    pub fn is_lossy(&self) -> bool {
        self.encode.format.is_lossy_with(self.encode.lossless)
    }
}

/// An encoded file ready for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub filename: String,
    pub width: u32,
    pub height: u32,
}

/// Output size for `crop` after applying `resize`.
///
/// A target is valid when it is present and positive. With aspect lock,
/// a lone width or height derives the other from the crop ratio and a pair
/// is driven by the width. Without it, each valid target replaces its own
/// dimension. Both sides are floored at 1.
pub fn resolve_output_size(crop: &Crop, resize: &ResizeRequest) -> Size {
    let mut width = crop.width as f64;
    let mut height = crop.height as f64;

    if resize.enabled {
        let w = resize.width.filter(|&v| v > 0).map(f64::from);
        let h = resize.height.filter(|&v| v > 0).map(f64::from);
        let ratio = crop.aspect_ratio();

        match (resize.keep_aspect, ratio, w, h) {
            (_, _, None, None) => {}
            (true, Some(ratio), Some(w), _) => {
                width = w;
                height = (w / ratio).round();
            }
            (true, Some(ratio), None, Some(h)) => {
                height = h;
                width = (h * ratio).round();
            }
            (_, _, w, h) => {
                width = w.unwrap_or(width);
                height = h.unwrap_or(height);
            }
        }
    }

    Size::new(width.max(1.0) as u32, height.max(1.0) as u32)
}

/// `<base>_edited.<suffix>`, where the base is the original name without
/// its last extension.
pub fn suggested_filename(original: Option<&str>, format: ExportFormat) -> String {
    let base = original
        .and_then(|name| name.rsplit_once('.'))
        .map(|(base, _)| base)
        .filter(|base| !base.is_empty())
        .unwrap_or(FALLBACK_BASE_NAME);
    format!("{}_edited.{}", base, format.suffix())
}

/// Composite `scene` at the export resolution and encode it.
///
/// The target size and resampling filter of `scene` are replaced: the size
/// comes from [`resolve_output_size`] and export always uses Lanczos3.
#[tracing::instrument(skip_all, fields(format = %settings.format()))]
pub fn export_image(
    scene: CompositeRequest<'_>,
    settings: &ExportSettings,
    original_filename: Option<&str>,
    encoder: &dyn Encoder,
) -> Result<ExportArtifact, ExportError> {
    if scene.image.is_empty() {
        return Err(ExportError::NoImage);
    }
    let crop = scene.crop;
    if !crop.is_valid() {
        return Err(ExportError::InvalidCrop {
            width: crop.width,
            height: crop.height,
        });
    }
    let size = resolve_output_size(&crop, &settings.resize);
    if size.is_empty() {
        return Err(ExportError::InvalidSize {
            width: size.width,
            height: size.height,
        });
    }

    let request = CompositeRequest {
        target: size,
        resample: ResampleFilter::Lanczos3,
        ..scene
    };
    let canvas = composite(&request);
    let bytes = encoder.encode(canvas.as_raw(), size.width, size.height, &settings.encode)?;

    let format = settings.format();
    let artifact = ExportArtifact {
        bytes,
        mime: format.mime(),
        filename: suggested_filename(original_filename, format),
        width: size.width,
        height: size.height,
    };
    tracing::info!(
        filename = %artifact.filename,
        width = size.width,
        height = size.height,
        len = artifact.bytes.len(),
        "Export complete"
    );
    Ok(artifact)
}


// =============================================================================
// Property-Based Tests
// =============================================================================
