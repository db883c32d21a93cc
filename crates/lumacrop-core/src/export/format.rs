//! Output formats.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a format name or MIME type is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown export format: {0}")]
pub struct FormatParseError(pub String);

/// Container format of an exported file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
    #[serde(rename = "webp")]
    WebP,
    Tiff,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Png,
        ExportFormat::Jpeg,
        ExportFormat::WebP,
        ExportFormat::Tiff,
    ];

    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::WebP => "image/webp",
            ExportFormat::Tiff => "image/tiff",
        }
    }

    /// File suffix, the MIME subtype.
    pub fn suffix(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpeg",
            ExportFormat::WebP => "webp",
            ExportFormat::Tiff => "tiff",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Png => "PNG (Lossless)",
            ExportFormat::Jpeg => "JPEG (Lossy)",
            ExportFormat::WebP => "WebP (Lossless)",
            ExportFormat::Tiff => "TIFF (Lossless)",
        }
    }

    /// True if the quality setting applies to this format.
    pub fn is_lossy(&self) -> bool {
        matches!(self, ExportFormat::Jpeg)
    }

    pub fn supports_lossless(&self) -> bool {
        matches!(self, ExportFormat::WebP)
    }

    /// True if an encode with these settings loses information.
    ///
    /// WebP is always written losslessly, whatever the flag says.
    pub fn is_lossy_with(&self, _lossless: bool) -> bool {
        self.is_lossy()
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for ExportFormat {
    type Err = FormatParseError;

    /// Accepts short names (`png`, `jpg`, `jpeg`, ...) and MIME types.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let name = lower.strip_prefix("image/").unwrap_or(&lower);
        match name {
            "png" => Ok(ExportFormat::Png),
            "jpeg" | "jpg" => Ok(ExportFormat::Jpeg),
            "webp" => Ok(ExportFormat::WebP),
            "tiff" | "tif" => Ok(ExportFormat::Tiff),
            _ => Err(FormatParseError(s.to_string())),
        }
    }
}
