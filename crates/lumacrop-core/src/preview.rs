//! Live preview frames.
//!
//! The preview composites at display resolution. When the export format is
//! lossy the frame is also pushed through an encode/decode round trip so
//! compression artifacts show up before export.
//!
//! Every pass takes a [`PreviewTicket`] from the [`PreviewCanvas`]. A frame
//! is applied only if its ticket is still the newest one issued, so a slow
//! round trip can never overwrite a newer frame.

use image::RgbaImage;

use crate::decode::decode_image;
use crate::export::{EncodeOptions, Encoder, ExportSettings};

/// Generation number of one preview pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PreviewTicket(u64);

impl PreviewTicket {
    pub fn generation(&self) -> u64 {
        self.0
    }
}

/// A displayed preview image.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewFrame {
    pub generation: u64,
    pub image: RgbaImage,
    /// True if the image went through a lossy round trip
    pub compressed: bool,
}

/// Holds the newest applied frame and the generation counter.
#[derive(Debug, Default)]
pub struct PreviewCanvas {
    issued: u64,
    frame: Option<PreviewFrame>,
}

impl PreviewCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a pass. Invalidates every earlier ticket.
    pub fn issue(&mut self) -> PreviewTicket {
        self.issued += 1;
        PreviewTicket(self.issued)
    }

    pub fn is_current(&self, ticket: PreviewTicket) -> bool {
        ticket.0 == self.issued
    }

    /// Apply a finished frame. Stale frames are dropped and `false` returned.
    pub fn apply(&mut self, ticket: PreviewTicket, image: RgbaImage, compressed: bool) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(
                generation = ticket.0,
                newest = self.issued,
                "Discarding stale preview frame"
            );
            return false;
        }
        self.frame = Some(PreviewFrame {
            generation: ticket.0,
            image,
            compressed,
        });
        true
    }

    pub fn frame(&self) -> Option<&PreviewFrame> {
        self.frame.as_ref()
    }

    /// Drop the displayed frame and invalidate outstanding tickets.
    pub fn clear(&mut self) {
        self.issued += 1;
        self.frame = None;
    }
}

/// A composited frame waiting for its optional round trip.
#[derive(Debug)]
pub struct PendingPreview {
    pub ticket: PreviewTicket,
    pub image: RgbaImage,
    /// Encode settings for the round trip, if the export format is lossy
    pub lossy: Option<EncodeOptions>,
}

impl PendingPreview {
    /// Run the round trip (if any). Returns the image and whether it was
    /// compressed.
    pub fn resolve(self, encoder: &dyn Encoder) -> (PreviewTicket, RgbaImage, bool) {
        match self.lossy {
            Some(options) => {
                let (image, compressed) = lossy_round_trip(self.image, &options, encoder);
                (self.ticket, image, compressed)
            }
            None => (self.ticket, self.image, false),
        }
    }
}

/// True if the preview should show compression artifacts.
pub fn requires_lossy_preview(settings: &ExportSettings) -> bool {
    settings.is_lossy()
}

/// Encode then decode `image`. On any failure the uncompressed image is
/// returned with `false`.
pub fn lossy_round_trip(
    image: RgbaImage,
    options: &EncodeOptions,
    encoder: &dyn Encoder,
) -> (RgbaImage, bool) {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return (image, false);
    }

    let bytes = match encoder.encode(image.as_raw(), width, height, options) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(error = %e, "Preview encode failed; showing uncompressed frame");
            return (image, false);
        }
    };
    let decoded = match decode_image(&bytes) {
        Ok(decoded) => decoded,
        Err(e) => {
            tracing::warn!(error = %e, "Preview decode failed; showing uncompressed frame");
            return (image, false);
        }
    };
    if (decoded.width, decoded.height) != (width, height) {
        tracing::warn!(
            width = decoded.width,
            height = decoded.height,
            "Preview round trip changed dimensions"
        );
        return (image, false);
    }
    match decoded.to_rgba_image() {
        Some(round_tripped) => (round_tripped, true),
        None => (image, false),
    }
}
