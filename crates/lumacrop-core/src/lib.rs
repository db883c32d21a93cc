//! Lumacrop Core - image editing library
//!
//! This crate provides the editing core for Lumacrop: decoding, crop and
//! overlay interaction sessions, the compositing pipeline (filters,
//! adjustments, blur/text overlays), live preview and export encoding.
//!
//! [`EditingSession`] ties the pieces together and is the usual entry point.

pub mod adjustments;
pub mod color;
pub mod config;
pub mod decode;
pub mod editor;
pub mod export;
pub mod filter;
pub mod geometry;
pub mod luminance;
pub mod overlay;
pub mod pipeline;
pub mod preview;
pub mod session;
pub mod text;

pub use adjustments::{AdjustmentKey, Adjustments};
pub use config::EditorConfig;
pub use decode::{decode_image, DecodeError, DecodedImage};
pub use editor::{CropSettings, EditingSession, ExportState, CROP_PRESETS};
pub use export::{
    export_image, CodecEncoder, EncodeOptions, Encoder, ExportArtifact, ExportError,
    ExportFormat, ExportSettings, ResizeRequest,
};
pub use filter::Filter;
pub use geometry::{Crop, DisplayGeometry, Point, Rect, Size};
pub use overlay::{
    Color, Overlay, OverlayId, OverlayKind, OverlayKindTag, TextAlign, TextStyle, TextStylePatch,
};
pub use pipeline::{composite, CompositeRequest, ResampleFilter};
pub use preview::{PendingPreview, PreviewFrame, PreviewTicket};
pub use session::{InteractionMode, ResizeHandle};
pub use text::{FontBook, TextRenderer};
