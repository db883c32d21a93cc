//! Interaction constants and preview defaults.
//!
//! Every value has a default matching the shipped editor behaviour. Hosts may
//! pass a partial object (e.g. from JSON) and unspecified fields keep their
//! defaults thanks to `#[serde(default)]`.

use serde::{Deserialize, Serialize};

/// Side length of the crop resize handle, in display pixels.
pub const CROP_HANDLE_SIZE: f64 = 12.0;

/// Minimum crop draft size on either axis, in display pixels.
pub const MIN_CROP_SIZE_DISPLAY: f64 = 20.0;

/// Minimum drawn overlay size on either axis, in display pixels.
pub const MIN_DRAW_SIZE_DISPLAY: f64 = 10.0;

/// Minimum overlay size while resizing, in display pixels.
pub const MIN_EDIT_SIZE_DISPLAY: f64 = 20.0;

/// Visual size of an overlay resize handle (8px square + 1px border each side).
pub const EDIT_HANDLE_SIZE: f64 = 10.0;

/// Window after an interaction release during which background clicks are ignored.
pub const CLICK_COOLDOWN_MS: f64 = 100.0;

/// Tunable editor behaviour.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    /// Crop resize handle size (display px)
    pub crop_handle_size: f64,
    /// Crop draft floor (display px)
    pub min_crop_size: f64,
    /// Smallest overlay a draw session will commit (display px)
    pub min_draw_size: f64,
    /// Overlay resize floor (display px)
    pub min_edit_size: f64,
    /// Overlay resize handle hit box (display px)
    pub edit_handle_size: f64,
    /// Background click suppression after a release (ms)
    pub click_cooldown_ms: f64,
    /// Run an encode/decode round trip for lossy formats in the live preview
    pub lossy_preview: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            crop_handle_size: CROP_HANDLE_SIZE,
            min_crop_size: MIN_CROP_SIZE_DISPLAY,
            min_draw_size: MIN_DRAW_SIZE_DISPLAY,
            min_edit_size: MIN_EDIT_SIZE_DISPLAY,
            edit_handle_size: EDIT_HANDLE_SIZE,
            click_cooldown_ms: CLICK_COOLDOWN_MS,
            lossy_preview: true,
        }
    }
}
