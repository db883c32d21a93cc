//! Standalone decode/encode bindings and option catalogs.
//!
//! # Example
//!
//! ```typescript
//! import { decode_image, encode_image } from '@lumacrop/wasm';
//!
//! const image = decode_image(new Uint8Array(await file.arrayBuffer()));
//! const webp = encode_image(image, { format: 'webp', quality: 80, lossless: true });
//! ```

use lumacrop_core::export::{encode_rgba, EncodeOptions};
use lumacrop_core::{AdjustmentKey, ExportFormat, Filter, CROP_PRESETS};
use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::types::JsImage;
use crate::{from_js_or_default, js_error, to_js};

/// Decode PNG, JPEG, WebP or TIFF bytes to RGBA, applying EXIF orientation.
#[wasm_bindgen]
pub fn decode_image(bytes: &[u8]) -> Result<JsImage, JsValue> {
    lumacrop_core::decode_image(bytes)
        .map(JsImage::from_decoded)
        .map_err(js_error)
}

/// Encode an image. `options` is a partial `{ format, quality, lossless }`
/// object; missing fields use the export defaults.
#[wasm_bindgen]
pub fn encode_image(image: &JsImage, options: JsValue) -> Result<Vec<u8>, JsValue> {
    let options: EncodeOptions = from_js_or_default(options)?;
    let decoded = image.as_decoded();
    encode_rgba(&decoded.pixels, decoded.width, decoded.height, &options).map_err(js_error)
}

/// Export formats with their labels, for the format picker.
#[wasm_bindgen]
pub fn export_formats() -> Result<JsValue, JsValue> {
    to_js(&format_options())
}

/// Filter names in menu order.
#[wasm_bindgen]
pub fn filter_names() -> Result<JsValue, JsValue> {
    to_js(&filter_options())
}

/// Adjustment sliders with their ranges and defaults.
#[wasm_bindgen]
pub fn adjustment_ranges() -> Result<JsValue, JsValue> {
    to_js(&adjustment_options())
}

/// Named crop aspect ratios.
#[wasm_bindgen]
pub fn crop_presets() -> Result<JsValue, JsValue> {
    to_js(&preset_options())
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FormatOption {
    id: &'static str,
    label: &'static str,
    mime: &'static str,
    lossy: bool,
    supports_lossless: bool,
}

#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct AdjustmentOption {
    label: &'static str,
    unit: &'static str,
    min: f32,
    max: f32,
    default: f32,
}

#[derive(Debug, Serialize, PartialEq)]
pub(crate) struct PresetOption {
    name: &'static str,
    ratio: f64,
}

pub(crate) fn format_options() -> Vec<FormatOption> {
    ExportFormat::ALL
        .iter()
        .map(|f| FormatOption {
            id: f.suffix(),
            label: f.label(),
            mime: f.mime(),
            lossy: f.is_lossy(),
            supports_lossless: f.supports_lossless(),
        })
        .collect()
}

pub(crate) fn filter_options() -> Vec<&'static str> {
    Filter::ALL.iter().map(Filter::name).collect()
}

pub(crate) fn adjustment_options() -> Vec<AdjustmentOption> {
    AdjustmentKey::ALL
        .iter()
        .map(|k| {
            let (min, max) = k.range();
            AdjustmentOption {
                label: k.label(),
                unit: k.unit(),
                min,
                max,
                default: k.default_value(),
            }
        })
        .collect()
}

pub(crate) fn preset_options() -> Vec<PresetOption> {
    CROP_PRESETS
        .iter()
        .map(|&(name, ratio)| PresetOption { name, ratio })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_options() {
        let formats = format_options();
        assert_eq!(formats.len(), 4);
        assert_eq!(formats[0].id, "png");
        assert_eq!(formats[0].label, "PNG (Lossless)");
        assert!(formats.iter().any(|f| f.id == "webp" && f.supports_lossless));
    }

    #[test]
    fn test_filter_options_start_with_none() {
        let names = filter_options();
        assert_eq!(names.first(), Some(&"None"));
        assert!(names.contains(&"Soft Focus"));
    }

    #[test]
    fn test_adjustment_options() {
        let adjustments = adjustment_options();
        let hue = adjustments.iter().find(|a| a.label == "Hue").unwrap();
        assert_eq!((hue.min, hue.max, hue.default), (-180.0, 180.0, 0.0));
    }

    #[test]
    fn test_preset_options() {
        let presets = preset_options();
        assert_eq!(presets.len(), CROP_PRESETS.len());
        assert_eq!(presets[0].name, "Instagram (1:1)");
        assert_eq!(presets[0].ratio, 1.0);
    }
}
