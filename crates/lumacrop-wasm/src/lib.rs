//! Lumacrop WASM - WebAssembly bindings for Lumacrop
//!
//! This crate exposes the lumacrop-core editing session, compositing,
//! preview and export to JavaScript/TypeScript applications.
//!
//! # Module Structure
//!
//! - `editor` - `JsEditor`, the interactive editing session
//! - `codec` - standalone decode/encode and option catalogs
//! - `types` - wrapper types for images, preview frames and exports
//! - `logging` - `tracing` output to the browser console
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsEditor } from '@lumacrop/wasm';
//!
//! await init();
//! const editor = new JsEditor();
//! editor.load_image(new Uint8Array(await file.arrayBuffer()), file.name);
//! ```

use std::fmt::Display;

use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

mod codec;
mod editor;
mod logging;
mod types;

pub use codec::{
    adjustment_ranges, crop_presets, decode_image, encode_image, export_formats, filter_names,
};
pub use editor::JsEditor;
pub use types::{JsExportArtifact, JsImage, JsPreviewFrame};

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    logging::install(tracing::Level::INFO);
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

pub(crate) fn js_error(e: impl Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

pub(crate) fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(js_error)
}

/// Deserialize a partial object; `undefined`/`null` yield the default.
pub(crate) fn from_js_or_default<T: DeserializeOwned + Default>(value: JsValue) -> Result<T, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(js_error)
}
