//! WASM-compatible wrapper types for image data and editor results.
//!
//! These types wrap core values and expose them through getters. Pixel and
//! byte buffers are copied into JavaScript memory when read.

use lumacrop_core::{DecodedImage, ExportArtifact, PreviewFrame};
use wasm_bindgen::prelude::*;

/// An RGBA image held in WASM memory.
#[wasm_bindgen]
pub struct JsImage {
    inner: DecodedImage,
}

#[wasm_bindgen]
impl JsImage {
    /// Create an image from RGBA pixel data (4 bytes per pixel, row-major).
    ///
    /// Fails if the buffer length does not match the dimensions.
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<JsImage, JsValue> {
        Self::from_parts(width, height, pixels).map_err(|e| JsValue::from_str(&e))
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.height
    }

    /// Number of bytes in the pixel buffer (width * height * 4)
    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.inner.pixels.len()
    }

    /// RGBA pixel data as a `Uint8Array`. Copies.
    pub fn pixels(&self) -> Vec<u8> {
        self.inner.pixels.clone()
    }
}

impl JsImage {
    pub(crate) fn from_parts(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, String> {
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(format!(
                "Invalid pixel data: expected {} bytes, got {}",
                expected,
                pixels.len()
            ));
        }
        Ok(Self {
            inner: DecodedImage::new(width, height, pixels),
        })
    }

    pub(crate) fn from_decoded(inner: DecodedImage) -> Self {
        Self { inner }
    }

    pub(crate) fn as_decoded(&self) -> &DecodedImage {
        &self.inner
    }
}

/// A live preview frame at display resolution.
#[wasm_bindgen]
pub struct JsPreviewFrame {
    generation: u64,
    width: u32,
    height: u32,
    compressed: bool,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsPreviewFrame {
    #[wasm_bindgen(getter)]
    pub fn generation(&self) -> f64 {
        self.generation as f64
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// True if the frame went through a lossy encode/decode round trip
    #[wasm_bindgen(getter)]
    pub fn compressed(&self) -> bool {
        self.compressed
    }

    /// RGBA pixels, ready for `ImageData`. Copies.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }
}

impl From<&PreviewFrame> for JsPreviewFrame {
    fn from(frame: &PreviewFrame) -> Self {
        Self {
            generation: frame.generation,
            width: frame.image.width(),
            height: frame.image.height(),
            compressed: frame.compressed,
            pixels: frame.image.as_raw().clone(),
        }
    }
}

/// An encoded export with its suggested filename.
#[wasm_bindgen]
pub struct JsExportArtifact {
    inner: ExportArtifact,
}

#[wasm_bindgen]
impl JsExportArtifact {
    /// Encoded file bytes. Copies.
    pub fn bytes(&self) -> Vec<u8> {
        self.inner.bytes.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn mime(&self) -> String {
        self.inner.mime.to_string()
    }

    #[wasm_bindgen(getter)]
    pub fn filename(&self) -> String {
        self.inner.filename.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.inner.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.inner.height
    }
}

impl From<ExportArtifact> for JsExportArtifact {
    fn from(inner: ExportArtifact) -> Self {
        Self { inner }
    }
}
