//! The `JsEditor` binding.
//!
//! One `JsEditor` holds an [`EditingSession`] and the fonts registered for
//! text overlays. The host forwards pointer and keyboard events with canvas
//! coordinates and event timestamps, then asks for a preview frame whenever
//! it redraws.
//!
//! ```typescript
//! const editor = new JsEditor({ clickCooldownMs: 150 });
//! editor.register_font('Arial', arialBytes);
//! editor.load_image(bytes, file.name);
//! editor.set_viewport_width(container.clientWidth);
//! const frame = editor.render_preview();
//! ```

use lumacrop_core::overlay::OverlayKindTag;
use lumacrop_core::{
    AdjustmentKey, CodecEncoder, EditingSession, EditorConfig, ExportFormat, Filter, FontBook,
    OverlayId, Point, TextRenderer, TextStylePatch,
};
use wasm_bindgen::prelude::*;

use crate::types::{JsExportArtifact, JsImage, JsPreviewFrame};
use crate::{from_js_or_default, js_error, to_js};

/// Overlay ids cross the boundary as JS numbers.
pub(crate) fn overlay_id_to_js(id: OverlayId) -> f64 {
    id.0 as f64
}

pub(crate) fn overlay_id_from_js(value: f64) -> Option<OverlayId> {
    (value.is_finite() && value >= 0.0 && value.fract() == 0.0).then(|| OverlayId(value as u64))
}

fn text_renderer(fonts: &FontBook) -> Option<&dyn TextRenderer> {
    if fonts.is_empty() {
        None
    } else {
        Some(fonts)
    }
}

/// Editing session wrapper for JavaScript
#[wasm_bindgen]
pub struct JsEditor {
    session: EditingSession,
    fonts: FontBook,
}

impl JsEditor {
    pub(crate) fn with_config(config: EditorConfig) -> Self {
        Self {
            session: EditingSession::new(config),
            fonts: FontBook::new(),
        }
    }

    pub(crate) fn session(&self) -> &EditingSession {
        &self.session
    }
}

#[wasm_bindgen]
impl JsEditor {
    /// Create an editor. `config` is an optional partial `EditorConfig`.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsEditor, JsValue> {
        let config: EditorConfig = from_js_or_default(config)?;
        Ok(Self::with_config(config))
    }

    /// Register a TrueType/OpenType font for text overlays. The first font
    /// registered is the fallback for unknown families.
    pub fn register_font(&mut self, family: &str, data: Vec<u8>) -> Result<(), JsValue> {
        self.fonts.register(family, data).map_err(js_error)
    }

    // ----- Image -----

    /// Decode and load an encoded image. On failure the editor is left
    /// without an image and `load_error` is set.
    pub fn load_image(&mut self, bytes: &[u8], file_name: Option<String>) -> Result<(), JsValue> {
        self.session
            .load_image_bytes(bytes, file_name.as_deref())
            .map_err(js_error)
    }

    /// Load an already decoded image.
    pub fn load_decoded(&mut self, image: &JsImage, file_name: Option<String>) -> Result<(), JsValue> {
        self.session
            .load_image(image.as_decoded().clone(), file_name.as_deref())
            .map_err(js_error)
    }

    #[wasm_bindgen(getter)]
    pub fn has_image(&self) -> bool {
        self.session.has_image()
    }

    #[wasm_bindgen(getter)]
    pub fn load_error(&self) -> Option<String> {
        self.session.load_error().map(str::to_string)
    }

    #[wasm_bindgen(getter)]
    pub fn file_name(&self) -> Option<String> {
        self.session.file_name().map(str::to_string)
    }

    pub fn set_viewport_width(&mut self, width: f64) {
        self.session.set_viewport_width(width);
    }

    /// `{ width, height, scale }` of the canvas, or undefined.
    pub fn display_geometry(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.display_geometry())
    }

    pub fn crop(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.crop())
    }

    // ----- Filter and adjustments -----

    pub fn set_filter(&mut self, name: &str) -> Result<(), JsValue> {
        let filter: Filter = name.parse().map_err(js_error)?;
        self.session.set_filter(filter);
        Ok(())
    }

    #[wasm_bindgen(getter)]
    pub fn filter(&self) -> String {
        self.session.filter().name().to_string()
    }

    pub fn set_adjustment(&mut self, key: &str, value: f32) -> Result<(), JsValue> {
        let key: AdjustmentKey = key.parse().map_err(js_error)?;
        self.session.set_adjustment(key, value);
        Ok(())
    }

    pub fn adjustments(&self) -> Result<JsValue, JsValue> {
        to_js(self.session.adjustments())
    }

    pub fn reset_adjustments(&mut self) {
        self.session.reset_adjustments();
    }

    // ----- Crop -----

    pub fn set_aspect_ratio(&mut self, ratio: Option<f64>) {
        self.session.set_aspect_ratio(ratio);
    }

    pub fn set_lock_aspect_ratio(&mut self, lock: bool) {
        self.session.set_lock_aspect_ratio(lock);
    }

    pub fn set_crop_rounding(&mut self, percent: f32) {
        self.session.set_crop_rounding(percent);
    }

    pub fn crop_settings(&self) -> Result<JsValue, JsValue> {
        to_js(self.session.crop_settings())
    }

    pub fn start_crop(&mut self) -> bool {
        self.session.start_crop()
    }

    pub fn confirm_crop(&mut self) -> bool {
        self.session.confirm_crop()
    }

    pub fn cancel_crop(&mut self) -> bool {
        self.session.cancel_crop()
    }

    /// The crop draft in canvas coordinates, or undefined.
    pub fn crop_draft(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.crop_draft())
    }

    // ----- Overlays -----

    /// Arm a draw session. `kind` is `"blur"` or `"text"`.
    pub fn begin_overlay_draw(&mut self, kind: &str) -> Result<bool, JsValue> {
        let kind: OverlayKindTag = kind.parse().map_err(js_error)?;
        Ok(self.session.begin_overlay_draw(kind))
    }

    pub fn cancel_overlay_draw(&mut self) -> bool {
        self.session.cancel_overlay_draw()
    }

    pub fn draw_draft(&self) -> Result<JsValue, JsValue> {
        to_js(&self.session.draw_draft())
    }

    pub fn overlays(&self) -> Result<JsValue, JsValue> {
        to_js(self.session.overlays())
    }

    /// Canvas-space box of an overlay, following an in-progress edit.
    pub fn overlay_display_rect(&self, id: f64) -> Result<JsValue, JsValue> {
        let rect = overlay_id_from_js(id).and_then(|id| self.session.overlay_display_rect(id));
        to_js(&rect)
    }

    #[wasm_bindgen(getter)]
    pub fn selected(&self) -> Option<f64> {
        self.session.selected().map(overlay_id_to_js)
    }

    pub fn select_overlay(&mut self, id: f64) -> bool {
        overlay_id_from_js(id).is_some_and(|id| self.session.select_overlay(id))
    }

    pub fn deselect(&mut self) {
        self.session.deselect();
    }

    pub fn delete_overlay(&mut self, id: f64) -> bool {
        overlay_id_from_js(id).is_some_and(|id| self.session.delete_overlay(id))
    }

    pub fn set_blur_intensity(&mut self, id: f64, intensity: u8) -> bool {
        overlay_id_from_js(id).is_some_and(|id| self.session.set_blur_intensity(id, intensity))
    }

    /// Apply a partial `{ text, fontSize, color, fontFamily, align }` update.
    pub fn update_text_style(&mut self, id: f64, patch: JsValue) -> Result<bool, JsValue> {
        let patch: TextStylePatch = from_js_or_default(patch)?;
        Ok(overlay_id_from_js(id).is_some_and(|id| self.session.update_text_style(id, patch)))
    }

    // ----- Input -----

    pub fn pointer_down(&mut self, x: f64, y: f64) -> bool {
        self.session.pointer_down(Point::new(x, y))
    }

    pub fn pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.session.pointer_move(Point::new(x, y))
    }

    /// CSS cursor for the pointer position, `undefined` for the default.
    pub fn hover_cursor(&self, x: f64, y: f64) -> Option<String> {
        self.session.hover_cursor(Point::new(x, y)).map(str::to_string)
    }

    pub fn pointer_up(&mut self, now_ms: f64) -> bool {
        self.session.pointer_up(now_ms)
    }

    /// Returns the selected overlay id after the click, if any.
    pub fn click(&mut self, x: f64, y: f64, now_ms: f64) -> Option<f64> {
        self.session
            .click(Point::new(x, y), now_ms)
            .map(overlay_id_to_js)
    }

    pub fn key_down(&mut self, key: &str) -> bool {
        self.session.key_down(key)
    }

    /// True while document-level pointer listeners should stay attached.
    #[wasm_bindgen(getter)]
    pub fn is_capturing(&self) -> bool {
        self.session.is_capturing()
    }

    /// `"idle"`, `"cropping"`, `"drawing"` or `"editing"`.
    #[wasm_bindgen(getter)]
    pub fn mode(&self) -> String {
        self.session.mode().name().to_string()
    }

    // ----- Export settings -----

    pub fn set_export_format(&mut self, format: &str) -> Result<(), JsValue> {
        let format: ExportFormat = format.parse().map_err(js_error)?;
        self.session.set_export_format(format);
        Ok(())
    }

    pub fn set_export_quality(&mut self, quality: u8) {
        self.session.set_export_quality(quality);
    }

    pub fn set_export_lossless(&mut self, lossless: bool) {
        self.session.set_export_lossless(lossless);
    }

    pub fn set_resize_enabled(&mut self, enabled: bool) {
        self.session.set_resize_enabled(enabled);
    }

    pub fn set_resize_target(&mut self, width: Option<u32>, height: Option<u32>) {
        self.session.set_resize_target(width, height);
    }

    pub fn set_keep_aspect(&mut self, keep: bool) {
        self.session.set_keep_aspect(keep);
    }

    pub fn export_settings(&self) -> Result<JsValue, JsValue> {
        to_js(self.session.export_settings())
    }

    pub fn export_state(&self) -> Result<JsValue, JsValue> {
        to_js(self.session.export_state())
    }

    pub fn clear_export_error(&mut self) {
        self.session.clear_export_error();
    }

    // ----- Rendering -----

    /// Composite a preview at canvas size. Undefined without an image.
    pub fn render_preview(&mut self) -> Option<JsPreviewFrame> {
        let text = text_renderer(&self.fonts);
        self.session
            .render_preview(text, &CodecEncoder)
            .map(JsPreviewFrame::from)
    }

    /// Composite at export resolution and encode.
    pub fn export(&mut self) -> Result<JsExportArtifact, JsValue> {
        let text = text_renderer(&self.fonts);
        self.session
            .export(text, &CodecEncoder)
            .map(JsExportArtifact::from)
            .map_err(js_error)
    }
}
