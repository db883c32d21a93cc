//! The editing session.
//!
//! [`EditingSession`] owns every piece of mutable editor state: the source
//! image, crop, filter, adjustments, overlays, selection, the active
//! interaction and the export settings. Hosts drive it through its methods
//! and pass it around by `&mut`; nothing is shared or global.
//!
//! Pointer coordinates are display-space points relative to the canvas.
//! Timestamps are caller-supplied milliseconds (event time).

use serde::{Deserialize, Serialize};

use crate::adjustments::{AdjustmentKey, Adjustments};
use crate::config::EditorConfig;
use crate::decode::{decode_image, DecodeError, DecodedImage};
use crate::export::{
    export_image, Encoder, ExportArtifact, ExportError, ExportFormat, ExportSettings,
};
use crate::filter::Filter;
use crate::geometry::{
    display_geometry, original_to_display, Crop, DisplayGeometry, PixelRect, Point, Rect,
};
use crate::overlay::{Overlay, OverlayId, OverlayKindTag, OverlayStack, TextStylePatch};
use crate::pipeline::{composite, CompositeRequest, ResampleFilter, MAX_ROUNDING};
use crate::preview::{
    requires_lossy_preview, PendingPreview, PreviewCanvas, PreviewFrame, PreviewTicket,
};
use crate::session::{
    handle_at, CropGesture, CropSession, EditGesture, InteractionMode, OverlayDrawSession,
    OverlayEditSession, Selection,
};
use crate::text::TextRenderer;

/// Named crop aspect ratios offered by the crop panel.
pub const CROP_PRESETS: &[(&str, f64)] = &[
    ("Instagram (1:1)", 1.0),
    ("Instagram (4:5)", 4.0 / 5.0),
    ("Instagram (1.91:1)", 1.91),
    ("Twitter (16:9)", 16.0 / 9.0),
    ("Facebook (1.91:1)", 1.91),
    ("Pinterest (2:3)", 2.0 / 3.0),
    ("Snapchat (9:16)", 9.0 / 16.0),
    ("LinkedIn (1.91:1)", 1.91),
    ("TikTok (9:16)", 9.0 / 16.0),
];

/// Crop panel state. Reset whenever a new image is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CropSettings {
    /// Target width / height, if any
    pub aspect_ratio: Option<f64>,
    pub lock_aspect_ratio: bool,
    /// Corner rounding percent (0-50)
    pub rounding: f32,
}

impl Default for CropSettings {
    fn default() -> Self {
        Self {
            aspect_ratio: None,
            lock_aspect_ratio: true,
            rounding: 0.0,
        }
    }
}

impl CropSettings {
    /// The ratio a crop session should enforce.
    pub fn locked_ratio(&self) -> Option<f64> {
        self.aspect_ratio.filter(|_| self.lock_aspect_ratio)
    }
}

/// Progress of the most recent export.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportState {
    pub in_progress: bool,
    pub last_error: Option<String>,
}

/// All mutable editing state.
#[derive(Debug)]
pub struct EditingSession {
    config: EditorConfig,
    image: Option<DecodedImage>,
    file_name: Option<String>,
    load_error: Option<String>,
    crop: Crop,
    crop_settings: CropSettings,
    filter: Filter,
    adjustments: Adjustments,
    overlays: OverlayStack,
    selection: Selection,
    mode: InteractionMode,
    viewport_width: f64,
    export_settings: ExportSettings,
    export_state: ExportState,
    preview: PreviewCanvas,
}

impl Default for EditingSession {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl EditingSession {
    pub fn new(config: EditorConfig) -> Self {
        let selection = Selection::new(&config);
        Self {
            config,
            image: None,
            file_name: None,
            load_error: None,
            crop: Crop::default(),
            crop_settings: CropSettings::default(),
            filter: Filter::None,
            adjustments: Adjustments::default(),
            overlays: OverlayStack::new(),
            selection,
            mode: InteractionMode::Idle,
            viewport_width: 0.0,
            export_settings: ExportSettings::default(),
            export_state: ExportState::default(),
            preview: PreviewCanvas::new(),
        }
    }

    // ----- Accessors -----

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn image(&self) -> Option<&DecodedImage> {
        self.image.as_ref()
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Message of the last failed load, cleared by a successful one.
    pub fn load_error(&self) -> Option<&str> {
        self.load_error.as_deref()
    }

    pub fn crop(&self) -> Crop {
        self.crop
    }

    pub fn crop_settings(&self) -> &CropSettings {
        &self.crop_settings
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn adjustments(&self) -> &Adjustments {
        &self.adjustments
    }

    pub fn overlays(&self) -> &[Overlay] {
        self.overlays.as_slice()
    }

    pub fn overlay(&self, id: OverlayId) -> Option<&Overlay> {
        self.overlays.get(id)
    }

    pub fn selected_overlay(&self) -> Option<&Overlay> {
        self.selection.selected().and_then(|id| self.overlays.get(id))
    }

    pub fn mode(&self) -> &InteractionMode {
        &self.mode
    }

    pub fn export_settings(&self) -> &ExportSettings {
        &self.export_settings
    }

    pub fn export_state(&self) -> &ExportState {
        &self.export_state
    }

    pub fn preview_frame(&self) -> Option<&PreviewFrame> {
        self.preview.frame()
    }

    // ----- Image -----

    /// Install a decoded image. Resets the crop to the full image, clears
    /// overlays and selection, resets crop settings and ends any session.
    ///
    /// An empty or inconsistent buffer is treated as a failed load.
    pub fn load_image(
        &mut self,
        image: DecodedImage,
        file_name: Option<&str>,
    ) -> Result<(), DecodeError> {
        if image.is_empty() {
            let err = DecodeError::EmptyImage;
            self.fail_load(&err);
            return Err(err);
        }
        if image.view().is_none() {
            let err = DecodeError::CorruptedFile("Pixel buffer does not match dimensions".into());
            self.fail_load(&err);
            return Err(err);
        }

        self.reset_for_new_image();
        self.crop = Crop::full(image.size());
        tracing::info!(
            width = image.width,
            height = image.height,
            file_name,
            "Image loaded"
        );
        self.image = Some(image);
        self.file_name = file_name.map(str::to_string);
        self.load_error = None;
        Ok(())
    }

    /// Decode and install an encoded image.
    pub fn load_image_bytes(
        &mut self,
        bytes: &[u8],
        file_name: Option<&str>,
    ) -> Result<(), DecodeError> {
        match decode_image(bytes) {
            Ok(image) => self.load_image(image, file_name),
            Err(err) => {
                self.fail_load(&err);
                Err(err)
            }
        }
    }

    fn fail_load(&mut self, err: &DecodeError) {
        tracing::warn!(error = %err, "Image load failed");
        self.reset_for_new_image();
        self.image = None;
        self.file_name = None;
        self.crop = Crop::default();
        self.load_error = Some(err.to_string());
    }

    fn reset_for_new_image(&mut self) {
        self.end_session();
        self.overlays.clear();
        self.selection.clear();
        self.crop_settings = CropSettings::default();
        self.preview.clear();
    }

    // ----- Display -----

    pub fn set_viewport_width(&mut self, width: f64) {
        self.viewport_width = if width.is_finite() { width.max(0.0) } else { 0.0 };
    }

    pub fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    /// Canvas size and scale for the committed crop, or `None` without an
    /// image or viewport.
    pub fn display_geometry(&self) -> Option<DisplayGeometry> {
        let image = self.image.as_ref()?;
        display_geometry(&self.crop, image.size(), self.viewport_width)
    }

    // ----- Filter and adjustments -----

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
    }

    /// Set one adjustment, clamped to its range.
    pub fn set_adjustment(&mut self, key: AdjustmentKey, value: f32) {
        self.adjustments.set(key, value);
    }

    pub fn set_adjustments(&mut self, adjustments: Adjustments) {
        self.adjustments = adjustments.clamped();
    }

    pub fn reset_adjustments(&mut self) {
        self.adjustments = Adjustments::default();
    }

    // ----- Crop settings -----

    pub fn set_aspect_ratio(&mut self, ratio: Option<f64>) {
        self.crop_settings.aspect_ratio = ratio.filter(|r| r.is_finite() && *r > 0.0);
        self.reseed_crop();
    }

    pub fn set_lock_aspect_ratio(&mut self, lock: bool) {
        self.crop_settings.lock_aspect_ratio = lock;
        self.reseed_crop();
    }

    /// Corner rounding percent, clamped to 0-50.
    pub fn set_crop_rounding(&mut self, percent: f32) {
        self.crop_settings.rounding = if percent.is_finite() {
            percent.clamp(0.0, MAX_ROUNDING)
        } else {
            0.0
        };
    }

    fn reseed_crop(&mut self) {
        let locked = self.crop_settings.locked_ratio();
        if let InteractionMode::Cropping(session) = &mut self.mode {
            session.set_locked_ratio(locked);
        }
    }

    // ----- Crop session -----

    /// Start (or restart) a crop session over the committed crop. An
    /// in-progress draw is abandoned. Fails without an image or viewport,
    /// or while an overlay is being edited.
    pub fn start_crop(&mut self) -> bool {
        if matches!(self.mode, InteractionMode::Editing(_)) {
            return false;
        }
        let Some(display) = self.display_geometry() else {
            tracing::debug!("Cannot start crop: no display geometry");
            return false;
        };
        let Some(session) = CropSession::start(
            self.crop,
            &display,
            self.crop_settings.locked_ratio(),
            &self.config,
        ) else {
            return false;
        };
        self.end_session();
        self.mode = InteractionMode::Cropping(session);
        true
    }

    /// Commit the crop draft. Returns true if the crop changed hands; an
    /// unusable draft ends the session like a cancel.
    pub fn confirm_crop(&mut self) -> bool {
        let session = match std::mem::take(&mut self.mode) {
            InteractionMode::Cropping(session) => session,
            other => {
                self.mode = other;
                return false;
            }
        };
        let Some(size) = self.image.as_ref().map(DecodedImage::size) else {
            return false;
        };
        match session.confirm(size) {
            Some(crop) => {
                self.crop = crop;
                true
            }
            None => false,
        }
    }

    pub fn cancel_crop(&mut self) -> bool {
        match std::mem::take(&mut self.mode) {
            InteractionMode::Cropping(session) => {
                session.cancel();
                true
            }
            other => {
                self.mode = other;
                false
            }
        }
    }

    /// The crop draft in display space while cropping.
    pub fn crop_draft(&self) -> Option<Rect> {
        match &self.mode {
            InteractionMode::Cropping(session) => Some(session.draft()),
            _ => None,
        }
    }

    // ----- Overlay drawing -----

    /// Arm a draw session for `kind`. Disabled while cropping, while an
    /// overlay is being edited, and without an image.
    pub fn begin_overlay_draw(&mut self, kind: OverlayKindTag) -> bool {
        if !self.has_image() {
            return false;
        }
        if matches!(
            self.mode,
            InteractionMode::Cropping(_) | InteractionMode::Editing(_)
        ) {
            tracing::debug!(mode = self.mode.name(), "Overlay draw unavailable");
            return false;
        }
        self.selection.clear();
        self.mode = InteractionMode::Drawing(OverlayDrawSession::new(kind, &self.config));
        true
    }

    pub fn cancel_overlay_draw(&mut self) -> bool {
        match std::mem::take(&mut self.mode) {
            InteractionMode::Drawing(session) => {
                session.cancel();
                true
            }
            other => {
                self.mode = other;
                false
            }
        }
    }

    /// The rectangle being drawn, in display space.
    pub fn draw_draft(&self) -> Option<Rect> {
        match &self.mode {
            InteractionMode::Drawing(session) => session.draft(),
            _ => None,
        }
    }

    // ----- Pointer routing -----

    /// Route a pointer-down to the active session, or begin moving/resizing
    /// the selected overlay. Returns true if a gesture started.
    pub fn pointer_down(&mut self, point: Point) -> bool {
        if self.mode.is_idle() {
            return self.begin_overlay_edit(point);
        }
        match &mut self.mode {
            InteractionMode::Cropping(session) => session.pointer_down(point).is_some(),
            InteractionMode::Drawing(session) => session.pointer_down(point),
            InteractionMode::Editing(_) | InteractionMode::Idle => false,
        }
    }

    /// Gesture a press at `point` would start on the selected overlay.
    /// Handles are tested before the body.
    fn edit_gesture_at(&self, point: Point) -> Option<EditGesture> {
        let scale = self.display_geometry()?.scale;
        let overlay = self.selected_overlay()?;
        let handle = handle_at(
            point,
            &overlay.rect,
            &self.crop,
            scale,
            self.config.edit_handle_size,
        );
        match handle {
            Some(handle) => Some(EditGesture::Resize(handle)),
            None => display_contains(&original_to_display(&overlay.rect, &self.crop, scale), point)
                .then_some(EditGesture::Move),
        }
    }

    fn begin_overlay_edit(&mut self, point: Point) -> bool {
        let Some(gesture) = self.edit_gesture_at(point) else {
            return false;
        };
        let (Some(display), Some(overlay)) = (self.display_geometry(), self.selected_overlay()) else {
            return false;
        };

        match OverlayEditSession::begin(overlay, gesture, point, display.scale, &self.config) {
            Some(session) => {
                self.mode = InteractionMode::Editing(session);
                true
            }
            None => false,
        }
    }

    /// CSS cursor for the pointer at `point`, or `None` for the default.
    /// An active gesture keeps its cursor wherever the pointer is.
    pub fn hover_cursor(&self, point: Point) -> Option<&'static str> {
        match &self.mode {
            InteractionMode::Cropping(session) => {
                let gesture = session.gesture().or_else(|| {
                    if session.handle_hit_box().contains(point) {
                        Some(CropGesture::Resize)
                    } else if session.draft().contains(point) {
                        Some(CropGesture::Drag)
                    } else {
                        None
                    }
                });
                gesture.map(|g| match g {
                    CropGesture::Resize => "nwse-resize",
                    CropGesture::Drag => "move",
                })
            }
            InteractionMode::Drawing(_) => Some("crosshair"),
            InteractionMode::Editing(session) => Some(edit_cursor(session.gesture())),
            InteractionMode::Idle => self.edit_gesture_at(point).map(edit_cursor),
        }
    }

    /// Returns true if the draft changed.
    pub fn pointer_move(&mut self, point: Point) -> bool {
        match &mut self.mode {
            InteractionMode::Cropping(session) => session.pointer_move(point),
            InteractionMode::Drawing(session) => session.pointer_move(point),
            InteractionMode::Editing(session) => {
                session.pointer_move(point);
                true
            }
            InteractionMode::Idle => false,
        }
    }

    /// Release the pointer. Draw and edit sessions commit and end; a crop
    /// session stays open for confirm/cancel. Returns true if a gesture
    /// ended.
    pub fn pointer_up(&mut self, now_ms: f64) -> bool {
        let ended = match std::mem::take(&mut self.mode) {
            InteractionMode::Cropping(mut session) => {
                let ended = session.pointer_up();
                self.mode = InteractionMode::Cropping(session);
                ended
            }
            InteractionMode::Drawing(session) if session.is_capturing() => {
                self.commit_draw(session);
                true
            }
            InteractionMode::Editing(session) => {
                let (id, rect) = session.finish();
                self.overlays.set_rect(id, rect);
                true
            }
            other => {
                self.mode = other;
                false
            }
        };
        if ended {
            self.selection.mark_interaction_end(now_ms);
        }
        ended
    }

    fn commit_draw(&mut self, session: OverlayDrawSession) {
        let Some(scale) = self.display_geometry().map(|d| d.scale) else {
            session.cancel();
            return;
        };
        if let Some((rect, kind)) = session.finish(&self.crop, scale) {
            let id = self.overlays.push(rect, kind);
            tracing::debug!(%id, "Overlay added");
        }
    }

    /// A click on the canvas. Selects the topmost overlay under the point,
    /// or deselects on background outside the cooldown window. Ignored while
    /// a session is active. Returns the selection afterwards.
    pub fn click(&mut self, point: Point, now_ms: f64) -> Option<OverlayId> {
        if !self.mode.is_idle() {
            return self.selection.selected();
        }
        let Some(display) = self.display_geometry() else {
            return self.selection.selected();
        };
        let original = Point::new(
            self.crop.x as f64 + point.x / display.scale,
            self.crop.y as f64 + point.y / display.scale,
        );
        match self.overlays.hit_test(original) {
            Some(id) => self.selection.select(id),
            None => {
                self.selection.background_click(now_ms);
            }
        }
        self.selection.selected()
    }

    /// Keyboard input. Escape cancels an armed or in-progress draw.
    pub fn key_down(&mut self, key: &str) -> bool {
        if key == "Escape" && self.mode.is_drawing() {
            tracing::debug!("Overlay draw cancelled by Escape");
            return self.cancel_overlay_draw();
        }
        false
    }

    /// True while global pointer-move/up listeners should be attached.
    pub fn is_capturing(&self) -> bool {
        self.mode.is_capturing()
    }

    fn end_session(&mut self) {
        match std::mem::take(&mut self.mode) {
            InteractionMode::Idle => {}
            InteractionMode::Cropping(session) => session.cancel(),
            InteractionMode::Drawing(session) => session.cancel(),
            InteractionMode::Editing(session) => {
                tracing::debug!(id = %session.id(), "Overlay edit abandoned");
            }
        }
    }

    // ----- Overlay edits -----

    pub fn select_overlay(&mut self, id: OverlayId) -> bool {
        if self.overlays.get(id).is_none() {
            return false;
        }
        self.selection.select(id);
        true
    }

    pub fn deselect(&mut self) {
        self.selection.clear();
    }

    pub fn selected(&self) -> Option<OverlayId> {
        self.selection.selected()
    }

    pub fn delete_overlay(&mut self, id: OverlayId) -> bool {
        if self.overlays.remove(id).is_none() {
            return false;
        }
        if self.selection.selected() == Some(id) {
            self.selection.clear();
        }
        if matches!(&self.mode, InteractionMode::Editing(session) if session.id() == id) {
            self.mode = InteractionMode::Idle;
        }
        tracing::debug!(%id, "Overlay deleted");
        true
    }

    pub fn set_blur_intensity(&mut self, id: OverlayId, intensity: u8) -> bool {
        self.overlays.set_blur_intensity(id, intensity)
    }

    pub fn update_text_style(&mut self, id: OverlayId, patch: TextStylePatch) -> bool {
        self.overlays.update_text_style(id, |style| patch.apply(style))
    }

    /// An overlay's box in display space, following an in-progress edit.
    pub fn overlay_display_rect(&self, id: OverlayId) -> Option<PixelRect> {
        let scale = self.display_geometry()?.scale;
        let rect = match &self.mode {
            InteractionMode::Editing(session) if session.id() == id => session.current_rect(),
            _ => self.overlays.get(id)?.rect,
        };
        Some(original_to_display(&rect, &self.crop, scale))
    }

    // ----- Export settings -----

    pub fn set_export_settings(&mut self, settings: ExportSettings) {
        let mut next = settings;
        next.set_format(settings.encode.format);
        next.set_quality(settings.encode.quality);
        self.export_settings = next;
    }

    pub fn set_export_format(&mut self, format: ExportFormat) {
        self.export_settings.set_format(format);
    }

    pub fn set_export_quality(&mut self, quality: u8) {
        self.export_settings.set_quality(quality);
    }

    pub fn set_export_lossless(&mut self, lossless: bool) {
        self.export_settings.set_lossless(lossless);
    }

    pub fn set_resize_enabled(&mut self, enabled: bool) {
        self.export_settings.resize.set_enabled(enabled);
    }

    pub fn set_resize_target(&mut self, width: Option<u32>, height: Option<u32>) {
        self.export_settings.resize.width = width;
        self.export_settings.resize.height = height;
    }

    pub fn set_keep_aspect(&mut self, keep: bool) {
        self.export_settings.resize.keep_aspect = keep;
    }

    pub fn clear_export_error(&mut self) {
        self.export_state.last_error = None;
    }

    // ----- Rendering -----

    fn scene<'a>(&'a self, text: Option<&'a dyn TextRenderer>) -> Option<CompositeRequest<'a>> {
        let image = self.image.as_ref()?;
        Some(CompositeRequest {
            image,
            crop: self.crop,
            filter: self.filter,
            adjustments: &self.adjustments,
            overlays: self.overlays.as_slice(),
            target: self.crop.size(),
            rounding: self.crop_settings.rounding,
            resample: ResampleFilter::Bilinear,
            text,
        })
    }

    /// Composite a preview frame at display size and take a ticket for it.
    ///
    /// Rounding is suppressed while cropping. The returned frame still
    /// needs [`finish_preview`](Self::finish_preview), which runs the lossy
    /// round trip when the export format calls for it.
    pub fn prepare_preview(&mut self, text: Option<&dyn TextRenderer>) -> Option<PendingPreview> {
        let display = self.display_geometry()?;
        let ticket = self.preview.issue();
        let rounding = if self.mode.is_cropping() {
            0.0
        } else {
            self.crop_settings.rounding
        };
        let scene = self.scene(text)?;
        let request = CompositeRequest {
            target: display.size(),
            rounding,
            resample: ResampleFilter::Bilinear,
            ..scene
        };
        let image = composite(&request);
        let lossy = (self.config.lossy_preview && requires_lossy_preview(&self.export_settings))
            .then_some(self.export_settings.encode);
        Some(PendingPreview {
            ticket,
            image,
            lossy,
        })
    }

    /// Finish a pending frame and apply it if it is still the newest.
    pub fn finish_preview(&mut self, pending: PendingPreview, encoder: &dyn Encoder) -> bool {
        let (ticket, image, compressed) = pending.resolve(encoder);
        self.preview.apply(ticket, image, compressed)
    }

    /// Whether `ticket` is still the newest preview pass.
    pub fn is_preview_current(&self, ticket: PreviewTicket) -> bool {
        self.preview.is_current(ticket)
    }

    /// Prepare and finish a preview in one step.
    pub fn render_preview(
        &mut self,
        text: Option<&dyn TextRenderer>,
        encoder: &dyn Encoder,
    ) -> Option<&PreviewFrame> {
        let pending = self.prepare_preview(text)?;
        self.finish_preview(pending, encoder);
        self.preview.frame()
    }

    /// Composite at the export resolution and encode. The in-progress flag
    /// is cleared whatever the outcome; a failure message is kept in
    /// [`export_state`](Self::export_state).
    pub fn export(
        &mut self,
        text: Option<&dyn TextRenderer>,
        encoder: &dyn Encoder,
    ) -> Result<ExportArtifact, ExportError> {
        self.export_state.in_progress = true;
        self.export_state.last_error = None;

        let result = match self.scene(text) {
            Some(scene) => export_image(
                scene,
                &self.export_settings,
                self.file_name.as_deref(),
                encoder,
            ),
            None => Err(ExportError::NoImage),
        };

        self.export_state.in_progress = false;
        if let Err(e) = &result {
            tracing::warn!(error = %e, "Export failed");
            self.export_state.last_error = Some(e.to_string());
        }
        result
    }
}

fn edit_cursor(gesture: EditGesture) -> &'static str {
    match gesture {
        EditGesture::Move => "move",
        EditGesture::Resize(handle) => handle.cursor(),
    }
}

fn display_contains(rect: &PixelRect, point: Point) -> bool {
    Rect::new(
        rect.x as f64,
        rect.y as f64,
        rect.width as f64,
        rect.height as f64,
    )
    .contains(point)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::{CodecEncoder, EncodeError, EncodeOptions};
    use crate::overlay::{OverlayKind, TextAlign};
    use crate::session::ResizeHandle;
    use image::{Rgba, RgbaImage};

    /// 200x100 gradient shown in a 400px viewport (scale 2)
    fn session() -> EditingSession {
        let mut s = EditingSession::default();
        let img = RgbaImage::from_fn(200, 100, |x, y| Rgba([x as u8, y as u8, 90, 255]));
        s.load_image(DecodedImage::from_rgba_image(img), Some("photo.png"))
            .unwrap();
        s.set_viewport_width(400.0);
        s
    }

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    /// Draw a blur overlay from display (40, 20) to (120, 100): original (20, 10, 40, 40)
    fn draw_blur(s: &mut EditingSession, now_ms: f64) -> OverlayId {
        assert!(s.begin_overlay_draw(OverlayKindTag::Blur));
        assert!(s.pointer_down(p(40.0, 20.0)));
        assert!(s.pointer_move(p(120.0, 100.0)));
        assert!(s.pointer_up(now_ms));
        s.overlays().last().unwrap().id
    }

    struct BrokenEncoder;

    impl Encoder for BrokenEncoder {
        fn encode(
            &self,
            _pixels: &[u8],
            _width: u32,
            _height: u32,
            options: &EncodeOptions,
        ) -> Result<Vec<u8>, EncodeError> {
            Err(EncodeError::EncodingFailed {
                format: options.format,
                message: "out of memory".to_string(),
            })
        }
    }

    // ===== Load Tests =====

    #[test]
    fn test_load_sets_full_crop() {
        let s = session();
        assert_eq!(s.crop(), Crop::new(0, 0, 200, 100));
        let display = s.display_geometry().unwrap();
        assert_eq!((display.width, display.height), (400, 200));
        assert_eq!(display.scale, 2.0);
    }

    #[test]
    fn test_load_resets_state() {
        let mut s = session();
        draw_blur(&mut s, 0.0);
        s.set_crop_rounding(30.0);
        s.set_aspect_ratio(Some(1.0));
        s.set_lock_aspect_ratio(false);
        assert!(s.start_crop());

        let img = RgbaImage::from_pixel(50, 60, Rgba([1, 2, 3, 255]));
        s.load_image(DecodedImage::from_rgba_image(img), None).unwrap();
        assert!(s.overlays().is_empty());
        assert_eq!(s.crop(), Crop::new(0, 0, 50, 60));
        assert_eq!(*s.crop_settings(), CropSettings::default());
        assert!(s.mode().is_idle());
        assert_eq!(s.selected(), None);
    }

    #[test]
    fn test_failed_load_blocks_compositing() {
        let mut s = session();
        draw_blur(&mut s, 0.0);
        assert!(s.load_image_bytes(&[1, 2, 3], Some("bad.png")).is_err());
        assert!(!s.has_image());
        assert!(s.load_error().is_some());
        assert!(s.overlays().is_empty());
        assert!(s.display_geometry().is_none());
        assert!(s.render_preview(None, &CodecEncoder).is_none());
        assert!(matches!(s.export(None, &CodecEncoder), Err(ExportError::NoImage)));
    }

    #[test]
    fn test_load_empty_image_fails() {
        let mut s = EditingSession::default();
        let err = s.load_image(DecodedImage::new(0, 0, Vec::new()), None);
        assert!(matches!(err, Err(DecodeError::EmptyImage)));
        assert!(!s.has_image());
    }

    // ===== Crop Tests =====

    #[test]
    fn test_crop_resize_and_confirm() {
        let mut s = session();
        assert!(s.start_crop());
        assert_eq!(s.crop_draft(), Some(Rect::new(0.0, 0.0, 400.0, 200.0)));

        // Bottom-right handle
        assert!(s.pointer_down(p(390.0, 190.0)));
        assert!(s.is_capturing());
        assert!(s.pointer_move(p(190.0, 90.0)));
        assert!(s.pointer_up(0.0));
        assert!(!s.is_capturing());
        assert!(s.mode().is_cropping());

        assert!(s.confirm_crop());
        assert_eq!(s.crop(), Crop::new(0, 0, 100, 50));
        assert!(s.mode().is_idle());
    }

    #[test]
    fn test_crop_cancel_keeps_crop() {
        let mut s = session();
        s.start_crop();
        s.pointer_down(p(390.0, 190.0));
        s.pointer_move(p(100.0, 100.0));
        s.pointer_up(0.0);
        assert!(s.cancel_crop());
        assert_eq!(s.crop(), Crop::new(0, 0, 200, 100));
    }

    #[test]
    fn test_locked_preset_seeds_draft() {
        let mut s = session();
        s.set_aspect_ratio(Some(1.0));
        assert!(s.start_crop());
        assert_eq!(s.crop_draft(), Some(Rect::new(100.0, 0.0, 200.0, 200.0)));

        // Unlocking mid-session reseeds to the full canvas
        s.set_lock_aspect_ratio(false);
        assert_eq!(s.crop_draft(), Some(Rect::new(0.0, 0.0, 400.0, 200.0)));
    }

    #[test]
    fn test_crop_rounding_clamped() {
        let mut s = session();
        s.set_crop_rounding(80.0);
        assert_eq!(s.crop_settings().rounding, 50.0);
        s.set_crop_rounding(-5.0);
        assert_eq!(s.crop_settings().rounding, 0.0);
        s.set_crop_rounding(f32::NAN);
        assert_eq!(s.crop_settings().rounding, 0.0);
    }

    #[test]
    fn test_start_crop_needs_viewport() {
        let mut s = session();
        s.set_viewport_width(0.0);
        assert!(!s.start_crop());
    }

    // ===== Draw Tests =====

    #[test]
    fn test_draw_commits_in_original_space() {
        let mut s = session();
        let id = draw_blur(&mut s, 0.0);
        let overlay = s.overlay(id).unwrap();
        assert_eq!(overlay.rect, Rect::new(20.0, 10.0, 40.0, 40.0));
        assert_eq!(overlay.kind, OverlayKind::Blur { intensity: 5 });
        assert!(s.mode().is_idle());
    }

    #[test]
    fn test_tiny_draw_is_discarded() {
        let mut s = session();
        s.begin_overlay_draw(OverlayKindTag::Blur);
        s.pointer_down(p(10.0, 10.0));
        s.pointer_move(p(15.0, 15.0));
        assert!(s.pointer_up(0.0));
        assert!(s.overlays().is_empty());
        assert!(s.mode().is_idle());
    }

    #[test]
    fn test_escape_cancels_draw() {
        let mut s = session();
        s.begin_overlay_draw(OverlayKindTag::Text);
        s.pointer_down(p(10.0, 10.0));
        s.pointer_move(p(100.0, 100.0));
        assert!(s.key_down("Escape"));
        assert!(s.mode().is_idle());
        assert!(!s.pointer_up(0.0));
        assert!(s.overlays().is_empty());
        assert!(!s.key_down("Escape"));
    }

    #[test]
    fn test_other_keys_ignored() {
        let mut s = session();
        s.begin_overlay_draw(OverlayKindTag::Blur);
        assert!(!s.key_down("Enter"));
        assert!(s.mode().is_drawing());
    }

    #[test]
    fn test_draw_disabled_while_cropping() {
        let mut s = session();
        s.start_crop();
        assert!(!s.begin_overlay_draw(OverlayKindTag::Blur));
        assert!(s.mode().is_cropping());
    }

    #[test]
    fn test_draw_disabled_without_image() {
        let mut s = EditingSession::default();
        assert!(!s.begin_overlay_draw(OverlayKindTag::Blur));
    }

    #[test]
    fn test_start_crop_abandons_draw() {
        let mut s = session();
        s.begin_overlay_draw(OverlayKindTag::Blur);
        assert!(s.start_crop());
        assert!(s.mode().is_cropping());
    }

    // ===== Selection Tests =====

    #[test]
    fn test_click_selects_topmost() {
        let mut s = session();
        let first = draw_blur(&mut s, 0.0);
        let second = draw_blur(&mut s, 0.0);
        assert_ne!(first, second);
        assert_eq!(s.click(p(60.0, 60.0), 1_000.0), Some(second));
    }

    #[test]
    fn test_background_click_respects_cooldown() {
        let mut s = session();
        let id = draw_blur(&mut s, 1_000.0);
        s.click(p(60.0, 60.0), 1_010.0);
        assert_eq!(s.selected(), Some(id));

        // Release of another gesture at 2000
        s.pointer_down(p(60.0, 60.0));
        s.pointer_up(2_000.0);

        assert_eq!(s.click(p(300.0, 180.0), 2_050.0), Some(id));
        assert_eq!(s.click(p(300.0, 180.0), 2_150.0), None);
    }

    #[test]
    fn test_delete_clears_selection() {
        let mut s = session();
        let id = draw_blur(&mut s, 0.0);
        assert!(s.select_overlay(id));
        assert!(s.delete_overlay(id));
        assert_eq!(s.selected(), None);
        assert!(!s.delete_overlay(id));
        assert!(!s.select_overlay(id));
    }

    // ===== Edit Tests =====

    #[test]
    fn test_move_selected_overlay() {
        let mut s = session();
        let id = draw_blur(&mut s, 0.0);
        s.select_overlay(id);

        assert!(s.pointer_down(p(60.0, 60.0)));
        assert!(matches!(s.mode(), InteractionMode::Editing(e) if e.gesture() == EditGesture::Move));
        assert!(s.is_capturing());
        s.pointer_move(p(80.0, 70.0));
        assert_eq!(
            s.overlay_display_rect(id),
            Some(PixelRect { x: 60, y: 30, width: 80, height: 80 })
        );
        assert!(s.pointer_up(500.0));
        assert_eq!(s.overlay(id).unwrap().rect, Rect::new(30.0, 15.0, 40.0, 40.0));
    }

    #[test]
    fn test_resize_from_corner_handle() {
        let mut s = session();
        let id = draw_blur(&mut s, 0.0);
        s.select_overlay(id);

        assert!(s.pointer_down(p(120.0, 100.0)));
        assert!(matches!(
            s.mode(),
            InteractionMode::Editing(e) if e.gesture() == EditGesture::Resize(ResizeHandle::Se)
        ));
        s.pointer_move(p(140.0, 120.0));
        s.pointer_up(0.0);
        assert_eq!(s.overlay(id).unwrap().rect, Rect::new(20.0, 10.0, 50.0, 50.0));
    }

    #[test]
    fn test_pointer_down_needs_selection() {
        let mut s = session();
        draw_blur(&mut s, 0.0);
        assert!(!s.pointer_down(p(60.0, 60.0)));
        assert!(s.mode().is_idle());
    }

    // ===== Cursor Tests =====

    #[test]
    fn test_hover_cursor_over_selected_overlay() {
        let mut s = session();
        let id = draw_blur(&mut s, 0.0);
        assert_eq!(s.hover_cursor(p(60.0, 60.0)), None);

        s.select_overlay(id);
        assert_eq!(s.hover_cursor(p(40.0, 20.0)), Some("nwse-resize"));
        assert_eq!(s.hover_cursor(p(40.0, 100.0)), Some("nesw-resize"));
        assert_eq!(s.hover_cursor(p(80.0, 20.0)), Some("ns-resize"));
        assert_eq!(s.hover_cursor(p(120.0, 60.0)), Some("ew-resize"));
        assert_eq!(s.hover_cursor(p(70.0, 70.0)), Some("move"));
        assert_eq!(s.hover_cursor(p(300.0, 150.0)), None);
    }

    #[test]
    fn test_hover_cursor_follows_active_gesture() {
        let mut s = session();
        let id = draw_blur(&mut s, 0.0);
        s.select_overlay(id);
        assert!(s.pointer_down(p(120.0, 100.0)));
        // Pointer outruns the overlay mid-resize
        s.pointer_move(p(300.0, 180.0));
        assert_eq!(s.hover_cursor(p(300.0, 180.0)), Some("nwse-resize"));
        s.pointer_up(0.0);

        assert!(s.begin_overlay_draw(OverlayKindTag::Text));
        assert_eq!(s.hover_cursor(p(10.0, 10.0)), Some("crosshair"));
    }

    #[test]
    fn test_hover_cursor_while_cropping() {
        let mut s = session();
        s.start_crop();
        assert_eq!(s.hover_cursor(p(395.0, 195.0)), Some("nwse-resize"));
        assert_eq!(s.hover_cursor(p(100.0, 100.0)), Some("move"));

        s.pointer_down(p(395.0, 195.0));
        s.pointer_move(p(190.0, 90.0));
        assert_eq!(s.hover_cursor(p(190.0, 90.0)), Some("nwse-resize"));
        s.pointer_up(0.0);
        assert_eq!(s.hover_cursor(p(300.0, 150.0)), None);
    }

    #[test]
    fn test_property_edits() {
        let mut s = session();
        let blur = draw_blur(&mut s, 0.0);
        assert!(s.set_blur_intensity(blur, 200));
        assert_eq!(s.overlay(blur).unwrap().kind, OverlayKind::Blur { intensity: 25 });

        s.begin_overlay_draw(OverlayKindTag::Text);
        s.pointer_down(p(0.0, 0.0));
        s.pointer_move(p(100.0, 40.0));
        s.pointer_up(0.0);
        let text = s.overlays().last().unwrap().id;
        let patch = TextStylePatch {
            text: Some("Hi".to_string()),
            font_size: Some(2.0),
            align: Some(TextAlign::Center),
            ..TextStylePatch::default()
        };
        assert!(s.update_text_style(text, patch));
        match &s.overlay(text).unwrap().kind {
            OverlayKind::Text(style) => {
                assert_eq!(style.text, "Hi");
                assert_eq!(style.font_size, 8.0);
                assert_eq!(style.align, TextAlign::Center);
            }
            other => panic!("expected text overlay, got {:?}", other),
        }
        assert!(!s.update_text_style(blur, TextStylePatch::default()));
    }

    // ===== Adjustment Tests =====

    #[test]
    fn test_adjustments_clamp_and_reset() {
        let mut s = session();
        s.set_adjustment(AdjustmentKey::Brightness, 500.0);
        assert_eq!(s.adjustments().brightness, 150.0);
        s.reset_adjustments();
        assert!(s.adjustments().is_default());
    }

    // ===== Preview Tests =====

    #[test]
    fn test_preview_at_display_size() {
        let mut s = session();
        let frame = s.render_preview(None, &CodecEncoder).unwrap();
        assert_eq!(frame.image.dimensions(), (400, 200));
        assert!(!frame.compressed);
    }

    #[test]
    fn test_preview_lossy_round_trip() {
        let mut s = session();
        s.set_export_format(ExportFormat::Jpeg);
        let frame = s.render_preview(None, &CodecEncoder).unwrap();
        assert!(frame.compressed);
    }

    #[test]
    fn test_preview_webp_skips_round_trip() {
        let mut s = session();
        s.set_export_format(ExportFormat::WebP);
        s.set_export_quality(5);
        let pending = s.prepare_preview(None).unwrap();
        assert!(pending.lossy.is_none());
        let frame = s.render_preview(None, &CodecEncoder).unwrap();
        assert!(!frame.compressed);
    }

    #[test]
    fn test_stale_preview_not_applied() {
        let mut s = session();
        let older = s.prepare_preview(None).unwrap();
        let newer = s.prepare_preview(None).unwrap();
        let newest_generation = newer.ticket.generation();
        assert!(!s.is_preview_current(older.ticket));

        assert!(s.finish_preview(newer, &CodecEncoder));
        assert!(!s.finish_preview(older, &CodecEncoder));
        assert_eq!(s.preview_frame().unwrap().generation, newest_generation);
    }

    #[test]
    fn test_preview_suppresses_rounding_while_cropping() {
        let mut s = session();
        s.set_crop_rounding(50.0);
        let rounded = s.render_preview(None, &CodecEncoder).unwrap().image.clone();
        assert_eq!(rounded.get_pixel(0, 0)[3], 0);

        s.start_crop();
        let square = s.render_preview(None, &CodecEncoder).unwrap();
        assert_eq!(square.image.get_pixel(0, 0)[3], 255);
    }

    // ===== Export Tests =====

    #[test]
    fn test_export_success_clears_flags() {
        let mut s = session();
        s.set_export_format(ExportFormat::Jpeg);
        let artifact = s.export(None, &CodecEncoder).unwrap();
        assert_eq!(artifact.mime, "image/jpeg");
        assert_eq!(artifact.filename, "photo_edited.jpeg");
        assert_eq!((artifact.width, artifact.height), (200, 100));
        assert_eq!(*s.export_state(), ExportState::default());
    }

    #[test]
    fn test_export_follows_crop_aspect() {
        let mut s = session();
        s.start_crop();
        s.pointer_down(p(390.0, 190.0));
        s.pointer_move(p(190.0, 190.0));
        s.pointer_up(0.0);
        s.confirm_crop();
        assert_eq!(s.crop(), Crop::new(0, 0, 100, 100));

        s.set_resize_enabled(true);
        s.set_resize_target(Some(64), None);
        let artifact = s.export(None, &CodecEncoder).unwrap();
        assert_eq!((artifact.width, artifact.height), (64, 64));
    }

    #[test]
    fn test_export_failure_recorded() {
        let mut s = session();
        let err = s.export(None, &BrokenEncoder).unwrap_err();
        assert!(matches!(err, ExportError::Encode(_)));
        let state = s.export_state();
        assert!(!state.in_progress);
        assert!(state.last_error.as_deref().unwrap().contains("out of memory"));

        s.clear_export_error();
        assert!(s.export_state().last_error.is_none());
    }

    #[test]
    fn test_export_settings_rules() {
        let mut s = session();
        s.set_export_format(ExportFormat::WebP);
        s.set_export_lossless(true);
        assert!(s.export_settings().encode.lossless);
        s.set_export_format(ExportFormat::Png);
        assert!(!s.export_settings().encode.lossless);

        s.set_resize_enabled(true);
        s.set_resize_target(Some(10), Some(10));
        s.set_resize_enabled(false);
        assert_eq!(s.export_settings().resize.width, None);
    }
}
