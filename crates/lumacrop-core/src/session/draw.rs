//! Drawing a new overlay by dragging out a rectangle.

use crate::config::EditorConfig;
use crate::geometry::{display_to_original, Crop, Point, Rect};
use crate::overlay::{OverlayKind, OverlayKindTag};

/// An armed draw session. The first pointer-down sets the anchor.
#[derive(Debug, Clone)]
pub struct OverlayDrawSession {
    kind: OverlayKindTag,
    anchor: Option<Point>,
    draft: Option<Rect>,
    min_size: f64,
}

impl OverlayDrawSession {
    pub fn new(kind: OverlayKindTag, config: &EditorConfig) -> Self {
        Self {
            kind,
            anchor: None,
            draft: None,
            min_size: config.min_draw_size,
        }
    }

    pub fn kind(&self) -> OverlayKindTag {
        self.kind
    }

    /// Rectangle being drawn, in display space.
    pub fn draft(&self) -> Option<Rect> {
        self.draft
    }

    pub fn is_capturing(&self) -> bool {
        self.anchor.is_some()
    }

    /// Set the anchor. Ignored while a rectangle is already being drawn.
    pub fn pointer_down(&mut self, point: Point) -> bool {
        if self.anchor.is_some() {
            return false;
        }
        self.anchor = Some(point);
        self.draft = Some(Rect::new(point.x, point.y, 0.0, 0.0));
        true
    }

    pub fn pointer_move(&mut self, point: Point) -> bool {
        let Some(anchor) = self.anchor else {
            return false;
        };
        self.draft = Some(Rect::from_corners(anchor, point));
        true
    }

    /// End the session. Yields the original-space rectangle (rounded, position
    /// clamped non-negative) and the kind's default properties when the draft
    /// is at least the minimum size on both axes, otherwise nothing.
    pub fn finish(self, crop: &Crop, scale: f64) -> Option<(Rect, OverlayKind)> {
        let draft = self.draft?;
        let big_enough = draft.width >= self.min_size && draft.height >= self.min_size;
        if !big_enough || !scale.is_finite() || scale <= 0.0 {
            tracing::debug!(
                width = draft.width,
                height = draft.height,
                scale,
                "Overlay draw discarded"
            );
            return None;
        }
        let r = display_to_original(&draft, crop, scale);
        let rect = Rect::new(
            r.x.max(0.0).round(),
            r.y.max(0.0).round(),
            r.width.max(1.0).round(),
            r.height.max(1.0).round(),
        );
        tracing::debug!(kind = ?self.kind, ?rect, "Overlay drawn");
        Some((rect, OverlayKind::default_for(self.kind)))
    }

    pub fn cancel(self) {
        tracing::debug!(kind = ?self.kind, "Overlay draw cancelled");
    }
}
