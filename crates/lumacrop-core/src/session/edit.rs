//! Moving and resizing an existing overlay, plus selection.
//!
//! The session works directly in original space: pointer deltas are divided
//! by the display scale before being applied, so the overlay stays attached
//! to image content regardless of zoom.

use crate::config::EditorConfig;
use crate::geometry::{original_to_display, Crop, Point, Rect};
use crate::overlay::{Overlay, OverlayId};

use super::ResizeHandle;

/// What the pointer is doing to the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditGesture {
    Move,
    Resize(ResizeHandle),
}

/// A move or resize of one overlay, from pointer-down to release.
#[derive(Debug, Clone)]
pub struct OverlayEditSession {
    id: OverlayId,
    gesture: EditGesture,
    start: Point,
    start_rect: Rect,
    current: Rect,
    scale: f64,
    min_size: f64,
}

impl OverlayEditSession {
    /// Start editing `overlay` at display point `point`. `None` if the scale
    /// is unusable.
    pub fn begin(
        overlay: &Overlay,
        gesture: EditGesture,
        point: Point,
        scale: f64,
        config: &EditorConfig,
    ) -> Option<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return None;
        }
        tracing::debug!(id = %overlay.id, ?gesture, "Overlay edit started");
        Some(Self {
            id: overlay.id,
            gesture,
            start: point,
            start_rect: overlay.rect,
            current: overlay.rect,
            scale,
            min_size: config.min_edit_size,
        })
    }

    pub fn id(&self) -> OverlayId {
        self.id
    }

    pub fn gesture(&self) -> EditGesture {
        self.gesture
    }

    /// The in-progress rectangle, in original space.
    pub fn current_rect(&self) -> Rect {
        self.current
    }

    pub fn pointer_move(&mut self, point: Point) {
        let dx = (point.x - self.start.x) / self.scale;
        let dy = (point.y - self.start.y) / self.scale;
        let s = self.start_rect;

        self.current = match self.gesture {
            EditGesture::Move => Rect::new(s.x + dx, s.y + dy, s.width, s.height),
            EditGesture::Resize(handle) => {
                let min = self.min_size / self.scale;
                let mut r = s;
                if handle.moves_right() {
                    r.width = (s.width + dx).max(min);
                }
                if handle.moves_left() {
                    r.width = (s.width - dx).max(min);
                    r.x = s.right() - r.width;
                }
                if handle.moves_bottom() {
                    r.height = (s.height + dy).max(min);
                }
                if handle.moves_top() {
                    r.height = (s.height - dy).max(min);
                    r.y = s.bottom() - r.height;
                }
                r
            }
        };
    }

    /// Finish the gesture. The rectangle has its position clamped
    /// non-negative and its size floored at one original pixel.
    pub fn finish(self) -> (OverlayId, Rect) {
        let finite_or = |v: f64, fallback: f64| if v.is_finite() { v } else { fallback };
        let c = self.current;
        let rect = Rect::new(
            finite_or(c.x, 0.0).max(0.0),
            finite_or(c.y, 0.0).max(0.0),
            finite_or(c.width, 1.0).max(1.0),
            finite_or(c.height, 1.0).max(1.0),
        );
        tracing::debug!(id = %self.id, ?rect, "Overlay edit finished");
        (self.id, rect)
    }
}

/// Which resize handle of `rect` (original space) lies under `point`
/// (display space), if any.
///
/// Handles are `handle_size` squares centered on the corners and edge
/// midpoints of the displayed box.
pub fn handle_at(
    point: Point,
    rect: &Rect,
    crop: &Crop,
    scale: f64,
    handle_size: f64,
) -> Option<ResizeHandle> {
    if !scale.is_finite() || scale <= 0.0 {
        return None;
    }
    let bounds = original_to_display(rect, crop, scale);
    let half = handle_size / 2.0;
    ResizeHandle::ALL.into_iter().find(|handle| {
        let (fx, fy) = handle.anchor();
        let cx = bounds.x as f64 + bounds.width as f64 * fx;
        let cy = bounds.y as f64 + bounds.height as f64 * fy;
        Rect::new(cx - half, cy - half, handle_size, handle_size).contains(point)
    })
}

/// The selected overlay and the post-release click cooldown.
#[derive(Debug, Clone)]
pub struct Selection {
    selected: Option<OverlayId>,
    last_interaction_end: Option<f64>,
    cooldown_ms: f64,
}

impl Selection {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            selected: None,
            last_interaction_end: None,
            cooldown_ms: config.click_cooldown_ms,
        }
    }

    pub fn selected(&self) -> Option<OverlayId> {
        self.selected
    }

    pub fn select(&mut self, id: OverlayId) {
        self.selected = Some(id);
    }

    pub fn clear(&mut self) {
        self.selected = None;
    }

    /// Record when an interaction was released (caller clock, ms).
    pub fn mark_interaction_end(&mut self, now_ms: f64) {
        self.last_interaction_end = Some(now_ms);
    }

    pub fn in_cooldown(&self, now_ms: f64) -> bool {
        self.last_interaction_end
            .is_some_and(|end| now_ms - end < self.cooldown_ms)
    }

    /// A click that hit no overlay. Deselects unless it falls inside the
    /// cooldown window. Returns true if the selection was cleared.
    pub fn background_click(&mut self, now_ms: f64) -> bool {
        if self.in_cooldown(now_ms) {
            tracing::trace!("Background click suppressed by cooldown");
            return false;
        }
        self.selected.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::{OverlayKind, OverlayKindTag};

    fn overlay(rect: Rect) -> Overlay {
        Overlay {
            id: OverlayId(7),
            rect,
            kind: OverlayKind::default_for(OverlayKindTag::Blur),
        }
    }

    fn begin(gesture: EditGesture, scale: f64) -> OverlayEditSession {
        let o = overlay(Rect::new(100.0, 100.0, 200.0, 100.0));
        OverlayEditSession::begin(&o, gesture, Point::new(0.0, 0.0), scale, &EditorConfig::default())
            .unwrap()
    }

    // ===== Move Tests =====

    #[test]
    fn test_move_divides_by_scale() {
        let mut s = begin(EditGesture::Move, 2.0);
        s.pointer_move(Point::new(20.0, -10.0));
        assert_eq!(s.current_rect(), Rect::new(110.0, 95.0, 200.0, 100.0));
    }

    #[test]
    fn test_finish_clamps_position() {
        let mut s = begin(EditGesture::Move, 1.0);
        s.pointer_move(Point::new(-500.0, -500.0));
        let (id, rect) = s.finish();
        assert_eq!(id, OverlayId(7));
        assert_eq!(rect, Rect::new(0.0, 0.0, 200.0, 100.0));
    }

    #[test]
    fn test_begin_rejects_bad_scale() {
        let o = overlay(Rect::new(0.0, 0.0, 10.0, 10.0));
        let cfg = EditorConfig::default();
        assert!(OverlayEditSession::begin(&o, EditGesture::Move, Point::default(), 0.0, &cfg).is_none());
    }

    // ===== Resize Tests =====

    #[test]
    fn test_resize_east_only_changes_width() {
        let mut s = begin(EditGesture::Resize(ResizeHandle::E), 1.0);
        s.pointer_move(Point::new(50.0, 80.0));
        assert_eq!(s.current_rect(), Rect::new(100.0, 100.0, 250.0, 100.0));
    }

    #[test]
    fn test_resize_west_anchors_right_edge() {
        let mut s = begin(EditGesture::Resize(ResizeHandle::W), 1.0);
        s.pointer_move(Point::new(50.0, 0.0));
        let r = s.current_rect();
        assert_eq!(r, Rect::new(150.0, 100.0, 150.0, 100.0));
        assert_eq!(r.right(), 300.0);
    }

    #[test]
    fn test_resize_north_floors_and_anchors_bottom() {
        let mut s = begin(EditGesture::Resize(ResizeHandle::N), 2.0);
        s.pointer_move(Point::new(0.0, 1000.0));
        let r = s.current_rect();
        // Floor is 20 display px = 10 original px
        assert_eq!(r.height, 10.0);
        assert_eq!(r.bottom(), 200.0);
    }

    #[test]
    fn test_resize_corner_changes_both_axes() {
        let mut s = begin(EditGesture::Resize(ResizeHandle::Nw), 1.0);
        s.pointer_move(Point::new(-10.0, -20.0));
        assert_eq!(s.current_rect(), Rect::new(90.0, 80.0, 210.0, 120.0));
    }

    // ===== Handle Hit Testing Tests =====

    #[test]
    fn test_handle_at_corners_and_edges() {
        let crop = Crop::new(0, 0, 1000, 1000);
        let rect = Rect::new(100.0, 100.0, 200.0, 100.0);
        // Display box at scale 1: (100, 100) .. (300, 200)
        assert_eq!(handle_at(Point::new(101.0, 99.0), &rect, &crop, 1.0, 10.0), Some(ResizeHandle::Nw));
        assert_eq!(handle_at(Point::new(200.0, 200.0), &rect, &crop, 1.0, 10.0), Some(ResizeHandle::S));
        assert_eq!(handle_at(Point::new(304.0, 150.0), &rect, &crop, 1.0, 10.0), Some(ResizeHandle::E));
        assert_eq!(handle_at(Point::new(200.0, 150.0), &rect, &crop, 1.0, 10.0), None);
    }

    #[test]
    fn test_handle_at_respects_crop_offset() {
        let crop = Crop::new(100, 100, 500, 500);
        let rect = Rect::new(100.0, 100.0, 50.0, 50.0);
        // Display box at scale 2: (0, 0) .. (100, 100)
        assert_eq!(handle_at(Point::new(99.0, 101.0), &rect, &crop, 2.0, 10.0), Some(ResizeHandle::Se));
    }

    // ===== Selection Tests =====

    #[test]
    fn test_background_click_deselects() {
        let mut sel = Selection::new(&EditorConfig::default());
        sel.select(OverlayId(1));
        assert!(sel.background_click(1000.0));
        assert_eq!(sel.selected(), None);
        assert!(!sel.background_click(1000.0));
    }

    #[test]
    fn test_cooldown_suppresses_deselect() {
        let mut sel = Selection::new(&EditorConfig::default());
        sel.select(OverlayId(1));
        sel.mark_interaction_end(5000.0);
        assert!(!sel.background_click(5050.0));
        assert_eq!(sel.selected(), Some(OverlayId(1)));
        assert!(sel.background_click(5100.0));
        assert_eq!(sel.selected(), None);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
