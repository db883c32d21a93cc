//! Blur-region and text overlays.
//!
//! Overlays are stored in original-space coordinates so they stay attached to
//! image content when the crop or display size changes. The stack order is the
//! insertion order and doubles as z-order: later overlays render on top.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Point, Rect};

/// Blur intensity bounds (percent of the overlay's average dimension).
pub const MIN_BLUR_INTENSITY: u8 = 1;
pub const MAX_BLUR_INTENSITY: u8 = 25;
pub const DEFAULT_BLUR_INTENSITY: u8 = 5;

/// Smallest allowed text size, in original pixels.
pub const MIN_FONT_SIZE: f32 = 8.0;
pub const DEFAULT_FONT_SIZE: f32 = 48.0;
pub const DEFAULT_TEXT: &str = "Enter Text";
pub const DEFAULT_FONT_FAMILY: &str = "Arial";

/// Font families offered by the editor UI (CSS-style family lists).
pub const FONT_FAMILIES: &[(&str, &str)] = &[
    ("Calibri", "Calibri, sans-serif"),
    ("Arial", "Arial, sans-serif"),
    ("Verdana", "Verdana, sans-serif"),
    ("Times New Roman", "'Times New Roman', Times, serif"),
    ("Georgia", "Georgia, serif"),
    ("Courier New", "'Courier New', Courier, monospace"),
    ("Impact", "Impact, fantasy"),
    ("Brush Script MT", "'Brush Script MT', cursive"),
];

/// Stable identifier of an overlay within one editing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OverlayId(pub u64);

impl fmt::Display for OverlayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "overlay-{}", self.0)
    }
}

/// Error parsing a hex color string.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid color '{0}': expected #RRGGBB or #RRGGBBAA")]
pub struct ColorParseError(pub String);

/// Straight (non-premultiplied) RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .trim()
            .strip_prefix('#')
            .ok_or_else(|| ColorParseError(s.to_string()))?;
        if !hex.is_ascii() {
            return Err(ColorParseError(s.to_string()));
        }
        let channel = |i: usize| {
            u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ColorParseError(s.to_string()))
        };
        match hex.len() {
            6 => Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Ok(Color {
                r: channel(0)?,
                g: channel(2)?,
                b: channel(4)?,
                a: channel(6)?,
            }),
            _ => Err(ColorParseError(s.to_string())),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.a == 255 {
            write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            write!(f, "#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }
}

impl Serialize for Color {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Horizontal text alignment inside the overlay rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Text overlay properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextStyle {
    pub text: String,
    /// Font size in original pixels (>= 8)
    pub font_size: f32,
    pub color: Color,
    /// CSS-style family list, e.g. `"'Times New Roman', Times, serif"`
    pub font_family: String,
    pub align: TextAlign,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            text: DEFAULT_TEXT.to_string(),
            font_size: DEFAULT_FONT_SIZE,
            color: Color::WHITE,
            font_family: DEFAULT_FONT_FAMILY.to_string(),
            align: TextAlign::Left,
        }
    }
}

impl TextStyle {
    /// Enforce the font size floor.
    pub fn normalized(mut self) -> Self {
        if !self.font_size.is_finite() || self.font_size < MIN_FONT_SIZE {
            self.font_size = MIN_FONT_SIZE;
        }
        self
    }
}

/// A partial text style update; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextStylePatch {
    pub text: Option<String>,
    pub font_size: Option<f32>,
    pub color: Option<Color>,
    pub font_family: Option<String>,
    pub align: Option<TextAlign>,
}

impl TextStylePatch {
    pub fn apply(self, style: &mut TextStyle) {
        if let Some(text) = self.text {
            style.text = text;
        }
        if let Some(size) = self.font_size {
            style.font_size = size;
        }
        if let Some(color) = self.color {
            style.color = color;
        }
        if let Some(family) = self.font_family {
            style.font_family = family;
        }
        if let Some(align) = self.align {
            style.align = align;
        }
    }
}

/// Which kind of overlay a draw session creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverlayKindTag {
    Blur,
    Text,
}

impl FromStr for OverlayKindTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blur" => Ok(Self::Blur),
            "text" => Ok(Self::Text),
            other => Err(format!("Unknown overlay kind: {}", other)),
        }
    }
}

/// Kind-specific overlay data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OverlayKind {
    Blur { intensity: u8 },
    Text(TextStyle),
}

impl OverlayKind {
    /// Defaults for a freshly drawn overlay.
    pub fn default_for(tag: OverlayKindTag) -> Self {
        match tag {
            OverlayKindTag::Blur => OverlayKind::Blur {
                intensity: DEFAULT_BLUR_INTENSITY,
            },
            OverlayKindTag::Text => OverlayKind::Text(TextStyle::default()),
        }
    }

    pub fn tag(&self) -> OverlayKindTag {
        match self {
            OverlayKind::Blur { .. } => OverlayKindTag::Blur,
            OverlayKind::Text(_) => OverlayKindTag::Text,
        }
    }

    fn normalized(self) -> Self {
        match self {
            OverlayKind::Blur { intensity } => OverlayKind::Blur {
                intensity: clamp_intensity(intensity),
            },
            OverlayKind::Text(style) => OverlayKind::Text(style.normalized()),
        }
    }
}

/// A positioned overlay in original-space coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    pub id: OverlayId,
    pub rect: Rect,
    #[serde(flatten)]
    pub kind: OverlayKind,
}

/// Ordered overlay list; index order is z-order.
#[derive(Debug, Clone, Default)]
pub struct OverlayStack {
    items: Vec<Overlay>,
    next_id: u64,
}

impl OverlayStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an overlay on top of the stack and return its id.
    pub fn push(&mut self, rect: Rect, kind: OverlayKind) -> OverlayId {
        self.next_id += 1;
        let id = OverlayId(self.next_id);
        self.items.push(Overlay {
            id,
            rect,
            kind: kind.normalized(),
        });
        id
    }

    pub fn get(&self, id: OverlayId) -> Option<&Overlay> {
        self.items.iter().find(|o| o.id == id)
    }

    /// Replace an overlay's rectangle. Returns false if the id is unknown.
    pub fn set_rect(&mut self, id: OverlayId, rect: Rect) -> bool {
        match self.items.iter_mut().find(|o| o.id == id) {
            Some(overlay) => {
                overlay.rect = rect;
                true
            }
            None => false,
        }
    }

    /// Set a blur overlay's intensity (clamped to 1..=25). Returns false if
    /// the id is unknown or not a blur overlay.
    pub fn set_blur_intensity(&mut self, id: OverlayId, value: u8) -> bool {
        match self.items.iter_mut().find(|o| o.id == id) {
            Some(Overlay {
                kind: OverlayKind::Blur { intensity },
                ..
            }) => {
                *intensity = clamp_intensity(value);
                true
            }
            _ => false,
        }
    }

    /// Edit a text overlay's style in place. Returns false if the id is
    /// unknown or not a text overlay.
    pub fn update_text_style(&mut self, id: OverlayId, edit: impl FnOnce(&mut TextStyle)) -> bool {
        match self.items.iter_mut().find(|o| o.id == id) {
            Some(Overlay {
                kind: OverlayKind::Text(style),
                ..
            }) => {
                edit(style);
                if !style.font_size.is_finite() || style.font_size < MIN_FONT_SIZE {
                    style.font_size = MIN_FONT_SIZE;
                }
                true
            }
            _ => false,
        }
    }

    pub fn remove(&mut self, id: OverlayId) -> Option<Overlay> {
        let index = self.items.iter().position(|o| o.id == id)?;
        Some(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Topmost overlay containing `point` (original space).
    pub fn hit_test(&self, point: Point) -> Option<OverlayId> {
        self.items
            .iter()
            .rev()
            .find(|o| o.rect.contains(point))
            .map(|o| o.id)
    }

    pub fn as_slice(&self) -> &[Overlay] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn clamp_intensity(value: u8) -> u8 {
    value.clamp(MIN_BLUR_INTENSITY, MAX_BLUR_INTENSITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect() -> Rect {
        Rect::new(10.0, 10.0, 50.0, 40.0)
    }

    #[test]
    fn test_color_parse_rgb() {
        let c: Color = "#FF8000".parse().unwrap();
        assert_eq!(c, Color::rgb(255, 128, 0));
        assert_eq!(c.to_string(), "#FF8000");
    }

    #[test]
    fn test_color_parse_rgba() {
        let c: Color = "#00000080".parse().unwrap();
        assert_eq!(c.a, 0x80);
        assert_eq!(c.to_string(), "#00000080");
    }

    #[test]
    fn test_color_parse_invalid() {
        assert!("FFFFFF".parse::<Color>().is_err());
        assert!("#FFF".parse::<Color>().is_err());
        assert!("#GGGGGG".parse::<Color>().is_err());
    }

    #[test]
    fn test_push_assigns_unique_ids_in_order() {
        let mut stack = OverlayStack::new();
        let a = stack.push(rect(), OverlayKind::default_for(OverlayKindTag::Blur));
        let b = stack.push(rect(), OverlayKind::default_for(OverlayKindTag::Text));
        assert_ne!(a, b);
        assert_eq!(stack.as_slice()[0].id, a);
        assert_eq!(stack.as_slice()[1].id, b);
    }

    #[test]
    fn test_ids_not_reused_after_removal() {
        let mut stack = OverlayStack::new();
        let a = stack.push(rect(), OverlayKind::default_for(OverlayKindTag::Blur));
        stack.remove(a);
        let b = stack.push(rect(), OverlayKind::default_for(OverlayKindTag::Blur));
        assert_ne!(a, b);
    }

    #[test]
    fn test_blur_defaults_and_clamping() {
        let mut stack = OverlayStack::new();
        let id = stack.push(rect(), OverlayKind::Blur { intensity: 200 });
        assert_eq!(
            stack.get(id).unwrap().kind,
            OverlayKind::Blur { intensity: 25 }
        );

        assert!(stack.set_blur_intensity(id, 0));
        assert_eq!(stack.get(id).unwrap().kind, OverlayKind::Blur { intensity: 1 });
    }

    #[test]
    fn test_text_defaults() {
        match OverlayKind::default_for(OverlayKindTag::Text) {
            OverlayKind::Text(style) => {
                assert_eq!(style.text, "Enter Text");
                assert_eq!(style.font_size, 48.0);
                assert_eq!(style.color, Color::WHITE);
                assert_eq!(style.align, TextAlign::Left);
            }
            other => panic!("Expected text overlay, got {:?}", other),
        }
    }

    #[test]
    fn test_update_text_style_enforces_font_floor() {
        let mut stack = OverlayStack::new();
        let id = stack.push(rect(), OverlayKind::default_for(OverlayKindTag::Text));
        assert!(stack.update_text_style(id, |s| {
            s.font_size = 2.0;
            s.align = TextAlign::Right;
        }));
        match &stack.get(id).unwrap().kind {
            OverlayKind::Text(style) => {
                assert_eq!(style.font_size, MIN_FONT_SIZE);
                assert_eq!(style.align, TextAlign::Right);
            }
            other => panic!("Expected text overlay, got {:?}", other),
        }
    }

    #[test]
    fn test_kind_specific_edits_reject_wrong_kind() {
        let mut stack = OverlayStack::new();
        let blur = stack.push(rect(), OverlayKind::default_for(OverlayKindTag::Blur));
        let text = stack.push(rect(), OverlayKind::default_for(OverlayKindTag::Text));
        assert!(!stack.update_text_style(blur, |s| s.text.clear()));
        assert!(!stack.set_blur_intensity(text, 10));
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let mut stack = OverlayStack::new();
        let _bottom = stack.push(rect(), OverlayKind::default_for(OverlayKindTag::Blur));
        let top = stack.push(rect(), OverlayKind::default_for(OverlayKindTag::Blur));
        assert_eq!(stack.hit_test(Point::new(20.0, 20.0)), Some(top));
        assert_eq!(stack.hit_test(Point::new(500.0, 500.0)), None);
    }

    #[test]
    fn test_set_rect_and_clear() {
        let mut stack = OverlayStack::new();
        let id = stack.push(rect(), OverlayKind::default_for(OverlayKindTag::Blur));
        let moved = Rect::new(0.0, 0.0, 5.0, 5.0);
        assert!(stack.set_rect(id, moved));
        assert_eq!(stack.get(id).unwrap().rect, moved);
        assert!(!stack.set_rect(OverlayId(999), moved));

        stack.clear();
        assert!(stack.is_empty());
    }

    #[test]
    fn test_kind_tag_parse() {
        assert_eq!("Blur".parse::<OverlayKindTag>(), Ok(OverlayKindTag::Blur));
        assert_eq!("text".parse::<OverlayKindTag>(), Ok(OverlayKindTag::Text));
        assert!("sticker".parse::<OverlayKindTag>().is_err());
    }

    #[test]
    fn test_patch_touches_only_given_fields() {
        let mut style = TextStyle::default();
        TextStylePatch {
            text: Some("Hello".to_string()),
            align: Some(TextAlign::Right),
            ..TextStylePatch::default()
        }
        .apply(&mut style);
        assert_eq!(style.text, "Hello");
        assert_eq!(style.align, TextAlign::Right);
        assert_eq!(style.font_size, DEFAULT_FONT_SIZE);
        assert_eq!(style.color, Color::WHITE);
    }
}
