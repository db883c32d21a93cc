//! Tonal adjustments.
//!
//! Seven sliders, each with a fixed range and default:
//!
//! | Key         | Range      | Default | Unit |
//! |-------------|------------|---------|------|
//! | brightness  | 50..=150   | 100     | %    |
//! | contrast    | 50..=150   | 100     | %    |
//! | saturation  | 50..=150   | 100     | %    |
//! | hue         | -180..=180 | 0       | °    |
//! | sharpness   | -100..=100 | 0       |      |
//! | temperature | -100..=100 | 0       |      |
//! | tint        | -100..=100 | 0       |      |
//!
//! Brightness, contrast, saturation and hue fold into the filter's color
//! matrix. Sharpness runs as its own convolution stage. Temperature and tint
//! are a per-pixel channel shift applied after sharpening.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::ColorMatrix;

/// Channel shift per unit of temperature or tint.
const WHITE_BALANCE_FACTOR: f32 = 0.3;

/// One adjustment slider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentKey {
    Brightness,
    Contrast,
    Saturation,
    Hue,
    Sharpness,
    Temperature,
    Tint,
}

impl AdjustmentKey {
    pub const ALL: [AdjustmentKey; 7] = [
        AdjustmentKey::Brightness,
        AdjustmentKey::Contrast,
        AdjustmentKey::Saturation,
        AdjustmentKey::Hue,
        AdjustmentKey::Sharpness,
        AdjustmentKey::Temperature,
        AdjustmentKey::Tint,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AdjustmentKey::Brightness => "Brightness",
            AdjustmentKey::Contrast => "Contrast",
            AdjustmentKey::Saturation => "Saturation",
            AdjustmentKey::Hue => "Hue",
            AdjustmentKey::Sharpness => "Sharpness",
            AdjustmentKey::Temperature => "Temperature",
            AdjustmentKey::Tint => "Tint",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            AdjustmentKey::Brightness | AdjustmentKey::Contrast | AdjustmentKey::Saturation => "%",
            AdjustmentKey::Hue => "°",
            _ => "",
        }
    }

    /// Inclusive `(min, max)`.
    pub fn range(&self) -> (f32, f32) {
        match self {
            AdjustmentKey::Brightness | AdjustmentKey::Contrast | AdjustmentKey::Saturation => {
                (50.0, 150.0)
            }
            AdjustmentKey::Hue => (-180.0, 180.0),
            AdjustmentKey::Sharpness | AdjustmentKey::Temperature | AdjustmentKey::Tint => {
                (-100.0, 100.0)
            }
        }
    }

    pub fn default_value(&self) -> f32 {
        match self {
            AdjustmentKey::Brightness | AdjustmentKey::Contrast | AdjustmentKey::Saturation => {
                100.0
            }
            _ => 0.0,
        }
    }

    /// Clamp `value` into this key's range. Non-finite input yields the default.
    pub fn clamp(&self, value: f32) -> f32 {
        if !value.is_finite() {
            return self.default_value();
        }
        let (min, max) = self.range();
        value.clamp(min, max)
    }
}

impl FromStr for AdjustmentKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AdjustmentKey::ALL
            .iter()
            .find(|k| k.label().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| format!("Unknown adjustment: {}", s))
    }
}

/// Current slider values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Adjustments {
    /// Brightness percent (50 to 150)
    pub brightness: f32,
    /// Contrast percent (50 to 150)
    pub contrast: f32,
    /// Saturation percent (50 to 150)
    pub saturation: f32,
    /// Hue rotation in degrees (-180 to 180)
    pub hue: f32,
    /// Sharpen (positive) or blur (negative) (-100 to 100)
    pub sharpness: f32,
    /// Warm (positive) or cool (negative) shift (-100 to 100)
    pub temperature: f32,
    /// Green (positive) or magenta (negative) shift (-100 to 100)
    pub tint: f32,
}

impl Default for Adjustments {
    fn default() -> Self {
        Self {
            brightness: 100.0,
            contrast: 100.0,
            saturation: 100.0,
            hue: 0.0,
            sharpness: 0.0,
            temperature: 0.0,
            tint: 0.0,
        }
    }
}

impl Adjustments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if all values are at their defaults
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn get(&self, key: AdjustmentKey) -> f32 {
        match key {
            AdjustmentKey::Brightness => self.brightness,
            AdjustmentKey::Contrast => self.contrast,
            AdjustmentKey::Saturation => self.saturation,
            AdjustmentKey::Hue => self.hue,
            AdjustmentKey::Sharpness => self.sharpness,
            AdjustmentKey::Temperature => self.temperature,
            AdjustmentKey::Tint => self.tint,
        }
    }

    /// Set a slider, clamped to its range.
    pub fn set(&mut self, key: AdjustmentKey, value: f32) {
        let value = key.clamp(value);
        let slot = match key {
            AdjustmentKey::Brightness => &mut self.brightness,
            AdjustmentKey::Contrast => &mut self.contrast,
            AdjustmentKey::Saturation => &mut self.saturation,
            AdjustmentKey::Hue => &mut self.hue,
            AdjustmentKey::Sharpness => &mut self.sharpness,
            AdjustmentKey::Temperature => &mut self.temperature,
            AdjustmentKey::Tint => &mut self.tint,
        };
        *slot = value;
    }

    /// Copy with every field clamped into range.
    pub fn clamped(&self) -> Self {
        let mut out = *self;
        for key in AdjustmentKey::ALL {
            out.set(key, self.get(key));
        }
        out
    }

    /// Brightness, contrast, saturation and hue as one matrix, in that order.
    pub fn color_matrix(&self) -> ColorMatrix {
        ColorMatrix::brightness(self.brightness / 100.0)
            .then(&ColorMatrix::contrast(self.contrast / 100.0))
            .then(&ColorMatrix::saturate(self.saturation / 100.0))
            .then(&ColorMatrix::hue_rotate(self.hue))
    }

    /// True if the temperature/tint stage would change pixels.
    pub fn has_white_balance(&self) -> bool {
        self.temperature != 0.0 || self.tint != 0.0
    }
}

/// Shift channels for temperature and tint, in place on RGBA data.
///
/// `R += 0.3*temperature`, `B -= 0.3*temperature`, `G += 0.3*tint`, each
/// clamped to 0..=255. Alpha is untouched.
pub fn apply_white_balance(pixels: &mut [u8], temperature: f32, tint: f32) {
    if temperature == 0.0 && tint == 0.0 {
        return;
    }
    let warm = temperature * WHITE_BALANCE_FACTOR;
    let green = tint * WHITE_BALANCE_FACTOR;

    for px in pixels.chunks_exact_mut(4) {
        px[0] = shift(px[0], warm);
        px[1] = shift(px[1], green);
        px[2] = shift(px[2], -warm);
    }
}

#[inline]
fn shift(channel: u8, amount: f32) -> u8 {
    (channel as f32 + amount).clamp(0.0, 255.0).round() as u8
}
