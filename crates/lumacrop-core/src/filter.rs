//! The fixed set of named filters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::color::ColorMatrix;

/// Gaussian blur radius of the Soft Focus filter, in target pixels.
pub const SOFT_FOCUS_RADIUS: f32 = 2.0;

/// A named look applied before the tonal adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Filter {
    #[default]
    None,
    Grayscale,
    Vintage,
    Vibrant,
    #[serde(rename = "Soft Focus")]
    SoftFocus,
    Noir,
    Sepia,
    Invert,
    Polaroid,
    Sketch,
}

/// How a filter touches pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterOp {
    /// Optional gaussian pre-blur, then a color matrix. Composes with adjustments.
    Color {
        matrix: ColorMatrix,
        blur_radius: Option<f32>,
    },
    /// Sobel edge rendering. Replaces the color stage entirely.
    EdgeSketch,
}

impl Filter {
    pub const ALL: [Filter; 10] = [
        Filter::None,
        Filter::Grayscale,
        Filter::Vintage,
        Filter::Vibrant,
        Filter::SoftFocus,
        Filter::Noir,
        Filter::Sepia,
        Filter::Invert,
        Filter::Polaroid,
        Filter::Sketch,
    ];

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Filter::None => "None",
            Filter::Grayscale => "Grayscale",
            Filter::Vintage => "Vintage",
            Filter::Vibrant => "Vibrant",
            Filter::SoftFocus => "Soft Focus",
            Filter::Noir => "Noir",
            Filter::Sepia => "Sepia",
            Filter::Invert => "Invert",
            Filter::Polaroid => "Polaroid",
            Filter::Sketch => "Sketch",
        }
    }

    pub fn operation(&self) -> FilterOp {
        let color = |matrix| FilterOp::Color {
            matrix,
            blur_radius: None,
        };
        match self {
            Filter::None => color(ColorMatrix::IDENTITY),
            Filter::Grayscale => color(ColorMatrix::grayscale(1.0)),
            Filter::Vintage => color(
                ColorMatrix::sepia(0.5)
                    .then(&ColorMatrix::contrast(1.2))
                    .then(&ColorMatrix::brightness(0.9)),
            ),
            Filter::Vibrant => color(ColorMatrix::saturate(1.5)),
            Filter::SoftFocus => FilterOp::Color {
                matrix: ColorMatrix::IDENTITY,
                blur_radius: Some(SOFT_FOCUS_RADIUS),
            },
            Filter::Noir => color(ColorMatrix::grayscale(1.0).then(&ColorMatrix::contrast(1.5))),
            Filter::Sepia => color(ColorMatrix::sepia(1.0)),
            Filter::Invert => color(ColorMatrix::invert(1.0)),
            Filter::Polaroid => {
                color(ColorMatrix::contrast(0.9).then(&ColorMatrix::brightness(1.1)))
            }
            Filter::Sketch => FilterOp::EdgeSketch,
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Filter {
    type Err = String;

    /// Case-insensitive; spaces, dashes and underscores are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        Filter::ALL
            .iter()
            .find(|f| f.name().replace(' ', "").to_lowercase() == key)
            .copied()
            .ok_or_else(|| format!("Unknown filter: {}", s))
    }
}
