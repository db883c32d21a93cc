//! Luma calculation using ITU-R BT.601 coefficients.
//!
//! The edge-sketch filter measures its gradients on this luma.

/// BT.601 coefficient for the red channel.
pub const LUMA_R: f32 = 0.299;

/// BT.601 coefficient for the green channel.
pub const LUMA_G: f32 = 0.587;

/// BT.601 coefficient for the blue channel.
pub const LUMA_B: f32 = 0.114;

/// Luma of a u8 RGB triple, unrounded (0.0 to 255.0).
#[inline]
pub fn luma(r: u8, g: u8, b: u8) -> f32 {
    LUMA_R * r as f32 + LUMA_G * g as f32 + LUMA_B * b as f32
}

/// Luma of a u8 RGB triple, rounded and clamped to u8.
#[inline]
pub fn luma_u8(r: u8, g: u8, b: u8) -> u8 {
    luma(r, g, b).clamp(0.0, 255.0).round() as u8
}

/// Luma plane of an RGBA buffer (alpha ignored), one f32 per pixel.
pub fn luma_plane(pixels: &[u8]) -> Vec<f32> {
    pixels
        .chunks_exact(4)
        .map(|p| luma(p[0], p[1], p[2]))
        .collect()
}
