//! Affine color matrices.
//!
//! Every composable filter and the brightness/contrast/saturation/hue
//! adjustments are expressed as a 3x4 matrix acting on RGB (alpha untouched).
//! Matrices compose, so an entire filter chain collapses into a single
//! per-pixel pass.
//!
//! # Layout
//!
//! Row-major, one row per output channel:
//!
//! ```text
//! r' = m[0]*r + m[1]*g + m[2]*b + m[3]
//! g' = m[4]*r + m[5]*g + m[6]*b + m[7]
//! b' = m[8]*r + m[9]*g + m[10]*b + m[11]
//! ```
//!
//! Channels are in 0..=255 and the offset column is in the same units. The
//! coefficients are the Filter Effects definitions of the CSS filter
//! functions of the same name.

use image::RgbaImage;

/// A 3x4 affine color transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorMatrix(pub [f32; 12]);

impl Default for ColorMatrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ColorMatrix {
    pub const IDENTITY: ColorMatrix = ColorMatrix([
        1.0, 0.0, 0.0, 0.0, //
        0.0, 1.0, 0.0, 0.0, //
        0.0, 0.0, 1.0, 0.0,
    ]);

    fn linear(m: [f32; 9]) -> Self {
        ColorMatrix([
            m[0], m[1], m[2], 0.0, //
            m[3], m[4], m[5], 0.0, //
            m[6], m[7], m[8], 0.0,
        ])
    }

    /// Uniform per-channel scale with a constant offset.
    fn diagonal(scale: f32, offset: f32) -> Self {
        ColorMatrix([
            scale, 0.0, 0.0, offset, //
            0.0, scale, 0.0, offset, //
            0.0, 0.0, scale, offset,
        ])
    }

    /// `brightness(amount)`: 1.0 is neutral.
    pub fn brightness(amount: f32) -> Self {
        Self::diagonal(amount, 0.0)
    }

    /// `contrast(amount)`: 1.0 is neutral, pivots around mid-gray.
    pub fn contrast(amount: f32) -> Self {
        Self::diagonal(amount, (0.5 - 0.5 * amount) * 255.0)
    }

    /// `invert(amount)`: 0.0 is neutral, 1.0 is a full inversion.
    pub fn invert(amount: f32) -> Self {
        let a = amount.clamp(0.0, 1.0);
        Self::diagonal(1.0 - 2.0 * a, a * 255.0)
    }

    /// `grayscale(amount)`: 0.0 is neutral, 1.0 is fully desaturated.
    pub fn grayscale(amount: f32) -> Self {
        let s = 1.0 - amount.clamp(0.0, 1.0);
        Self::linear([
            0.2126 + 0.7874 * s,
            0.7152 - 0.7152 * s,
            0.0722 - 0.0722 * s,
            0.2126 - 0.2126 * s,
            0.7152 + 0.2848 * s,
            0.0722 - 0.0722 * s,
            0.2126 - 0.2126 * s,
            0.7152 - 0.7152 * s,
            0.0722 + 0.9278 * s,
        ])
    }

    /// `sepia(amount)`: 0.0 is neutral, 1.0 is full sepia.
    pub fn sepia(amount: f32) -> Self {
        let s = 1.0 - amount.clamp(0.0, 1.0);
        Self::linear([
            0.393 + 0.607 * s,
            0.769 - 0.769 * s,
            0.189 - 0.189 * s,
            0.349 - 0.349 * s,
            0.686 + 0.314 * s,
            0.168 - 0.168 * s,
            0.272 - 0.272 * s,
            0.534 - 0.534 * s,
            0.131 + 0.869 * s,
        ])
    }

    /// `saturate(amount)`: 1.0 is neutral, 0.0 is grayscale.
    pub fn saturate(amount: f32) -> Self {
        let s = amount.max(0.0);
        Self::linear([
            0.213 + 0.787 * s,
            0.715 - 0.715 * s,
            0.072 - 0.072 * s,
            0.213 - 0.213 * s,
            0.715 + 0.285 * s,
            0.072 - 0.072 * s,
            0.213 - 0.213 * s,
            0.715 - 0.715 * s,
            0.072 + 0.928 * s,
        ])
    }

    /// `hue-rotate(degrees)`.
    pub fn hue_rotate(degrees: f32) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Self::linear([
            0.213 + cos * 0.787 - sin * 0.213,
            0.715 - cos * 0.715 - sin * 0.715,
            0.072 - cos * 0.072 + sin * 0.928,
            0.213 - cos * 0.213 + sin * 0.143,
            0.715 + cos * 0.285 + sin * 0.140,
            0.072 - cos * 0.072 - sin * 0.283,
            0.213 - cos * 0.213 - sin * 0.787,
            0.715 - cos * 0.715 + sin * 0.715,
            0.072 + cos * 0.928 + sin * 0.072,
        ])
    }

    /// The transform that applies `self` first and `next` second.
    pub fn then(&self, next: &ColorMatrix) -> ColorMatrix {
        let a = &self.0;
        let b = &next.0;
        let mut out = [0.0f32; 12];
        for row in 0..3 {
            let br = &b[row * 4..row * 4 + 4];
            for col in 0..4 {
                let mut v = br[0] * a[col] + br[1] * a[4 + col] + br[2] * a[8 + col];
                if col == 3 {
                    v += br[3];
                }
                out[row * 4 + col] = v;
            }
        }
        ColorMatrix(out)
    }

    /// True if applying the matrix leaves every pixel unchanged.
    pub fn is_identity(&self) -> bool {
        self.0
            .iter()
            .zip(Self::IDENTITY.0.iter())
            .all(|(a, b)| (a - b).abs() < 1e-6)
    }

    /// Transform one RGB triple, clamping to u8.
    #[inline]
    pub fn transform(&self, r: u8, g: u8, b: u8) -> [u8; 3] {
        let m = &self.0;
        let (r, g, b) = (r as f32, g as f32, b as f32);
        let ch = |row: usize| {
            let i = row * 4;
            (m[i] * r + m[i + 1] * g + m[i + 2] * b + m[i + 3])
                .clamp(0.0, 255.0)
                .round() as u8
        };
        [ch(0), ch(1), ch(2)]
    }

    /// Apply to RGBA pixel data in place. Alpha is untouched.
    pub fn apply(&self, pixels: &mut [u8]) {
        if self.is_identity() {
            return;
        }
        for px in pixels.chunks_exact_mut(4) {
            let [r, g, b] = self.transform(px[0], px[1], px[2]);
            px[0] = r;
            px[1] = g;
            px[2] = b;
        }
    }

    /// Apply to an owned image and hand it back.
    pub fn apply_image(&self, mut image: RgbaImage) -> RgbaImage {
        self.apply(&mut image);
        image
    }
}
