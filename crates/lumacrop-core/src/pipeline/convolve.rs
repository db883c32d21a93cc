//! 3x3 neighborhood filters: edge sketch and sharpening.
//!
//! Both leave the one-pixel border untouched since it has no full
//! neighborhood.

use image::RgbaImage;

use crate::luminance::luma_plane;

const SOBEL_X: [f32; 9] = [-1.0, 0.0, 1.0, -2.0, 0.0, 2.0, -1.0, 0.0, 1.0];
const SOBEL_Y: [f32; 9] = [-1.0, -2.0, -1.0, 0.0, 0.0, 0.0, 1.0, 2.0, 1.0];

/// Render edges as dark lines on white.
///
/// Interior pixels become `255 - clamp(|sobel(luma)|, 0, 255)` on all three
/// channels with alpha 255.
pub fn edge_sketch(image: RgbaImage) -> RgbaImage {
    let (w, h) = image.dimensions();
    if w < 3 || h < 3 {
        return image;
    }
    let (w, h) = (w as usize, h as usize);
    let luma = luma_plane(image.as_raw());
    let mut out = image;
    let buf: &mut [u8] = &mut out;

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let mut gx = 0.0f32;
            let mut gy = 0.0f32;
            for ky in 0..3 {
                let row = (y + ky - 1) * w;
                for kx in 0..3 {
                    let l = luma[row + x + kx - 1];
                    gx += SOBEL_X[ky * 3 + kx] * l;
                    gy += SOBEL_Y[ky * 3 + kx] * l;
                }
            }
            let magnitude = (gx * gx + gy * gy).sqrt();
            let intensity = (255.0 - magnitude.min(255.0)).round() as u8;
            let i = (y * w + x) * 4;
            buf[i..i + 4].copy_from_slice(&[intensity, intensity, intensity, 255]);
        }
    }
    out
}

/// Unsharp-style 4-neighbor sharpen with weight `amount` (0..=1).
///
/// Kernel: center `1 + 4w`, orthogonal neighbors `-w`, applied per RGB
/// channel. Alpha is untouched.
pub fn sharpen(image: RgbaImage, amount: f32) -> RgbaImage {
    let (w, h) = image.dimensions();
    if amount <= 0.0 || w < 3 || h < 3 {
        return image;
    }
    let (w, h) = (w as usize, h as usize);
    let src = image.as_raw().clone();
    let mut out = image;
    let buf: &mut [u8] = &mut out;
    let center = 1.0 + 4.0 * amount;
    let stride = w * 4;

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let i = (y * w + x) * 4;
            for c in 0..3 {
                let p = i + c;
                let neighbors = src[p - 4] as f32
                    + src[p + 4] as f32
                    + src[p - stride] as f32
                    + src[p + stride] as f32;
                let v = center * src[p] as f32 - amount * neighbors;
                buf[p] = v.clamp(0.0, 255.0).round() as u8;
            }
        }
    }
    out
}
