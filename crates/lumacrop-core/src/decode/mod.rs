//! Source image decoding.
//!
//! Accepts PNG, JPEG, WebP and TIFF bytes, applies the EXIF orientation and
//! returns straight RGBA8 pixels. This is the loader side of the editor: a
//! failed decode leaves the session without an image and blocks compositing
//! until a new one is supplied.

mod orientation;
mod types;

use std::io::Cursor;

use image::ImageReader;

pub use orientation::{apply_orientation, read_orientation};
pub use types::{DecodeError, DecodedImage, ImageView, Orientation};

/// Decode an encoded image, applying EXIF orientation correction.
///
/// # Errors
///
/// Returns `DecodeError::InvalidFormat` if the format cannot be recognized,
/// `DecodeError::CorruptedFile` if decoding fails, and
/// `DecodeError::EmptyImage` for a zero-sized result.
#[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
pub fn decode_image(bytes: &[u8]) -> Result<DecodedImage, DecodeError> {
    let orientation = read_orientation(bytes);

    let reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;
    if reader.format().is_none() {
        return Err(DecodeError::InvalidFormat);
    }

    let img = reader
        .decode()
        .map_err(|e| DecodeError::CorruptedFile(e.to_string()))?;

    let rgba = apply_orientation(img, orientation).into_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(DecodeError::EmptyImage);
    }
    tracing::debug!(
        width = rgba.width(),
        height = rgba.height(),
        ?orientation,
        "Image decoded"
    );
    Ok(DecodedImage::from_rgba_image(rgba))
}
