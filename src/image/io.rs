//! Decoding and loading helpers backed by the `image` crate.
//!
//! Available when the `image-io` feature enables the PNG and JPEG codecs.

use crate::image::{Image, RgbBuffer};
use crate::util::{DecodeError, MatchError, Result};
use std::path::Path;

/// Decodes an encoded PNG/JPEG stream into an RGB8 buffer.
pub fn decode_rgb(bytes: &[u8]) -> std::result::Result<RgbBuffer, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    let img = image::load_from_memory(bytes).map_err(|err| DecodeError::Malformed(err.to_string()))?;
    rgb_from_dynamic_image(&img)
}

/// Converts a dynamic image into an RGB8 buffer.
pub fn rgb_from_dynamic_image(
    img: &image::DynamicImage,
) -> std::result::Result<RgbBuffer, DecodeError> {
    let rgb = img.to_rgb8();
    let (width, height) = (rgb.width() as usize, rgb.height() as usize);
    if width == 0 || height == 0 {
        return Err(DecodeError::ZeroArea { width, height });
    }
    RgbBuffer::from_rgb_image(rgb).map_err(|err| DecodeError::Malformed(err.to_string()))
}

/// Reads an image file into an [`Image`] identified by its path.
///
/// The bytes are kept encoded; decoding happens in the normalizer so that a
/// corrupt file fails only its own comparison.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Image> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|err| {
        MatchError::Decode(DecodeError::Malformed(format!(
            "{}: {err}",
            path.display()
        )))
    })?;
    Ok(Image::from_encoded(path.display().to_string(), bytes))
}
