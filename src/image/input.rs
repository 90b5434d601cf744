//! Caller-supplied images.

use crate::image::RgbBuffer;
use crate::util::DecodeError;

/// Raw interleaved pixels with their declared geometry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelBuffer {
    /// Row-major interleaved bytes.
    pub data: Vec<u8>,
    /// Width in pixels.
    pub width: usize,
    /// Height in pixels.
    pub height: usize,
    /// Channels per pixel: 1 (gray), 3 (RGB) or 4 (RGBA).
    pub channels: usize,
}

impl PixelBuffer {
    /// Validates the declared geometry and expands the pixels to RGB8.
    ///
    /// Alpha is dropped and gray is replicated into all three channels.
    pub fn to_rgb(&self) -> Result<RgbBuffer, DecodeError> {
        if self.data.is_empty() {
            return Err(DecodeError::Empty);
        }
        if self.width == 0 || self.height == 0 {
            return Err(DecodeError::ZeroArea {
                width: self.width,
                height: self.height,
            });
        }
        if !matches!(self.channels, 1 | 3 | 4) {
            return Err(DecodeError::UnsupportedChannels(self.channels));
        }
        let expected = self
            .width
            .checked_mul(self.height)
            .and_then(|v| v.checked_mul(self.channels))
            .ok_or(DecodeError::ZeroArea {
                width: self.width,
                height: self.height,
            })?;
        if self.data.len() != expected {
            return Err(DecodeError::LengthMismatch {
                width: self.width,
                height: self.height,
                channels: self.channels,
                expected,
                got: self.data.len(),
            });
        }

        let rgb = match self.channels {
            3 => self.data.clone(),
            1 => self.data.iter().flat_map(|&v| [v, v, v]).collect(),
            _ => self
                .data
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect(),
        };
        RgbBuffer::new(rgb, self.width, self.height)
            .map_err(|err| DecodeError::Malformed(err.to_string()))
    }
}

/// Where an image's pixels come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageSource {
    /// Already-decoded interleaved pixels.
    Pixels(PixelBuffer),
    /// An encoded stream (PNG or JPEG), decoded with the `image-io` feature.
    Encoded(Vec<u8>),
}

/// An image to compare, tagged with a stable identifier (path or URL).
///
/// Construction never fails; malformed buffers surface as a `DecodeError`
/// when the image is normalized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Image {
    id: String,
    source: ImageSource,
}

impl Image {
    /// Creates an image from interleaved pixels.
    pub fn from_pixels(
        id: impl Into<String>,
        data: Vec<u8>,
        width: usize,
        height: usize,
        channels: usize,
    ) -> Self {
        Self {
            id: id.into(),
            source: ImageSource::Pixels(PixelBuffer {
                data,
                width,
                height,
                channels,
            }),
        }
    }

    /// Creates an image from a single-channel buffer.
    pub fn from_gray(id: impl Into<String>, data: Vec<u8>, width: usize, height: usize) -> Self {
        Self::from_pixels(id, data, width, height, 1)
    }

    /// Creates an image from an interleaved RGB buffer.
    pub fn from_rgb(id: impl Into<String>, data: Vec<u8>, width: usize, height: usize) -> Self {
        Self::from_pixels(id, data, width, height, 3)
    }

    /// Creates an image from encoded bytes.
    pub fn from_encoded(id: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            source: ImageSource::Encoded(bytes),
        }
    }

    /// Returns the identifier used for reporting.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the pixel source.
    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    /// Decodes or validates the source into an RGB8 buffer.
    pub fn decode_rgb(&self) -> Result<RgbBuffer, DecodeError> {
        match &self.source {
            ImageSource::Pixels(buffer) => buffer.to_rgb(),
            ImageSource::Encoded(bytes) => decode_encoded(bytes),
        }
    }
}

#[cfg(feature = "image-io")]
fn decode_encoded(bytes: &[u8]) -> Result<RgbBuffer, DecodeError> {
    crate::image::io::decode_rgb(bytes)
}

#[cfg(not(feature = "image-io"))]
fn decode_encoded(bytes: &[u8]) -> Result<RgbBuffer, DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty);
    }
    Err(DecodeError::UnsupportedEncoding)
}
