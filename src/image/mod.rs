//! Image buffers, views and preprocessing primitives.
//!
//! `ImageView` is a borrowed 2D view into a 1D buffer with an explicit stride.
//! The stride counts elements between the starts of consecutive rows, so a
//! stride larger than the width represents padded rows. ROI slices are zero-copy
//! views into the same backing slice and retain the original stride.
//!
//! `Image` is the caller-facing input type: an identifier plus either raw
//! interleaved pixels or an encoded byte stream. Nothing is validated until the
//! normalizer touches it, so a broken candidate only fails its own comparison.

use crate::util::{MatchError, Result};
use image::{GrayImage, RgbImage};

pub mod color;
mod input;
#[cfg(feature = "image-io")]
pub mod io;
pub mod pyramid;
pub mod resize;

pub use input::{Image, ImageSource, PixelBuffer};

/// Borrowed 2D image view with an explicit stride.
#[derive(Copy, Clone)]
pub struct ImageView<'a, T> {
    data: &'a [T],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a, T> ImageView<'a, T> {
    /// Creates a contiguous view with `stride == width`.
    pub fn from_slice(data: &'a [T], width: usize, height: usize) -> Result<Self> {
        Self::new(data, width, height, width)
    }

    /// Creates a view with an explicit stride.
    pub fn new(data: &'a [T], width: usize, height: usize, stride: usize) -> Result<Self> {
        let needed = required_len(width, height, stride)?;
        if data.len() < needed {
            return Err(MatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the stride in elements between row starts.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Returns the backing slice including any row padding.
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }

    /// Returns the element at `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y.checked_mul(self.stride)?.checked_add(x)?;
        self.data.get(idx)
    }

    /// Returns a contiguous slice for row `y` with length `width`.
    pub fn row(&self, y: usize) -> Option<&'a [T]> {
        if y >= self.height {
            return None;
        }
        let start = y.checked_mul(self.stride)?;
        let end = start.checked_add(self.width)?;
        self.data.get(start..end)
    }

    /// Returns a zero-copy ROI view into the same backing buffer.
    pub fn roi(&self, x: usize, y: usize, width: usize, height: usize) -> Result<ImageView<'a, T>> {
        if width == 0 || height == 0 {
            return Err(MatchError::InvalidDimensions { width, height });
        }

        let out_of_bounds = MatchError::RoiOutOfBounds {
            x,
            y,
            width,
            height,
            img_width: self.width,
            img_height: self.height,
        };
        let end_x = x.checked_add(width).ok_or_else(|| out_of_bounds.clone())?;
        let end_y = y.checked_add(height).ok_or_else(|| out_of_bounds.clone())?;
        if end_x > self.width || end_y > self.height {
            return Err(out_of_bounds);
        }

        let start = y
            .checked_mul(self.stride)
            .and_then(|v| v.checked_add(x))
            .ok_or(MatchError::InvalidDimensions {
                width: self.width,
                height: self.height,
            })?;
        let data = self.data.get(start..).ok_or(MatchError::BufferTooSmall {
            needed: start.saturating_add(1),
            got: self.data.len(),
        })?;

        ImageView::new(data, width, height, self.stride)
    }
}

fn required_len(width: usize, height: usize, stride: usize) -> Result<usize> {
    if width == 0 || height == 0 {
        return Err(MatchError::InvalidDimensions { width, height });
    }
    if stride < width {
        return Err(MatchError::InvalidStride { width, stride });
    }
    (height - 1)
        .checked_mul(stride)
        .and_then(|v| v.checked_add(width))
        .ok_or(MatchError::InvalidDimensions { width, height })
}

/// Owned contiguous grayscale image buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedImage {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl OwnedImage {
    /// Wraps a contiguous row-major buffer of exactly `width * height` bytes.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(MatchError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .ok_or(MatchError::InvalidDimensions { width, height })?;
        if data.len() < needed {
            return Err(MatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        if data.len() > needed {
            return Err(MatchError::InvalidDimensions { width, height });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Copies a (possibly strided) view into a contiguous buffer.
    pub fn from_view(view: ImageView<'_, u8>) -> Result<Self> {
        let width = view.width();
        let height = view.height();
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            let row = view.row(y).ok_or(MatchError::BufferTooSmall {
                needed: (y + 1) * view.stride(),
                got: view.as_slice().len(),
            })?;
            data.extend_from_slice(row);
        }
        Self::new(data, width, height)
    }

    /// Returns a borrowed view of the image.
    pub fn view(&self) -> ImageView<'_, u8> {
        ImageView {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.width,
        }
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the row-major pixel data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Takes ownership of an `image` crate luma buffer.
    pub fn from_gray_image(img: GrayImage) -> Result<Self> {
        let (width, height) = (img.width() as usize, img.height() as usize);
        Self::new(img.into_raw(), width, height)
    }

    /// Copies the pixels into an `image` crate luma buffer.
    pub fn to_gray_image(&self) -> Result<GrayImage> {
        let (width, height) = image_dims(self.width, self.height)?;
        GrayImage::from_raw(width, height, self.data.clone()).ok_or(MatchError::BufferTooSmall {
            needed: self.width * self.height,
            got: self.data.len(),
        })
    }
}

/// Owned interleaved RGB8 buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RgbBuffer {
    data: Vec<u8>,
    width: usize,
    height: usize,
}

impl RgbBuffer {
    /// Wraps an interleaved buffer of exactly `width * height * 3` bytes.
    pub fn new(data: Vec<u8>, width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(MatchError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .and_then(|v| v.checked_mul(3))
            .ok_or(MatchError::InvalidDimensions { width, height })?;
        if data.len() != needed {
            return Err(MatchError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the interleaved RGB data.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Takes ownership of an `image` crate RGB buffer.
    pub fn from_rgb_image(img: RgbImage) -> Result<Self> {
        let (width, height) = (img.width() as usize, img.height() as usize);
        Self::new(img.into_raw(), width, height)
    }

    /// Copies the pixels into an `image` crate RGB buffer.
    pub fn to_rgb_image(&self) -> Result<RgbImage> {
        let (width, height) = image_dims(self.width, self.height)?;
        RgbImage::from_raw(width, height, self.data.clone()).ok_or(MatchError::BufferTooSmall {
            needed: self.width * self.height * 3,
            got: self.data.len(),
        })
    }

    /// Iterates over pixels as `[r, g, b]` triples.
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.data.chunks_exact(3).map(|px| [px[0], px[1], px[2]])
    }
}

pub(crate) fn image_dims(width: usize, height: usize) -> Result<(u32, u32)> {
    let invalid = MatchError::InvalidDimensions { width, height };
    let w = u32::try_from(width).map_err(|_| invalid.clone())?;
    let h = u32::try_from(height).map_err(|_| invalid)?;
    Ok((w, h))
}
