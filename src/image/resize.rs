//! Resampling to the working resolution, backed by `image::imageops`.
//!
//! Triangle (bilinear) filtering widens its support when shrinking, so a
//! downscale averages over the covered source area instead of aliasing.

use crate::image::{image_dims, ImageView, OwnedImage, RgbBuffer};
use crate::util::{MatchError, Result};
use image::imageops::{self, FilterType};

const FILTER: FilterType = FilterType::Triangle;

fn target_dims(width: usize, height: usize) -> Result<(u32, u32)> {
    if width == 0 || height == 0 {
        return Err(MatchError::InvalidDimensions { width, height });
    }
    image_dims(width, height)
}

/// Resizes an RGB buffer to `width x height`.
pub fn resize_rgb(src: &RgbBuffer, width: usize, height: usize) -> Result<RgbBuffer> {
    let (w, h) = target_dims(width, height)?;
    if (src.width(), src.height()) == (width, height) {
        return Ok(src.clone());
    }
    let resized = imageops::resize(&src.to_rgb_image()?, w, h, FILTER);
    RgbBuffer::from_rgb_image(resized)
}

/// Resizes a grayscale view to `width x height`.
pub fn resize_gray(src: ImageView<'_, u8>, width: usize, height: usize) -> Result<OwnedImage> {
    let (w, h) = target_dims(width, height)?;
    let contiguous = OwnedImage::from_view(src)?;
    if (contiguous.width(), contiguous.height()) == (width, height) {
        return Ok(contiguous);
    }
    let resized = imageops::resize(&contiguous.to_gray_image()?, w, h, FILTER);
    OwnedImage::from_gray_image(resized)
}

#[cfg(test)]
mod tests {
    use super::{resize_gray, resize_rgb};
    use crate::image::{ImageView, RgbBuffer};

    #[test]
    fn same_size_is_identity() {
        let data: Vec<u8> = (0..48).collect();
        let rgb = RgbBuffer::new(data.clone(), 4, 4).unwrap();
        let out = resize_rgb(&rgb, 4, 4).unwrap();
        assert_eq!(out.data(), data.as_slice());
    }

    #[test]
    fn constant_stays_constant_both_ways() {
        let rgb = RgbBuffer::new(vec![77u8; 3 * 3 * 3], 3, 3).unwrap();
        let up = resize_rgb(&rgb, 8, 5).unwrap();
        assert_eq!((up.width(), up.height()), (8, 5));
        assert!(up.data().iter().all(|&v| v == 77));

        let big = RgbBuffer::new(vec![140u8; 40 * 30 * 3], 40, 30).unwrap();
        let down = resize_rgb(&big, 7, 9).unwrap();
        assert!(down.data().iter().all(|&v| v == 140));
    }

    #[test]
    fn downscaled_ramp_stays_monotone() {
        let data: Vec<u8> = (0..64u8).flat_map(|_| (0..64u8).map(|x| x * 4)).collect();
        let view = ImageView::from_slice(&data, 64, 64).unwrap();
        let out = resize_gray(view, 16, 16).unwrap();
        for row in out.data().chunks_exact(16) {
            assert!(row.windows(2).all(|w| w[0] <= w[1]), "{row:?}");
            assert!(row[0] < row[15]);
        }
    }

    #[test]
    fn zero_target_is_rejected() {
        let rgb = RgbBuffer::new(vec![0u8; 12], 2, 2).unwrap();
        assert!(resize_rgb(&rgb, 0, 4).is_err());
    }
}
