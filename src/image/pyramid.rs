//! Image pyramid construction for grayscale `u8` images.
//!
//! Downsampling uses a 2x2 box filter with integer rounding:
//! `dst = ((a + b + c + d) + 2) / 4`. Odd trailing rows and columns are
//! dropped. The template scorer searches coarse-to-fine over these levels and
//! the keypoint detector treats them as octaves.

use crate::image::{ImageView, OwnedImage};
use crate::util::{MatchError, Result};

/// Halves a grayscale image with a 2x2 box filter.
pub fn downsample_2x(src: ImageView<'_, u8>) -> Result<OwnedImage> {
    let dst_width = src.width() / 2;
    let dst_height = src.height() / 2;
    if dst_width == 0 || dst_height == 0 {
        return Err(MatchError::InvalidDimensions {
            width: dst_width,
            height: dst_height,
        });
    }
    let mut dst = vec![0u8; dst_width * dst_height];

    for y in 0..dst_height {
        let (row0, row1) = match (src.row(y * 2), src.row(y * 2 + 1)) {
            (Some(r0), Some(r1)) => (r0, r1),
            _ => {
                return Err(MatchError::BufferTooSmall {
                    needed: (y * 2 + 2) * src.stride(),
                    got: src.as_slice().len(),
                })
            }
        };
        let out = &mut dst[y * dst_width..(y + 1) * dst_width];
        for (x, value) in out.iter_mut().enumerate() {
            let sum = u16::from(row0[2 * x])
                + u16::from(row0[2 * x + 1])
                + u16::from(row1[2 * x])
                + u16::from(row1[2 * x + 1]);
            *value = ((sum + 2) / 4) as u8;
        }
    }

    OwnedImage::new(dst, dst_width, dst_height)
}

/// Owned image pyramid built from a base level.
#[derive(Clone, Debug)]
pub struct ImagePyramid {
    levels: Vec<OwnedImage>,
}

impl ImagePyramid {
    /// Builds a pyramid from a base grayscale view.
    ///
    /// `max_levels` is clamped to at least 1 so the base level is always
    /// present. Construction stops early once a level would drop below
    /// `min_side` pixels on either axis.
    pub fn build_u8(base: ImageView<'_, u8>, max_levels: usize, min_side: usize) -> Result<Self> {
        let max_levels = max_levels.max(1);
        let mut levels = vec![OwnedImage::from_view(base)?];

        while levels.len() < max_levels {
            let Some(prev) = levels.last() else { break };
            if prev.width() / 2 < min_side.max(1) || prev.height() / 2 < min_side.max(1) {
                break;
            }
            let next = downsample_2x(prev.view())?;
            levels.push(next);
        }

        Ok(Self { levels })
    }

    /// Returns all pyramid levels (level 0 is the base resolution).
    pub fn levels(&self) -> &[OwnedImage] {
        &self.levels
    }

    /// Returns the number of levels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Returns `true` if the pyramid has no levels (never the case once built).
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Returns a view for a specific pyramid level.
    pub fn level(&self, index: usize) -> Option<ImageView<'_, u8>> {
        self.levels.get(index).map(|level| level.view())
    }
}
