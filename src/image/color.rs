//! Color space conversions.

use crate::image::{OwnedImage, RgbBuffer};
use crate::util::Result;
use image::DynamicImage;

/// Converts an RGB buffer to a single-channel luma image.
pub fn rgb_to_gray(src: &RgbBuffer) -> Result<OwnedImage> {
    let luma = DynamicImage::ImageRgb8(src.to_rgb_image()?).to_luma8();
    OwnedImage::from_gray_image(luma)
}

/// Converts an RGB pixel to `(hue in [0, 360), saturation in [0, 1], value in [0, 1])`.
///
/// Achromatic pixels get hue 0 and saturation 0.
pub fn hsv(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let value = f32::from(max) / 255.0;
    if max == 0 || max == min {
        return (0.0, 0.0, value);
    }
    let delta = f32::from(max - min);
    let saturation = delta / f32::from(max);
    let (rf, gf, bf) = (f32::from(r), f32::from(g), f32::from(b));
    let hue = if max == r {
        60.0 * ((gf - bf) / delta)
    } else if max == g {
        60.0 * ((bf - rf) / delta + 2.0)
    } else {
        60.0 * ((rf - gf) / delta + 4.0)
    };
    let hue = if hue < 0.0 { hue + 360.0 } else { hue };
    (hue.min(359.999), saturation, value)
}
