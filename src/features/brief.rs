//! Oriented BRIEF descriptors.
//!
//! The sampling pattern is 256 point pairs drawn once from a fixed seed, so
//! descriptors are comparable across processes and runs. Pairs are rotated
//! by the keypoint's intensity-centroid angle before sampling a box-blurred
//! copy of the level image.

use crate::util::math::sin_cos;
use crate::ImageView;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::OnceLock;

/// Half extent of the unrotated sampling pattern.
const PATTERN_EXTENT: i32 = 13;

/// Radius of the disc used for the orientation moment.
pub(crate) const ORIENTATION_RADIUS: i32 = 15;

/// Keypoints must stay this far from every edge: the rotated pattern reaches
/// `13 * sqrt(2)` pixels and the moment disc reaches 15.
pub(crate) const DESCRIPTOR_BORDER: usize = 19;

const PATTERN_SEED: u64 = 0x0B21_EF00;

type PointPair = [i32; 4];

fn pattern() -> &'static [PointPair; 256] {
    static PATTERN: OnceLock<[PointPair; 256]> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let mut rng = StdRng::seed_from_u64(PATTERN_SEED);
        std::array::from_fn(|_| {
            loop {
                let pair: PointPair =
                    std::array::from_fn(|_| rng.random_range(-PATTERN_EXTENT..=PATTERN_EXTENT));
                if pair[0] != pair[2] || pair[1] != pair[3] {
                    break pair;
                }
            }
        })
    })
}

/// Box-blurs a grayscale view with a `(2r + 1)^2` window and clamped edges.
pub(crate) fn box_blur(image: ImageView<'_, u8>, radius: usize) -> Vec<u8> {
    let width = image.width();
    let height = image.height();
    let mut out = vec![0u8; width * height];
    if radius == 0 {
        for y in 0..height {
            if let Some(row) = image.row(y) {
                out[y * width..(y + 1) * width].copy_from_slice(row);
            }
        }
        return out;
    }

    let r = radius as isize;
    let taps = (2 * radius + 1) as u32;
    let mut horizontal = vec![0u32; width * height];
    for y in 0..height {
        let Some(row) = image.row(y) else { continue };
        for x in 0..width {
            let mut acc = 0u32;
            for dx in -r..=r {
                let sx = (x as isize + dx).clamp(0, width as isize - 1) as usize;
                acc += u32::from(row[sx]);
            }
            horizontal[y * width + x] = acc;
        }
    }
    for y in 0..height {
        for x in 0..width {
            let mut acc = 0u32;
            for dy in -r..=r {
                let sy = (y as isize + dy).clamp(0, height as isize - 1) as usize;
                acc += horizontal[sy * width + x];
            }
            let n = taps * taps;
            out[y * width + x] = ((acc + n / 2) / n) as u8;
        }
    }
    out
}

/// Intensity-centroid orientation in radians.
pub(crate) fn orientation(image: ImageView<'_, u8>, x: usize, y: usize) -> f32 {
    let mut m01 = 0.0f32;
    let mut m10 = 0.0f32;
    let r2 = ORIENTATION_RADIUS * ORIENTATION_RADIUS;
    for dy in -ORIENTATION_RADIUS..=ORIENTATION_RADIUS {
        let Some(row) = image.row((y as i32 + dy) as usize) else {
            continue;
        };
        for dx in -ORIENTATION_RADIUS..=ORIENTATION_RADIUS {
            if dx * dx + dy * dy > r2 {
                continue;
            }
            let Some(&value) = row.get((x as i32 + dx) as usize) else {
                continue;
            };
            let v = f32::from(value);
            m10 += v * dx as f32;
            m01 += v * dy as f32;
        }
    }
    m01.atan2(m10)
}

/// Computes a 256-bit steered BRIEF descriptor on a blurred level buffer.
///
/// `(x, y)` must be at least [`DESCRIPTOR_BORDER`] pixels inside the image.
pub(crate) fn describe(
    blurred: &[u8],
    width: usize,
    height: usize,
    x: usize,
    y: usize,
    angle: f32,
) -> [u8; 32] {
    let (sin_a, cos_a) = sin_cos(angle);
    let sample = |dx: i32, dy: i32| -> u8 {
        let rx = (dx as f32 * cos_a - dy as f32 * sin_a).round() as i32;
        let ry = (dx as f32 * sin_a + dy as f32 * cos_a).round() as i32;
        let px = (x as i32 + rx).clamp(0, width as i32 - 1) as usize;
        let py = (y as i32 + ry).clamp(0, height as i32 - 1) as usize;
        blurred[py * width + px]
    };

    let mut descriptor = [0u8; 32];
    for (byte_idx, chunk) in pattern().chunks(8).enumerate() {
        let mut byte = 0u8;
        for (bit, &[x1, y1, x2, y2]) in chunk.iter().enumerate() {
            if sample(x1, y1) < sample(x2, y2) {
                byte |= 1 << bit;
            }
        }
        descriptor[byte_idx] = byte;
    }
    descriptor
}
