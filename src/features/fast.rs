//! FAST-9 corner detection with 3x3 non-maximum suppression.

use crate::ImageView;

/// Bresenham circle of radius 3, clockwise from north.
const CIRCLE: [(isize, isize); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

/// Contiguous arc length required for a corner.
const ARC: usize = 9;

/// A detected corner in level coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Corner {
    pub(crate) x: usize,
    pub(crate) y: usize,
    pub(crate) score: f32,
}

#[inline]
fn circle_pixel(img: &[u8], stride: usize, x: usize, y: usize, k: usize) -> u8 {
    let (dx, dy) = CIRCLE[k];
    let px = (x as isize + dx) as usize;
    let py = (y as isize + dy) as usize;
    img[py * stride + px]
}

/// Returns the corner score at `(x, y)`, or `None` if it is not a FAST-9 corner.
///
/// The score is the summed excess contrast of the circle over the threshold.
fn corner_score(img: &[u8], stride: usize, x: usize, y: usize, threshold: u8) -> Option<f32> {
    let center = img[y * stride + x];
    let bright = center.saturating_add(threshold);
    let dark = center.saturating_sub(threshold);

    // Any 9-arc on the 16-circle covers at least two of the four compass points.
    let compass = [0usize, 4, 8, 12].map(|k| circle_pixel(img, stride, x, y, k));
    let n_bright = compass.iter().filter(|&&p| p > bright).count();
    let n_dark = compass.iter().filter(|&&p| p < dark).count();
    if n_bright < 2 && n_dark < 2 {
        return None;
    }

    let ring: [u8; 16] = std::array::from_fn(|k| circle_pixel(img, stride, x, y, k));
    let mut run_bright = 0usize;
    let mut run_dark = 0usize;
    let mut is_corner = false;
    for k in 0..CIRCLE.len() * 2 {
        let p = ring[k % CIRCLE.len()];
        if p > bright {
            run_bright += 1;
            run_dark = 0;
        } else if p < dark {
            run_dark += 1;
            run_bright = 0;
        } else {
            run_bright = 0;
            run_dark = 0;
        }
        if run_bright >= ARC || run_dark >= ARC {
            is_corner = true;
            break;
        }
    }
    if !is_corner {
        return None;
    }

    let score = ring
        .iter()
        .map(|&p| {
            let diff = (i16::from(p) - i16::from(center)).unsigned_abs();
            f32::from(diff.saturating_sub(u16::from(threshold)))
        })
        .sum();
    Some(score)
}

/// Detects FAST-9 corners at least `border` pixels away from every edge.
///
/// A corner survives suppression when its score beats all eight neighbours;
/// equal scores are resolved in favour of the earlier pixel in raster order.
pub(crate) fn detect(image: ImageView<'_, u8>, threshold: u8, border: usize) -> Vec<Corner> {
    let width = image.width();
    let height = image.height();
    let border = border.max(3);
    if width <= 2 * border || height <= 2 * border {
        return Vec::new();
    }
    let img = image.as_slice();
    let stride = image.stride();

    let mut scores = vec![0.0f32; width * height];
    for y in border..height - border {
        for x in border..width - border {
            if let Some(score) = corner_score(img, stride, x, y, threshold) {
                scores[y * width + x] = score;
            }
        }
    }

    let mut corners = Vec::new();
    for y in border..height - border {
        for x in border..width - border {
            let idx = y * width + x;
            let score = scores[idx];
            if score <= 0.0 {
                continue;
            }
            let mut is_max = true;
            'nbr: for ny in y - 1..=y + 1 {
                for nx in x - 1..=x + 1 {
                    let nidx = ny * width + nx;
                    if nidx == idx {
                        continue;
                    }
                    let other = scores[nidx];
                    if other > score || (other == score && nidx < idx) {
                        is_max = false;
                        break 'nbr;
                    }
                }
            }
            if is_max {
                corners.push(Corner { x, y, score });
            }
        }
    }
    corners
}

#[cfg(test)]
mod tests {
    use super::detect;
    use crate::ImageView;

    #[test]
    fn bright_square_yields_corners_at_its_vertices() {
        let (w, h) = (40, 40);
        let mut data = vec![20u8; w * h];
        for y in 15..25 {
            for x in 15..25 {
                data[y * w + x] = 220;
            }
        }
        let view = ImageView::from_slice(&data, w, h).unwrap();
        let corners = detect(view, 20, 3);
        assert!(!corners.is_empty());
        for c in &corners {
            let near_x = c.x.abs_diff(15) <= 2 || c.x.abs_diff(24) <= 2;
            let near_y = c.y.abs_diff(15) <= 2 || c.y.abs_diff(24) <= 2;
            assert!(near_x && near_y, "unexpected corner at ({}, {})", c.x, c.y);
        }
    }

    #[test]
    fn flat_image_has_no_corners() {
        let data = vec![90u8; 32 * 32];
        let view = ImageView::from_slice(&data, 32, 32).unwrap();
        assert!(detect(view, 10, 3).is_empty());
    }
}
