//! Planar homographies estimated from four correspondences.

use nalgebra::{Matrix3, SMatrix, SVector, Vector3};

/// Smallest doubled triangle area, in normalized coordinates, that still
/// counts as a proper triangle.
const MIN_NORMALIZED_AREA2: f64 = 1e-9;

/// A 3x3 projective transform with `h[(2, 2)] == 1`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    h: Matrix3<f64>,
}

impl Homography {
    /// The identity transform.
    pub fn identity() -> Self {
        Self {
            h: Matrix3::identity(),
        }
    }

    /// Returns the transform matrix.
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.h
    }

    /// Maps a point, returning `None` when it lands at infinity.
    pub fn apply(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let p = self.h * Vector3::new(x, y, 1.0);
        if p.z.abs() < 1e-12 {
            return None;
        }
        Some((p.x / p.z, p.y / p.z))
    }

    /// Estimates the homography mapping `src[i]` onto `dst[i]` exactly.
    ///
    /// Points are Hartley-normalized before the 8x8 DLT system is solved by
    /// LU decomposition. Returns `None` when three points of either set are
    /// collinear or the system is singular.
    pub fn from_four_points(src: &[(f64, f64); 4], dst: &[(f64, f64); 4]) -> Option<Self> {
        let (ns, ts) = normalize_points(src)?;
        let (nd, td) = normalize_points(dst)?;
        if is_degenerate(&ns) || is_degenerate(&nd) {
            return None;
        }

        let mut rows = [0.0f64; 64];
        let mut rhs = SVector::<f64, 8>::zeros();
        for (i, (&(x, y), &(u, v))) in ns.iter().zip(nd.iter()).enumerate() {
            rows[16 * i..16 * i + 8].copy_from_slice(&[x, y, 1.0, 0.0, 0.0, 0.0, -u * x, -u * y]);
            rows[16 * i + 8..16 * i + 16]
                .copy_from_slice(&[0.0, 0.0, 0.0, x, y, 1.0, -v * x, -v * y]);
            rhs[2 * i] = u;
            rhs[2 * i + 1] = v;
        }
        let sol = SMatrix::<f64, 8, 8>::from_row_slice(&rows).lu().solve(&rhs)?;
        let hn = Matrix3::new(
            sol[0], sol[1], sol[2], sol[3], sol[4], sol[5], sol[6], sol[7], 1.0,
        );

        let h = td.try_inverse()? * hn * ts;
        let scale = h[(2, 2)];
        if !h.iter().all(|v| v.is_finite()) || scale.abs() < 1e-12 {
            return None;
        }
        Some(Self { h: h / scale })
    }
}

/// Moves the centroid to the origin and scales the mean distance to
/// `sqrt(2)`. Returns the moved points and the similarity that does it.
fn normalize_points(pts: &[(f64, f64); 4]) -> Option<([(f64, f64); 4], Matrix3<f64>)> {
    let cx = pts.iter().map(|p| p.0).sum::<f64>() / 4.0;
    let cy = pts.iter().map(|p| p.1).sum::<f64>() / 4.0;
    let mean_dist = pts
        .iter()
        .map(|p| ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt())
        .sum::<f64>()
        / 4.0;
    if mean_dist < 1e-9 {
        return None;
    }
    let s = std::f64::consts::SQRT_2 / mean_dist;
    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    Some((pts.map(|(x, y)| (s * (x - cx), s * (y - cy))), t))
}

fn is_degenerate(pts: &[(f64, f64); 4]) -> bool {
    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    TRIPLES.iter().any(|&[a, b, c]| {
        let (a, b, c) = (pts[a], pts[b], pts[c]);
        ((b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)).abs() < MIN_NORMALIZED_AREA2
    })
}
