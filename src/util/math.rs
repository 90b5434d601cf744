//! Numeric helpers shared by the scorers.

/// Converts a similarity in `[0, 1]` to a percentage, clamping out-of-range
/// and non-finite inputs.
pub(crate) fn unit_to_percent(value: f64) -> f32 {
    if !value.is_finite() {
        return 0.0;
    }
    (value.clamp(0.0, 1.0) * 100.0) as f32
}

/// Clamps a percentage to `[0, 100]`, mapping NaN to zero.
pub(crate) fn clamp_percent(value: f32) -> f32 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 100.0)
}

/// Counts differing bits between two 256-bit descriptors.
#[inline]
pub(crate) fn hamming_256(a: &[u8; 32], b: &[u8; 32]) -> u32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x ^ y).count_ones()).sum()
}

/// Computes sine and cosine for an angle in radians.
#[inline]
pub(crate) fn sin_cos(angle_rad: f32) -> (f32, f32) {
    angle_rad.sin_cos()
}
