//! Brute-force Hamming matching with a ratio test.

use crate::features::Feature;
use crate::util::math::hamming_256;

/// A correspondence between a reference and a candidate feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeatureMatch {
    /// Index into the reference feature set.
    pub reference_idx: usize,
    /// Index into the candidate feature set.
    pub candidate_idx: usize,
    /// Hamming distance between the two descriptors.
    pub distance: u32,
}

/// Matches every reference descriptor to its nearest candidate descriptor.
///
/// A match is kept when the nearest distance is at most `max_distance` and
/// strictly below `ratio` times the second-nearest distance. Matches are then
/// made one-to-one: a candidate feature claimed by several reference features
/// keeps only the closest (lowest reference index on ties). The result is
/// sorted by reference index.
pub fn match_descriptors(
    reference: &[Feature],
    candidate: &[Feature],
    ratio: f32,
    max_distance: u32,
) -> Vec<FeatureMatch> {
    if reference.is_empty() || candidate.is_empty() {
        return Vec::new();
    }

    let mut claimed: Vec<Option<FeatureMatch>> = vec![None; candidate.len()];
    for (reference_idx, feature) in reference.iter().enumerate() {
        let mut best = u32::MAX;
        let mut second = u32::MAX;
        let mut best_idx = 0usize;
        for (candidate_idx, other) in candidate.iter().enumerate() {
            let distance = hamming_256(&feature.descriptor, &other.descriptor);
            if distance < best {
                second = best;
                best = distance;
                best_idx = candidate_idx;
            } else if distance < second {
                second = distance;
            }
        }

        if best > max_distance {
            continue;
        }
        if second != u32::MAX && best as f32 >= ratio * second as f32 {
            continue;
        }

        let m = FeatureMatch {
            reference_idx,
            candidate_idx: best_idx,
            distance: best,
        };
        match claimed[best_idx] {
            Some(prev) if prev.distance <= m.distance => {}
            _ => claimed[best_idx] = Some(m),
        }
    }

    let mut matches: Vec<FeatureMatch> = claimed.into_iter().flatten().collect();
    matches.sort_by_key(|m| m.reference_idx);
    matches
}
