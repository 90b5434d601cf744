//! RANSAC verification only ever removes keypoint matches.

mod common;

use common::{quadrant_swap, textured_rgb, SIDE};
use prodmatch::{compare, FusionWeights, Image, MetricKind};

#[test]
fn rearranged_texture_loses_feature_score_under_verification() {
    let data = textured_rgb(90, SIDE, SIDE);
    let reference = Image::from_rgb("ref", data.clone(), SIDE, SIDE);
    let shuffled = Image::from_rgb("shuffled", quadrant_swap(&data, SIDE), SIDE, SIDE);

    let weights = FusionWeights::default();
    let plain = compare(&reference, &shuffled, &weights, false).unwrap();
    let verified = compare(&reference, &shuffled, &weights, true).unwrap();

    let before = plain.metric(MetricKind::Feature);
    let after = verified.metric(MetricKind::Feature);
    assert!(before > 0.0);
    assert!(after < before, "verified {after} vs plain {before}");
    assert!(verified.fused <= plain.fused);

    for kind in [MetricKind::Template, MetricKind::Structural, MetricKind::Histogram] {
        assert_eq!(plain.metric(kind), verified.metric(kind));
    }
}

#[test]
fn true_copy_survives_verification() {
    let data = textured_rgb(91, SIDE, SIDE);
    let reference = Image::from_rgb("ref", data.clone(), SIDE, SIDE);
    let copy = Image::from_rgb("copy", data, SIDE, SIDE);

    let verified = compare(&reference, &copy, &FusionWeights::default(), true).unwrap();
    assert!(verified.metric(MetricKind::Feature) >= 90.0);
    assert!(verified.fused >= 95.0);
}
