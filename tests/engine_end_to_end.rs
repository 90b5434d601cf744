//! End-to-end properties of `compare` on synthetic product photos.

mod common;

use common::{brightened, center_zoom, red_channel, textured, textured_rgb, SIDE};
use prodmatch::{compare, BonusLevel, Engine, EngineConfig, FusionWeights, Image, MetricKind};

fn assert_in_range(report: &prodmatch::ComparisonReport) {
    for metric in &report.metrics {
        assert!(
            (0.0..=100.0).contains(&metric.value),
            "{} out of range: {}",
            metric.kind,
            metric.value
        );
    }
    assert!((0.0..=100.0).contains(&report.weighted));
    assert!((0.0..=100.0).contains(&report.fused));
}

#[test]
fn identical_copy_is_near_certain() {
    let reference = textured("ref", 7);
    let copy = reference.clone();
    let report = compare(&reference, &copy, &FusionWeights::default(), false).unwrap();

    for kind in MetricKind::ALL {
        assert!(report.metric(kind) >= 90.0, "{kind}: {}", report.metric(kind));
    }
    assert_eq!(report.bonus, BonusLevel::Majority);
    assert!(report.fused >= 95.0);
}

#[test]
fn unrelated_noise_stays_below_match_threshold() {
    for seed in [1u64, 2, 3] {
        let a = textured("a", seed);
        let b = textured("b", seed + 1000);
        let report = compare(&a, &b, &FusionWeights::default(), false).unwrap();
        assert_in_range(&report);
        assert!(report.fused < 50.0, "seed {seed}: {}", report.fused);
        assert!(report.metric(MetricKind::Feature) < 20.0);
    }
}

#[test]
fn scores_stay_in_range_for_awkward_inputs() {
    let flat = Image::from_gray("flat", vec![90; 64 * 64], 64, 64);
    let tiny = Image::from_rgb("tiny", vec![10, 200, 30, 250, 0, 0], 2, 1);
    let wide = Image::from_rgb("wide", textured_rgb(5, 400, 120), 400, 120);
    let tex = textured("tex", 6);
    let images = [flat, tiny, wide, tex];

    for a in &images {
        for b in &images {
            let report = compare(a, b, &FusionWeights::default(), true).unwrap();
            assert_in_range(&report);
        }
    }
}

#[test]
fn comparison_is_deterministic() {
    let a = textured("a", 21);
    let b = Image::from_rgb(
        "b",
        common::quadrant_swap(&textured_rgb(21, SIDE, SIDE), SIDE),
        SIDE,
        SIDE,
    );
    for verify in [false, true] {
        let first = compare(&a, &b, &FusionWeights::default(), verify).unwrap();
        let second = compare(&a, &b, &FusionWeights::default(), verify).unwrap();
        assert_eq!(first, second, "verify = {verify}");
    }
}

#[test]
fn brightness_change_keeps_a_strong_match() {
    let data = textured_rgb(33, SIDE, SIDE);
    let reference = Image::from_rgb("ref", data.clone(), SIDE, SIDE);
    let brighter = Image::from_rgb("bright", brightened(&data, 15), SIDE, SIDE);
    let report = compare(&reference, &brighter, &FusionWeights::default(), false).unwrap();
    assert!(report.metric(MetricKind::Template) > 95.0);
    assert!(report.fused > 80.0);
}

#[test]
fn resized_copy_still_matches() {
    let data = textured_rgb(44, 512, 512);
    let reference = Image::from_rgb("ref", data.clone(), 512, 512);
    let candidate = Image::from_rgb("same", data, 512, 512);
    let engine = Engine::new(EngineConfig::default()).unwrap();
    let report = engine.compare(&reference, &candidate).unwrap();
    assert!(report.fused >= 95.0);
}

#[test]
fn weights_change_the_fused_score() {
    let a = textured("a", 50);
    let b = textured("b", 51);
    let template_only = FusionWeights::new(100.0, 0.0, 0.0, 0.0).unwrap();
    let histogram_only = FusionWeights::new(0.0, 0.0, 0.0, 100.0).unwrap();
    let t = compare(&a, &b, &template_only, false).unwrap();
    let h = compare(&a, &b, &histogram_only, false).unwrap();
    assert!((t.weighted - t.metric(MetricKind::Template)).abs() < 1e-3);
    assert!((h.weighted - h.metric(MetricKind::Histogram)).abs() < 1e-3);
}

#[test]
fn center_crop_matches_in_both_orders() {
    let data = textured_rgb(5, SIDE, SIDE);
    let reference = Image::from_rgb("ref", data.clone(), SIDE, SIDE);
    let cropped = Image::from_rgb("crop", center_zoom(&data, SIDE, 0.8), SIDE, SIDE);

    let forward = compare(&reference, &cropped, &FusionWeights::default(), false).unwrap();
    let backward = compare(&cropped, &reference, &FusionWeights::default(), false).unwrap();
    let template = forward.metric(MetricKind::Template);
    assert!(template > 85.0, "template {template}");
    assert_eq!(template, backward.metric(MetricKind::Template));
    assert!(forward.fused > 50.0, "fused {}", forward.fused);
}

#[test]
fn grayscale_content_is_not_a_histogram_match() {
    let texture = Image::from_gray("tex", red_channel(&textured_rgb(8, SIDE, SIDE)), SIDE, SIDE);
    let black = Image::from_gray("black", vec![0; SIDE * SIDE], SIDE, SIDE);
    let report = compare(&texture, &black, &FusionWeights::default(), false).unwrap();
    let histogram = report.metric(MetricKind::Histogram);
    assert!(histogram < 50.0, "histogram {histogram}");
    assert_eq!(report.high_count, 0);
}
