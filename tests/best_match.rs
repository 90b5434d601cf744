//! Best-match selection over candidate pools.

mod common;

use common::{textured, textured_rgb, SIDE};
use prodmatch::{
    find_best_match, CancellationToken, DecodeError, Engine, EngineConfig, FusionWeights, Image,
    MatchError, SelectorConfig,
};

fn reference_and_pool(seed: u64, copy_index: usize) -> (Image, Vec<Image>) {
    let data = textured_rgb(seed, SIDE, SIDE);
    let reference = Image::from_rgb("ref", data.clone(), SIDE, SIDE);
    let pool = (0..5)
        .map(|i| {
            if i == copy_index {
                Image::from_rgb("copy", data.clone(), SIDE, SIDE)
            } else {
                textured(&format!("noise-{i}"), seed * 10 + i as u64)
            }
        })
        .collect();
    (reference, pool)
}

#[test]
fn exact_copy_wins_regardless_of_position() {
    for copy_index in 0..5 {
        let (reference, pool) = reference_and_pool(77, copy_index);
        let result = find_best_match(
            &reference,
            &pool,
            &FusionWeights::default(),
            false,
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(result.candidate_index, Some(copy_index));
        assert_eq!(result.candidate_id.as_deref(), Some("copy"));
        assert!(result.score >= 95.0);
        assert!(result.is_match(70.0));
        assert!(result.failures.is_empty());
    }
}

#[test]
fn full_scan_agrees_with_early_stop() {
    let (reference, pool) = reference_and_pool(78, 2);
    let full = Engine::new(EngineConfig {
        selector: SelectorConfig {
            parallel: false,
            stop_on_perfect: false,
        },
        ..EngineConfig::default()
    })
    .unwrap()
    .find_best_match(&reference, &pool, &CancellationToken::new())
    .unwrap();
    let early = Engine::new(EngineConfig::default())
        .unwrap()
        .find_best_match(&reference, &pool, &CancellationToken::new())
        .unwrap();

    assert_eq!(full.candidate_index, early.candidate_index);
    assert_eq!(full.score, early.score);
    assert_eq!(full.evaluated, 5);
    assert_eq!(early.evaluated, 3);
}

#[test]
fn undecodable_candidate_is_reported_once() {
    let (reference, mut pool) = reference_and_pool(79, 4);
    pool[1] = Image::from_rgb("broken", Vec::new(), 256, 256);

    let result = find_best_match(
        &reference,
        &pool,
        &FusionWeights::default(),
        false,
        &CancellationToken::new(),
    )
    .unwrap();
    assert_eq!(result.candidate_index, Some(4));
    assert_eq!(result.evaluated, 4);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].index, 1);
    assert_eq!(result.failures[0].id, "broken");
    assert_eq!(
        result.failures[0].error,
        MatchError::Decode(DecodeError::Empty)
    );
}

#[test]
fn pool_of_failures_has_no_winner() {
    let reference = textured("ref", 80);
    let pool = vec![
        Image::from_rgb("a", Vec::new(), 8, 8),
        Image::from_rgb("b", vec![0; 10], 8, 8),
    ];
    let result = find_best_match(
        &reference,
        &pool,
        &FusionWeights::default(),
        false,
        &CancellationToken::new(),
    )
    .unwrap();
    assert_eq!(result.candidate_index, None);
    assert_eq!(result.score, 0.0);
    assert_eq!(result.failures.len(), 2);
    assert_eq!(result.reference_id, "ref");
}

#[test]
fn empty_pool_and_bad_reference_are_errors() {
    let reference = textured("ref", 81);
    let err = find_best_match(
        &reference,
        &[],
        &FusionWeights::default(),
        false,
        &CancellationToken::new(),
    )
    .unwrap_err();
    assert_eq!(err, MatchError::EmptyPool);

    let broken = Image::from_rgb("broken", vec![1, 2, 3], 4, 4);
    let err = find_best_match(
        &broken,
        &[reference],
        &FusionWeights::default(),
        false,
        &CancellationToken::new(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        MatchError::Decode(DecodeError::LengthMismatch { .. })
    ));
}

#[test]
fn cancelled_scan_evaluates_nothing() {
    let (reference, pool) = reference_and_pool(82, 0);
    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = find_best_match(&reference, &pool, &FusionWeights::default(), false, &cancel)
        .unwrap();
    assert!(result.cancelled);
    assert_eq!(result.evaluated, 0);
    assert_eq!(result.candidate_index, None);
}
