#![cfg(feature = "rayon")]

mod common;

use common::{textured, textured_rgb, SIDE};
use prodmatch::{CancellationToken, Engine, EngineConfig, Image, SearchConfig, SelectorConfig};

fn engine(parallel: bool) -> Engine {
    let mut cfg = EngineConfig {
        selector: SelectorConfig {
            parallel,
            stop_on_perfect: false,
        },
        ..EngineConfig::default()
    };
    cfg.template.search = SearchConfig {
        parallel,
        ..SearchConfig::default()
    };
    Engine::new(cfg).unwrap()
}

#[test]
fn parallel_selection_matches_sequential() {
    let data = textured_rgb(300, SIDE, SIDE);
    let reference = Image::from_rgb("ref", data.clone(), SIDE, SIDE);
    let mut pool: Vec<Image> = (0..6)
        .map(|i| textured(&format!("noise-{i}"), 310 + i))
        .collect();
    pool.insert(3, Image::from_rgb("copy", data.clone(), SIDE, SIDE));
    pool.insert(5, Image::from_rgb("copy-2", data, SIDE, SIDE));
    pool.push(Image::from_rgb("broken", Vec::new(), SIDE, SIDE));

    let cancel = CancellationToken::new();
    let seq = engine(false)
        .find_best_match(&reference, &pool, &cancel)
        .unwrap();
    let par = engine(true)
        .find_best_match(&reference, &pool, &cancel)
        .unwrap();

    assert_eq!(seq.candidate_index, Some(3));
    assert_eq!(par.candidate_index, seq.candidate_index);
    assert_eq!(par.score, seq.score);
    assert_eq!(par.evaluated, seq.evaluated);
    assert_eq!(par.failures, seq.failures);
    assert_eq!(par.report, seq.report);
}

#[test]
fn cancelled_parallel_scan_is_flagged() {
    let reference = textured("ref", 320);
    let pool: Vec<Image> = (0..4).map(|i| textured(&format!("c{i}"), 321 + i)).collect();
    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = engine(true)
        .find_best_match(&reference, &pool, &cancel)
        .unwrap();
    assert!(result.cancelled);
    assert_eq!(result.evaluated, 0);
    assert!(result.candidate_index.is_none());
}
