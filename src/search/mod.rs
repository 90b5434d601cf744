//! Coarse-to-fine ZNCC search of a scaled template over a pyramid.
//!
//! The coarsest common level is scanned exhaustively; the best peaks survive
//! non-maximum suppression and a beam cut, then each is re-scored in a small
//! ROI at every finer level until level 0.

pub(crate) mod coarse;
pub(crate) mod refine;

use crate::image::pyramid::ImagePyramid;
use crate::template::ScaledTemplate;
use crate::trace::{trace_event, trace_span};
use crate::util::Result;

/// Parameters of the coarse-to-fine placement search.
#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Maximum pyramid levels used by the search.
    pub max_levels: usize,
    /// Candidates carried from one level to the next.
    pub beam_width: usize,
    /// Peaks collected at the coarsest level before suppression.
    pub coarse_topk: usize,
    /// Chebyshev radius for non-maximum suppression at the coarsest level.
    pub nms_radius: usize,
    /// Search radius around an upscaled candidate at finer levels.
    pub roi_radius: usize,
    /// Minimum window variance; flatter windows are skipped.
    pub min_var_i: f64,
    /// Scan the coarsest level on the rayon pool (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_levels: 3,
            beam_width: 4,
            coarse_topk: 16,
            nms_radius: 2,
            roi_radius: 2,
            min_var_i: 1e-8,
            parallel: false,
        }
    }
}

/// Best placement found by the search, at level 0.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Top-left x in level-0 pixels.
    pub x: usize,
    /// Top-left y in level-0 pixels.
    pub y: usize,
    /// ZNCC score in `[-1, 1]`.
    pub score: f32,
}

/// Finds the best level-0 placement of `template` inside `image`.
///
/// Returns `Ok(None)` when no placement has a usable (non-flat) window.
pub fn locate(
    image: &ImagePyramid,
    template: &ScaledTemplate,
    cfg: &SearchConfig,
) -> Result<Option<Placement>> {
    let levels = cfg
        .max_levels
        .max(1)
        .min(image.len())
        .min(template.num_levels());
    let coarsest = levels - 1;
    let _span = trace_span!("template_search", scale = template.scale(), levels = levels).entered();

    let mut candidates = coarse::coarse_search_level(image, template, coarsest, cfg)?;
    for level in (0..coarsest).rev() {
        if candidates.is_empty() {
            break;
        }
        candidates = refine::refine_to_finer_level(image, template, level, &candidates, cfg)?;
    }

    let best = candidates.first().map(|peak| Placement {
        x: peak.x,
        y: peak.y,
        score: peak.score,
    });
    trace_event!(
        "template_placement",
        scale = template.scale(),
        score = best.map_or(f32::NEG_INFINITY, |p| p.score)
    );
    Ok(best)
}

#[cfg(test)]
mod tests {
    use super::{locate, SearchConfig};
    use crate::image::pyramid::ImagePyramid;
    use crate::image::ImageView;
    use crate::template::ScaledTemplate;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn smooth_noise(width: usize, height: usize, seed: u64) -> Vec<u8> {
        let mut rng = StdRng::seed_from_u64(seed);
        let coarse: Vec<u8> = (0..(width / 4 + 1) * (height / 4 + 1))
            .map(|_| rng.random_range(0..=255))
            .collect();
        let cw = width / 4 + 1;
        (0..width * height)
            .map(|i| {
                let (x, y) = (i % width, i / width);
                let base = coarse[(y / 4) * cw + x / 4] as i32;
                (base + rng.random_range(-12..=12)).clamp(0, 255) as u8
            })
            .collect()
    }

    #[test]
    fn full_size_template_scores_its_source_at_origin() {
        let data = smooth_noise(64, 64, 3);
        let view = ImageView::from_slice(&data, 64, 64).unwrap();
        let pyramid = ImagePyramid::build_u8(view, 3, 8).unwrap();
        let tpl = ScaledTemplate::compile(view, 1.0, 3, 8).unwrap();
        let best = locate(&pyramid, &tpl, &SearchConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!((best.x, best.y), (0, 0));
        assert!(best.score > 0.999);
    }

    #[test]
    fn shrunk_template_finds_embedded_copy() {
        let (w, h) = (96, 80);
        let patch = smooth_noise(48, 40, 9);
        let mut image = smooth_noise(w, h, 10);
        let (x0, y0) = (32, 24);
        for y in 0..40 {
            image[(y0 + y) * w + x0..(y0 + y) * w + x0 + 48]
                .copy_from_slice(&patch[y * 48..(y + 1) * 48]);
        }
        let view = ImageView::from_slice(&image, w, h).unwrap();
        let pyramid = ImagePyramid::build_u8(view, 3, 8).unwrap();
        let tpl = ScaledTemplate::compile(
            ImageView::from_slice(&patch, 48, 40).unwrap(),
            1.0,
            3,
            8,
        )
        .unwrap();
        let best = locate(&pyramid, &tpl, &SearchConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!((best.x, best.y), (x0, y0));
        assert!(best.score > 0.999);
    }
}
