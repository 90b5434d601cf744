//! Scaled templates for the template scorer.
//!
//! Each prepared image is shrunk by every configured scale factor and searched
//! in the other image, so a pair where either side shows the item with extra
//! margin, zoomed in or cropped still lines up with some placement. Each
//! scaled copy carries a box-filter pyramid of plans for coarse-to-fine
//! search.

use crate::image::pyramid::ImagePyramid;
use crate::image::resize::resize_gray;
use crate::image::ImageView;
use crate::util::{ConfigError, MatchError, Result};

mod plan;

pub use plan::TemplatePlan;

/// One scaled copy of an image with a plan per pyramid level.
#[derive(Clone, Debug)]
pub struct ScaledTemplate {
    scale: f32,
    plans: Vec<TemplatePlan>,
}

impl ScaledTemplate {
    /// Shrinks `source` by `scale` and compiles up to `max_levels` plans.
    ///
    /// Levels that become flat or smaller than `min_side` pixels are trimmed
    /// from the coarse end; a flat base level is a `DegenerateTemplate` error.
    pub fn compile(
        source: ImageView<'_, u8>,
        scale: f32,
        max_levels: usize,
        min_side: usize,
    ) -> Result<Self> {
        if !(scale > 0.0 && scale <= 1.0) {
            return Err(MatchError::Configuration(ConfigError::InvalidParameter {
                name: "template.scales",
                reason: "scale must lie in (0, 1]",
            }));
        }
        let width = ((source.width() as f32 * scale).round() as usize).max(1);
        let height = ((source.height() as f32 * scale).round() as usize).max(1);
        let scaled = resize_gray(source, width, height)?;
        let pyramid = ImagePyramid::build_u8(scaled.view(), max_levels, min_side)?;

        let mut plans = Vec::with_capacity(pyramid.len());
        for level in pyramid.levels() {
            match TemplatePlan::from_view(level.view()) {
                Ok(plan) => plans.push(plan),
                Err(err) if plans.is_empty() => return Err(err),
                Err(_) => break,
            }
        }

        Ok(Self { scale, plans })
    }

    /// Returns the scale factor relative to the working resolution.
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Returns the number of compiled levels (at least 1).
    pub fn num_levels(&self) -> usize {
        self.plans.len()
    }

    /// Returns the plan for a pyramid level.
    pub fn plan(&self, level: usize) -> Option<&TemplatePlan> {
        self.plans.get(level)
    }
}
