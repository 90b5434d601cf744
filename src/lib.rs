//! prodmatch is a CPU-first visual product-matching engine.
//!
//! Given a reference photo and a pool of candidate photos, it scores every
//! candidate with four independent signals (multi-scale ZNCC template
//! correlation, oriented keypoint matching with optional RANSAC verification,
//! SSIM and a hue/saturation histogram), fuses them with configurable weights
//! and a consistency bonus, and selects the single best candidate.
//!
//! Candidate evaluation can run in parallel via the `rayon` feature, template
//! correlation uses `wide` SIMD lanes with the `simd` feature, and encoded
//! PNG/JPEG input is decoded through the `image-io` feature.

mod candidate;
pub mod engine;
pub mod features;
pub mod fusion;
pub mod geometry;
pub mod image;
pub mod kernel;
pub mod lowlevel;
pub mod normalize;
pub mod scorer;
pub mod search;
pub mod select;
pub mod template;
mod trace;
pub mod util;

pub use engine::{compare, find_best_match, ComparisonReport, Engine, EngineConfig};
pub use features::FeatureConfig;
pub use fusion::{BonusLevel, ConsistencyBonus, FusionConfig, FusionWeights};
pub use geometry::RansacConfig;
pub use crate::image::pyramid::ImagePyramid;
pub use crate::image::{Image, ImageSource, ImageView, PixelBuffer};
pub use normalize::NormalizeConfig;
pub use scorer::{HistogramConfig, MetricKind, MetricScore, SsimConfig, TemplateConfig};
pub use search::SearchConfig;
pub use select::{CancellationToken, CandidateFailure, MatchResult, SelectorConfig};
pub use util::{ConfigError, DecodeError, MatchError, Result};
