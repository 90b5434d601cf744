//! Low-level building blocks for custom matching pipelines.
//!
//! These expose the individual scorers, the ZNCC kernels and the geometric
//! helpers behind [`Engine`](crate::Engine). Most users should prefer the
//! top-level `compare` and `find_best_match` functions.

pub use crate::candidate::nms::nms_2d;
pub use crate::candidate::topk::{Peak, TopK};
pub use crate::features::{detect_features, match_descriptors, FeatureMatch, FeatureSet};
pub use crate::fusion::{fuse, Fused};
pub use crate::geometry::{ransac_homography, Homography, RansacOutcome};
pub use crate::kernel::{Kernel, ScanParams};
pub use crate::normalize::{normalize, normalize_pair, NormalizedImage};
pub use crate::scorer::{
    mean_ssim, ColorHistogram, FeatureScorer, HistogramScorer, PreparedImage, Scorer,
    StructuralScorer, TemplateScorer,
};
pub use crate::search::{locate, Placement};
pub use crate::select::select_best;
pub use crate::template::{ScaledTemplate, TemplatePlan};
