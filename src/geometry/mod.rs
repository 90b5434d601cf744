//! Geometric verification of keypoint correspondences.

mod homography;
mod ransac;

pub use homography::Homography;
pub use ransac::{ransac_homography, RansacConfig, RansacOutcome};
