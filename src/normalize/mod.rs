//! Image normalizer: decode, validate and bring images to a shared geometry.
//!
//! Every image is resized to the engine's working resolution so that all
//! scorers compare pixel grids of identical size. The RGB buffer feeds the
//! histogram scorer; the luma buffer feeds the template, structural and
//! keypoint scorers.

use crate::image::color::rgb_to_gray;
use crate::image::resize::resize_rgb;
use crate::image::{Image, OwnedImage, RgbBuffer};
use crate::trace::trace_span;
use crate::util::{ConfigError, DecodeError};

/// Working geometry for normalization.
#[derive(Clone, Debug)]
pub struct NormalizeConfig {
    /// Target width in pixels.
    pub working_width: usize,
    /// Target height in pixels.
    pub working_height: usize,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            working_width: 256,
            working_height: 256,
        }
    }
}

impl NormalizeConfig {
    /// Rejects working sizes too small for keypoint detection.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.working_width < MIN_WORKING_SIDE || self.working_height < MIN_WORKING_SIDE {
            return Err(ConfigError::InvalidParameter {
                name: "normalize.working_size",
                reason: "both sides must be at least 64 pixels",
            });
        }
        Ok(())
    }
}

/// Smallest accepted working side.
pub const MIN_WORKING_SIDE: usize = 64;

/// An image resampled to the working resolution.
#[derive(Clone, Debug)]
pub struct NormalizedImage {
    id: String,
    rgb: RgbBuffer,
    gray: OwnedImage,
}

impl NormalizedImage {
    /// Returns the source identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the resampled RGB buffer.
    pub fn rgb(&self) -> &RgbBuffer {
        &self.rgb
    }

    /// Returns the resampled luma buffer.
    pub fn gray(&self) -> &OwnedImage {
        &self.gray
    }
}

/// Decodes `image` and resamples it to the configured working resolution.
pub fn normalize(image: &Image, cfg: &NormalizeConfig) -> Result<NormalizedImage, DecodeError> {
    let _span = trace_span!("normalize", id = image.id()).entered();
    let decoded = image.decode_rgb()?;
    let rgb = resize_rgb(&decoded, cfg.working_width, cfg.working_height)
        .map_err(|err| DecodeError::Malformed(err.to_string()))?;
    let gray = rgb_to_gray(&rgb).map_err(|err| DecodeError::Malformed(err.to_string()))?;
    Ok(NormalizedImage {
        id: image.id().to_owned(),
        rgb,
        gray,
    })
}

/// Normalizes a reference/candidate pair to the same geometry.
pub fn normalize_pair(
    reference: &Image,
    candidate: &Image,
    cfg: &NormalizeConfig,
) -> Result<(NormalizedImage, NormalizedImage), DecodeError> {
    Ok((normalize(reference, cfg)?, normalize(candidate, cfg)?))
}
