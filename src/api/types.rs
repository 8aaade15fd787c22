//! Request and response bodies of the design API

use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::generation::{GenerationParams, DEFAULT_GUIDANCE_SCALE, DEFAULT_STEPS};

/// Default image count for `/api/generate`
pub const DEFAULT_TEXT_IMAGES: usize = 3;

/// Default image count for `/api/generate_from_image`
pub const DEFAULT_SEEDED_IMAGES: usize = 1;

/// Default img2img strength
pub const DEFAULT_STRENGTH: f64 = 0.8;

/// A number that clients may also send as a numeric string ("7.5")
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LenientNumber {
    Number(f64),
    Text(String),
}

impl LenientNumber {
    pub fn as_f64(&self, field: &str) -> Result<f64, ApiError> {
        let not_a_number = || ApiError::invalid(format!("{} must be a number", field));
        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse::<f64>().map_err(|_| not_a_number())?,
        };
        if !value.is_finite() {
            return Err(ApiError::invalid(format!(
                "{} must be a finite number",
                field
            )));
        }
        Ok(value)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub prompt: Option<String>,
    pub quality_level: Option<LenientNumber>,
    pub detail_level: Option<LenientNumber>,
    pub num_images: Option<LenientNumber>,
}

impl GenerateRequest {
    pub fn params(&self, max_images: usize) -> Result<GenerationParams, ApiError> {
        resolve_params(
            self.quality_level.as_ref(),
            self.detail_level.as_ref(),
            self.num_images.as_ref(),
            DEFAULT_TEXT_IMAGES,
            max_images,
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateFromImageRequest {
    /// Base64 seed image, plain or as a data URL
    pub image: Option<String>,
    pub prompt: Option<String>,
    pub quality_level: Option<LenientNumber>,
    pub detail_level: Option<LenientNumber>,
    pub num_images: Option<LenientNumber>,
    pub strength: Option<LenientNumber>,
}

impl GenerateFromImageRequest {
    pub fn params(&self, max_images: usize) -> Result<GenerationParams, ApiError> {
        resolve_params(
            self.quality_level.as_ref(),
            self.detail_level.as_ref(),
            self.num_images.as_ref(),
            DEFAULT_SEEDED_IMAGES,
            max_images,
        )
    }

    pub fn strength(&self) -> Result<f64, ApiError> {
        let strength = match &self.strength {
            Some(s) => s.as_f64("strength")?,
            None => DEFAULT_STRENGTH,
        };
        if !(0.0..=1.0).contains(&strength) {
            return Err(ApiError::invalid("strength must be between 0 and 1"));
        }
        Ok(strength)
    }
}

fn resolve_params(
    quality_level: Option<&LenientNumber>,
    detail_level: Option<&LenientNumber>,
    num_images: Option<&LenientNumber>,
    default_images: usize,
    max_images: usize,
) -> Result<GenerationParams, ApiError> {
    let guidance_scale = match quality_level {
        Some(q) => q.as_f64("qualityLevel")?,
        None => DEFAULT_GUIDANCE_SCALE,
    };

    let steps = match detail_level {
        Some(d) => {
            let steps = d.as_f64("detailLevel")?.trunc();
            if steps < 1.0 {
                return Err(ApiError::invalid("detailLevel must be at least 1"));
            }
            steps.min(u32::MAX as f64) as u32
        }
        None => DEFAULT_STEPS,
    };

    // Negative counts request nothing; large counts are capped
    let num_images = match num_images {
        Some(n) => {
            let requested = n.as_f64("numImages")?.trunc();
            requested.clamp(0.0, max_images as f64) as usize
        }
        None => default_images.min(max_images),
    };

    Ok(GenerationParams {
        num_images,
        guidance_scale,
        steps,
    })
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    /// Base64 JPEG per requested image, null where rendering failed
    pub images: Vec<Option<String>>,
    pub enhanced_prompt: String,
    pub original_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
