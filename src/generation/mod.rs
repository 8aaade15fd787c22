//! Image generation module
//!
//! The diffusion model runs behind the [`ImageGenerator`] trait. Each call
//! renders a single image; [`GenerationPipeline`] fans a request out into
//! one call per requested image and isolates failures per slot.

mod pipeline;
mod stable_diffusion;

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;

pub use pipeline::{
    GenerationOutcome, GenerationParams, GenerationPipeline, GenerationPlan,
    DEFAULT_GUIDANCE_SCALE, DEFAULT_STEPS, MAX_SEED,
};
pub use stable_diffusion::{build_sdapi_url, StableDiffusionClient};

/// Boxed future returned by render calls, resolving to encoded image bytes
pub type RenderFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>>> + Send + 'a>>;

/// Text-to-image render request
#[derive(Debug, Clone, Copy)]
pub struct TextToImage<'a> {
    pub prompt: &'a str,
    pub guidance_scale: f64,
    pub steps: u32,
    pub seed: u64,
}

/// Image-to-image render request
#[derive(Debug, Clone, Copy)]
pub struct ImageToImage<'a> {
    pub prompt: &'a str,
    /// Seed image, RGB PNG
    pub init_image: &'a [u8],
    pub guidance_scale: f64,
    pub steps: u32,
    /// 0.0 keeps the seed image, 1.0 regenerates it fully
    pub strength: f64,
    pub seed: u64,
}

/// External diffusion renderer
pub trait ImageGenerator: Send + Sync {
    /// Render one image from a prompt
    fn render_text<'a>(&'a self, request: TextToImage<'a>) -> RenderFuture<'a>;

    /// Render one image from a prompt and a seed image
    fn render_image<'a>(&'a self, request: ImageToImage<'a>) -> RenderFuture<'a>;
}
