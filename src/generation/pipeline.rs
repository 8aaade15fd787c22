//! Generation pipeline - enhance, then render one image per slot

use std::sync::Arc;
use std::time::Instant;

use rand::Rng;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::{ImageGenerator, ImageToImage, RenderFuture, TextToImage};
use crate::enhancer::PromptEnhancer;

/// Largest per-image seed (seeds are drawn from 1..=MAX_SEED)
pub const MAX_SEED: u64 = 2_147_483_647;

/// Default guidance scale (prompt adherence)
pub const DEFAULT_GUIDANCE_SCALE: f64 = 7.5;

/// Default number of inference steps
pub const DEFAULT_STEPS: u32 = 50;

/// Diffusion parameters shared by every image of a request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub num_images: usize,
    pub guidance_scale: f64,
    pub steps: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            num_images: 1,
            guidance_scale: DEFAULT_GUIDANCE_SCALE,
            steps: DEFAULT_STEPS,
        }
    }
}

/// Enhanced prompt plus one seed per requested image
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationPlan {
    pub enhanced_prompt: String,
    pub seeds: Vec<u64>,
}

/// Result of one request: a slot per requested image, `None` where rendering failed
#[derive(Debug, Clone)]
pub struct GenerationOutcome {
    pub enhanced_prompt: String,
    pub images: Vec<Option<Vec<u8>>>,
    /// Set when at least one slot failed
    pub error: Option<String>,
}

impl GenerationOutcome {
    pub fn failed_count(&self) -> usize {
        self.images.iter().filter(|slot| slot.is_none()).count()
    }

    /// Every requested image failed
    pub fn is_total_failure(&self) -> bool {
        !self.images.is_empty() && self.images.iter().all(Option::is_none)
    }
}

#[derive(Clone, Copy)]
enum RenderKind<'a> {
    Text,
    Image { init_image: &'a [u8], strength: f64 },
}

/// Runs enhanced prompts against a shared renderer
pub struct GenerationPipeline {
    generator: Arc<dyn ImageGenerator>,
    enhancer: PromptEnhancer,
    // The renderer owns a single accelerator; one batch at a time.
    device: Mutex<()>,
}

impl GenerationPipeline {
    pub fn new(generator: Arc<dyn ImageGenerator>, enhancer: PromptEnhancer) -> Self {
        Self {
            generator,
            enhancer,
            device: Mutex::new(()),
        }
    }

    pub fn enhancer(&self) -> &PromptEnhancer {
        &self.enhancer
    }

    /// Enhance the prompt and draw one seed per image
    pub fn plan<R: Rng + ?Sized>(
        &self,
        user_input: &str,
        num_images: usize,
        rng: &mut R,
    ) -> GenerationPlan {
        let enhanced_prompt = self.enhancer.enhance_with_rng(user_input, rng);
        let seeds = (0..num_images)
            .map(|_| rng.gen_range(1..=MAX_SEED))
            .collect();
        GenerationPlan {
            enhanced_prompt,
            seeds,
        }
    }

    /// Text-to-image: enhance `user_input` and render `params.num_images` images
    pub async fn generate(
        &self,
        user_input: &str,
        params: &GenerationParams,
    ) -> GenerationOutcome {
        let plan = {
            let mut rng = rand::thread_rng();
            self.plan(user_input, params.num_images, &mut rng)
        };
        info!("Enhanced prompt for text-to-image: {}", plan.enhanced_prompt);
        self.render_text(plan, params).await
    }

    /// Image-to-image: enhance `user_input` and transform `init_image`
    pub async fn generate_from_image(
        &self,
        init_image: &[u8],
        user_input: &str,
        params: &GenerationParams,
        strength: f64,
    ) -> GenerationOutcome {
        let plan = {
            let mut rng = rand::thread_rng();
            self.plan(user_input, params.num_images, &mut rng)
        };
        info!("Enhanced prompt for img2img: {}", plan.enhanced_prompt);
        self.render_from_image(plan, init_image, params, strength)
            .await
    }

    /// Render a prepared plan text-to-image
    pub async fn render_text(
        &self,
        plan: GenerationPlan,
        params: &GenerationParams,
    ) -> GenerationOutcome {
        self.run(plan, params, RenderKind::Text).await
    }

    /// Render a prepared plan image-to-image
    pub async fn render_from_image(
        &self,
        plan: GenerationPlan,
        init_image: &[u8],
        params: &GenerationParams,
        strength: f64,
    ) -> GenerationOutcome {
        self.run(
            plan,
            params,
            RenderKind::Image {
                init_image,
                strength,
            },
        )
        .await
    }

    fn dispatch<'a>(
        &'a self,
        prompt: &'a str,
        kind: RenderKind<'a>,
        params: &GenerationParams,
        seed: u64,
    ) -> RenderFuture<'a> {
        match kind {
            RenderKind::Text => self.generator.render_text(TextToImage {
                prompt,
                guidance_scale: params.guidance_scale,
                steps: params.steps,
                seed,
            }),
            RenderKind::Image {
                init_image,
                strength,
            } => self.generator.render_image(ImageToImage {
                prompt,
                init_image,
                guidance_scale: params.guidance_scale,
                steps: params.steps,
                strength,
                seed,
            }),
        }
    }

    async fn run(
        &self,
        plan: GenerationPlan,
        params: &GenerationParams,
        kind: RenderKind<'_>,
    ) -> GenerationOutcome {
        let total = plan.seeds.len();
        let mut images = Vec::with_capacity(total);
        let mut errors: Vec<String> = Vec::new();

        let _device = self.device.lock().await;
        let start_time = Instant::now();

        for (slot, seed) in plan.seeds.iter().enumerate() {
            match self
                .dispatch(&plan.enhanced_prompt, kind, params, *seed)
                .await
            {
                Ok(bytes) => images.push(Some(bytes)),
                Err(e) => {
                    warn!("Image {}/{} (seed {}) failed: {}", slot + 1, total, seed, e);
                    let message = e.to_string();
                    if !errors.contains(&message) {
                        errors.push(message);
                    }
                    images.push(None);
                }
            }
        }

        let outcome = GenerationOutcome {
            enhanced_prompt: plan.enhanced_prompt,
            images,
            error: if errors.is_empty() {
                None
            } else {
                Some(format!("Error: {}", errors.join("; ")))
            },
        };

        if outcome.is_total_failure() {
            error!("All {} image(s) failed to render", total);
        } else {
            info!(
                "Rendered {}/{} image(s) in {}ms",
                total - outcome.failed_count(),
                total,
                start_time.elapsed().as_millis()
            );
        }

        outcome
    }
}
