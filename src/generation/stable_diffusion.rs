//! Stable Diffusion render backend
//!
//! Talks to an Automatic1111-compatible WebUI API:
//! - `POST /sdapi/v1/txt2img`
//! - `POST /sdapi/v1/img2img`

use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ImageGenerator, ImageToImage, RenderFuture, TextToImage};
use crate::config::Config;
use crate::utils::image_codec::decode_base64;

/// txt2img request payload
#[derive(Debug, Serialize)]
struct Txt2ImgPayload<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<&'a str>,
    cfg_scale: f64,
    steps: u32,
    seed: u64,
    batch_size: u32,
    n_iter: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    sampler_name: Option<&'a str>,
    save_images: bool,
    send_images: bool,
}

/// img2img request payload
#[derive(Debug, Serialize)]
struct Img2ImgPayload<'a> {
    #[serde(flatten)]
    base: Txt2ImgPayload<'a>,
    init_images: Vec<String>,
    denoising_strength: f64,
}

/// Response shared by both endpoints
#[derive(Debug, Deserialize)]
struct SdApiResponse {
    #[serde(default)]
    images: Vec<String>,
}

pub fn build_sdapi_url(base_url: &str, endpoint: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    let base_url = base_url.strip_suffix("/sdapi/v1").unwrap_or(base_url);
    format!("{}/sdapi/v1/{}", base_url, endpoint)
}

/// HTTP client for a Stable Diffusion WebUI backend
#[derive(Debug, Clone)]
pub struct StableDiffusionClient {
    client: Client,
    base_url: String,
    sampler: Option<String>,
    negative_prompt: Option<String>,
}

impl StableDiffusionClient {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.render_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.backend_url.clone(),
            sampler: config.sampler.clone(),
            negative_prompt: config.negative_prompt.clone(),
        })
    }

    fn base_payload<'a>(
        &'a self,
        prompt: &'a str,
        guidance_scale: f64,
        steps: u32,
        seed: u64,
    ) -> Txt2ImgPayload<'a> {
        Txt2ImgPayload {
            prompt,
            negative_prompt: self.negative_prompt.as_deref(),
            cfg_scale: guidance_scale,
            steps,
            seed,
            batch_size: 1,
            n_iter: 1,
            sampler_name: self.sampler.as_deref(),
            save_images: false,
            send_images: true,
        }
    }

    async fn txt2img(&self, request: TextToImage<'_>) -> Result<Vec<u8>> {
        let payload = self.base_payload(
            request.prompt,
            request.guidance_scale,
            request.steps,
            request.seed,
        );
        self.post_render("txt2img", &payload).await
    }

    async fn img2img(&self, request: ImageToImage<'_>) -> Result<Vec<u8>> {
        let payload = Img2ImgPayload {
            base: self.base_payload(
                request.prompt,
                request.guidance_scale,
                request.steps,
                request.seed,
            ),
            init_images: vec![BASE64.encode(request.init_image)],
            denoising_strength: request.strength,
        };
        self.post_render("img2img", &payload).await
    }

    async fn post_render<P: Serialize + ?Sized>(
        &self,
        endpoint: &str,
        payload: &P,
    ) -> Result<Vec<u8>> {
        let url = build_sdapi_url(&self.base_url, endpoint);
        let start_time = Instant::now();

        info!("Calling render backend: {}", url);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(payload)
            .send()
            .await;

        let duration_ms = start_time.elapsed().as_millis() as u64;
        info!("Render backend call completed in {}ms", duration_ms);

        match response {
            Ok(resp) => {
                let status = resp.status();
                let body_text = resp.text().await.unwrap_or_default();

                if !status.is_success() {
                    return Err(anyhow!(
                        "Render backend failed: {} - {}",
                        status,
                        truncate_for_error(&body_text)
                    ));
                }

                let api_response: SdApiResponse = serde_json::from_str(&body_text)
                    .map_err(|e| anyhow!("Failed to parse render backend response: {}", e))?;

                let encoded = api_response
                    .images
                    .into_iter()
                    .next()
                    .ok_or_else(|| anyhow!("Render backend returned no images"))?;

                let bytes = decode_base64(&encoded)?;
                debug!("Render backend returned {} bytes", bytes.len());
                Ok(bytes)
            }
            Err(e) => Err(anyhow!("Render backend request failed: {}", e)),
        }
    }
}

impl ImageGenerator for StableDiffusionClient {
    fn render_text<'a>(&'a self, request: TextToImage<'a>) -> RenderFuture<'a> {
        Box::pin(self.txt2img(request))
    }

    fn render_image<'a>(&'a self, request: ImageToImage<'a>) -> RenderFuture<'a> {
        Box::pin(self.img2img(request))
    }
}

/// Keep error messages readable when the backend returns an HTML page
fn truncate_for_error(body: &str) -> &str {
    const MAX_ERROR_BODY: usize = 500;
    if body.len() <= MAX_ERROR_BODY {
        return body;
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
