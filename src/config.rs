//! Configuration module - server and render backend settings

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, Result};

/// Default bind address
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default bind port
pub const DEFAULT_PORT: u16 = 5000;

/// Default per-render HTTP timeout (5 minutes)
pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 300;

/// Upper bound for images per request
pub const DEFAULT_MAX_IMAGES: usize = 4;

/// Default request body limit (20MB, seed images travel as base64)
pub const DEFAULT_MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Default JPEG quality for generated images
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Optional configuration parameters for Config::new()
#[derive(Debug, Clone, Default)]
pub struct ConfigOptions {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub render_timeout: Option<u64>,
    pub max_images: Option<usize>,
    pub max_body_bytes: Option<usize>,
    pub jpeg_quality: Option<u8>,
    pub sampler: Option<String>,
    pub negative_prompt: Option<String>,
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: String,
    pub host: String,
    pub port: u16,
    pub render_timeout_secs: u64,
    pub max_images: usize,
    pub max_body_bytes: usize,
    pub jpeg_quality: u8,
    pub sampler: Option<String>,
    pub negative_prompt: Option<String>,
}

impl Config {
    /// Create a new Config with the required backend URL plus optional settings
    pub fn new(backend_url: String, options: ConfigOptions) -> Result<Arc<Self>> {
        let backend_url = backend_url.trim();
        if backend_url.is_empty() {
            return Err(anyhow!("backend_url cannot be empty"));
        }

        // Local backends usually speak plain http
        let has_scheme = backend_url.starts_with("http://") || backend_url.starts_with("https://");
        let backend_url = if has_scheme {
            backend_url.to_string()
        } else {
            format!("http://{}", backend_url)
        };
        let backend_url = backend_url.trim_end_matches('/').to_string();

        let max_images = options.max_images.unwrap_or(DEFAULT_MAX_IMAGES);
        if max_images == 0 {
            return Err(anyhow!("max_images must be at least 1"));
        }

        let jpeg_quality = options.jpeg_quality.unwrap_or(DEFAULT_JPEG_QUALITY);
        if !(1..=100).contains(&jpeg_quality) {
            return Err(anyhow!("jpeg_quality must be between 1 and 100"));
        }

        let host = options
            .host
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        Ok(Arc::new(Self {
            backend_url,
            host,
            port: options.port.unwrap_or(DEFAULT_PORT),
            render_timeout_secs: options
                .render_timeout
                .unwrap_or(DEFAULT_RENDER_TIMEOUT_SECS),
            max_images,
            max_body_bytes: options.max_body_bytes.unwrap_or(DEFAULT_MAX_BODY_BYTES),
            jpeg_quality,
            sampler: non_empty(options.sampler),
            negative_prompt: non_empty(options.negative_prompt),
        }))
    }

    /// Socket address to bind
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow!("Invalid bind address {}:{}: {}", self.host, self.port, e))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
