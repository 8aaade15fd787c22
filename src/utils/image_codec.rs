//! Image transport encoding
//!
//! Seed images arrive as base64 (optionally a data URL) and are normalized
//! to RGB PNG before they go to the render backend. Rendered images are
//! re-encoded as JPEG and base64 for the JSON response.

use std::io::Cursor;

use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};

/// Strip a `data:<mime>;base64,` prefix if present
pub fn strip_data_url(encoded: &str) -> &str {
    let trimmed = encoded.trim();
    if trimmed.starts_with("data:") {
        if let Some((_, payload)) = trimmed.split_once(";base64,") {
            return payload;
        }
    }
    trimmed
}

/// Decode base64 text into raw bytes. Line-wrapped (MIME style) input is accepted.
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>> {
    let payload: String = strip_data_url(encoded).split_ascii_whitespace().collect();
    if payload.is_empty() {
        return Err(anyhow!("empty image payload"));
    }
    BASE64
        .decode(payload)
        .map_err(|e| anyhow!("invalid base64 image data: {}", e))
}

/// Decode a base64 seed image and re-encode it as RGB PNG
pub fn decode_seed_image(encoded: &str) -> Result<Vec<u8>> {
    let bytes = decode_base64(encoded)?;
    let image = image::load_from_memory(&bytes)
        .context("unsupported or corrupt image")?;
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());

    let mut png = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .context("failed to encode seed image as PNG")?;
    Ok(png)
}

/// Re-encode rendered image bytes as base64 JPEG
pub fn encode_for_transport(bytes: &[u8], quality: u8) -> Result<String> {
    let image = image::load_from_memory(bytes)
        .context("render backend returned an unreadable image")?;
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());

    let mut jpeg = Vec::new();
    rgb.write_with_encoder(JpegEncoder::new_with_quality(&mut jpeg, quality))
        .context("failed to encode JPEG")?;
    Ok(BASE64.encode(jpeg))
}
