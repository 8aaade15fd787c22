//! Tests for the Stable Diffusion WebUI backend client
//! Uses wiremock to mock HTTP responses

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::{ImageFormat, Rgb, RgbImage};
use interior_design::config::{Config, ConfigOptions};
use interior_design::generation::{ImageGenerator, ImageToImage, StableDiffusionClient, TextToImage};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn tiny_png() -> Vec<u8> {
    let image = RgbImage::from_pixel(4, 4, Rgb([200, 180, 150]));
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn create_test_client(base_url: &str, options: ConfigOptions) -> StableDiffusionClient {
    let config = Config::new(
        base_url.to_string(),
        ConfigOptions {
            render_timeout: Some(30),
            ..options
        },
    )
    .unwrap();
    StableDiffusionClient::new(&config).unwrap()
}

fn text_request(prompt: &str, seed: u64) -> TextToImage<'_> {
    TextToImage {
        prompt,
        guidance_scale: 7.5,
        steps: 50,
        seed,
    }
}

// ============================================================================
// txt2img
// ============================================================================

#[tokio::test]
async fn test_txt2img_success() {
    let mock_server = MockServer::start().await;
    let png = tiny_png();

    Mock::given(method("POST"))
        .and(path("/sdapi/v1/txt2img"))
        .and(body_partial_json(serde_json::json!({
            "prompt": "a bedroom. cinematic",
            "seed": 1234,
            "cfg_scale": 7.5,
            "steps": 50,
            "batch_size": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "images": [BASE64.encode(&png)],
            "parameters": {},
            "info": "{}"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri(), ConfigOptions::default());
    let result = client
        .render_text(text_request("a bedroom. cinematic", 1234))
        .await;

    assert_eq!(result.unwrap(), png);
}

#[tokio::test]
async fn test_txt2img_sends_sampler_and_negative_prompt() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sdapi/v1/txt2img"))
        .and(body_partial_json(serde_json::json!({
            "sampler_name": "Euler a",
            "negative_prompt": "blurry"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "images": [BASE64.encode(tiny_png())]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(
        &mock_server.uri(),
        ConfigOptions {
            sampler: Some("Euler a".to_string()),
            negative_prompt: Some("blurry".to_string()),
            ..Default::default()
        },
    );

    assert!(client.render_text(text_request("a loft", 1)).await.is_ok());
}

#[tokio::test]
async fn test_txt2img_strips_data_url_prefix() {
    let mock_server = MockServer::start().await;
    let png = tiny_png();

    Mock::given(method("POST"))
        .and(path("/sdapi/v1/txt2img"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "images": [format!("data:image/png;base64,{}", BASE64.encode(&png))]
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri(), ConfigOptions::default());
    let result = client.render_text(text_request("a loft", 1)).await;

    assert_eq!(result.unwrap(), png);
}

#[tokio::test]
async fn test_backend_base_url_with_api_suffix() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sdapi/v1/txt2img"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "images": [BASE64.encode(tiny_png())]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let base_url = format!("{}/sdapi/v1/", mock_server.uri());
    let client = create_test_client(&base_url, ConfigOptions::default());

    assert!(client.render_text(text_request("a loft", 1)).await.is_ok());
}

// ============================================================================
// img2img
// ============================================================================

#[tokio::test]
async fn test_img2img_sends_init_image_and_strength() {
    let mock_server = MockServer::start().await;
    let init_image = tiny_png();
    let rendered = tiny_png();

    Mock::given(method("POST"))
        .and(path("/sdapi/v1/img2img"))
        .and(body_partial_json(serde_json::json!({
            "prompt": "a brighter loft",
            "init_images": [BASE64.encode(&init_image)],
            "denoising_strength": 0.5,
            "seed": 99
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "images": [BASE64.encode(&rendered)]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri(), ConfigOptions::default());
    let result = client
        .render_image(ImageToImage {
            prompt: "a brighter loft",
            init_image: &init_image,
            guidance_scale: 7.5,
            steps: 50,
            strength: 0.5,
            seed: 99,
        })
        .await;

    assert_eq!(result.unwrap(), rendered);
}

// ============================================================================
// Error Handling
// ============================================================================

#[tokio::test]
async fn test_backend_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sdapi/v1/txt2img"))
        .respond_with(ResponseTemplate::new(500).set_body_string("CUDA out of memory"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri(), ConfigOptions::default());
    let result = client.render_text(text_request("a loft", 1)).await;

    let message = result.unwrap_err().to_string();
    assert!(message.contains("Render backend failed"));
    assert!(message.contains("500"));
    assert!(message.contains("CUDA out of memory"));
}

#[tokio::test]
async fn test_backend_returns_no_images() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sdapi/v1/txt2img"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "images": []
        })))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri(), ConfigOptions::default());
    let result = client.render_text(text_request("a loft", 1)).await;

    assert!(result.unwrap_err().to_string().contains("no images"));
}

#[tokio::test]
async fn test_backend_invalid_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sdapi/v1/txt2img"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&mock_server)
        .await;

    let client = create_test_client(&mock_server.uri(), ConfigOptions::default());
    let result = client.render_text(text_request("a loft", 1)).await;

    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Failed to parse render backend response"));
}

#[tokio::test]
async fn test_backend_unreachable() {
    // Nothing listens on port 1
    let client = create_test_client("http://127.0.0.1:1", ConfigOptions::default());
    let result = client.render_text(text_request("a loft", 1)).await;

    assert!(result
        .unwrap_err()
        .to_string()
        .contains("Render backend request failed"));
}
