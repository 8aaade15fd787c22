//! Tests for config module

use interior_design::config::{
    Config, ConfigOptions, DEFAULT_HOST, DEFAULT_JPEG_QUALITY, DEFAULT_MAX_BODY_BYTES,
    DEFAULT_MAX_IMAGES, DEFAULT_PORT, DEFAULT_RENDER_TIMEOUT_SECS,
};

fn test_config(backend_url: &str) -> Result<std::sync::Arc<Config>, anyhow::Error> {
    Config::new(backend_url.to_string(), ConfigOptions::default())
}

#[test]
fn test_config_new_with_valid_url() {
    let config = test_config("http://127.0.0.1:7860").unwrap();
    assert_eq!(config.backend_url, "http://127.0.0.1:7860");
}

#[test]
fn test_config_adds_http_prefix() {
    let config = test_config("127.0.0.1:7860").unwrap();
    assert_eq!(config.backend_url, "http://127.0.0.1:7860");
}

#[test]
fn test_config_keeps_https() {
    let config = test_config("https://sd.example.com").unwrap();
    assert_eq!(config.backend_url, "https://sd.example.com");
}

#[test]
fn test_config_removes_trailing_slashes() {
    let config = test_config("http://127.0.0.1:7860///").unwrap();
    assert_eq!(config.backend_url, "http://127.0.0.1:7860");
}

#[test]
fn test_config_empty_url_fails() {
    let config = test_config("   ");
    assert!(config.is_err());
    assert!(config.unwrap_err().to_string().contains("backend_url"));
}

#[test]
fn test_config_default_values() {
    let config = test_config("http://localhost:7860").unwrap();
    assert_eq!(config.host, DEFAULT_HOST);
    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.port, 5000);
    assert_eq!(config.render_timeout_secs, DEFAULT_RENDER_TIMEOUT_SECS);
    assert_eq!(config.max_images, DEFAULT_MAX_IMAGES);
    assert_eq!(config.max_images, 4);
    assert_eq!(config.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
    assert_eq!(config.jpeg_quality, DEFAULT_JPEG_QUALITY);
    assert_eq!(config.jpeg_quality, 90);
    assert!(config.sampler.is_none());
    assert!(config.negative_prompt.is_none());
}

#[test]
fn test_config_with_custom_values() {
    let config = Config::new(
        "http://localhost:7860".to_string(),
        ConfigOptions {
            host: Some("127.0.0.1".to_string()),
            port: Some(8080),
            render_timeout: Some(60),
            max_images: Some(2),
            max_body_bytes: Some(1024),
            jpeg_quality: Some(75),
            sampler: Some("DPM++ 2M Karras".to_string()),
            negative_prompt: Some("blurry, distorted".to_string()),
        },
    )
    .unwrap();

    assert_eq!(config.host, "127.0.0.1");
    assert_eq!(config.port, 8080);
    assert_eq!(config.render_timeout_secs, 60);
    assert_eq!(config.max_images, 2);
    assert_eq!(config.max_body_bytes, 1024);
    assert_eq!(config.jpeg_quality, 75);
    assert_eq!(config.sampler.as_deref(), Some("DPM++ 2M Karras"));
    assert_eq!(config.negative_prompt.as_deref(), Some("blurry, distorted"));
}

#[test]
fn test_config_blank_optional_strings_become_none() {
    let config = Config::new(
        "http://localhost:7860".to_string(),
        ConfigOptions {
            host: Some("  ".to_string()),
            sampler: Some("".to_string()),
            negative_prompt: Some("   ".to_string()),
            ..Default::default()
        },
    )
    .unwrap();

    assert_eq!(config.host, DEFAULT_HOST);
    assert!(config.sampler.is_none());
    assert!(config.negative_prompt.is_none());
}

#[test]
fn test_config_zero_max_images_fails() {
    let config = Config::new(
        "http://localhost:7860".to_string(),
        ConfigOptions {
            max_images: Some(0),
            ..Default::default()
        },
    );
    assert!(config.is_err());
}

#[test]
fn test_config_invalid_jpeg_quality_fails() {
    for quality in [0u8, 101] {
        let config = Config::new(
            "http://localhost:7860".to_string(),
            ConfigOptions {
                jpeg_quality: Some(quality),
                ..Default::default()
            },
        );
        assert!(config.is_err(), "quality {} accepted", quality);
    }
}

#[test]
fn test_bind_addr() {
    let config = Config::new(
        "http://localhost:7860".to_string(),
        ConfigOptions {
            host: Some("127.0.0.1".to_string()),
            port: Some(5050),
            ..Default::default()
        },
    )
    .unwrap();
    assert_eq!(config.bind_addr().unwrap().to_string(), "127.0.0.1:5050");
}

#[test]
fn test_bind_addr_invalid_host() {
    let config = Config::new(
        "http://localhost:7860".to_string(),
        ConfigOptions {
            host: Some("not a host".to_string()),
            ..Default::default()
        },
    )
    .unwrap();
    assert!(config.bind_addr().is_err());
}
