//! interior-design library - prompt enhancement and image generation API

pub mod api;
pub mod config;
pub mod enhancer;
pub mod error;
pub mod generation;
pub mod utils;

// Re-export commonly used types
pub use api::DesignServer;
pub use config::{Config, ConfigOptions};
pub use enhancer::{KnowledgeTables, PromptEnhancer};
pub use error::ApiError;
pub use generation::{GenerationPipeline, ImageGenerator, StableDiffusionClient};
