//! Design API module
//! HTTP routes for design suggestions and image generation

pub mod server;
pub mod types;

pub use server::{AppState, DesignServer};
pub use types::{GenerateFromImageRequest, GenerateRequest, GenerateResponse};
