//! Utility modules

pub mod image_codec;
