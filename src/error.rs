//! API error types surfaced at the HTTP boundary

use hyper::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request field
    #[error("{0}")]
    InvalidInput(String),

    #[error("Request body too large (max {0} bytes)")]
    BodyTooLarge(usize),

    /// Every requested image failed to render
    #[error("Failed to generate design: {0}")]
    Generation(String),

    #[error("Not Found")]
    NotFound,

    /// Server-side fault unrelated to the request contents
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::BodyTooLarge(_) => StatusCode::BAD_REQUEST,
            Self::Generation(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }
}
