//! Errors raised while building shadow inputs.
//!
//! Evaluation itself never fails: every degenerate case resolves to full
//! visibility. These errors only cover constructing a depth buffer,
//! validating parameters, and loading configuration.

use thiserror::Error;

/// Errors from the soft-shadow setup path
#[derive(Debug, Error)]
pub enum ShadowError {
    #[error("Invalid shadow parameter `{field}`: {reason}")]
    InvalidParams { field: &'static str, reason: String },

    #[error("Invalid depth buffer: {0}")]
    InvalidDepthBuffer(String),

    #[error("Failed to read shadow config: {0}")]
    ConfigRead(#[from] std::io::Error),

    #[error("Failed to parse shadow config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl ShadowError {
    pub(crate) fn invalid_param(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParams { field, reason: reason.into() }
    }
}

/// Result type alias
pub type Result<T> = core::result::Result<T, ShadowError>;
