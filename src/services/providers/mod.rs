//! Vision provider abstractions and implementations.
//!
//! This module provides a trait-based abstraction for multimodal vision
//! providers, allowing easy swapping between backends (Gemini, mock).

pub mod gemini;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Empty response from provider")]
    EmptyResponse,

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Inline image payload sent alongside the instruction prompt.
#[derive(Debug, Clone)]
pub struct InlineImage {
    /// MIME type declared by the upload (e.g. `image/png`).
    pub mime_type: String,

    /// Base64-encoded image bytes.
    pub data: String,
}

/// Trait for vision analysis providers.
#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Run the instruction prompt against the inline image and return the
    /// provider's plain-text answer.
    async fn analyze(&self, prompt: &str, image: &InlineImage) -> Result<String, ProviderError>;
}
