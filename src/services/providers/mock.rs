//! Mock provider implementation for testing and keyless local runs.

use super::{InlineImage, ProviderError, VisionProvider};
use async_trait::async_trait;

/// Mock vision provider returning a canned analysis.
#[derive(Default)]
pub struct MockVisionProvider;

impl MockVisionProvider {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl VisionProvider for MockVisionProvider {
    async fn analyze(&self, _prompt: &str, image: &InlineImage) -> Result<String, ProviderError> {
        Ok(format!(
            "Mock analysis for a {} upload: species unknown, the plant looks \
             healthy, water when the topsoil feels dry.",
            image.mime_type
        ))
    }
}
