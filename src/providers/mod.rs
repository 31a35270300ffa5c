mod google;
mod prompt;

pub use google::GoogleProvider;
pub use prompt::{url_extraction_prompt, IMAGE_EXTRACTION_PROMPT};

use crate::error::KeeperError;
use async_trait::async_trait;

/// Unified trait for generative model backends
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name (e.g., "google")
    fn provider_name(&self) -> &str;

    /// Send a text-only prompt and return the raw model text
    async fn generate(&self, prompt: &str) -> Result<String, KeeperError>;

    /// Send a prompt together with an inline base64 image
    async fn generate_with_image(
        &self,
        prompt: &str,
        mime_type: &str,
        data_b64: &str,
    ) -> Result<String, KeeperError>;
}
