//! Turning an unstructured source (web page, photo) into a [`Recipe`].

mod json_repair;

pub use json_repair::parse_model_json;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{debug, warn};
use url::Url;

use crate::error::KeeperError;
use crate::images::{ImageCache, ImageDiscovery};
use crate::model::Recipe;
use crate::providers::{url_extraction_prompt, LlmProvider, IMAGE_EXTRACTION_PROMPT};

/// What the user handed us.
#[derive(Debug, Clone)]
pub enum RecipeSource {
    /// A page URL to analyze
    Url(String),
    /// An uploaded photo of a recipe
    Image { bytes: Vec<u8>, mime_type: String },
}

/// Orchestrates model calls, output repair, and image discovery.
pub struct RecipeExtractor {
    provider: Box<dyn LlmProvider>,
    discovery: ImageDiscovery,
}

impl RecipeExtractor {
    pub fn new(provider: Box<dyn LlmProvider>, discovery: ImageDiscovery) -> Self {
        Self {
            provider,
            discovery,
        }
    }

    /// Extract a recipe from the source.
    ///
    /// On success the returned record is a preview: not yet persisted, no
    /// id, no timestamp. Every failure carries a reason; none leaves
    /// partially-populated state behind.
    pub async fn extract(
        &self,
        source: RecipeSource,
        cache: &mut ImageCache,
    ) -> Result<Recipe, KeeperError> {
        match source {
            RecipeSource::Url(url) => self.extract_from_url(&url, cache).await,
            RecipeSource::Image { bytes, mime_type } => {
                self.extract_from_image(&bytes, &mime_type).await
            }
        }
    }

    async fn extract_from_url(
        &self,
        page_url: &str,
        cache: &mut ImageCache,
    ) -> Result<Recipe, KeeperError> {
        let trimmed = page_url.trim();
        let parsed = Url::parse(trimmed)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .ok_or_else(|| {
                KeeperError::InvalidInput(format!("not an http(s) URL: {trimmed}"))
            })?;

        let raw = self
            .provider
            .generate(&url_extraction_prompt(parsed.as_str()))
            .await?;
        let value = parse_model_json(&raw)?;
        let mut recipe = Recipe::from_model_json(value)
            .map_err(|e| KeeperError::UnparseableOutput(e.to_string()))?;

        recipe.source_url = Some(parsed.to_string());
        self.discovery.best_image(parsed.as_str(), &mut recipe).await;

        // Opportunistic warm-up; a cache failure never fails the extraction.
        if let Some(image_url) = recipe.image_url.clone() {
            cache.ensure_cached(self.discovery.client(), &image_url).await;
        }

        debug!("extracted recipe from {trimmed}: {:?}", recipe.title);
        Ok(recipe)
    }

    async fn extract_from_image(
        &self,
        bytes: &[u8],
        mime_type: &str,
    ) -> Result<Recipe, KeeperError> {
        // Reject non-images before spending a model call on them.
        if image::guess_format(bytes).is_err() {
            warn!("rejected upload that does not look like an image ({mime_type})");
            return Err(KeeperError::InvalidInput(
                "uploaded file is not a recognizable image".to_string(),
            ));
        }

        let data_b64 = STANDARD.encode(bytes);
        let raw = self
            .provider
            .generate_with_image(IMAGE_EXTRACTION_PROMPT, mime_type, &data_b64)
            .await?;
        let value = parse_model_json(&raw)?;
        let recipe = Recipe::from_model_json(value)
            .map_err(|e| KeeperError::UnparseableOutput(e.to_string()))?;

        // The photographed source is the recipe image; no discovery here.
        debug!("extracted recipe from image: {:?}", recipe.title);
        Ok(recipe)
    }
}
