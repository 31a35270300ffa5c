use crate::config::GeminiConfig;
use crate::error::KeeperError;
use crate::providers::LlmProvider;
use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};

pub struct GoogleProvider {
    client: Client,
    api_key: String,
    base_url: String,
    url_model: String,
    image_model: String,
    temperature: f32,
}

impl GoogleProvider {
    /// Create a new Google Gemini provider from configuration
    pub fn new(config: &GeminiConfig) -> Result<Self, KeeperError> {
        let api_key = config.api_key()?;

        Ok(GoogleProvider {
            client: Client::new(),
            api_key,
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            url_model: config.url_model.clone(),
            image_model: config.image_model.clone(),
            temperature: config.temperature,
        })
    }

    #[doc(hidden)]
    pub fn with_base_url(api_key: String, base_url: String, model: String) -> Self {
        GoogleProvider {
            client: Client::new(),
            api_key,
            base_url,
            url_model: model.clone(),
            image_model: model,
            temperature: 0.1,
        }
    }

    /// Call generateContent and pull the text out of the first candidate.
    ///
    /// Structured JSON output is requested directly via responseMimeType;
    /// the repair cascade downstream handles models that ignore it.
    async fn generate_content(&self, model: &str, parts: Vec<Value>) -> Result<String, KeeperError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "contents": [{
                    "parts": parts
                }],
                "generationConfig": {
                    "temperature": self.temperature,
                    "responseMimeType": "application/json"
                }
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(KeeperError::Model(format!(
                "Gemini API error ({status}): {error_text}"
            )));
        }

        let response_body: Value = response.json().await?;
        debug!("{:?}", response_body);

        response_body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|text| text.to_string())
            .ok_or_else(|| {
                KeeperError::Model("Failed to extract content from Gemini response".to_string())
            })
    }
}

#[async_trait]
impl LlmProvider for GoogleProvider {
    fn provider_name(&self) -> &str {
        "google"
    }

    async fn generate(&self, prompt: &str) -> Result<String, KeeperError> {
        self.generate_content(&self.url_model, vec![json!({ "text": prompt })])
            .await
    }

    async fn generate_with_image(
        &self,
        prompt: &str,
        mime_type: &str,
        data_b64: &str,
    ) -> Result<String, KeeperError> {
        let parts = vec![
            json!({ "text": prompt }),
            json!({
                "inlineData": {
                    "mimeType": mime_type,
                    "data": data_b64
                }
            }),
        ];
        self.generate_content(&self.image_model, parts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn gemini_reply(text: &str) -> String {
        json!({
            "candidates": [{
                "content": {
                    "parts": [{ "text": text }]
                }
            }]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_generate() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-test:generateContent")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(gemini_reply(r#"{"title": "Shakshuka"}"#))
            .create();

        let provider = GoogleProvider::with_base_url(
            "fake_api_key".to_string(),
            server.url(),
            "gemini-test".to_string(),
        );

        let result = provider.generate("extract this").await.unwrap();
        assert!(result.contains("Shakshuka"));
        mock.assert();
    }

    #[tokio::test]
    async fn test_generate_api_error() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-test:generateContent")
            .match_query(mockito::Matcher::Any)
            .with_status(429)
            .with_header("content-type", "application/json")
            .with_body(r#"{"error": "quota exceeded"}"#)
            .create();

        let provider = GoogleProvider::with_base_url(
            "fake_api_key".to_string(),
            server.url(),
            "gemini-test".to_string(),
        );

        let result = provider.generate("extract this").await;
        assert!(matches!(result, Err(KeeperError::Model(_))));
        mock.assert();
    }

    #[tokio::test]
    async fn test_empty_candidates_is_an_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-test:generateContent")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates": []}"#)
            .create();

        let provider = GoogleProvider::with_base_url(
            "fake_api_key".to_string(),
            server.url(),
            "gemini-test".to_string(),
        );

        let result = provider.generate("extract this").await;
        assert!(matches!(result, Err(KeeperError::Model(_))));
    }

    #[tokio::test]
    async fn test_provider_name() {
        let provider = GoogleProvider::with_base_url(
            "fake_api_key".to_string(),
            "http://localhost".to_string(),
            "gemini-test".to_string(),
        );
        assert_eq!(provider.provider_name(), "google");
    }
}
