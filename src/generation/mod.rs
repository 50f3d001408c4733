//! Answer generation
//!
//! The generation service turns a prompt built from retrieved context and the
//! user's question into an answer.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generation client initialization failed: {0}")]
    InitializationError(String),

    #[error("Generation request failed: {0}")]
    Request(String),

    #[error("Malformed generation response: {0}")]
    MalformedResponse(String),
}

/// Trait for text generation backends
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    fn model_name(&self) -> &str;
}

/// Fixed prompt combining retrieved context with the question
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptTemplate;

impl PromptTemplate {
    pub fn render(&self, context: &str, question: &str) -> String {
        format!(
            "Using this data: {}. Respond to this prompt: {}",
            context, question
        )
    }
}

#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: Option<String>,
}

/// Completions from a local Ollama instance (`/api/generate`, non-streaming)
pub struct OllamaGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaGenerator {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::InitializationError(e.to_string()))?;

        tracing::info!("Using Ollama generation model {} at {}", model, base_url);

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl GenerationProvider for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&serde_json::json!({
                "model": self.model,
                "prompt": prompt,
                "stream": false,
            }))
            .send()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::Request(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        parsed
            .response
            .ok_or_else(|| GenerationError::MalformedResponse("Missing 'response' field".to_string()))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_template() {
        let prompt = PromptTemplate.render("Alpha fact.", "What is the alpha fact?");
        assert_eq!(
            prompt,
            "Using this data: Alpha fact.. Respond to this prompt: What is the alpha fact?"
        );
    }

    #[test]
    fn test_response_parsing() {
        let parsed: OllamaGenerateResponse =
            serde_json::from_str(r#"{"model": "m", "response": "42", "done": true}"#).unwrap();
        assert_eq!(parsed.response.as_deref(), Some("42"));

        let parsed: OllamaGenerateResponse = serde_json::from_str(r#"{"error": "x"}"#).unwrap();
        assert!(parsed.response.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let generator =
            OllamaGenerator::new("http://127.0.0.1:9/", "m", Duration::from_millis(500)).unwrap();
        assert_eq!(generator.model_name(), "m");
        let result = generator.generate("hello").await;
        assert!(matches!(result, Err(GenerationError::Request(_))));
    }
}
