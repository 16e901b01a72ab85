//! Generation backends.
//!
//! `HttpGenerator` calls an OpenAI-compatible `/chat/completions`
//! endpoint (non-streaming). `CannedGenerator` is the offline stand-in
//! used when no endpoint is configured.

use async_trait::async_trait;
use serde_json::json;

use podium_core::{Error, GenerationConfig, Result};

/// Trait for generative-model backends.
#[async_trait]
pub trait GeneratorBackend: Send + Sync {
    /// Generate a completion for a fully assembled prompt.
    async fn generate(&self, system: &str, prompt: &str) -> Result<String>;

    /// Model identifier.
    fn model(&self) -> &str;
}

/// Generator backed by an OpenAI-compatible chat completions endpoint.
pub struct HttpGenerator {
    client: reqwest::Client,
    config: GenerationConfig,
}

impl HttpGenerator {
    pub fn new(config: GenerationConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()
            .unwrap_or_default();
        Self { client, config }
    }
}

#[async_trait]
impl GeneratorBackend for HttpGenerator {
    async fn generate(&self, system: &str, prompt: &str) -> Result<String> {
        let endpoint = self
            .config
            .endpoint
            .as_deref()
            .ok_or_else(|| Error::Config("HttpGenerator requires an endpoint".into()))?;

        let body = json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": prompt},
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
        });

        let mut request = self.client.post(endpoint).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::GenerationUnavailable(format!("request failed: {e}")))?;
        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(Error::GenerationUnavailable(format!(
                "API error {status}: {text}"
            )));
        }

        let parsed: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::GenerationUnavailable(format!("bad response body: {e}")))?;
        parsed["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::GenerationUnavailable("response has no content".into()))
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

/// Offline generator that produces a fixed reply.
pub struct CannedGenerator {
    reply: String,
}

impl CannedGenerator {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl Default for CannedGenerator {
    fn default() -> Self {
        Self::new("(offline mode) See the cited passages for the relevant content.")
    }
}

#[async_trait]
impl GeneratorBackend for CannedGenerator {
    async fn generate(&self, _system: &str, _prompt: &str) -> Result<String> {
        Ok(self.reply.clone())
    }

    fn model(&self) -> &str {
        "canned"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_canned_generator_replies() {
        let generator = CannedGenerator::new("fixed answer");
        let out = generator.generate("system", "prompt").await.unwrap();
        assert_eq!(out, "fixed answer");
    }
}
