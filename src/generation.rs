//! Generation service abstraction.
//!
//! The generative model is an opaque text-completion service: one call,
//! `generate(prompt) -> answer`. The HTTP implementation targets an
//! OpenAI-compatible chat-completions endpoint; the prompt carries all
//! retrieved context, so no conversation state is sent.
//!
//! Unlike the embedding adapter, there is no retry loop here: a failed or
//! timed-out completion is surfaced to the caller as that call's failure.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::config::GenerationConfig;

/// Opaque text-completion capability.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Returns the model identifier (e.g. `"gpt-4o-mini"`).
    fn model_name(&self) -> &str;

    /// Produce a completion for the assembled prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Generation provider calling `POST {base_url}/chat/completions`.
/// Requires the `OPENAI_API_KEY` environment variable.
pub struct HttpGenerator {
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl HttpGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let model = config
            .model
            .clone()
            .ok_or_else(|| anyhow::anyhow!("generation.model required for openai provider"))?;

        if std::env::var("OPENAI_API_KEY").is_err() {
            bail!("OPENAI_API_KEY environment variable not set");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            model,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| anyhow::anyhow!("OPENAI_API_KEY not set"))?;

        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("generation API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        parse_completion_response(&json)
    }
}

/// Extract `choices[0].message.content` from a chat-completions response.
fn parse_completion_response(json: &serde_json::Value) -> Result<String> {
    json.get("choices")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(|c| c.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| {
            anyhow::anyhow!("invalid generation response: missing choices[0].message.content")
        })
}

/// Create the configured [`Generator`].
pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn Generator>> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(HttpGenerator::new(config)?)),
        "disabled" => {
            bail!("Generation provider is disabled. Set [generation] provider in config.")
        }
        other => bail!("Unknown generation provider: {}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_completion_response() {
        let json = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "An answer." } }]
        });
        assert_eq!(parse_completion_response(&json).unwrap(), "An answer.");
    }

    #[test]
    fn test_parse_completion_response_missing_content() {
        let json = serde_json::json!({ "choices": [] });
        assert!(parse_completion_response(&json).is_err());
    }
}
