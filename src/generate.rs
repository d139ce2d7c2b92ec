//! Text-generation provider abstraction and implementations.
//!
//! Defines the [`Generator`] trait and concrete implementations:
//! - **[`DisabledGenerator`]** — returns errors; used when generation is not configured.
//! - **[`GoogleAiGenerator`]** — calls the Google AI Studio `generateContent` endpoint.
//! - **[`OllamaGenerator`]** — calls a local Ollama instance's `/api/generate` endpoint.
//!
//! Each call is a single synchronous round trip bounded by the configured
//! timeout. No retries are performed: a failed call surfaces immediately as
//! a [`GenerationError`] so the caller can report it.

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;

use crate::config::GenerationConfig;
use crate::error::GenerationError;

/// Narrow capability interface over an external text-generation service.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Returns the model identifier (e.g. `"gemini-1.5-flash-latest"`).
    fn model_name(&self) -> &str;

    /// Produce a completion for `prompt`. Single round trip, may fail.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Create the appropriate [`Generator`] based on configuration.
///
/// # Supported Providers
///
/// | Config value | Provider |
/// |--------------|----------|
/// | `"gemini"` | [`GoogleAiGenerator`] |
/// | `"ollama"` | [`OllamaGenerator`] |
/// | `"disabled"` | [`DisabledGenerator`] |
///
/// # Errors
///
/// Returns an error for unknown provider names or when the provider cannot
/// be initialized (e.g. a missing API key).
pub fn create_generator(config: &GenerationConfig) -> Result<Box<dyn Generator>> {
    match config.provider.as_str() {
        "disabled" => Ok(Box::new(DisabledGenerator)),
        "gemini" => Ok(Box::new(GoogleAiGenerator::new(config)?)),
        "ollama" => Ok(Box::new(OllamaGenerator::new(config)?)),
        other => bail!("Unknown generation provider: {}", other),
    }
}

// ============ Disabled Generator ============

/// A no-op generator that always returns errors.
///
/// Used when `generation.provider = "disabled"` in the configuration.
pub struct DisabledGenerator;

#[async_trait]
impl Generator for DisabledGenerator {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Err(GenerationError::Failed(
            "generation provider is disabled".to_string(),
        ))
    }
}

// ============ Google AI Studio Generator ============

/// Generator using the Google AI Studio `generateContent` API.
///
/// Requires the `GOOGLE_AI_API_KEY` environment variable to be set.
pub struct GoogleAiGenerator {
    model: String,
    api_key: String,
    timeout: Duration,
    temperature: f64,
    max_output_tokens: u32,
}

impl GoogleAiGenerator {
    /// Create a new Google AI generator from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `GOOGLE_AI_API_KEY` is not in the environment.
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = std::env::var("GOOGLE_AI_API_KEY")
            .map_err(|_| anyhow::anyhow!("GOOGLE_AI_API_KEY environment variable not set"))?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            timeout: Duration::from_secs(config.timeout_secs),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }
}

#[async_trait]
impl Generator for GoogleAiGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let body = serde_json::json!({
            "contents": [
                { "parts": [ { "text": prompt } ] }
            ],
            "generationConfig": {
                "temperature": self.temperature,
                "topK": 1,
                "topP": 1,
                "maxOutputTokens": self.max_output_tokens,
            }
        });

        let response = client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(GenerationError::Transport(format!(
                "HTTP {}: {}",
                status, body_text
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        parse_google_response(&json)
    }
}

/// Extract the generated text from a `generateContent` response.
fn parse_google_response(json: &serde_json::Value) -> Result<String, GenerationError> {
    json.get("candidates")
        .and_then(|c| c.as_array())
        .and_then(|c| c.first())
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .and_then(|p| p.first())
        .and_then(|p| p.get("text"))
        .and_then(|t| t.as_str())
        .map(|t| t.to_string())
        .ok_or_else(|| {
            GenerationError::MalformedResponse(
                "missing candidates[0].content.parts[0].text".to_string(),
            )
        })
}

// ============ Ollama Generator ============

/// Generator using a local Ollama instance.
///
/// Calls `POST /api/generate` on the configured URL
/// (default: `http://localhost:11434`).
pub struct OllamaGenerator {
    model: String,
    url: String,
    timeout: Duration,
}

impl OllamaGenerator {
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let url = config
            .url
            .clone()
            .unwrap_or_else(|| "http://localhost:11434".to_string());

        Ok(Self {
            model: config.model.clone(),
            url,
            timeout: Duration::from_secs(config.timeout_secs),
        })
    }
}

#[async_trait]
impl Generator for OllamaGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });

        let response = client
            .post(format!("{}/api/generate", self.url))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                GenerationError::Transport(format!(
                    "Ollama connection error (is Ollama running at {}?): {}",
                    self.url, e
                ))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(GenerationError::Transport(format!(
                "HTTP {}: {}",
                status, body_text
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GenerationError::MalformedResponse(e.to_string()))?;

        parse_ollama_response(&json)
    }
}

fn parse_ollama_response(json: &serde_json::Value) -> Result<String, GenerationError> {
    json.get("response")
        .and_then(|r| r.as_str())
        .map(|r| r.to_string())
        .ok_or_else(|| GenerationError::MalformedResponse("missing response field".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_google_response_valid() {
        let json = serde_json::json!({
            "candidates": [
                {
                    "content": {
                        "parts": [ { "text": "Grounded answer." } ]
                    }
                }
            ]
        });
        assert_eq!(parse_google_response(&json).unwrap(), "Grounded answer.");
    }

    #[test]
    fn test_parse_google_response_no_candidates() {
        let json = serde_json::json!({ "candidates": [] });
        let err = parse_google_response(&json).unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_google_response_missing_parts() {
        let json = serde_json::json!({
            "candidates": [ { "content": {} } ]
        });
        let err = parse_google_response(&json).unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_ollama_response_valid() {
        let json = serde_json::json!({ "response": "Local answer." });
        assert_eq!(parse_ollama_response(&json).unwrap(), "Local answer.");
    }

    #[test]
    fn test_parse_ollama_response_missing_field() {
        let json = serde_json::json!({ "done": true });
        let err = parse_ollama_response(&json).unwrap_err();
        assert!(matches!(err, GenerationError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_disabled_generator_errors() {
        let gen = DisabledGenerator;
        let err = gen.generate("anything").await.unwrap_err();
        assert!(matches!(err, GenerationError::Failed(_)));
    }

    #[test]
    fn test_create_generator_unknown_provider() {
        let config = GenerationConfig {
            provider: "carrier-pigeon".to_string(),
            ..GenerationConfig::default()
        };
        assert!(create_generator(&config).is_err());
    }

    #[test]
    fn test_create_generator_disabled() {
        let config = GenerationConfig {
            provider: "disabled".to_string(),
            ..GenerationConfig::default()
        };
        let gen = create_generator(&config).unwrap();
        assert_eq!(gen.model_name(), "disabled");
    }
}
