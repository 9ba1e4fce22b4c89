//! Text generation client
//!
//! Provides:
//! - `GenerationProvider` trait (prompt in, raw text out)
//! - `GeminiClient` over the `generateContent` REST endpoint
//! - Explicit empty-response detection

use crate::config::GenerationConfig;
use crate::errors::{AppError, Result};
use crate::metrics;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Trait for text generation
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Send a single prompt and return the raw response text
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get the model name
    fn model_name(&self) -> &str;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: RequestGenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RequestGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate
    fn into_text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|part| part.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

/// Gemini generation client
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_output_tokens: u32,
}

impl GeminiClient {
    /// Create a new client from explicit configuration
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AppError::Configuration {
                message: "generation.api_key is required".to_string(),
            })?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Internal {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_output_tokens: config.max_output_tokens,
        })
    }

    fn endpoint(&self) -> String {
        let model = self.model.trim_start_matches("models/");
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    async fn make_request(&self, prompt: &str) -> Result<String> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: RequestGenerationConfig {
                temperature: self.temperature,
                max_output_tokens: self.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::GenerationUnavailable {
                status: None,
                message: format!("Request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(200).collect();
            return Err(AppError::GenerationUnavailable {
                status: Some(status.as_u16()),
                message: format!("API error {}: {}", status, excerpt),
            });
        }

        let parsed: GenerateResponse =
            response
                .json()
                .await
                .map_err(|e| AppError::GenerationUnavailable {
                    status: Some(status.as_u16()),
                    message: format!("Failed to parse response: {}", e),
                })?;

        let text = parsed.into_text();
        if text.trim().is_empty() {
            return Err(AppError::EmptyGeneration);
        }

        Ok(text)
    }
}

#[async_trait]
impl GenerationProvider for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let start = Instant::now();
        tracing::debug!(model = %self.model, prompt_chars = prompt.len(), "Sending generation request");

        let result = self.make_request(prompt).await;
        let elapsed = start.elapsed().as_secs_f64();

        match &result {
            Ok(text) => {
                metrics::record_llm_request(elapsed, &self.model, "success");
                tracing::info!(
                    model = %self.model,
                    response_chars = text.len(),
                    elapsed_secs = elapsed,
                    "Generation completed"
                );
            }
            Err(e) => {
                let status = match e {
                    AppError::EmptyGeneration => "empty",
                    _ => "unavailable",
                };
                metrics::record_llm_request(elapsed, &self.model, status);
                tracing::warn!(model = %self.model, error = %e, "Generation failed");
            }
        }

        result
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
