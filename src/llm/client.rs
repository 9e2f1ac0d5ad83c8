//! Gemini `generateContent` client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use super::TextGenerator;
use crate::config::AppConfig;
use crate::errors::ChatRagError;
use crate::errors::Result;

const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 2048;

/// Client for the hosted generative model
#[derive(Clone)]
pub struct LlmService {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    temperature: f32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
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
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

impl LlmService {
    /// Create a new LLM service from application config
    pub fn new(config: &AppConfig) -> Result<Self> {
        if config.gemini_api_key().is_empty() {
            return Err(ChatRagError::ConfigError(
                "gemini.api_key is not set (or GEMINI_API_KEY)".to_string(),
            ));
        }

        Self::with_endpoint(
            config.gemini.endpoint.clone(),
            config.generation_model().to_string(),
            config.gemini_api_key().to_string(),
            config.rag.temperature,
            Duration::from_secs(config.gemini.timeout_secs),
        )
    }

    /// Create a client against an explicit endpoint
    pub fn with_endpoint(
        endpoint: String,
        model: String,
        api_key: String,
        temperature: f32,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatRagError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model,
            api_key,
            temperature,
        })
    }

    /// Generate text with explicit sampling parameters
    pub async fn generate_with_params(
        &self,
        prompt: &str,
        temperature: f32,
        max_output_tokens: u32,
    ) -> Result<String> {
        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        debug!("Calling Gemini generateContent: model={}", self.model);

        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature,
                max_output_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ChatRagError::LlmError(format!(
                "Gemini API error ({status}): {error_text}"
            )));
        }

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| ChatRagError::LlmError(format!("Failed to parse response: {e}")))?;

        extract_text(result)
    }
}

fn extract_text(response: GenerateResponse) -> Result<String> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ChatRagError::LlmError(format!("Prompt blocked: {reason}")));
    }

    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|content| content.parts.into_iter().filter_map(|p| p.text).collect())
        .ok_or_else(|| ChatRagError::LlmError("No candidates in response".to_string()))?;

    let text = text.trim();
    if text.is_empty() {
        return Err(ChatRagError::LlmError("Empty completion".to_string()));
    }
    Ok(text.to_string())
}

#[async_trait]
impl TextGenerator for LlmService {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.generate_with_params(prompt, self.temperature, DEFAULT_MAX_OUTPUT_TOKENS)
            .await
    }
}
