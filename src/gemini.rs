//! Gemini API client backing the agent's capabilities
//!
//! One long-lived reqwest::Client is shared by the classifier, relevance and
//! advice calls for connection pooling.

use crate::capability::{AdviceGenerator, CanonicalClassifier, RelevanceClassifier};
use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const API_KEY_HEADER: &str = "x-goog-api-key";

const CLASSIFIER_INSTRUCTION: &str =
    "You're an assistant that helps map user questions to canonical questions.";

const RELEVANCE_INSTRUCTION: &str =
    "You are an expert at categorizing questions into financial and non-financial topics.";

const ADVISOR_INSTRUCTION: &str =
    "You are a helpful financial advisor providing educational information about personal finance topics.";

/// Sampling settings for a single call
#[derive(Debug, Clone, Copy)]
pub struct GenerationOptions {
    pub temperature: f32,
    pub max_output_tokens: Option<u32>,
}

impl GenerationOptions {
    pub const CLASSIFY: Self = Self {
        temperature: 0.2,
        max_output_tokens: None,
    };

    pub const RELEVANCE: Self = Self {
        temperature: 0.1,
        max_output_tokens: None,
    };

    pub fn advice(max_output_tokens: u32) -> Self {
        Self {
            temperature: 0.3,
            max_output_tokens: Some(max_output_tokens),
        }
    }
}

/// Reusable Gemini client (connection-pooled)
pub struct GeminiClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl GeminiClient {
    pub fn new(config: &AgentConfig) -> Result<Self> {
        Self::with_base_url(config, GEMINI_BASE_URL)
    }

    /// Same as `new`, against a different models endpoint
    pub fn with_base_url(config: &AgentConfig, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            endpoint: format!(
                "{}/{}:generateContent",
                base_url.trim_end_matches('/'),
                config.model
            ),
        })
    }

    /// Single-turn generation with a system instruction
    pub async fn generate(
        &self,
        system_instruction: &str,
        prompt: &str,
        options: GenerationOptions,
    ) -> Result<String> {
        let request = GeminiRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: options.temperature,
                max_output_tokens: options.max_output_tokens,
            },
            system_instruction: SystemInstruction {
                parts: vec![Part {
                    text: system_instruction.to_string(),
                }],
            },
        };

        debug!(temperature = options.temperature, "Calling Gemini API");

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                // URLs stay out of logs and error text
                let e = e.without_url();
                error!("Gemini API request failed: {}", e);
                AgentError::LlmError(format!("Gemini API error: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Gemini API error response: {}", error_text);
            return Err(AgentError::LlmError(format!(
                "Gemini API returned {}: {}",
                status, error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            let e = e.without_url();
            error!("Failed to parse Gemini response: {}", e);
            AgentError::LlmError(format!("Gemini parse error: {}", e))
        })?;

        extract_text(gemini_response)
    }
}

#[async_trait]
impl CanonicalClassifier for GeminiClient {
    async fn classify_canonical_question(&self, prompt: &str) -> Result<String> {
        self.generate(CLASSIFIER_INSTRUCTION, prompt, GenerationOptions::CLASSIFY)
            .await
    }
}

#[async_trait]
impl RelevanceClassifier for GeminiClient {
    async fn classify_relevance(&self, question: &str) -> Result<String> {
        self.generate(
            RELEVANCE_INSTRUCTION,
            &build_relevance_prompt(question),
            GenerationOptions::RELEVANCE,
        )
        .await
    }
}

#[async_trait]
impl AdviceGenerator for GeminiClient {
    async fn generate_advice(&self, question: &str, max_output_tokens: u32) -> Result<String> {
        self.generate(
            ADVISOR_INSTRUCTION,
            &build_advice_prompt(question),
            GenerationOptions::advice(max_output_tokens),
        )
        .await
    }
}

fn build_relevance_prompt(question: &str) -> String {
    format!(
        r#"Determine if the following question is related to personal finance, investing, banking, loans, mortgages, insurance, budgeting, savings, retirement planning, taxes, or any other financial topics.

Question: "{}"

Respond with only "YES" if it's financial-related, or "NO" if it's not financial-related."#,
        question
    )
}

fn build_advice_prompt(question: &str) -> String {
    format!(
        r#"You are a knowledgeable financial advisor. Please provide helpful, accurate, and responsible financial advice for the following question.

Important guidelines:
- Provide general educational information, not personalized investment advice
- Suggest consulting with qualified financial professionals for specific situations
- Be clear about risks and limitations
- Keep responses concise but informative

Question: {}"#,
        question
    )
}

fn extract_text(response: GeminiResponse) -> Result<String> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content.parts.into_iter().next())
        .map(|part| part.text)
        .ok_or_else(|| AgentError::LlmError("Empty response from Gemini".to_string()))
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    system_instruction: SystemInstruction,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}
