// src/ai/client.rs
//
// Minimal client for an OpenAI-compatible chat-completions endpoint (Groq in
// production). One user message per call, no retries: a failed or timed-out
// call is reported once and the adapters decide what to do with it.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};

use crate::config::Config;

use super::TextGenerator;

/// A single generation attempt failed. Timeouts surface as `Request`.
#[derive(Debug)]
pub enum GenerationError {
    /// Transport-level failure (connect, timeout, body read).
    Request(String),
    /// Non-2xx reply from the provider.
    Api { status: u16, message: String },
    /// 2xx reply with no usable text in it.
    EmptyReply,
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Request(msg) => write!(f, "request failed: {}", msg),
            GenerationError::Api { status, message } => {
                write!(f, "provider returned HTTP {}: {}", status, message)
            }
            GenerationError::EmptyReply => write!(f, "provider returned an empty reply"),
        }
    }
}

impl std::error::Error for GenerationError {}

#[derive(Clone)]
pub struct GroqClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GroqClient {
    pub fn new(config: &Config) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.generation_timeout_secs))
            .build()
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        Ok(Self {
            client,
            api_key: config.groq_api_key.clone(),
            base_url: config.groq_base_url.clone(),
            model: config.groq_model.clone(),
        })
    }
}

#[async_trait]
impl TextGenerator for GroqClient {
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GenerationError> {
        let url = format!("{}/chat/completions", self.base_url);
        let req = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessageReq {
                role: "user".into(),
                content: prompt.into(),
            }],
            max_tokens,
            temperature,
        };

        let res = self
            .client
            .post(&url)
            .header(USER_AGENT, "curriforge-backend/0.1")
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&req)
            .send()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            let message = extract_provider_error(&body).unwrap_or(body);
            return Err(GenerationError::Api { status, message });
        }

        let body: ChatCompletionResponse = res
            .json()
            .await
            .map_err(|e| GenerationError::Request(e.to_string()))?;

        if let Some(usage) = &body.usage {
            tracing::info!(
                prompt_tokens = ?usage.prompt_tokens,
                completion_tokens = ?usage.completion_tokens,
                "generation usage"
            );
        }

        let text = body
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .map(|t| t.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(GenerationError::EmptyReply);
        }

        Ok(text)
    }
}

// --- Wire DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessageReq>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessageReq {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResp,
}

#[derive(Deserialize)]
struct ChatMessageResp {
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: Option<u32>,
    #[serde(default)]
    completion_tokens: Option<u32>,
}

/// Pulls a clean message out of a provider error body, if it has one.
fn extract_provider_error(body: &str) -> Option<String> {
    #[derive(Deserialize)]
    struct Wrap {
        error: Obj,
    }
    #[derive(Deserialize)]
    struct Obj {
        message: String,
    }
    serde_json::from_str::<Wrap>(body)
        .ok()
        .map(|w| w.error.message)
}
