//! Hosted completion-service client.
//!
//! The orchestrator talks to the model through the `CompletionBackend`
//! trait so tests can script responses instead of making network calls.
//! The production backend targets an OpenAI-compatible chat completions
//! endpoint. No retry and no timeout beyond the client defaults; a failed
//! call fails the request.

use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

const DEFAULT_COMPLETION_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send a system/user prompt pair and return the raw response text.
    async fn complete(&self, system: &str, user: &str, max_tokens: u32) -> Result<String>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

/// Production backend against a hosted chat completions API.
pub struct HostedCompletion {
    client: reqwest::Client,
    url: String,
    model: String,
    api_key: String,
}

impl HostedCompletion {
    pub fn new(url: String, model: String, api_key: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
            model,
            api_key,
        }
    }

    /// Build a client from `MENTIVA_COMPLETION_API_KEY` (required) plus
    /// optional `MENTIVA_COMPLETION_URL` and `MENTIVA_COMPLETION_MODEL`.
    pub fn from_env() -> Result<Self, AppError> {
        let api_key = std::env::var("MENTIVA_COMPLETION_API_KEY")
            .map_err(|_| AppError::UpstreamConfig("MENTIVA_COMPLETION_API_KEY is not set".into()))?;
        let url = std::env::var("MENTIVA_COMPLETION_URL")
            .unwrap_or_else(|_| DEFAULT_COMPLETION_URL.to_string());
        let model = std::env::var("MENTIVA_COMPLETION_MODEL")
            .unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self::new(url, model, api_key))
    }
}

#[async_trait]
impl CompletionBackend for HostedCompletion {
    async fn complete(&self, system: &str, user: &str, max_tokens: u32) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            max_tokens,
        };

        let resp: ChatResponse = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .context("Failed to send completion request")?
            .error_for_status()
            .context("Completion service returned error status")?
            .json()
            .await
            .context("Failed to parse completion response envelope")?;

        resp.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| anyhow!("Completion response contained no message content"))
    }
}

/// Scripted backend for tests: returns canned responses in order, then
/// repeats the last one. Records every prompt it was asked.
pub struct ScriptedCompletion {
    responses: Mutex<Vec<String>>,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedCompletion {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CompletionBackend for ScriptedCompletion {
    async fn complete(&self, _system: &str, user: &str, _max_tokens: u32) -> Result<String> {
        self.prompts
            .lock()
            .map_err(|_| anyhow!("prompt log lock poisoned"))?
            .push(user.to_string());
        let mut responses = self
            .responses
            .lock()
            .map_err(|_| anyhow!("response script lock poisoned"))?;
        if responses.is_empty() {
            return Err(anyhow!("scripted completion has no responses"));
        }
        if responses.len() == 1 {
            Ok(responses[0].clone())
        } else {
            Ok(responses.remove(0))
        }
    }
}
