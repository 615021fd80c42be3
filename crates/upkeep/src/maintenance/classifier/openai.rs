//! Chat-completions backend for the classifier.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ClassifierConfig;

use super::{CompletionBackend, CompletionError};

// Classification wants low-variance output, not creative generation.
const TEMPERATURE: f32 = 0.3;
const MAX_TOKENS: u32 = 500;

/// OpenAI-compatible chat-completions client. One best-effort attempt per
/// classification; retry policy is deliberately absent.
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    model: String,
}

impl OpenAiBackend {
    pub fn from_config(config: &ClassifierConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn complete(&self, system: &str, user: &str) -> Result<String, CompletionError> {
        let api_key = self.api_key.as_ref().ok_or(CompletionError::Credentials)?;

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&request)
            .send()
            .await
            .map_err(|err| CompletionError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompletionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let payload: ChatResponse = response
            .json()
            .await
            .map_err(|err| CompletionError::Transport(err.to_string()))?;

        let content = payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(CompletionError::Empty);
        }

        Ok(content)
    }
}
