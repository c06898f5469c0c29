// SPDX-FileCopyrightText: 2026 Lorebase Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-compatible chat completion client.
//!
//! Talks to whatever base URL a model configuration points at; Gemini,
//! OpenAI, and local inference servers all expose this surface.

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use lorebase_core::{LlmSettings, LorebaseError};

/// A completed generation.
#[derive(Debug, Clone)]
pub struct LlmCompletion {
    pub text: String,
    pub tokens_used: i64,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: i64,
}

/// Thin reqwest wrapper around `POST {base}/chat/completions`.
#[derive(Clone)]
pub struct LlmClient {
    http: reqwest::Client,
}

impl Default for LlmClient {
    fn default() -> Self {
        Self::new()
    }
}

impl LlmClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Run one chat completion with a system prompt and user message.
    pub async fn complete(
        &self,
        settings: &LlmSettings,
        system: &str,
        user: &str,
    ) -> Result<LlmCompletion, LorebaseError> {
        let base = settings.api_base_url.trim_end_matches('/');
        if base.is_empty() {
            return Err(LorebaseError::Provider {
                message: format!("model {} has no api_base_url", settings.model_name),
                source: None,
            });
        }
        let url = format!("{base}/chat/completions");
        debug!(model = %settings.model_name, %url, "sending chat completion");

        let body = json!({
            "model": settings.model_name,
            "max_tokens": settings.max_tokens,
            "temperature": settings.temperature,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&settings.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LorebaseError::Provider {
                message: format!("request to {} failed", settings.model_name),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(LorebaseError::Provider {
                message: format!(
                    "{} returned {status}: {}",
                    settings.model_name,
                    detail.chars().take(200).collect::<String>()
                ),
                source: None,
            });
        }

        let parsed: ChatResponse =
            response.json().await.map_err(|e| LorebaseError::Provider {
                message: format!("{} returned an unreadable body", settings.model_name),
                source: Some(Box::new(e)),
            })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LorebaseError::Provider {
                message: format!("{} returned no choices", settings.model_name),
                source: None,
            })?;

        Ok(LlmCompletion {
            text: choice.message.content,
            tokens_used: parsed.usage.map(|u| u.total_tokens).unwrap_or(0),
        })
    }
}
