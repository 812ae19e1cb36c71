//! Chat assistant backed by a hosted language model.
//!
//! The provider is picked once at startup from `AI_PROVIDER` and the matching
//! API key, then shared through `AppState`.

use std::time::Duration;

use serde_json::json;

use crate::config::Config;
use crate::error::{AppError, AppResult};

const SYSTEM_PROMPT: &str = "You are Ustawi AI, a compassionate mental health and career \
guidance assistant for young people in Kenya. Respond with empathy and culturally relevant, \
practical advice, in English or Swahili to match the user. Encourage professional help \
when someone may be at risk.";

const MAX_REPLY_TOKENS: u32 = 500;
const FALLBACK_REPLY: &str = "Sorry, I could not generate a response.";

/// Enabled providers share one pooled HTTP client for their lifetime.
#[derive(Debug, Clone)]
pub enum ChatProvider {
    Disabled,
    OpenAi {
        client: reqwest::Client,
        api_key: String,
        model: String,
    },
    Claude {
        client: reqwest::Client,
        api_key: String,
        model: String,
    },
}

impl ChatProvider {
    pub fn from_config(config: &Config) -> Result<Self, anyhow::Error> {
        let provider = match config.ai_provider.to_ascii_lowercase().as_str() {
            "openai" if !config.openai_api_key.is_empty() => ChatProvider::OpenAi {
                client: http_client()?,
                api_key: config.openai_api_key.clone(),
                model: config.openai_model.clone(),
            },
            "claude" | "anthropic" if !config.claude_api_key.is_empty() => ChatProvider::Claude {
                client: http_client()?,
                api_key: config.claude_api_key.clone(),
                model: config.claude_model.clone(),
            },
            other => {
                if other != "none" {
                    tracing::warn!(provider = %other, "Chat provider not configured, assistant disabled");
                }
                ChatProvider::Disabled
            }
        };
        Ok(provider)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChatProvider::Disabled => "none",
            ChatProvider::OpenAi { .. } => "openai",
            ChatProvider::Claude { .. } => "claude",
        }
    }

    pub async fn reply(&self, message: &str) -> AppResult<String> {
        let result = match self {
            ChatProvider::Disabled => {
                return Err(AppError::ServiceUnavailable(
                    "AI service not configured".into(),
                ))
            }
            ChatProvider::OpenAi {
                client,
                api_key,
                model,
            } => call_openai(client, api_key, model, message).await,
            ChatProvider::Claude {
                client,
                api_key,
                model,
            } => call_claude(client, api_key, model, message).await,
        };

        result.map_err(|e| {
            tracing::warn!(provider = self.name(), error = %e, "Chat provider request failed");
            AppError::Internal(e)
        })
    }
}

fn http_client() -> Result<reqwest::Client, anyhow::Error> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?)
}

async fn call_openai(
    client: &reqwest::Client,
    api_key: &str,
    model: &str,
    message: &str,
) -> Result<String, anyhow::Error> {
    let response = client
        .post("https://api.openai.com/v1/chat/completions")
        .bearer_auth(api_key)
        .json(&json!({
            "model": model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": message }
            ],
            "temperature": 0.7,
            "max_tokens": MAX_REPLY_TOKENS
        }))
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("OpenAI API error {}: {}", status, body);
    }

    let body: serde_json::Value = response.json().await?;
    Ok(extract_reply(&body["choices"][0]["message"]["content"]))
}

async fn call_claude(
    client: &reqwest::Client,
    api_key: &str,
    model: &str,
    message: &str,
) -> Result<String, anyhow::Error> {
    let response = client
        .post("https://api.anthropic.com/v1/messages")
        .header("x-api-key", api_key)
        .header("anthropic-version", "2023-06-01")
        .json(&json!({
            "model": model,
            "max_tokens": MAX_REPLY_TOKENS,
            "system": SYSTEM_PROMPT,
            "messages": [{ "role": "user", "content": message }]
        }))
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Claude API error {}: {}", status, body);
    }

    let body: serde_json::Value = response.json().await?;
    Ok(extract_reply(&body["content"][0]["text"]))
}

fn extract_reply(value: &serde_json::Value) -> String {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(FALLBACK_REPLY)
        .to_string()
}
