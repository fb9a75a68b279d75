//! Client for the OpenAI-compatible chat-completion endpoint and the cached
//! status probe built on top of it.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::Config;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Single text-generation capability shared by the analyzer, coach and chat.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, system_prompt: &str) -> anyhow::Result<String>;

    /// Cheap reachability check. The default sends a one-word prompt.
    async fn probe(&self) -> ProbeResult {
        match self.generate("Hello", "You are a helpful assistant.").await {
            Ok(_) => ProbeResult::Online { response_code: None },
            Err(e) => ProbeResult::Unreachable(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeResult {
    Online { response_code: Option<u16> },
    Rejected { response_code: u16 },
    Unreachable(String),
}

pub struct ChatCompletionClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl ChatCompletionClient {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.ai_timeout())
            .build()?;

        Ok(Self {
            http,
            api_url: config.ai_api_url.clone(),
            api_key: config.ai_api_key.clone(),
            model: config.ai_model.clone(),
        })
    }

    fn request_body(&self, prompt: &str, system_prompt: &str, max_tokens: u32) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": prompt }
            ],
            "temperature": 0.3,
            "max_tokens": max_tokens
        })
    }
}

#[async_trait]
impl TextGenerator for ChatCompletionClient {
    async fn generate(&self, prompt: &str, system_prompt: &str) -> anyhow::Result<String> {
        tracing::debug!(model = %self.model, "Sending chat-completion request");

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(prompt, system_prompt, 500))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("AI API error {}: {}", status, body);
        }

        let body: Value = response.json().await?;
        reply_text(&body)
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("AI API response had no message content"))
    }

    async fn probe(&self) -> ProbeResult {
        let result = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .timeout(PROBE_TIMEOUT)
            .json(&self.request_body("Hello", "You are a helpful assistant.", 5))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => ProbeResult::Online {
                response_code: Some(response.status().as_u16()),
            },
            Ok(response) => ProbeResult::Rejected {
                response_code: response.status().as_u16(),
            },
            Err(e) => ProbeResult::Unreachable(e.to_string()),
        }
    }
}

/// `choices[0].message.content` of a chat-completion reply.
fn reply_text(body: &Value) -> Option<&str> {
    body["choices"][0]["message"]["content"].as_str()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AiStatus {
    Online,
    Offline,
    Disabled,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiStatusSnapshot {
    pub status: AiStatus,
    pub message: String,
    pub is_available: bool,
    pub checked_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub cached_result: bool,
}

impl AiStatusSnapshot {
    fn disabled(now: DateTime<Utc>) -> Self {
        Self {
            status: AiStatus::Disabled,
            message: "AI features are disabled in configuration".into(),
            is_available: false,
            checked_at: now,
            response_code: None,
            error: None,
            cached_result: false,
        }
    }

    fn from_probe(result: ProbeResult, now: DateTime<Utc>) -> Self {
        let (status, message, response_code, error) = match result {
            ProbeResult::Online { response_code } => (
                AiStatus::Online,
                "AI service is online and responding".to_string(),
                response_code,
                None,
            ),
            ProbeResult::Rejected { response_code } => (
                AiStatus::Offline,
                format!("AI service returned error: {}", response_code),
                Some(response_code),
                None,
            ),
            ProbeResult::Unreachable(e) => (
                AiStatus::Offline,
                format!("AI service is unreachable: {}", e),
                None,
                Some(e),
            ),
        };

        Self {
            status,
            message,
            is_available: status == AiStatus::Online,
            checked_at: now,
            response_code,
            error,
            cached_result: false,
        }
    }
}

/// Returns `previous` (flagged as cached) while it is younger than `ttl`,
/// otherwise probes the generator. `None` generator means AI is disabled.
pub async fn check_status(
    generator: Option<&dyn TextGenerator>,
    previous: Option<&AiStatusSnapshot>,
    ttl: Duration,
    now: DateTime<Utc>,
) -> AiStatusSnapshot {
    let Some(generator) = generator else {
        return AiStatusSnapshot::disabled(now);
    };

    if let Some(previous) = previous {
        let age = now.signed_duration_since(previous.checked_at);
        let fresh = age
            .to_std()
            .map(|age| age < ttl)
            .unwrap_or(true);
        if previous.status != AiStatus::Disabled && fresh {
            return AiStatusSnapshot {
                cached_result: true,
                ..previous.clone()
            };
        }
    }

    let result = match tokio::time::timeout(PROBE_TIMEOUT, generator.probe()).await {
        Ok(result) => result,
        Err(_) => ProbeResult::Unreachable("status check timed out".into()),
    };

    if let ProbeResult::Unreachable(e) = &result {
        tracing::warn!(error = %e, "AI service status check failed");
    }

    AiStatusSnapshot::from_probe(result, now)
}
