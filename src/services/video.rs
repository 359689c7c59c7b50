use std::time::Duration;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde_json::{json, Value};

use crate::core::config::Settings;

pub(crate) const DEFAULT_VOICE_ID: &str = "en-US-JennyNeural";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum VideoTaskStatus {
    /// Still generating; carries the provider's status label for display.
    Pending(String),
    /// Generation finished; carries the result URL.
    Done(String),
    Failed,
}

#[derive(Debug, Clone)]
pub(crate) struct VideoService {
    client: Client,
    auth_header: String,
    base_url: String,
    poll_interval: Duration,
    max_session_polls: u32,
}

impl VideoService {
    pub(crate) fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout = Duration::from_secs(settings.video().timeout_seconds);
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(20))
            .timeout(timeout)
            .build()
            .context("Failed to build video HTTP client")?;

        Ok(Self {
            client,
            auth_header: basic_auth_value(&settings.video().api_key),
            base_url: settings.video().base_url.trim_end_matches('/').to_string(),
            poll_interval: Duration::from_secs(settings.video().poll_interval_seconds),
            max_session_polls: settings.video().max_session_polls,
        })
    }

    pub(crate) fn poll_interval_seconds(&self) -> u64 {
        self.poll_interval.as_secs()
    }

    pub(crate) fn max_session_polls(&self) -> u32 {
        self.max_session_polls
    }

    /// Submit a talking-avatar generation task; returns the provider task id.
    pub(crate) async fn create_talk(
        &self,
        image_url: &str,
        script: &str,
        voice_id: &str,
    ) -> Result<String> {
        let payload = json!({
            "source_url": image_url,
            "script": {
                "type": "text",
                "input": script,
                "provider": {
                    "type": "microsoft",
                    "voice_id": voice_id
                }
            }
        });

        let response = self
            .client
            .post(&self.base_url)
            .header("Authorization", &self.auth_header)
            .json(&payload)
            .send()
            .await
            .context("Failed to call video provider")?;

        let status = response.status();
        let body: Value =
            response.json().await.context("Failed to read video provider response")?;

        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "Video task creation failed (status {}): {}",
                status,
                extract_error_message(&body)
            ));
        }

        body.get("id")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .context("Video provider response missing task id")
    }

    /// Single status poll. The caller decides whether and when to re-poll;
    /// the student session enforces the per-session poll cap.
    pub(crate) async fn fetch_status(&self, task_id: &str) -> Result<VideoTaskStatus> {
        let url = format!("{}/{}", self.base_url, task_id);
        let response = self
            .client
            .get(&url)
            .header("Authorization", &self.auth_header)
            .send()
            .await
            .context("Failed to call video status endpoint")?;

        let status = response.status();
        let body: Value =
            response.json().await.context("Failed to read video status response")?;

        if !status.is_success() {
            return Err(anyhow::anyhow!(
                "Video status check failed (status {}): {}",
                status,
                extract_error_message(&body)
            ));
        }

        let label = body
            .get("status")
            .and_then(Value::as_str)
            .map(|value| value.to_ascii_lowercase())
            .unwrap_or_else(|| "unknown".to_string());

        match label.as_str() {
            "done" => {
                let result_url = body
                    .get("result_url")
                    .and_then(Value::as_str)
                    .context("Video status 'done' missing result_url")?;
                Ok(VideoTaskStatus::Done(result_url.to_string()))
            }
            "error" | "rejected" => Ok(VideoTaskStatus::Failed),
            other => Ok(VideoTaskStatus::Pending(other.to_string())),
        }
    }
}

fn basic_auth_value(api_key: &str) -> String {
    format!("Basic {}", STANDARD.encode(api_key.as_bytes()))
}

fn extract_error_message(payload: &Value) -> String {
    payload
        .get("description")
        .and_then(Value::as_str)
        .or_else(|| payload.get("message").and_then(Value::as_str))
        .or_else(|| payload.get("error").and_then(Value::as_str))
        .unwrap_or("unknown_error")
        .to_string()
}
