//! Notification delivery.
//!
//! A [`Notifier`] posts a short text message to a named channel once a
//! pipeline run completes. [`SlackNotifier`] talks to a Slack-style chat
//! API; [`NoopNotifier`] swallows messages for tests and `--no-notify` runs.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use docdraft_shared::{DocDraftError, Result};

/// User-Agent string for API requests.
const USER_AGENT: &str = concat!("DocDraft/", env!("CARGO_PKG_VERSION"));

/// Public chat API base.
const DEFAULT_API_BASE: &str = "https://slack.com/api";

/// Bounded timeout applied to every request.
const REQUEST_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Capability trait
// ---------------------------------------------------------------------------

/// Posts a text message to a named channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn post(&self, channel: &str, text: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Slack-style chat poster
// ---------------------------------------------------------------------------

/// Notifier backed by a Slack-style `chat.postMessage` endpoint.
#[derive(Debug, Clone)]
pub struct SlackNotifier {
    http: reqwest::Client,
    api_base: Url,
    token: String,
}

impl SlackNotifier {
    /// Create a notifier against the public chat API.
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_api_base(DEFAULT_API_BASE, token)
    }

    /// Create a notifier against a specific API base (a mock server in
    /// tests).
    pub fn with_api_base(api_base: &str, token: impl Into<String>) -> Result<Self> {
        let api_base = Url::parse(api_base)
            .map_err(|e| DocDraftError::config(format!("invalid API base '{api_base}': {e}")))?;
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| DocDraftError::upstream(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            api_base,
            token: token.into(),
        })
    }
}

/// Response envelope of `chat.postMessage`. The API reports failures in the
/// body with `ok: false` rather than via HTTP status.
#[derive(Debug, Deserialize)]
struct PostMessageWire {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn post(&self, channel: &str, text: &str) -> Result<()> {
        let endpoint = format!(
            "{}/chat.postMessage",
            self.api_base.as_str().trim_end_matches('/')
        );
        let response = self
            .http
            .post(endpoint)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "channel": channel, "text": text }))
            .send()
            .await
            .map_err(|e| DocDraftError::upstream(format!("POST chat.postMessage: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocDraftError::upstream(format!(
                "POST chat.postMessage: HTTP {status}"
            )));
        }

        let body: PostMessageWire = response.json().await.map_err(|e| {
            DocDraftError::upstream(format!("chat.postMessage: failed to decode response: {e}"))
        })?;
        if !body.ok {
            let reason = body.error.unwrap_or_else(|| "unknown error".to_string());
            return Err(DocDraftError::upstream(format!(
                "notification rejected: {reason}"
            )));
        }

        debug!(channel, "notification posted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// No-op notifier
// ---------------------------------------------------------------------------

/// Notifier that drops every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

#[async_trait]
impl Notifier for NoopNotifier {
    async fn post(&self, channel: &str, text: &str) -> Result<()> {
        debug!(channel, bytes = text.len(), "notification suppressed");
        Ok(())
    }
}
