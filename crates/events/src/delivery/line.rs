//! LINE messenger push delivery with exponential-backoff retry.
//!
//! [`LinePushDelivery`] posts a text message to the LINE Messaging API push
//! endpoint. Transient failures (network errors, 429, 5xx) are retried up to
//! three times with backoff of 1 s, 2 s and 4 s; other 4xx responses fail
//! immediately.

use std::time::Duration;

/// Retry delays in seconds (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default push endpoint of the LINE Messaging API.
pub const DEFAULT_PUSH_URL: &str = "https://api.line.me/v2/bot/message/push";

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Where and how to push LINE messages.
#[derive(Debug, Clone)]
pub struct LineConfig {
    pub push_url: String,
    pub channel_access_token: String,
}

impl LineConfig {
    /// Load from the environment.
    ///
    /// | Env Var                     | Default                                   |
    /// |-----------------------------|-------------------------------------------|
    /// | `LINE_PUSH_URL`             | `https://api.line.me/v2/bot/message/push` |
    /// | `LINE_CHANNEL_ACCESS_TOKEN` | unset: LINE delivery disabled             |
    pub fn from_env() -> Option<Self> {
        let channel_access_token = std::env::var("LINE_CHANNEL_ACCESS_TOKEN")
            .ok()
            .filter(|t| !t.trim().is_empty())?;
        let push_url = std::env::var("LINE_PUSH_URL").unwrap_or_else(|_| DEFAULT_PUSH_URL.into());
        Some(Self {
            push_url,
            channel_access_token,
        })
    }
}

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for LINE push failures.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The push endpoint returned a non-2xx status code.
    #[error("LINE push returned HTTP {0}")]
    HttpStatus(u16),
}

impl PushError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            PushError::Request(_) => true,
            PushError::HttpStatus(status) => *status == 429 || *status >= 500,
        }
    }
}

// ---------------------------------------------------------------------------
// LinePushDelivery
// ---------------------------------------------------------------------------

/// Pushes text messages to LINE users.
pub struct LinePushDelivery {
    client: reqwest::Client,
    config: LineConfig,
}

impl LinePushDelivery {
    /// Create a delivery service with a pre-configured HTTP client.
    pub fn new(config: LineConfig) -> Result<Self, PushError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    /// Push `subject` and `body` to the LINE user `to`, retrying transient
    /// failures. Returns `Ok(())` on the first successful attempt.
    pub async fn push(&self, to: &str, subject: &str, body: &str) -> Result<(), PushError> {
        let payload = message_payload(to, subject, body);

        for (attempt, delay_secs) in RETRY_DELAYS_SECS.iter().enumerate() {
            match self.try_send(&payload).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        error = %e,
                        "LINE push attempt failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_secs(*delay_secs)).await;
                }
                Err(e) => {
                    tracing::error!(error = %e, "LINE push rejected");
                    return Err(e);
                }
            }
        }

        // Final attempt after the last backoff.
        self.try_send(&payload).await.inspect_err(|e| {
            tracing::error!(error = %e, "LINE push failed after all retries");
        })
    }

    /// Execute a single POST request and check the response status.
    async fn try_send(&self, payload: &serde_json::Value) -> Result<(), PushError> {
        let response = self
            .client
            .post(&self.config.push_url)
            .bearer_auth(&self.config.channel_access_token)
            .json(payload)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PushError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

/// Request body for the push endpoint: one text message.
fn message_payload(to: &str, subject: &str, body: &str) -> serde_json::Value {
    serde_json::json!({
        "to": to,
        "messages": [
            { "type": "text", "text": format!("{subject}\n{body}") }
        ],
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
