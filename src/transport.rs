use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::config::Config;
use crate::events::HistoryEntry;

/// Body of a conversation exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<HistoryEntry>,
}

/// The bot's reply text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotReply {
    pub text: String,
}

/// Successful response from the conversation endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub bot: BotReply,
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to conversation endpoint failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("conversation endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response from conversation endpoint: {0}")]
    Decode(#[from] serde_json::Error),
}

/// One request/response exchange with the bot backend.
///
/// Implementations perform no retries; the session controller decides what a
/// failure means to the user.
#[async_trait]
pub trait ConversationTransport: Send + Sync {
    async fn exchange(&self, request: &ChatRequest) -> Result<ChatResponse, TransportError>;
}

/// HTTP client for the bot's chat endpoint
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(endpoint: Url, timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self { client, endpoint })
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let endpoint = config.endpoint_url()?;
        let timeout = config.request_timeout_secs.map(Duration::from_secs);
        Ok(Self::new(endpoint, timeout)?)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ConversationTransport for HttpTransport {
    async fn exchange(&self, request: &ChatRequest) -> Result<ChatResponse, TransportError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            history_len = request.history.len(),
            "sending message"
        );

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        // Decode separately so a bad body surfaces as Decode, not Network.
        let bytes = response.bytes().await?;
        let parsed = serde_json::from_slice::<ChatResponse>(&bytes)?;
        Ok(parsed)
    }
}
