use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::state::FALLBACK_REPLY;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/api/chatbot/query";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChatQuery<'a> {
    question: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<&'a str>,
}

/// Body returned by the query endpoint.
///
/// Only `message` is shown to the user. The backend also sends `type`, `data`,
/// `success` and `errorMessage`; the scalar ones are kept for logging and the
/// rest is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub success: Option<bool>,
    pub error_message: Option<String>,
}

impl ChatReply {
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Text to show for this reply. An empty `message` counts as missing.
    pub fn text(&self) -> &str {
        self.message
            .as_deref()
            .filter(|m| !m.is_empty())
            .unwrap_or(FALLBACK_REPLY)
    }
}

/// Anything that can answer a question on behalf of the bot.
#[async_trait]
pub trait ChatBackend: Send + Sync + 'static {
    async fn ask(&self, question: &str) -> Result<ChatReply>;
}

/// HTTP client for the chatbot query endpoint
#[derive(Clone)]
pub struct QueryClient {
    client: Client,
    endpoint: Url,
    user_id: Option<String>,
}

impl QueryClient {
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| Error::Config(format!("endpoint '{}': {}", endpoint, e)))?;

        Ok(Self {
            client: Client::new(),
            endpoint,
            user_id: None,
        })
    }

    pub fn with_user_id(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    /// Sibling `health` resource of the query endpoint,
    /// e.g. `/api/chatbot/query` -> `/api/chatbot/health`.
    pub fn health_url(&self) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| Error::Config(format!("endpoint '{}' has no path", self.endpoint)))?
            .pop_if_empty()
            .pop()
            .push("health");
        Ok(url)
    }

    pub async fn health(&self) -> Result<String> {
        let url = self.health_url()?;
        debug!(%url, "checking chatbot health");

        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl ChatBackend for QueryClient {
    async fn ask(&self, question: &str) -> Result<ChatReply> {
        let request = ChatQuery {
            question,
            user_id: self.user_id.as_deref(),
        };
        debug!(endpoint = %self.endpoint, "sending chat query");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::RequestFailed(format!(
                "chatbot responded with status {}",
                response.status()
            )));
        }

        let reply: ChatReply = response.json().await?;
        debug!(
            kind = ?reply.kind,
            success = ?reply.success,
            error_message = ?reply.error_message,
            "chat reply received"
        );
        Ok(reply)
    }
}
