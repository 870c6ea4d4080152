//! reqwest-backed transport.

use super::Transport;
use crate::error::{ConversationError, ConversationResult};
use crate::request::{ApiRequest, Body};
use crate::response::RawResponse;
use crate::version::API_BASE_URL;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the conversation service.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Client against the public service endpoint.
    pub fn new() -> ConversationResult<Self> {
        Self::with_base_url(API_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Client against another base URL, e.g. a local mock server.
    ///
    /// A trailing slash is added when missing so endpoints join under the
    /// versioned path instead of replacing its last segment.
    pub fn with_base_url(base_url: &str, timeout: Duration) -> ConversationResult<Self> {
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };
        let base_url = Url::parse(&normalized).map_err(|e| {
            ConversationError::Config(format!("Invalid base URL '{}': {}", base_url, e))
        })?;

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(format!("conversation-client/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConversationError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url_for(&self, endpoint: &str) -> ConversationResult<Url> {
        self.base_url.join(endpoint).map_err(|e| ConversationError::Transport {
            message: format!("Invalid endpoint '{}': {}", endpoint, e),
            status: None,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: &ApiRequest) -> ConversationResult<RawResponse> {
        let url = self.url_for(&request.endpoint)?;

        // Unset parameters are left off the query string
        let query: Vec<(&str, &str)> = request
            .query
            .iter()
            .filter_map(|(key, value)| value.as_deref().map(|v| (key.as_str(), v)))
            .collect();

        let mut builder = self.client.post(url).query(&query);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match &request.body {
            Body::Json(value) => builder.body(serde_json::to_vec(value)?),
            Body::Binary(bytes) => builder.body(bytes.clone()),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let bytes = response.bytes().await?;

        // Error pages are not always JSON; keep them as a string body
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        debug!(status = status, bytes = bytes.len(), "Response received");
        Ok(RawResponse::new(status, body))
    }
}
