use super::Transport;
use crate::error::ConversationResult;
use crate::request::ApiRequest;
use crate::response::RawResponse;
use async_trait::async_trait;
use std::time::Instant;
use tracing::{error, info};

/// Transport decorator that logs every call with its outcome and duration.
pub struct LoggingTransport<T> {
    inner: T,
}

impl<T> LoggingTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<T: Transport> Transport for LoggingTransport<T> {
    async fn post(&self, request: &ApiRequest) -> ConversationResult<RawResponse> {
        let start_time = Instant::now();
        let body_kind = if request.body.is_binary() { "binary" } else { "json" };

        info!(
            endpoint = %request.endpoint,
            body = body_kind,
            "Request started"
        );

        let result = self.inner.post(request).await;
        let duration = start_time.elapsed();

        match &result {
            Ok(response) => {
                info!(
                    endpoint = %request.endpoint,
                    status = %response.status,
                    duration_ms = %duration.as_millis(),
                    "Request completed"
                );
            }
            Err(err) => {
                error!(
                    endpoint = %request.endpoint,
                    duration_ms = %duration.as_millis(),
                    error = %err,
                    "Request failed"
                );
            }
        }

        result
    }
}
