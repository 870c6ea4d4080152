//! # Transport
//!
//! The seam between the session layer and the network. A transport performs
//! one POST described by an [`ApiRequest`] and hands back the status and JSON
//! body; it does not interpret either.
//!
//! ## Implementations:
//! - **HttpTransport**: reqwest client against the service base URL
//! - **LoggingTransport**: wraps another transport with request logging
//!
//! Tests substitute their own implementation to script responses and count
//! calls.

pub mod http;
pub mod logging;

pub use http::HttpTransport;
pub use logging::LoggingTransport;

use crate::error::ConversationResult;
use crate::request::ApiRequest;
use crate::response::RawResponse;
use async_trait::async_trait;

/// Performs the HTTP exchange for one call.
///
/// Non-2xx answers are returned as `Ok(RawResponse)` so the remote message
/// reaches the caller; `Err` is reserved for exchanges that never completed.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, request: &ApiRequest) -> ConversationResult<RawResponse>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn post(&self, request: &ApiRequest) -> ConversationResult<RawResponse> {
        (**self).post(request).await
    }
}
