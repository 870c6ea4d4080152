//! # Error Handling
//!
//! Error types for the conversation client.
//!
//! Errors in this crate never travel on a separate channel to the caller of a
//! session operation. Every `ConversationError` is folded into a failure
//! [`Response`](crate::response::Response) with a message and a numeric code,
//! so callers branch on `response.status.success` for both local and remote
//! failures.
//!
//! ## Error Categories:
//! - **Local precondition errors**: missing credentials, malformed arguments,
//!   malformed WAV data. Detected before any network traffic, code 500.
//! - **Transport errors**: the HTTP exchange itself failed (DNS, TLS, timeout).
//! - **Decode errors**: the remote answered with something that is not JSON.
//! - **Config errors**: only raised by the console client while loading settings.

use std::fmt;

/// Code attached to every failure that is detected locally.
pub const LOCAL_ERROR_CODE: u16 = 500;

/// Message returned when an operation runs without a usable request context.
pub const MISSING_REQUEST_MESSAGE: &str = "Valid request object missing";

/// Custom error types for the conversation client.
///
/// ## Usage Example:
/// ```rust
/// use conversation_client::error::ConversationError;
///
/// let err = ConversationError::InvalidArgument("entities sent to getEntities must be an array".to_string());
/// assert_eq!(err.to_string(), "entities sent to getEntities must be an array");
/// assert_eq!(err.code(), 500);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationError {
    /// No request context was supplied, or it has no API key
    MissingRequest,

    /// A call argument has the wrong shape
    InvalidArgument(String),

    /// The audio format tag is not one the service accepts
    UnsupportedFormat(String),

    /// The WAV container could not be reduced to raw PCM
    InvalidWav(String),

    /// The HTTP exchange failed; carries the status when one was received
    Transport { message: String, status: Option<u16> },

    /// The response body could not be decoded
    Decode(String),

    /// Configuration file or environment variable problems
    Config(String),
}

impl ConversationError {
    /// Numeric code reported in the failure status.
    ///
    /// Local errors always use 500. Transport errors reuse the HTTP status
    /// when the server got far enough to send one.
    pub fn code(&self) -> u16 {
        match self {
            ConversationError::Transport {
                status: Some(status),
                ..
            } => *status,
            _ => LOCAL_ERROR_CODE,
        }
    }
}

/// The message is written exactly as the caller will see it in
/// `status.message`, so local failures can be told apart by content alone.
impl fmt::Display for ConversationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationError::MissingRequest => write!(f, "{}", MISSING_REQUEST_MESSAGE),
            ConversationError::InvalidArgument(msg) => write!(f, "{}", msg),
            ConversationError::UnsupportedFormat(msg) => write!(f, "{}", msg),
            ConversationError::InvalidWav(msg) => write!(f, "{}", msg),
            ConversationError::Transport { message, .. } => write!(f, "Transport error: {}", message),
            ConversationError::Decode(msg) => write!(f, "Response decoding error: {}", msg),
            ConversationError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for ConversationError {}

/// Automatic conversion from anyhow::Error to ConversationError.
///
/// Anything that reaches this conversion is unexpected, so it is reported as
/// a transport-level failure without a status code.
impl From<anyhow::Error> for ConversationError {
    fn from(err: anyhow::Error) -> Self {
        ConversationError::Transport {
            message: err.to_string(),
            status: None,
        }
    }
}

/// A body that fails to parse as JSON is a decode error, not a local one.
impl From<serde_json::Error> for ConversationError {
    fn from(err: serde_json::Error) -> Self {
        ConversationError::Decode(format!("JSON parsing error: {}", err))
    }
}

impl From<config::ConfigError> for ConversationError {
    fn from(err: config::ConfigError) -> Self {
        ConversationError::Config(err.to_string())
    }
}

/// reqwest errors keep the HTTP status when the failure happened after the
/// response line was read (for example a body read timeout).
impl From<reqwest::Error> for ConversationError {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else if err.is_connect() {
            format!("connection failed: {}", err)
        } else {
            err.to_string()
        };
        ConversationError::Transport { message, status }
    }
}

/// Type alias for Results that use our custom error type.
pub type ConversationResult<T> = Result<T, ConversationError>;
