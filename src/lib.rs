//! # Conversation Client
//!
//! Client-side session manager for a remote conversational-AI service.
//!
//! A caller starts a conversation with a project, then sends text, activities,
//! events, entity reads/writes or audio. Each call becomes a request against
//! the service's `conversation` resource, and the conversation and participant
//! ids from each successful response are threaded into the next call.
//!
//! ## Module Layout:
//! - **audio**: progressive capture buffer and WAV parsing
//! - **request**: request context, call intents and the request builder
//! - **response**: decoding of service responses and local failures
//! - **transport**: the HTTP seam and its implementations
//! - **session**: the `Conversation` state machine
//! - **version**: service base URL and feature probing
//! - **config**: settings for the console client
//! - **error**: crate error type

pub mod audio;
pub mod config;
pub mod error;
pub mod request;
pub mod response;
pub mod session;
pub mod transport;
pub mod version;

pub use audio::{ASR_CHANNELS, ASR_SAMPLE_RATE};
pub use error::{ConversationError, ConversationResult};
pub use request::{AudioFormat, BuildType, Intent, RequestContext};
pub use response::{Entity, Output, RawResponse, Response, Status};
pub use session::{Conversation, SessionState};
pub use transport::{HttpTransport, LoggingTransport, Transport};
