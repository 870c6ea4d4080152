//! # Session Management
//!
//! The orchestrator exposed to callers: one [`Conversation`] per remote
//! conversation thread.

pub mod conversation;

pub use conversation::{Conversation, SessionState};
