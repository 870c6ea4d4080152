//! # Request Construction
//!
//! Everything needed to shape an outgoing call:
//! - **context**: API key, identifiers and session options
//! - **intent**: which call is being made and its arguments
//! - **builder**: endpoint, headers, query parameters and body

pub mod builder;
pub mod context;
pub mod intent;

pub use builder::{ApiRequest, Body, RequestBuilder};
pub use context::{BuildType, RequestContext};
pub use intent::{AudioFormat, Intent};
