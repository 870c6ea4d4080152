//! Version information for the conversation service API.

/// Public endpoint of the conversation service, including the API version.
pub const API_BASE_URL: &str = "https://conversation.pullstring.ai/v1/";

/// Service features that may or may not be available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    /// Recognition on audio chunks as they arrive instead of on the whole capture
    StreamingAsr,
}

/// Check if the endpoint currently supports a feature.
pub fn has_feature(feature: Feature) -> bool {
    match feature {
        Feature::StreamingAsr => false,
    }
}
