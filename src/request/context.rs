//! Session and auth parameters read by every outgoing call.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which build of the remote project to converse with.
///
/// Serialized in lowercase because that is how it travels in `build_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildType {
    #[default]
    Production,
    Staging,
    Development,
}

impl BuildType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildType::Production => "production",
            BuildType::Staging => "staging",
            BuildType::Development => "development",
        }
    }
}

/// Bag of session parameters threaded through a conversation.
///
/// `conversation_id` and `participant_id` start out empty and are only ever
/// overwritten from a successful response. Everything else is caller input.
///
/// `restart_if_modified` is a tri-state: `None` lets the server default apply,
/// `Some(false)` is the only value that gets sent.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    pub api_key: String,
    pub conversation_id: Option<String>,
    pub participant_id: Option<String>,
    pub language: Option<String>,
    pub locale: Option<String>,
    pub account_id: Option<String>,
    #[serde(default)]
    pub build_type: BuildType,
    pub restart_if_modified: Option<bool>,
    /// Sent only with the start call
    pub time_zone_offset: Option<i32>,
}

impl RequestContext {
    /// Create a context carrying just an API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn with_participant(mut self, participant_id: impl Into<String>) -> Self {
        self.participant_id = Some(participant_id.into());
        self
    }

    pub fn with_conversation(mut self, conversation_id: impl Into<String>) -> Self {
        self.conversation_id = Some(conversation_id.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    pub fn with_build_type(mut self, build_type: BuildType) -> Self {
        self.build_type = build_type;
        self
    }

    pub fn with_restart_if_modified(mut self, restart: bool) -> Self {
        self.restart_if_modified = Some(restart);
        self
    }

    pub fn with_time_zone_offset(mut self, offset: i32) -> Self {
        self.time_zone_offset = Some(offset);
        self
    }

    /// A context is usable once it carries a non-empty API key.
    pub fn is_valid(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Overwrite the identifiers with the values a successful response carried.
    ///
    /// A response that omits an identifier leaves the stored one in place.
    pub fn commit_identifiers(&mut self, conversation_id: Option<String>, participant_id: Option<String>) {
        if conversation_id.is_some() {
            self.conversation_id = conversation_id;
        }
        if participant_id.is_some() {
            self.participant_id = participant_id;
        }
    }
}

/// Hand-written so the API key never ends up in logs.
impl fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestContext")
            .field("api_key", &"<redacted>")
            .field("conversation_id", &self.conversation_id)
            .field("participant_id", &self.participant_id)
            .field("language", &self.language)
            .field("locale", &self.locale)
            .field("account_id", &self.account_id)
            .field("build_type", &self.build_type)
            .field("restart_if_modified", &self.restart_if_modified)
            .field("time_zone_offset", &self.time_zone_offset)
            .finish()
    }
}
