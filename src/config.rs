//! # Configuration Management
//!
//! Settings for the console client, loaded from multiple sources:
//! - TOML configuration file (conversation.toml)
//! - Environment variables (with CONVERSATION_ prefix)
//! - Default values (built into the code)
//!
//! The library types never read configuration themselves; the binary turns an
//! [`AppConfig`] into a [`RequestContext`] and an [`HttpTransport`].
//!
//! ## Configuration Priority (highest to lowest):
//! 1. `API_KEY` and `PROJECT_ID` environment variables
//! 2. Environment variables (CONVERSATION_SESSION__API_KEY, CONVERSATION_HTTP__TIMEOUT_SECS, ...)
//! 3. Configuration file (conversation.toml)
//! 4. Default values (defined in the Default impl)
//!
//! [`HttpTransport`]: crate::transport::HttpTransport

use crate::error::{ConversationError, ConversationResult};
use crate::request::{BuildType, RequestContext};
use crate::version::API_BASE_URL;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Main application configuration.
///
/// ## Why separate config structs:
/// Session parameters end up in every request; HTTP settings only shape the
/// transport. Keeping them apart mirrors that split.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub session: SessionConfig,
    pub http: HttpConfig,
}

/// Parameters copied into the initial request context.
///
/// ## Fields:
/// - `api_key`: bearer credential for the service
/// - `project`: project id passed to the start call
/// - `language`/`locale`: recognition hints sent as query parameters
/// - `build_type`: `production`, `staging` or `development`
/// - `restart_if_modified`: leave unset to let the server decide
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub project: String,
    pub language: Option<String>,
    pub locale: Option<String>,
    pub account_id: Option<String>,
    #[serde(default)]
    pub build_type: BuildType,
    pub restart_if_modified: Option<bool>,
    pub time_zone_offset: Option<i32>,
}

/// Transport settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub base_url: String,
    pub timeout_secs: u64, // whole seconds per request
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            http: HttpConfig {
                base_url: API_BASE_URL.to_string(),
                timeout_secs: 30,
            },
        }
    }
}

impl AppConfig {
    /// Load configuration from multiple sources in priority order.
    ///
    /// ## Configuration Loading Process:
    /// 1. Start with built-in defaults
    /// 2. Override with values from conversation.toml (if it exists)
    /// 3. Override with environment variables prefixed with CONVERSATION_
    /// 4. Handle the bare API_KEY and PROJECT_ID variables
    ///
    /// ## Environment Variable Examples:
    /// - `CONVERSATION_SESSION__LOCALE=en-US`
    /// - `CONVERSATION_SESSION__BUILD_TYPE=staging`
    /// - `CONVERSATION_HTTP__TIMEOUT_SECS=10`
    pub fn load() -> ConversationResult<Self> {
        let mut settings = config::Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(config::File::with_name("conversation").required(false))
            .add_source(
                config::Environment::with_prefix("CONVERSATION")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        // Short names commonly set by deployment scripts
        if let Ok(api_key) = env::var("API_KEY") {
            settings = settings.set_override("session.api_key", api_key)?;
        }

        if let Ok(project) = env::var("PROJECT_ID") {
            settings = settings.set_override("session.project", project)?;
        }

        let config = settings.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Validate that the configuration values make sense.
    ///
    /// ## What this checks:
    /// - A project id is set (the start call needs one)
    /// - The request timeout is not zero
    /// - The base URL parses
    ///
    /// A missing API key is not rejected here: the session reports it on the
    /// first call like any other local failure.
    pub fn validate(&self) -> ConversationResult<()> {
        if self.session.project.trim().is_empty() {
            return Err(ConversationError::Config("Project id must be set".to_string()));
        }

        if self.http.timeout_secs == 0 {
            return Err(ConversationError::Config(
                "Request timeout must be greater than 0".to_string(),
            ));
        }

        Url::parse(&self.http.base_url).map_err(|e| {
            ConversationError::Config(format!("Invalid base URL '{}': {}", self.http.base_url, e))
        })?;

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs)
    }

    /// Initial request context for a new conversation.
    pub fn request_context(&self) -> RequestContext {
        let session = &self.session;
        RequestContext {
            api_key: session.api_key.clone(),
            conversation_id: None,
            participant_id: None,
            language: session.language.clone(),
            locale: session.locale.clone(),
            account_id: session.account_id.clone(),
            build_type: session.build_type,
            restart_if_modified: session.restart_if_modified,
            time_zone_offset: session.time_zone_offset,
        }
    }
}
