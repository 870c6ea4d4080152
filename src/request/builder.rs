//! # Request Builder
//!
//! Pure translation of an [`Intent`] plus the current [`RequestContext`] into
//! an [`ApiRequest`]: endpoint, headers, query parameters and body.
//!
//! ## Body Rules:
//! - The intent contributes its own payload (`{"text": ...}`, `{"goto": ...}`, ...)
//! - Session-wide fields are added only when they differ from the server
//!   default. Presence is treated as an override by the remote, so sending a
//!   default explicitly is not equivalent to leaving it out.
//! - Audio intents produce a binary body with no JSON wrapping

use super::context::{BuildType, RequestContext};
use super::intent::{AudioFormat, Intent};
use crate::audio::{self, PCM_CONTENT_TYPE};
use crate::error::{ConversationError, ConversationResult};
use serde_json::{json, Map, Value};

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const UNSUPPORTED_FORMAT_MESSAGE: &str = "Unsupported format sent to sendAudio.";

/// Request body: either a JSON document or raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Binary(Vec<u8>),
}

impl Body {
    pub fn content_type(&self) -> &'static str {
        match self {
            Body::Json(_) => JSON_CONTENT_TYPE,
            Body::Binary(_) => PCM_CONTENT_TYPE,
        }
    }

    pub fn is_binary(&self) -> bool {
        matches!(self, Body::Binary(_))
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Body::Json(value) => Some(value),
            Body::Binary(_) => None,
        }
    }
}

/// Everything a transport needs to perform one call.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Path relative to the service base URL
    pub endpoint: String,
    pub headers: Vec<(String, String)>,
    /// Unset values are part of the request but omitted on the wire
    pub query: Vec<(String, Option<String>)>,
    pub body: Body,
}

impl ApiRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(key, _)| key == name)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn has_query_param(&self, name: &str) -> bool {
        self.query.iter().any(|(key, _)| key == name)
    }
}

/// A session-wide body field: its wire name and a function that yields the
/// value only when the field should be sent.
type SessionField = (&'static str, fn(&RequestContext) -> Option<Value>);

/// Applied in order after the intent payload.
const SESSION_FIELDS: [SessionField; 3] = [
    ("build_type", build_type_field),
    ("restart_if_modified", restart_if_modified_field),
    ("participant", participant_field),
];

fn build_type_field(ctx: &RequestContext) -> Option<Value> {
    (ctx.build_type != BuildType::Production).then(|| json!(ctx.build_type.as_str()))
}

fn restart_if_modified_field(ctx: &RequestContext) -> Option<Value> {
    (ctx.restart_if_modified == Some(false)).then(|| json!(false))
}

fn participant_field(ctx: &RequestContext) -> Option<Value> {
    non_empty(&ctx.participant_id).map(|id| json!(id))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Builds requests against one context.
///
/// ## Usage Example:
/// ```rust
/// use conversation_client::request::{Intent, RequestBuilder, RequestContext};
///
/// let ctx = RequestContext::new("key").with_conversation("c1");
/// let request = RequestBuilder::new(&ctx).build(&Intent::SendText("hi".into())).unwrap();
/// assert_eq!(request.endpoint, "conversation/c1");
/// ```
pub struct RequestBuilder<'a> {
    context: &'a RequestContext,
}

impl<'a> RequestBuilder<'a> {
    pub fn new(context: &'a RequestContext) -> Self {
        Self { context }
    }

    /// Validate the intent and assemble the full request.
    pub fn build(&self, intent: &Intent) -> ConversationResult<ApiRequest> {
        if !self.context.is_valid() {
            return Err(ConversationError::MissingRequest);
        }

        let body = self.body(intent)?;
        Ok(ApiRequest {
            endpoint: self.endpoint(),
            headers: self.headers(body.content_type()),
            query: self.query(),
            body,
        })
    }

    /// `conversation` before the first start, `conversation/{id}` after.
    pub fn endpoint(&self) -> String {
        match non_empty(&self.context.conversation_id) {
            Some(id) => format!("conversation/{}", id),
            None => "conversation".to_string(),
        }
    }

    pub fn headers(&self, content_type: &str) -> Vec<(String, String)> {
        vec![
            (
                "Authorization".to_string(),
                format!("Bearer {}", self.context.api_key),
            ),
            ("Accept".to_string(), JSON_CONTENT_TYPE.to_string()),
            ("Content-Type".to_string(), content_type.to_string()),
        ]
    }

    /// `asr_language` is always listed; `locale` and `account` only when set.
    pub fn query(&self) -> Vec<(String, Option<String>)> {
        let mut query = vec![("asr_language".to_string(), self.context.language.clone())];

        if let Some(locale) = non_empty(&self.context.locale) {
            query.push(("locale".to_string(), Some(locale.to_string())));
        }
        if let Some(account) = non_empty(&self.context.account_id) {
            query.push(("account".to_string(), Some(account.to_string())));
        }

        query
    }

    pub fn body(&self, intent: &Intent) -> ConversationResult<Body> {
        let payload = match intent {
            Intent::Start {
                project,
                time_zone_offset,
            } => {
                let mut payload = json!({ "project": project });
                if let Some(offset) = time_zone_offset {
                    payload["time_zone_offset"] = json!(offset);
                }
                payload
            }
            Intent::SendText(text) => json!({ "text": text }),
            Intent::SendActivity(activity) => json!({ "activity": activity }),
            Intent::SendEvent { name, parameters } => json!({
                "event": { "name": name, "parameters": parameters }
            }),
            Intent::GoTo(response_id) => json!({ "goto": response_id }),
            Intent::CheckTimedResponse => json!({}),
            Intent::GetEntities(names) => json!({ "get_entities": names }),
            Intent::SetEntities(entities) => {
                let mut values = Map::new();
                for entity in entities {
                    values.insert(entity.name.clone(), entity.value.clone());
                }
                json!({ "set_entities": values })
            }
            Intent::SendAudio(pcm) => return Ok(Body::Binary(pcm.clone())),
            Intent::SendAudioBlob { bytes, format } => {
                return self.audio_blob_body(bytes, *format);
            }
        };

        Ok(Body::Json(self.with_session_fields(payload)))
    }

    fn with_session_fields(&self, mut payload: Value) -> Value {
        if let Value::Object(fields) = &mut payload {
            for (name, value_for) in SESSION_FIELDS.iter() {
                if let Some(value) = value_for(self.context) {
                    fields.insert(name.to_string(), value);
                }
            }
        }
        payload
    }

    fn audio_blob_body(&self, bytes: &[u8], format: AudioFormat) -> ConversationResult<Body> {
        if format != AudioFormat::Wav16k {
            return Err(ConversationError::UnsupportedFormat(
                UNSUPPORTED_FORMAT_MESSAGE.to_string(),
            ));
        }
        if bytes.is_empty() {
            return Err(ConversationError::InvalidArgument(
                "Unable to extract audio data".to_string(),
            ));
        }

        let pcm = audio::parse_wav(bytes)?;
        Ok(Body::Binary(pcm.to_vec()))
    }
}
