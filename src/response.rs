//! # Response Decoding
//!
//! Turns what the transport received into the structured [`Response`] handed
//! to callers. Locally detected failures use the same type, so a caller never
//! has to tell "local" from "remote" by shape, only by message.
//!
//! ## Wire Fields Read:
//! - `conversation`, `participant`: identifiers threaded into the next call
//! - `timed_response_interval`: seconds until a time-based output may be ready
//! - `outputs`: ordered dialog lines and behaviors
//! - `entities`: either `[{"name": .., "value": ..}]` or `{"NAME": value}`
//! - `asr_hypothesis`, `etag`, `last_modified`: passed through untouched

use crate::error::ConversationError;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// What the transport received: HTTP status plus parsed JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Value,
}

impl RawResponse {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(200, body)
    }
}

/// Outcome of a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub success: bool,
    pub code: u16,
    pub message: String,
}

impl Status {
    pub fn ok(code: u16) -> Self {
        Self {
            success: true,
            code,
            message: reason_phrase(code),
        }
    }

    pub fn failure(message: impl Into<String>, code: u16) -> Self {
        Self {
            success: false,
            code,
            message: message.into(),
        }
    }
}

/// Kind of value an entity holds, derived from its JSON type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Label,
    Counter,
    Flag,
    List,
    Unknown,
}

/// A named piece of dialogue state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub name: String,
    #[serde(default)]
    pub value: Value,
}

impl Entity {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match &self.value {
            Value::String(_) => EntityKind::Label,
            Value::Number(_) => EntityKind::Counter,
            Value::Bool(_) => EntityKind::Flag,
            Value::Array(_) => EntityKind::List,
            _ => EntityKind::Unknown,
        }
    }
}

/// One item of conversational output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Output {
    /// A line of dialog
    #[serde(alias = "dialog")]
    Text {
        id: Option<String>,
        #[serde(default)]
        text: String,
        uri: Option<String>,
        video_uri: Option<String>,
        duration: Option<f64>,
        character: Option<String>,
        user_data: Option<Value>,
    },
    /// An action the caller should perform
    Behavior {
        id: Option<String>,
        behavior: String,
        #[serde(default)]
        parameters: Map<String, Value>,
    },
    #[serde(other)]
    Unknown,
}

/// Structured result of a call, successful or not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    pub conversation_id: Option<String>,
    pub participant_id: Option<String>,
    /// Seconds to wait before polling for a timed response
    pub timed_response_interval: Option<f64>,
    pub asr_hypothesis: Option<String>,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub outputs: Vec<Output>,
    pub entities: Vec<Entity>,
}

impl Response {
    /// Decode a transport result.
    ///
    /// Any 2xx status is a success. Otherwise the message is taken from the
    /// body when it has one, else from the HTTP reason phrase.
    pub fn decode(raw: RawResponse) -> Self {
        let RawResponse { status, body } = raw;

        if !(200..300).contains(&status) {
            return Self::failure(failure_message(&body, status), status);
        }

        let mut response = Self::empty(Status::ok(status));
        let Value::Object(fields) = body else {
            return response;
        };

        response.conversation_id = string_field(&fields, "conversation");
        response.participant_id = string_field(&fields, "participant");
        response.timed_response_interval = fields
            .get("timed_response_interval")
            .and_then(Value::as_f64)
            .filter(|interval| *interval >= 0.0);
        response.asr_hypothesis = string_field(&fields, "asr_hypothesis");
        response.etag = string_field(&fields, "etag");
        response.last_modified = string_field(&fields, "last_modified");

        if let Some(Value::Array(items)) = fields.get("outputs") {
            response.outputs = items.iter().filter_map(decode_output).collect();
        }
        if let Some(entities) = fields.get("entities") {
            response.entities = decode_entities(entities);
        }

        response
    }

    /// A failure result synthesized without contacting the network.
    pub fn failure(message: impl Into<String>, code: u16) -> Self {
        Self::empty(Status::failure(message, code))
    }

    pub fn from_error(err: &ConversationError) -> Self {
        Self::failure(err.to_string(), err.code())
    }

    fn empty(status: Status) -> Self {
        Self {
            status,
            conversation_id: None,
            participant_id: None,
            timed_response_interval: None,
            asr_hypothesis: None,
            etag: None,
            last_modified: None,
            outputs: Vec::new(),
            entities: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.success
    }

    /// Dialog lines in output order.
    pub fn texts(&self) -> Vec<&str> {
        self.outputs
            .iter()
            .filter_map(|output| match output {
                Output::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entities.iter().find(|entity| entity.name == name)
    }
}

fn string_field(fields: &Map<String, Value>, name: &str) -> Option<String> {
    fields
        .get(name)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn decode_output(item: &Value) -> Option<Output> {
    match serde_json::from_value::<Output>(item.clone()) {
        Ok(output) => Some(output),
        Err(e) => {
            warn!(error = %e, "Skipping malformed output");
            None
        }
    }
}

fn decode_entities(entities: &Value) -> Vec<Entity> {
    match entities {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| serde_json::from_value::<Entity>(item.clone()).ok())
            .collect(),
        Value::Object(map) => map
            .iter()
            .map(|(name, value)| Entity::new(name.clone(), value.clone()))
            .collect(),
        _ => Vec::new(),
    }
}

fn failure_message(body: &Value, status: u16) -> String {
    let from_body = match body {
        Value::String(text) => Some(text.clone()),
        Value::Object(fields) => match fields.get("error") {
            Some(Value::String(text)) => Some(text.clone()),
            Some(Value::Object(error)) => error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => fields
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string),
        },
        _ => None,
    };

    from_body
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| reason_phrase(status))
}

fn reason_phrase(code: u16) -> String {
    StatusCode::from_u16(code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("Unknown status")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_success() {
        let raw = RawResponse::ok(json!({
            "conversation": "c1",
            "participant": "p1",
            "timed_response_interval": 2.5,
            "outputs": [
                { "type": "dialog", "id": "o1", "text": "Hello. What's your name?", "character": "Host" },
                { "type": "behavior", "behavior": "wave", "parameters": { "hand": "left" } },
                { "type": "hologram" }
            ],
            "entities": [{ "name": "NAME", "value": "jill" }]
        }));

        let response = Response::decode(raw);
        assert!(response.is_success());
        assert_eq!(response.conversation_id.as_deref(), Some("c1"));
        assert_eq!(response.participant_id.as_deref(), Some("p1"));
        assert_eq!(response.timed_response_interval, Some(2.5));
        assert_eq!(response.texts(), vec!["Hello. What's your name?"]);
        assert_eq!(response.outputs.len(), 3);
        assert_eq!(response.outputs[2], Output::Unknown);
        match &response.outputs[1] {
            Output::Behavior { behavior, parameters, .. } => {
                assert_eq!(behavior, "wave");
                assert_eq!(parameters["hand"], json!("left"));
            }
            other => panic!("unexpected output {:?}", other),
        }
        assert_eq!(response.entity("NAME").unwrap().value, json!("jill"));
    }

    #[test]
    fn test_entities_as_object() {
        let response = Response::decode(RawResponse::ok(json!({
            "entities": { "COUNT": 3, "DONE": true, "ITEMS": ["a", "b"] }
        })));
        assert_eq!(response.entity("COUNT").unwrap().kind(), EntityKind::Counter);
        assert_eq!(response.entity("DONE").unwrap().kind(), EntityKind::Flag);
        assert_eq!(response.entity("ITEMS").unwrap().kind(), EntityKind::List);
    }

    #[test]
    fn test_negative_interval_means_none() {
        let response = Response::decode(RawResponse::ok(json!({ "timed_response_interval": -1 })));
        assert_eq!(response.timed_response_interval, None);
    }

    #[test]
    fn test_decode_failure_message() {
        let response = Response::decode(RawResponse::new(
            401,
            json!({ "error": { "message": "Invalid API key" } }),
        ));
        assert!(!response.is_success());
        assert_eq!(response.status.code, 401);
        assert_eq!(response.status.message, "Invalid API key");
        assert!(response.conversation_id.is_none());

        let response = Response::decode(RawResponse::new(404, Value::Null));
        assert_eq!(response.status.message, "Not Found");
    }

    #[test]
    fn test_failure_ignores_identifiers() {
        let response = Response::decode(RawResponse::new(
            400,
            json!({ "conversation": "c2", "message": "Invalid project" }),
        ));
        assert_eq!(response.status.message, "Invalid project");
        assert!(response.conversation_id.is_none());
    }

    #[test]
    fn test_from_error() {
        let response = Response::from_error(&ConversationError::MissingRequest);
        assert!(!response.is_success());
        assert_eq!(response.status.code, 500);
        assert_eq!(response.status.message, "Valid request object missing");
    }
}
