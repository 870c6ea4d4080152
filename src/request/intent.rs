//! # Call Intents
//!
//! One variant per kind of call the conversation service understands. The
//! service exposes a single endpoint and tells calls apart by body shape, so
//! each variant owns exactly one body shape (see
//! [`RequestBuilder`](super::RequestBuilder)).
//!
//! Audio chunks from a progressive capture are not intents of their own: they
//! accumulate locally and only the completed capture becomes a
//! [`Intent::SendAudio`] request.

use crate::error::{ConversationError, ConversationResult};
use crate::response::Entity;
use serde_json::{Map, Value};

pub const GET_ENTITIES_NOT_ARRAY: &str = "entities sent to getEntities must be an array";
pub const SET_ENTITIES_NOT_ARRAY: &str = "entities sent to setEntities must be an array";

/// Format tag for one-shot audio submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    /// Headerless 16-bit mono PCM at 16kHz
    RawPcm16k,
    /// 16-bit mono PCM at 16kHz inside a RIFF/WAVE container
    Wav16k,
}

/// A call against the conversation resource.
#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Begin a conversation with a project
    Start {
        project: String,
        time_zone_offset: Option<i32>,
    },
    SendText(String),
    /// Activity name or id
    SendActivity(String),
    SendEvent {
        name: String,
        parameters: Map<String, Value>,
    },
    /// Jump to a response by its UUID
    GoTo(String),
    /// Poll for a time-based response
    CheckTimedResponse,
    GetEntities(Vec<String>),
    /// Pairs are collapsed into one mapping, so the last pair for a name wins
    SetEntities(Vec<Entity>),
    /// Raw PCM from a completed progressive capture
    SendAudio(Vec<u8>),
    /// Caller-supplied audio tagged with its container format
    SendAudioBlob { bytes: Vec<u8>, format: AudioFormat },
}

impl Intent {
    pub fn start(project: impl Into<String>, time_zone_offset: Option<i32>) -> Self {
        Intent::Start {
            project: project.into(),
            time_zone_offset,
        }
    }

    pub fn event(name: impl Into<String>, parameters: Option<Map<String, Value>>) -> Self {
        Intent::SendEvent {
            name: name.into(),
            parameters: parameters.unwrap_or_default(),
        }
    }

    /// Build a `GetEntities` intent from loosely typed input.
    ///
    /// ## Errors:
    /// - the value is not an array
    /// - an element is not a string
    pub fn get_entities_from_value(value: Value) -> ConversationResult<Self> {
        let Value::Array(items) = value else {
            return Err(ConversationError::InvalidArgument(GET_ENTITIES_NOT_ARRAY.to_string()));
        };

        let names = items
            .into_iter()
            .map(|item| match item {
                Value::String(name) => Ok(name),
                other => Err(ConversationError::InvalidArgument(format!(
                    "entity names sent to getEntities must be strings, got {}",
                    other
                ))),
            })
            .collect::<ConversationResult<Vec<_>>>()?;

        Ok(Intent::GetEntities(names))
    }

    /// Build a `SetEntities` intent from loosely typed input.
    ///
    /// Each element must be an object with a string `name` and any `value`.
    pub fn set_entities_from_value(value: Value) -> ConversationResult<Self> {
        if !value.is_array() {
            return Err(ConversationError::InvalidArgument(SET_ENTITIES_NOT_ARRAY.to_string()));
        }

        let entities: Vec<Entity> = serde_json::from_value(value).map_err(|e| {
            ConversationError::InvalidArgument(format!(
                "entities sent to setEntities must be name/value objects: {}",
                e
            ))
        })?;

        Ok(Intent::SetEntities(entities))
    }

    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Intent::Start { .. } => "start",
            Intent::SendText(_) => "text",
            Intent::SendActivity(_) => "activity",
            Intent::SendEvent { .. } => "event",
            Intent::GoTo(_) => "goto",
            Intent::CheckTimedResponse => "timed_response",
            Intent::GetEntities(_) => "get_entities",
            Intent::SetEntities(_) => "set_entities",
            Intent::SendAudio(_) => "audio",
            Intent::SendAudioBlob { .. } => "audio_blob",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_entities_requires_array() {
        let err = Intent::get_entities_from_value(json!("NAME")).unwrap_err();
        assert_eq!(err.to_string(), GET_ENTITIES_NOT_ARRAY);

        let intent = Intent::get_entities_from_value(json!(["NAME", "AGE"])).unwrap();
        assert_eq!(
            intent,
            Intent::GetEntities(vec!["NAME".to_string(), "AGE".to_string()])
        );
    }

    #[test]
    fn test_get_entities_rejects_non_string_names() {
        assert!(Intent::get_entities_from_value(json!(["NAME", 3])).is_err());
    }

    #[test]
    fn test_set_entities_requires_array() {
        let err = Intent::set_entities_from_value(json!({"name": "NAME", "value": "jill"})).unwrap_err();
        assert_eq!(err.to_string(), SET_ENTITIES_NOT_ARRAY);
        assert_eq!(err.code(), 500);
    }

    #[test]
    fn test_set_entities_from_pairs() {
        let intent =
            Intent::set_entities_from_value(json!([{"name": "NAME", "value": "jill"}, {"name": "AGE", "value": 7}]))
                .unwrap();
        match intent {
            Intent::SetEntities(entities) => {
                assert_eq!(entities.len(), 2);
                assert_eq!(entities[0].name, "NAME");
                assert_eq!(entities[1].value, json!(7));
            }
            other => panic!("unexpected intent {:?}", other),
        }
    }

    #[test]
    fn test_event_defaults_parameters() {
        match Intent::event("tap", None) {
            Intent::SendEvent { name, parameters } => {
                assert_eq!(name, "tap");
                assert!(parameters.is_empty());
            }
            other => panic!("unexpected intent {:?}", other),
        }
    }
}
