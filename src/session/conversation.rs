//! # Conversation Session
//!
//! Drives one conversation with the remote service. The session owns the
//! request context, builds each call through [`RequestBuilder`], submits it
//! through the injected [`Transport`] and threads the identifiers from every
//! successful response into the next call.
//!
//! ## Session Lifecycle:
//! 1. **Unstarted**: no conversation id yet, calls go to `conversation`
//! 2. **Active**: a successful start assigned an id, calls go to
//!    `conversation/{id}`
//! 3. **Recording**: a progressive audio capture is accumulating chunks
//!
//! ## Serialized Calls:
//! Every operation takes `&mut self` and resolves to the call's [`Response`],
//! so a second call cannot be issued while the first one is still in flight.
//! The identifier updates of one call are always visible to the next.

use crate::audio::AudioBuffer;
use crate::error::{ConversationError, ConversationResult};
use crate::request::{AudioFormat, Intent, RequestBuilder, RequestContext};
use crate::response::{Entity, Response};
use crate::transport::Transport;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

pub const CAPTURE_NOT_STARTED_MESSAGE: &str = "Audio capture was not started";

/// Current state of a conversation session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No conversation id yet
    Unstarted,
    /// Conversation id assigned by the service
    Active,
    /// Accumulating audio for a progressive capture
    Recording,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Unstarted => "unstarted",
            SessionState::Active => "active",
            SessionState::Recording => "recording",
        }
    }
}

/// One conversation thread with the remote service.
///
/// ## Request Contexts:
/// Every operation accepts an optional [`RequestContext`]. When one is given
/// it replaces the held context; when `None` the last one is reused. The
/// first call therefore has to supply a context with an API key.
///
/// ## Usage Example:
/// ```rust,no_run
/// use conversation_client::{Conversation, HttpTransport, RequestContext};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut conversation = Conversation::new(HttpTransport::new()?);
/// let response = conversation
///     .start("my-project-id", Some(RequestContext::new("my-api-key")))
///     .await;
/// if response.is_success() {
///     let reply = conversation.send_text("hello", None).await;
///     println!("{:?}", reply.texts());
/// }
/// # Ok(())
/// # }
/// ```
pub struct Conversation<T> {
    transport: T,
    request: Option<RequestContext>,
    audio: AudioBuffer,
    recording: bool,
}

impl<T: Transport> Conversation<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            request: None,
            audio: AudioBuffer::new(),
            recording: false,
        }
    }

    /// Start a new conversation with a project.
    ///
    /// The context's `time_zone_offset`, when set, is sent with this call only.
    pub async fn start(&mut self, project: &str, request: Option<RequestContext>) -> Response {
        let time_zone_offset = match self.ensure_request(request) {
            Ok(ctx) => ctx.time_zone_offset,
            Err(err) => return Self::local_failure(err),
        };

        self.send(Intent::start(project, time_zone_offset), None).await
    }

    pub async fn send_text(&mut self, text: &str, request: Option<RequestContext>) -> Response {
        self.send(Intent::SendText(text.to_string()), request).await
    }

    /// Send an activity name or id.
    pub async fn send_activity(&mut self, activity: &str, request: Option<RequestContext>) -> Response {
        self.send(Intent::SendActivity(activity.to_string()), request).await
    }

    pub async fn send_event(
        &mut self,
        event: &str,
        parameters: Option<Map<String, Value>>,
        request: Option<RequestContext>,
    ) -> Response {
        self.send(Intent::event(event, parameters), request).await
    }

    /// Jump the conversation directly to a response.
    pub async fn go_to(&mut self, response_id: &str, request: Option<RequestContext>) -> Response {
        self.send(Intent::GoTo(response_id.to_string()), request).await
    }

    /// Ask whether a time-based response is ready.
    ///
    /// Only useful after a response carried `timed_response_interval`; the
    /// caller waits that many seconds and then calls this. An empty response
    /// means nothing was pending.
    pub async fn check_for_timed_response(&mut self, request: Option<RequestContext>) -> Response {
        self.send(Intent::CheckTimedResponse, request).await
    }

    pub async fn get_entities(&mut self, names: &[&str], request: Option<RequestContext>) -> Response {
        let names = names.iter().map(|name| name.to_string()).collect();
        self.send(Intent::GetEntities(names), request).await
    }

    /// Change entity values. When a name appears twice the last value wins.
    pub async fn set_entities(&mut self, entities: Vec<Entity>, request: Option<RequestContext>) -> Response {
        self.send(Intent::SetEntities(entities), request).await
    }

    /// Send a complete recording in one call.
    ///
    /// Only [`AudioFormat::Wav16k`] is accepted; the WAV container is
    /// reduced to its PCM payload before sending.
    pub async fn send_audio(
        &mut self,
        audio: &[u8],
        format: AudioFormat,
        request: Option<RequestContext>,
    ) -> Response {
        let intent = Intent::SendAudioBlob {
            bytes: audio.to_vec(),
            format,
        };
        self.send(intent, request).await
    }

    /// Begin a progressive capture. Any previously accumulated audio is dropped.
    ///
    /// ## Errors:
    /// Without a usable context the capture is not started and the same
    /// failure [`Response`] any other call would give is returned.
    pub fn start_audio(&mut self, request: Option<RequestContext>) -> Result<(), Response> {
        if let Err(err) = self.ensure_request(request) {
            return Err(Self::local_failure(err));
        }

        self.audio.start();
        self.recording = true;
        info!("Audio capture started");
        Ok(())
    }

    /// Add a chunk of mono float samples at 16kHz to the current capture.
    pub fn add_audio(&mut self, samples: &[f32]) {
        if !self.recording {
            warn!(samples = samples.len(), "Ignoring audio added outside a capture");
            return;
        }
        self.audio.add_samples(samples);
    }

    /// Finish the capture and send everything recorded as one raw PCM body.
    ///
    /// Uses the last context the session held; no credentials need to be
    /// supplied again.
    pub async fn stop_audio(&mut self) -> Response {
        if !self.recording {
            return Self::local_failure(ConversationError::InvalidArgument(
                CAPTURE_NOT_STARTED_MESSAGE.to_string(),
            ));
        }

        let duration_secs = self.audio.duration_seconds();
        let pcm = self.audio.drain();
        self.audio.flush();
        self.recording = false;
        info!(
            bytes = pcm.len(),
            duration_secs = duration_secs,
            "Audio capture stopped"
        );

        self.send(Intent::SendAudio(pcm), None).await
    }

    /// Conversation id from the last successful response, if any.
    pub fn conversation_id(&self) -> Option<&str> {
        self.request
            .as_ref()
            .and_then(|ctx| ctx.conversation_id.as_deref())
            .filter(|id| !id.is_empty())
    }

    /// Participant id from the last successful response, if any.
    pub fn participant_id(&self) -> Option<&str> {
        self.request
            .as_ref()
            .and_then(|ctx| ctx.participant_id.as_deref())
            .filter(|id| !id.is_empty())
    }

    pub fn state(&self) -> SessionState {
        if self.recording {
            SessionState::Recording
        } else if self.conversation_id().is_some() {
            SessionState::Active
        } else {
            SessionState::Unstarted
        }
    }

    /// The context the next call will use.
    pub fn request(&self) -> Option<&RequestContext> {
        self.request.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Install a supplied context and return the held one if it is usable.
    fn ensure_request(&mut self, request: Option<RequestContext>) -> ConversationResult<&RequestContext> {
        if let Some(request) = request {
            self.request = Some(request);
        }

        match &self.request {
            Some(ctx) if ctx.is_valid() => Ok(ctx),
            _ => Err(ConversationError::MissingRequest),
        }
    }

    /// Submit any intent. The named operations above all end up here.
    ///
    /// Local failures (missing credentials, bad arguments) come back as a
    /// failure response without touching the transport.
    pub async fn send(&mut self, intent: Intent, request: Option<RequestContext>) -> Response {
        let built = self
            .ensure_request(request)
            .and_then(|ctx| RequestBuilder::new(ctx).build(&intent));
        let api_request = match built {
            Ok(api_request) => api_request,
            Err(err) => return Self::local_failure(err),
        };

        debug!(
            intent = intent.kind(),
            endpoint = %api_request.endpoint,
            binary = api_request.body.is_binary(),
            "Request built"
        );

        let response = match self.transport.post(&api_request).await {
            Ok(raw) => Response::decode(raw),
            Err(err) => {
                error!(intent = intent.kind(), error = %err, "Transport failed");
                Response::from_error(&err)
            }
        };

        self.commit(&response);
        response
    }

    /// Thread identifiers from a successful response into the held context.
    /// Failed responses leave the context untouched so the call can be retried.
    ///
    /// Only the ids present in the response are overwritten; a reply without
    /// them (e.g. an empty timed-response check) keeps the current thread.
    /// See [`RequestContext::commit_identifiers`].
    fn commit(&mut self, response: &Response) {
        if !response.is_success() {
            warn!(
                code = response.status.code,
                message = %response.status.message,
                "Call failed"
            );
            return;
        }

        let previous = self.state();
        if let Some(ctx) = self.request.as_mut() {
            ctx.commit_identifiers(
                response.conversation_id.clone(),
                response.participant_id.clone(),
            );
        }

        let current = self.state();
        if previous != current {
            info!(
                from = previous.as_str(),
                to = current.as_str(),
                conversation_id = ?self.conversation_id(),
                "Session state changed"
            );
        }
    }

    fn local_failure(err: ConversationError) -> Response {
        warn!(error = %err, "Call rejected locally");
        Response::from_error(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::ApiRequest;
    use crate::response::RawResponse;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Replays canned responses and records every request it receives.
    #[derive(Default)]
    struct ScriptedTransport {
        responses: Mutex<VecDeque<RawResponse>>,
        requests: Mutex<Vec<ApiRequest>>,
    }

    impl ScriptedTransport {
        fn with(responses: Vec<RawResponse>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<ApiRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for ScriptedTransport {
        async fn post(&self, request: &ApiRequest) -> ConversationResult<RawResponse> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(self
                .responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| RawResponse::ok(json!({}))))
        }
    }

    fn started() -> RawResponse {
        RawResponse::ok(json!({ "conversation": "c1", "participant": "p1" }))
    }

    #[tokio::test]
    async fn test_start_assigns_identifiers() {
        let mut conversation = Conversation::new(ScriptedTransport::with(vec![started()]));
        assert_eq!(conversation.state(), SessionState::Unstarted);
        assert_eq!(conversation.conversation_id(), None);

        let response = conversation
            .start("proj", Some(RequestContext::new("key").with_time_zone_offset(3600)))
            .await;

        assert!(response.is_success());
        assert_eq!(conversation.conversation_id(), Some("c1"));
        assert_eq!(conversation.participant_id(), Some("p1"));
        assert_eq!(conversation.state(), SessionState::Active);

        let requests = conversation.transport().requests();
        assert_eq!(requests[0].endpoint, "conversation");
        assert_eq!(
            requests[0].body.as_json(),
            Some(&json!({ "project": "proj", "time_zone_offset": 3600 }))
        );
    }

    #[tokio::test]
    async fn test_next_call_uses_new_identifiers() {
        let mut conversation = Conversation::new(ScriptedTransport::with(vec![started()]));
        conversation.start("proj", Some(RequestContext::new("key"))).await;
        conversation.send_text("janet", None).await;

        let requests = conversation.transport().requests();
        assert_eq!(requests[1].endpoint, "conversation/c1");
        assert_eq!(
            requests[1].body.as_json(),
            Some(&json!({ "text": "janet", "participant": "p1" }))
        );
    }

    #[tokio::test]
    async fn test_failed_response_keeps_identifiers() {
        let mut conversation = Conversation::new(ScriptedTransport::with(vec![
            started(),
            RawResponse::new(400, json!({ "conversation": "c9", "message": "Invalid response id" })),
        ]));
        conversation.start("proj", Some(RequestContext::new("key"))).await;

        let response = conversation.go_to("missing", None).await;
        assert!(!response.is_success());
        assert_eq!(response.status.message, "Invalid response id");
        assert_eq!(conversation.conversation_id(), Some("c1"));

        conversation.check_for_timed_response(None).await;
        let requests = conversation.transport().requests();
        assert_eq!(requests[2].endpoint, "conversation/c1");
    }

    #[tokio::test]
    async fn test_missing_key_never_reaches_transport() {
        let mut conversation = Conversation::new(ScriptedTransport::default());

        let response = conversation.send_text("hello", None).await;
        assert!(!response.is_success());
        assert_eq!(response.status.message, "Valid request object missing");
        assert_eq!(response.status.code, 500);

        let response = conversation.start("proj", Some(RequestContext::default())).await;
        assert_eq!(response.status.message, "Valid request object missing");

        let failure = conversation.start_audio(None).unwrap_err();
        assert!(!failure.is_success());
        assert_eq!(failure.status.message, "Valid request object missing");
        assert_eq!(failure.status.code, 500);
        assert_ne!(conversation.state(), SessionState::Recording);
        assert!(conversation.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_progressive_capture_reuses_context() {
        let mut conversation = Conversation::new(ScriptedTransport::with(vec![started()]));
        conversation.start("proj", Some(RequestContext::new("key"))).await;

        conversation.start_audio(None).unwrap();
        assert_eq!(conversation.state(), SessionState::Recording);
        conversation.add_audio(&[0.0, 0.5]);
        conversation.add_audio(&[-0.5]);
        let response = conversation.stop_audio().await;
        assert!(response.is_success());
        assert_eq!(conversation.state(), SessionState::Active);

        let requests = conversation.transport().requests();
        let audio = &requests[1];
        assert_eq!(audio.endpoint, "conversation/c1");
        assert_eq!(audio.header("Authorization"), Some("Bearer key"));
        assert_eq!(audio.header("Content-Type"), Some("audio/l16; rate=16000"));
        assert_eq!(
            audio.body,
            crate::request::Body::Binary(vec![0x00, 0x00, 0x00, 0x40, 0x00, 0xC0])
        );
    }

    #[tokio::test]
    async fn test_stop_without_start_is_local_failure() {
        let mut conversation = Conversation::new(ScriptedTransport::default());
        conversation.add_audio(&[0.1]);
        let response = conversation.stop_audio().await;
        assert_eq!(response.status.message, CAPTURE_NOT_STARTED_MESSAGE);
        assert!(conversation.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_audio_format_is_local() {
        let mut conversation = Conversation::new(ScriptedTransport::default());
        let response = conversation
            .send_audio(&[0u8; 64], AudioFormat::RawPcm16k, Some(RequestContext::new("key")))
            .await;
        assert_eq!(response.status.message, "Unsupported format sent to sendAudio.");
        assert!(conversation.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_empty_audio_is_local() {
        let mut conversation = Conversation::new(ScriptedTransport::default());
        let response = conversation
            .send_audio(&[], AudioFormat::Wav16k, Some(RequestContext::new("key")))
            .await;
        assert!(!response.is_success());
        assert_eq!(response.status.message, "Unable to extract audio data");
        assert_eq!(response.status.code, 500);
        assert!(conversation.transport().requests().is_empty());
    }
}
