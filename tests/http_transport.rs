//! HttpTransport against a mock service.

use conversation_client::request::{Intent, RequestBuilder};
use conversation_client::transport::http::DEFAULT_TIMEOUT;
use conversation_client::{
    Conversation, HttpTransport, LoggingTransport, RequestContext, Response, Transport,
};
use serde_json::json;
use wiremock::matchers::{body_bytes, body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport(server: &MockServer) -> HttpTransport {
    HttpTransport::with_base_url(&format!("{}/v1", server.uri()), DEFAULT_TIMEOUT).unwrap()
}

#[tokio::test]
async fn start_posts_json_to_conversation_resource() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/conversation"))
        .and(header("Authorization", "Bearer test-key"))
        .and(header("Content-Type", "application/json"))
        .and(header("Accept", "application/json"))
        .and(query_param("locale", "en-US"))
        .and(body_json(json!({ "project": "proj", "build_type": "staging" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversation": "c1",
            "participant": "p1",
            "outputs": [{ "type": "dialog", "id": "o1", "text": "Hello" }],
            "timed_response_interval": 2.5
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = RequestContext::new("test-key")
        .with_locale("en-US")
        .with_build_type(conversation_client::BuildType::Staging);
    let mut conversation = Conversation::new(LoggingTransport::new(transport(&server)));
    let response = conversation.start("proj", Some(ctx)).await;

    assert!(response.is_success());
    assert_eq!(response.texts(), vec!["Hello"]);
    assert_eq!(response.timed_response_interval, Some(2.5));
    assert_eq!(conversation.conversation_id(), Some("c1"));

    // Unset language is left off the query string
    let received = server.received_requests().await.unwrap();
    assert!(!received[0].url.query_pairs().any(|(key, _)| key == "asr_language"));
}

#[tokio::test]
async fn audio_is_posted_as_raw_pcm() {
    let server = MockServer::start().await;
    let pcm = vec![0x00, 0x00, 0x00, 0x40, 0x00, 0xC0];

    Mock::given(method("POST"))
        .and(path("/v1/conversation/c1"))
        .and(header("Content-Type", "audio/l16; rate=16000"))
        .and(query_param("asr_language", "en-US"))
        .and(body_bytes(pcm.clone()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "conversation": "c1",
            "asr_hypothesis": "hello"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = RequestContext::new("test-key")
        .with_conversation("c1")
        .with_language("en-US");
    let request = RequestBuilder::new(&ctx).build(&Intent::SendAudio(pcm)).unwrap();
    let raw = transport(&server).post(&request).await.unwrap();

    let response = Response::decode(raw);
    assert_eq!(response.asr_hypothesis.as_deref(), Some("hello"));
}

#[tokio::test]
async fn error_status_is_returned_with_remote_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/conversation/c1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error": { "message": "Conversation not found" }
        })))
        .mount(&server)
        .await;

    let ctx = RequestContext::new("test-key").with_conversation("c1");
    let mut conversation = Conversation::new(transport(&server));
    let response = conversation.send_text("hi", Some(ctx)).await;

    assert!(!response.is_success());
    assert_eq!(response.status.code, 404);
    assert_eq!(response.status.message, "Conversation not found");
    assert_eq!(conversation.conversation_id(), Some("c1"));
}

#[tokio::test]
async fn plain_text_error_body_is_kept() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let ctx = RequestContext::new("test-key");
    let request = RequestBuilder::new(&ctx).build(&Intent::start("proj", None)).unwrap();
    let raw = transport(&server).post(&request).await.unwrap();

    assert_eq!(raw.status, 502);
    assert_eq!(raw.body, json!("Bad Gateway"));
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);

    let transport = HttpTransport::with_base_url(&uri, DEFAULT_TIMEOUT).unwrap();
    let mut conversation = Conversation::new(transport);
    let response = conversation
        .start("proj", Some(RequestContext::new("test-key")))
        .await;

    assert!(!response.is_success());
    assert_eq!(response.status.code, 500);
    assert!(response.status.message.starts_with("Transport error"));
    assert_eq!(conversation.conversation_id(), None);
}
