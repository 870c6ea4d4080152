//! # Conversation Client - Console Entry Point
//!
//! Interactive console for talking to a conversation project.
//!
//! ## What it does:
//! 1. **Loads configuration** from conversation.toml and environment variables
//! 2. **Sets up logging** with tracing
//! 3. **Starts the conversation** on the configured project
//! 4. **Reads lines from stdin** and turns each into a call
//! 5. **Polls timed responses** when the service asks for it
//!
//! ## Commands:
//! - plain text: sent as user input
//! - `/activity NAME`, `/event NAME [JSON]`, `/goto RESPONSE_ID`
//! - `/get ["NAME", ...]`, `/set [{"name": "NAME", "value": ...}, ...]`
//! - `/audio PATH.wav`, `/timed`, `/ids`, `/quit`

use anyhow::{Context, Result};
use conversation_client::config::AppConfig;
use conversation_client::{
    AudioFormat, Conversation, HttpTransport, Intent, LoggingTransport, Output, Response,
    Transport,
};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// One line of console input.
#[derive(Debug, PartialEq)]
enum Command {
    Text(String),
    Activity(String),
    Event {
        name: String,
        parameters: Option<Map<String, Value>>,
    },
    GoTo(String),
    GetEntities(Value),
    SetEntities(Value),
    Audio(PathBuf),
    Timed,
    Ids,
    Quit,
    Empty,
    Invalid(String),
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    dotenv::dotenv().ok();

    init_tracing()?;

    let config = AppConfig::load().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    info!("Starting conversation-client v{}", env!("CARGO_PKG_VERSION"));
    info!(base_url = %config.http.base_url, project = %config.session.project, "Configuration loaded");

    let transport = HttpTransport::with_base_url(&config.http.base_url, config.timeout())
        .context("failed to create HTTP transport")?;
    let mut conversation = Conversation::new(LoggingTransport::new(transport));

    let response = conversation
        .start(&config.session.project, Some(config.request_context()))
        .await;
    print_response(&response);
    follow_timed_responses(&mut conversation, response).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        // Stop on Ctrl+C as well as end of input
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                None
            }
        };
        let Some(line) = line else { break };

        let response = match parse_command(&line) {
            Command::Empty => continue,
            Command::Quit => break,
            Command::Ids => {
                println!(
                    "conversation: {}  participant: {}",
                    conversation.conversation_id().unwrap_or("-"),
                    conversation.participant_id().unwrap_or("-")
                );
                continue;
            }
            Command::Invalid(message) => {
                println!("! {}", message);
                continue;
            }
            Command::Text(text) => conversation.send_text(&text, None).await,
            Command::Activity(activity) => conversation.send_activity(&activity, None).await,
            Command::Event { name, parameters } => {
                conversation.send_event(&name, parameters, None).await
            }
            Command::GoTo(response_id) => conversation.go_to(&response_id, None).await,
            Command::Timed => conversation.check_for_timed_response(None).await,
            Command::GetEntities(value) => match Intent::get_entities_from_value(value) {
                Ok(intent) => conversation.send(intent, None).await,
                Err(err) => Response::from_error(&err),
            },
            Command::SetEntities(value) => match Intent::set_entities_from_value(value) {
                Ok(intent) => conversation.send(intent, None).await,
                Err(err) => Response::from_error(&err),
            },
            Command::Audio(path) => match tokio::fs::read(&path).await {
                Ok(bytes) => conversation.send_audio(&bytes, AudioFormat::Wav16k, None).await,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Unable to read audio file");
                    println!("! cannot read {}: {}", path.display(), e);
                    continue;
                }
            },
        };

        print_response(&response);
        follow_timed_responses(&mut conversation, response).await;
    }

    info!("Conversation ended");
    Ok(())
}

/// Initialize the tracing (logging) system.
///
/// ## Environment Variables:
/// - `RUST_LOG`: Controls what gets logged (e.g. "debug", "conversation_client=debug")
/// - If not set, defaults to "conversation_client=info"
fn init_tracing() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "conversation_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("failed to initialize tracing")?;

    Ok(())
}

fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Empty;
    }
    if !line.starts_with('/') {
        return Command::Text(line.to_string());
    }

    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "/quit" | "/exit" => Command::Quit,
        "/ids" => Command::Ids,
        "/timed" => Command::Timed,
        "/activity" if !rest.is_empty() => Command::Activity(rest.to_string()),
        "/goto" if !rest.is_empty() => Command::GoTo(rest.to_string()),
        "/audio" if !rest.is_empty() => Command::Audio(PathBuf::from(rest)),
        "/event" if !rest.is_empty() => parse_event(rest),
        "/get" => parse_json(rest).map_or_else(Command::Invalid, Command::GetEntities),
        "/set" => parse_json(rest).map_or_else(Command::Invalid, Command::SetEntities),
        _ => Command::Invalid(format!("unknown or incomplete command: {}", line)),
    }
}

fn parse_event(rest: &str) -> Command {
    let (name, parameters) = match rest.split_once(char::is_whitespace) {
        Some((name, json)) => (name, Some(json.trim())),
        None => (rest, None),
    };

    match parameters.map(serde_json::from_str::<Map<String, Value>>) {
        None => Command::Event {
            name: name.to_string(),
            parameters: None,
        },
        Some(Ok(parameters)) => Command::Event {
            name: name.to_string(),
            parameters: Some(parameters),
        },
        Some(Err(e)) => Command::Invalid(format!("event parameters must be a JSON object: {}", e)),
    }
}

fn parse_json(rest: &str) -> Result<Value, String> {
    serde_json::from_str(rest).map_err(|e| format!("invalid JSON: {}", e))
}

fn print_response(response: &Response) {
    if !response.status.success {
        println!("! [{}] {}", response.status.code, response.status.message);
        return;
    }

    if let Some(hypothesis) = &response.asr_hypothesis {
        println!("(heard: {})", hypothesis);
    }

    for output in &response.outputs {
        match output {
            Output::Text { text, character, .. } => match character {
                Some(character) => println!("{}: {}", character, text),
                None => println!("> {}", text),
            },
            Output::Behavior {
                behavior,
                parameters,
                ..
            } => println!("* {} {}", behavior, Value::Object(parameters.clone())),
            Output::Unknown => {}
        }
    }

    for entity in &response.entities {
        println!("= {} = {}", entity.name, entity.value);
    }
}

/// Caller-driven polling: wait the interval the service asked for, then ask
/// for the timed response, for as long as the service keeps asking.
async fn follow_timed_responses<T: Transport>(conversation: &mut Conversation<T>, mut response: Response) {
    while let Some(interval) = response.timed_response_interval {
        let delay = Duration::try_from_secs_f64(interval).unwrap_or(Duration::ZERO);
        info!(delay_ms = delay.as_millis() as u64, "Waiting for timed response");
        tokio::time::sleep(delay).await;

        response = conversation.check_for_timed_response(None).await;
        print_response(&response);
        if !response.status.success {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_text() {
        assert_eq!(parse_command("  janet "), Command::Text("janet".to_string()));
        assert_eq!(parse_command("   "), Command::Empty);
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse_command("/quit"), Command::Quit);
        assert_eq!(parse_command("/timed"), Command::Timed);
        assert_eq!(parse_command("/activity wizard"), Command::Activity("wizard".to_string()));
        assert_eq!(
            parse_command("/goto d6701507-61a9-47d9-8300-2e9c6b08dfcd"),
            Command::GoTo("d6701507-61a9-47d9-8300-2e9c6b08dfcd".to_string())
        );
        assert_eq!(parse_command("/audio res/test.wav"), Command::Audio(PathBuf::from("res/test.wav")));
    }

    #[test]
    fn test_event_command() {
        assert_eq!(
            parse_command("/event tap"),
            Command::Event {
                name: "tap".to_string(),
                parameters: None
            }
        );

        match parse_command(r#"/event tap {"x": 1}"#) {
            Command::Event { name, parameters } => {
                assert_eq!(name, "tap");
                assert_eq!(parameters.unwrap()["x"], json!(1));
            }
            other => panic!("unexpected command {:?}", other),
        }

        assert!(matches!(parse_command("/event tap [1]"), Command::Invalid(_)));
    }

    #[test]
    fn test_entity_commands_keep_raw_json() {
        assert_eq!(parse_command(r#"/get ["NAME"]"#), Command::GetEntities(json!(["NAME"])));
        // Shape is checked when the intent is built, not while parsing
        assert_eq!(parse_command(r#"/get "NAME""#), Command::GetEntities(json!("NAME")));
        assert!(matches!(parse_command("/set [oops"), Command::Invalid(_)));
    }

    #[test]
    fn test_incomplete_commands() {
        assert!(matches!(parse_command("/activity"), Command::Invalid(_)));
        assert!(matches!(parse_command("/unknown thing"), Command::Invalid(_)));
    }
}
