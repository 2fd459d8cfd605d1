//! Drives one streaming chat completion and turns the reply into an
//! explanation plus a list of proposed code changes.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use futures_util::StreamExt;
use tracing::debug;

use crate::client::{ChatCompletionRequest, ChatMessage, DynLlmClient};
use crate::code_change::CodeChange;

mod parser;

pub use parser::{ParsedEvent, ResponseParser};

const RESPONSE_TEMPERATURE: f32 = 0.5;

/// Result of a single model round-trip.
#[derive(Debug, Clone)]
pub struct ResponseState {
    /// Raw reply text, replayed verbatim as the assistant turn.
    pub message: String,
    pub explanation: String,
    pub code_changes: Vec<CodeChange>,
    pub elapsed: Duration,
}

pub async fn stream_and_parse_response(
    client: &DynLlmClient,
    messages: Vec<ChatMessage>,
    model: &str,
) -> Result<ResponseState> {
    let started = Instant::now();
    let request = ChatCompletionRequest {
        model: model.to_string(),
        messages,
        temperature: Some(RESPONSE_TEMPERATURE),
    };

    let mut stream = client
        .stream_chat_completion(request)
        .await
        .context("Chat completion request failed")?;

    let mut parser = ResponseParser::new();
    while let Some(delta) = stream.next().await {
        let delta = delta.context("Chat completion stream failed")?;
        for event in parser.push(&delta)? {
            display_event(&event);
        }
    }
    for event in parser.finish()? {
        display_event(&event);
    }

    let elapsed = started.elapsed();
    let (message, explanation, code_changes) = parser.into_parts();
    debug!(
        changes = code_changes.len(),
        elapsed_ms = elapsed.as_millis() as u64,
        "model response parsed"
    );

    Ok(ResponseState {
        message,
        explanation,
        code_changes,
        elapsed,
    })
}

fn display_event(event: &ParsedEvent) {
    match event {
        ParsedEvent::ExplanationLine(line) => println!("{line}"),
        ParsedEvent::Change(change) => debug!(%change, "parsed code change"),
    }
}
