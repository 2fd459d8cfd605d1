use anyhow::{Context, Result};
use memchr::memchr;
use serde::Deserialize;

/// A decoded server-sent event from a streaming chat completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SseEvent {
    Delta(String),
    Done,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: StreamDelta,
}

#[derive(Debug, Default, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Drain every complete line from `buffer`, leaving a trailing partial line
/// in place for the next network chunk.
///
/// Decoding stops after `[DONE]` or the first undecodable line; in both cases
/// the rest of the buffer is discarded.
pub(crate) fn drain_events(buffer: &mut Vec<u8>) -> Vec<Result<SseEvent>> {
    let mut events = Vec::new();

    while let Some(newline_pos) = memchr(b'\n', buffer) {
        let line: Vec<u8> = buffer.drain(..=newline_pos).collect();
        let decoded = std::str::from_utf8(&line)
            .context("Invalid UTF-8 in response stream")
            .and_then(|line| decode_line(line.trim()));

        match decoded {
            Ok(None) => {}
            Ok(Some(event)) => {
                let done = event == SseEvent::Done;
                events.push(Ok(event));
                if done {
                    buffer.clear();
                    break;
                }
            }
            Err(error) => {
                events.push(Err(error));
                buffer.clear();
                break;
            }
        }
    }

    events
}

/// Decode whatever is left in `buffer` once the body has ended. The last
/// line of a response may arrive without a trailing newline.
pub(crate) fn drain_remainder(buffer: &mut Vec<u8>) -> Option<Result<SseEvent>> {
    if buffer.is_empty() {
        return None;
    }
    let rest = std::mem::take(buffer);
    std::str::from_utf8(&rest)
        .context("Invalid UTF-8 in response stream")
        .and_then(|line| decode_line(line.trim()))
        .transpose()
}

fn decode_line(line: &str) -> Result<Option<SseEvent>> {
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(None);
    };
    let data = data.trim_start();

    if data == "[DONE]" {
        return Ok(Some(SseEvent::Done));
    }

    let chunk: StreamChunk = serde_json::from_str(data)
        .with_context(|| format!("Failed to parse streamed chunk JSON: {data}"))?;

    let content = chunk
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.delta.content)
        .filter(|content| !content.is_empty());

    Ok(content.map(SseEvent::Delta))
}
