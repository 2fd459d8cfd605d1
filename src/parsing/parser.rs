use anyhow::{Result, bail};

use crate::code_change::CodeChange;

const BLOCK_START: &str = "@@start";
const BLOCK_CODE: &str = "@@code";
const BLOCK_END: &str = "@@end";

/// Something the parser recognised in the stream, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedEvent {
    ExplanationLine(String),
    Change(CodeChange),
}

#[derive(Debug)]
enum BlockState {
    Explanation,
    Header(Vec<String>),
    Code { header: String, lines: Vec<String> },
}

/// Incremental parser for a streamed model reply.
///
/// Deltas may split lines (or markers) anywhere; only complete lines are
/// interpreted, so feeding the reply in one piece or one byte at a time
/// yields the same result.
#[derive(Debug)]
pub struct ResponseParser {
    message: String,
    partial_line: String,
    state: BlockState,
    explanation_lines: Vec<String>,
    changes: Vec<CodeChange>,
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseParser {
    pub fn new() -> Self {
        Self {
            message: String::new(),
            partial_line: String::new(),
            state: BlockState::Explanation,
            explanation_lines: Vec::new(),
            changes: Vec::new(),
        }
    }

    pub fn push(&mut self, delta: &str) -> Result<Vec<ParsedEvent>> {
        self.message.push_str(delta);
        self.partial_line.push_str(delta);

        let mut events = Vec::new();
        while let Some(newline_pos) = self.partial_line.find('\n') {
            let line: String = self.partial_line.drain(..=newline_pos).collect();
            if let Some(event) = self.process_line(line.trim_end_matches(['\n', '\r']))? {
                events.push(event);
            }
        }
        Ok(events)
    }

    /// Flush the trailing line and check that no change block was left open.
    pub fn finish(&mut self) -> Result<Vec<ParsedEvent>> {
        let mut events = Vec::new();
        if !self.partial_line.is_empty() {
            let line = std::mem::take(&mut self.partial_line);
            if let Some(event) = self.process_line(line.trim_end_matches('\r'))? {
                events.push(event);
            }
        }

        if !matches!(self.state, BlockState::Explanation) {
            bail!("Model response ended inside an unterminated change block");
        }
        Ok(events)
    }

    /// Raw reply text, explanation, and parsed changes.
    pub fn into_parts(self) -> (String, String, Vec<CodeChange>) {
        let explanation = self.explanation_lines.join("\n").trim().to_string();
        (self.message, explanation, self.changes)
    }

    fn process_line(&mut self, line: &str) -> Result<Option<ParsedEvent>> {
        let marker = line.trim();
        let state = std::mem::replace(&mut self.state, BlockState::Explanation);

        let (next_state, event) = match state {
            BlockState::Explanation if marker == BLOCK_START => {
                (BlockState::Header(Vec::new()), None)
            }
            BlockState::Explanation => {
                self.explanation_lines.push(line.to_string());
                (
                    BlockState::Explanation,
                    Some(ParsedEvent::ExplanationLine(line.to_string())),
                )
            }
            BlockState::Header(lines) if marker == BLOCK_CODE => (
                BlockState::Code {
                    header: lines.join("\n"),
                    lines: Vec::new(),
                },
                None,
            ),
            BlockState::Header(lines) if marker == BLOCK_END => {
                let change = CodeChange::from_header(&lines.join("\n"), Vec::new())?;
                if change.action.needs_code() {
                    bail!(
                        "Change to {} ({}) has no {BLOCK_CODE} section",
                        change.file.display(),
                        change.action
                    );
                }
                self.changes.push(change.clone());
                (BlockState::Explanation, Some(ParsedEvent::Change(change)))
            }
            BlockState::Header(_) if marker == BLOCK_START => {
                bail!("Found {BLOCK_START} inside an unfinished change header")
            }
            BlockState::Header(mut lines) => {
                lines.push(line.to_string());
                (BlockState::Header(lines), None)
            }
            BlockState::Code { header, lines } if marker == BLOCK_END => {
                let event = self.complete_change(&header, lines)?;
                (BlockState::Explanation, Some(event))
            }
            BlockState::Code { header, mut lines } => {
                lines.push(line.to_string());
                (BlockState::Code { header, lines }, None)
            }
        };

        self.state = next_state;
        Ok(event)
    }

    fn complete_change(&mut self, header: &str, lines: Vec<String>) -> Result<ParsedEvent> {
        let change = CodeChange::from_header(header, lines)?;
        self.changes.push(change.clone());
        Ok(ParsedEvent::Change(change))
    }
}
