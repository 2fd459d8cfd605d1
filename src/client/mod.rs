use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use futures_util::stream::{self, BoxStream, Stream, StreamExt};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LlmSettings;

mod sse;

use sse::{SseEvent, drain_events, drain_remainder};

/// Stream of text deltas produced by a streaming chat completion.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Seam between the conversation and the chat API.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Identifiers of every model the configured API key can use.
    async fn list_models(&self) -> Result<Vec<String>>;

    async fn stream_chat_completion(&self, request: ChatCompletionRequest) -> Result<ChunkStream>;
}

pub type DynLlmClient = dyn LlmClient;

#[derive(Debug, Clone)]
pub struct AIClient {
    http: Client,
    base_url: String,
    api_key: String,
    user_agent: String,
}

impl AIClient {
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let sanitized_base = settings.base_url.trim_end_matches('/').to_string();
        if sanitized_base.is_empty() {
            return Err(anyhow!("Base URL cannot be empty"));
        }

        let timeout = Duration::from_secs(settings.timeout_secs);
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: sanitized_base,
            api_key: settings.api_key.clone(),
            user_agent: settings.user_agent.clone(),
        })
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        match response.status() {
            status if status.is_success() => Ok(response),
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                let error_text = response.text().await.unwrap_or_default();
                let error_msg = if error_text.contains("quota") {
                    "API quota exceeded. Check your plan and billing details."
                } else {
                    "Rate limit exceeded. Please wait a moment and try again."
                };
                Err(anyhow!("{} (API response: {})", error_msg, error_text))
            }
            reqwest::StatusCode::UNAUTHORIZED => Err(anyhow!(
                "Invalid API key. Please check your API key configuration."
            )),
            reqwest::StatusCode::BAD_REQUEST => {
                let error_text = response.text().await.unwrap_or_default();
                Err(anyhow!("Invalid request: {}", error_text))
            }
            reqwest::StatusCode::INTERNAL_SERVER_ERROR
            | reqwest::StatusCode::BAD_GATEWAY
            | reqwest::StatusCode::SERVICE_UNAVAILABLE => Err(anyhow!(
                "Service is temporarily unavailable. Please try again later."
            )),
            status => {
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                Err(anyhow!("API error (status {}): {}", status, error_text))
            }
        }
    }
}

#[async_trait]
impl LlmClient for AIClient {
    async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/models", self.base_url);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.api_key)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .context("Failed to send request to models endpoint")?;

        let models: ModelListResponse = Self::check_status(response)
            .await?
            .json()
            .await
            .context("Failed to parse model list response JSON")?;

        Ok(models.data.into_iter().map(|model| model.id).collect())
    }

    async fn stream_chat_completion(&self, request: ChatCompletionRequest) -> Result<ChunkStream> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(
            model = %request.model,
            messages = request.messages.len(),
            "sending streaming chat completion"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .header("User-Agent", &self.user_agent)
            .header("Content-Type", "application/json")
            .json(&StreamingRequest {
                inner: &request,
                stream: true,
            })
            .send()
            .await
            .context("Failed to send request to chat completions endpoint")?;

        let response = Self::check_status(response).await?;
        let bytes = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed();

        Ok(decode_stream(bytes))
    }
}

struct DecodeState {
    bytes: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    buffer: Vec<u8>,
    pending: VecDeque<Result<String>>,
    saw_done: bool,
    finished: bool,
}

impl DecodeState {
    fn accept(&mut self, event: Result<SseEvent>) {
        match event {
            Ok(SseEvent::Delta(text)) => self.pending.push_back(Ok(text)),
            Ok(SseEvent::Done) => {
                self.saw_done = true;
                self.finished = true;
            }
            Err(error) => {
                self.pending.push_back(Err(error));
                self.finished = true;
            }
        }
    }

    /// Called once the body is exhausted. A reply is only complete after `[DONE]`.
    fn end_of_body(&mut self) {
        self.finished = true;
        if let Some(event) = drain_remainder(&mut self.buffer) {
            let failed = event.is_err();
            self.accept(event);
            if failed {
                return;
            }
        }
        if !self.saw_done {
            self.pending
                .push_back(Err(anyhow!("Response stream ended before [DONE]")));
        }
    }
}

fn decode_stream(bytes: BoxStream<'static, reqwest::Result<Vec<u8>>>) -> ChunkStream {
    let state = DecodeState {
        bytes,
        buffer: Vec::new(),
        pending: VecDeque::new(),
        saw_done: false,
        finished: false,
    };

    let stream = stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.pending.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }

            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    state.buffer.extend_from_slice(&chunk);
                    for event in drain_events(&mut state.buffer) {
                        state.accept(event);
                    }
                }
                Some(Err(error)) => {
                    state.finished = true;
                    let error = anyhow::Error::new(error).context("Response stream interrupted");
                    state.pending.push_back(Err(error));
                }
                None => state.end_of_body(),
            }
        }
    });

    Box::pin(stream)
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Serialize)]
struct StreamingRequest<'a> {
    #[serde(flatten)]
    inner: &'a ChatCompletionRequest,
    stream: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatMessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatMessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Deserialize)]
struct ModelListResponse {
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}
