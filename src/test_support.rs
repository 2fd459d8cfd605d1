//! Scripted `LlmClient` used by unit tests across the crate.

use std::sync::Mutex;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures_util::stream;

use crate::client::{ChatCompletionRequest, ChunkStream, LlmClient};

pub(crate) enum Reply {
    Deltas(Vec<String>),
    /// Yields the deltas, then fails mid-stream.
    Interrupted(Vec<String>),
    Rejected,
}

pub(crate) struct ScriptedClient {
    models: Result<Vec<String>, String>,
    replies: Mutex<Vec<Reply>>,
    requests: Mutex<Vec<ChatCompletionRequest>>,
}

impl ScriptedClient {
    pub(crate) fn new(replies: Vec<Reply>) -> Self {
        Self {
            models: Ok(Vec::new()),
            replies: Mutex::new(replies),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn replying(deltas: &[&str]) -> Self {
        Self::new(vec![Reply::Deltas(
            deltas.iter().map(|delta| delta.to_string()).collect(),
        )])
    }

    pub(crate) fn with_models(mut self, models: &[&str]) -> Self {
        self.models = Ok(models.iter().map(|model| model.to_string()).collect());
        self
    }

    pub(crate) fn with_model_listing_error(mut self, message: &str) -> Self {
        self.models = Err(message.to_string());
        self
    }

    pub(crate) fn recorded_requests(&self) -> Vec<ChatCompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedClient {
    async fn list_models(&self) -> Result<Vec<String>> {
        self.models.clone().map_err(|message| anyhow!(message))
    }

    async fn stream_chat_completion(&self, request: ChatCompletionRequest) -> Result<ChunkStream> {
        self.requests.lock().unwrap().push(request);

        let mut replies = self.replies.lock().unwrap();
        if replies.is_empty() {
            return Err(anyhow!("no scripted reply left"));
        }

        match replies.remove(0) {
            Reply::Deltas(deltas) => {
                let items = deltas.into_iter().map(Ok::<String, anyhow::Error>);
                Ok(Box::pin(stream::iter(items)))
            }
            Reply::Interrupted(deltas) => {
                let items = deltas
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(anyhow!("connection reset by peer"))));
                Ok(Box::pin(stream::iter(items)))
            }
            Reply::Rejected => Err(anyhow!(
                "Service is temporarily unavailable. Please try again later."
            )),
        }
    }
}
