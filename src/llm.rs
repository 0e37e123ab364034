use anyhow::{Context, Result};
use async_trait::async_trait;
use ollama_rs::{
    generation::chat::{request::ChatMessageRequest, ChatMessage},
    Ollama,
};
use reqwest::Url;
use tracing::debug;

use crate::conversation::{Role, Turn};

/// Opaque text generation: role-tagged turns in, one completion out.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn complete(&self, history: &[Turn]) -> Result<String>;
}

/// Chat completions served by a local Ollama instance.
pub struct OllamaBackend {
    client: Ollama,
    model: String,
}

impl OllamaBackend {
    pub fn new(url: &str, port: u16, model: &str) -> Result<Self> {
        let url = Url::parse(url).with_context(|| format!("invalid Ollama URL {url:?}"))?;
        Ok(Self {
            client: Ollama::new(url, port),
            model: model.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

fn to_chat_message(turn: &Turn) -> ChatMessage {
    match turn.role {
        Role::System => ChatMessage::system(turn.content.clone()),
        Role::User => ChatMessage::user(turn.content.clone()),
        Role::Assistant => ChatMessage::assistant(turn.content.clone()),
    }
}

#[async_trait]
impl ChatBackend for OllamaBackend {
    async fn complete(&self, history: &[Turn]) -> Result<String> {
        let messages = history.iter().map(to_chat_message).collect();
        let request = ChatMessageRequest::new(self.model.clone(), messages);

        let start = std::time::Instant::now();
        let resp = self
            .client
            .send_chat_messages(request)
            .await
            .with_context(|| format!("Ollama chat with model {} failed", self.model))?;
        debug!(
            "Model {} answered in {:.1} seconds",
            self.model,
            start.elapsed().as_secs_f64()
        );

        Ok(resp.message.content)
    }
}
