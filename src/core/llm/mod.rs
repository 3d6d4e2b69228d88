//! Language-model completion providers.

mod openai;

use async_trait::async_trait;
use serde::Serialize;

pub use openai::{OPENAI_CHAT_URL, OpenAIChat, OpenAIConfig};

#[derive(Debug, Clone, thiserror::Error)]
pub enum LLMError {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Provider error ({status}): {body}")]
    ProviderError { status: u16, body: String },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

pub type LLMResult<T> = Result<T, LLMError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A chat-completion backend.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Complete the conversation.
    ///
    /// `Ok(None)` means the provider answered without any content; callers
    /// treat that as an empty turn rather than an error.
    async fn complete(&self, messages: &[ChatMessage]) -> LLMResult<Option<String>>;

    fn provider_name(&self) -> &'static str;
}
