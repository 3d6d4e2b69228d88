use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ChatMessage, LLMError, LLMResult, LanguageModel};
use crate::utils::req_manager::ReqManager;

pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Settings for the OpenAI chat-completions client
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    pub api_key: String,
    pub model: String,
    pub endpoint: String,
    pub temperature: Option<f64>,
    /// Replies are spoken aloud, so they are kept short
    pub max_tokens: Option<u32>,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            endpoint: OPENAI_CHAT_URL.to_string(),
            temperature: Some(0.7),
            max_tokens: Some(150),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatMessageResponse>,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

/// Extract the first non-empty completion from a raw response body.
fn parse_completion(body: &str) -> LLMResult<Option<String>> {
    let parsed: ChatResponse = serde_json::from_str(body)
        .map_err(|e| LLMError::InvalidResponse(format!("Failed to parse completion: {e}")))?;

    Ok(parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty()))
}

pub struct OpenAIChat {
    config: OpenAIConfig,
    req_manager: Arc<ReqManager>,
}

impl OpenAIChat {
    pub fn new(config: OpenAIConfig, req_manager: Arc<ReqManager>) -> LLMResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LLMError::InvalidConfiguration(
                "API key is required for OpenAI".to_string(),
            ));
        }
        Ok(Self {
            config,
            req_manager,
        })
    }

    fn build_request(&self, client: &reqwest::Client, messages: &[ChatMessage]) -> reqwest::RequestBuilder {
        let body = ChatRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
    }
}

#[async_trait]
impl LanguageModel for OpenAIChat {
    async fn complete(&self, messages: &[ChatMessage]) -> LLMResult<Option<String>> {
        let guard = self
            .req_manager
            .acquire()
            .await
            .map_err(|e| LLMError::NetworkError(e.to_string()))?;

        let request = self.build_request(guard.client(), messages);
        let response = guard
            .send(request)
            .await
            .map_err(|e| LLMError::NetworkError(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LLMError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            return Err(LLMError::ProviderError {
                status: status.as_u16(),
                body,
            });
        }

        debug!("OpenAI completion received ({} bytes)", body.len());
        parse_completion(&body)
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::llm::ChatRole;
    use crate::utils::req_manager::ReqManagerConfig;

    fn client() -> OpenAIChat {
        let req = Arc::new(ReqManager::new(ReqManagerConfig::default()).unwrap());
        OpenAIChat::new(OpenAIConfig::new("sk-test", "gpt-4o-mini"), req).unwrap()
    }

    #[test]
    fn test_missing_api_key_rejected() {
        let req = Arc::new(ReqManager::new(ReqManagerConfig::default()).unwrap());
        let result = OpenAIChat::new(OpenAIConfig::new("  ", "gpt-4o-mini"), req);
        assert!(matches!(result, Err(LLMError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_request_shape() {
        let llm = client();
        let messages = vec![
            ChatMessage::new(ChatRole::System, "Eres un agente"),
            ChatMessage::new(ChatRole::User, "hola"),
        ];
        let request = llm
            .build_request(&reqwest::Client::new(), &messages)
            .build()
            .unwrap();

        assert_eq!(request.url().as_str(), OPENAI_CHAT_URL);
        assert_eq!(
            request.headers()["authorization"].to_str().unwrap(),
            "Bearer sk-test"
        );

        let body: serde_json::Value =
            serde_json::from_slice(request.body().unwrap().as_bytes().unwrap()).unwrap();
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["content"], "hola");
        assert_eq!(body["max_tokens"], 150);
        assert_eq!(body["temperature"], 0.7);
    }

    #[test]
    fn test_parse_completion_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":" ¡Claro! "}}]}"#;
        assert_eq!(parse_completion(body).unwrap().as_deref(), Some("¡Claro!"));
    }

    #[test]
    fn test_parse_completion_without_content() {
        for body in [
            r#"{"choices":[]}"#,
            r#"{}"#,
            r#"{"choices":[{"message":{"content":null}}]}"#,
            r#"{"choices":[{"message":{"content":"   "}}]}"#,
        ] {
            assert_eq!(parse_completion(body).unwrap(), None, "body: {body}");
        }
    }

    #[test]
    fn test_parse_completion_garbage() {
        assert!(matches!(
            parse_completion("<html>bad gateway</html>"),
            Err(LLMError::InvalidResponse(_))
        ));
    }
}
