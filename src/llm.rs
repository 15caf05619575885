// Chat-completion wrapper around the multi-backend `llm` crate.

use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::ChatMessage;
use thiserror::Error;

/// Settings for one chat call. Temperature varies per task: regeneration
/// runs hotter than rule drafting.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub provider: String,
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
}

impl ChatSettings {
    pub fn new(provider: &str, model: &str, api_key: &str, temperature: f32) -> Self {
        Self {
            provider: provider.to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            temperature,
        }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("unknown LLM provider: {0}")]
    UnknownProvider(String),
    #[error("failed to build LLM client: {0}")]
    Build(String),
    #[error("chat request failed: {0}")]
    Chat(String),
    #[error("model returned an empty reply")]
    EmptyReply,
}

fn map_backend(provider: &str) -> Result<LLMBackend, LlmError> {
    match provider {
        "openai" => Ok(LLMBackend::OpenAI),
        "anthropic" => Ok(LLMBackend::Anthropic),
        "ollama" => Ok(LLMBackend::Ollama),
        other => Err(LlmError::UnknownProvider(other.to_string())),
    }
}

/// Send one system + user exchange and return the reply text.
pub async fn generate(
    settings: &ChatSettings,
    system: &str,
    user_msg: &str,
) -> Result<String, LlmError> {
    let backend = map_backend(&settings.provider)?;

    let mut builder = LLMBuilder::new()
        .backend(backend)
        .model(&settings.model)
        .temperature(settings.temperature)
        .system(system);

    if !settings.api_key.is_empty() {
        builder = builder.api_key(&settings.api_key);
    }

    let client = builder.build().map_err(|e| LlmError::Build(e.to_string()))?;

    let messages = vec![ChatMessage::user().content(user_msg).build()];

    let response = client
        .chat(&messages)
        .await
        .map_err(|e| LlmError::Chat(e.to_string()))?;

    match response.text() {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(LlmError::EmptyReply),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_backend_known_providers() {
        assert!(map_backend("openai").is_ok());
        assert!(map_backend("anthropic").is_ok());
        assert!(map_backend("ollama").is_ok());
    }

    #[test]
    fn test_map_backend_unknown_provider() {
        let err = map_backend("palm").unwrap_err();
        assert_eq!(err.to_string(), "unknown LLM provider: palm");
    }

    #[test]
    fn test_chat_settings_constructor() {
        let settings = ChatSettings::new("openai", "gpt-4o", "sk-test", 0.9);
        assert_eq!(settings.model, "gpt-4o");
        assert_eq!(settings.temperature, 0.9);
    }
}
