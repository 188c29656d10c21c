//! OpenAI chat-completion implementation.

use super::{ChatMessage, ChatModel, Role};
use crate::config::RagSettings;
use crate::error::{Result, ShoptalkError};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// OpenAI-backed chat model.
pub struct OpenAIChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIChatModel {
    /// Create a chat model with the given model name and temperature.
    pub fn new(model: &str, temperature: f32) -> Result<Self> {
        Ok(Self {
            client: create_client()?,
            model: model.to_string(),
            temperature,
        })
    }

    /// Create a chat model from RAG settings.
    pub fn from_settings(settings: &RagSettings) -> Result<Self> {
        Self::new(&settings.model, settings.temperature)
    }

    /// The configured model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage> {
        let converted = match message.role {
            Role::System => ChatCompletionRequestSystemMessageArgs::default()
                .content(message.content.clone())
                .build()
                .map_err(|e| ShoptalkError::Llm(e.to_string()))?
                .into(),
            Role::User => ChatCompletionRequestUserMessageArgs::default()
                .content(message.content.clone())
                .build()
                .map_err(|e| ShoptalkError::Llm(e.to_string()))?
                .into(),
            Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
                .content(message.content.clone())
                .build()
                .map_err(|e| ShoptalkError::Llm(e.to_string()))?
                .into(),
        };
        Ok(converted)
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    #[instrument(skip(self, messages), fields(model = %self.model, count = messages.len()))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        let messages = messages
            .iter()
            .map(Self::to_request_message)
            .collect::<Result<Vec<_>>>()?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature)
            .build()
            .map_err(|e| ShoptalkError::Llm(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| ShoptalkError::OpenAI(format!("Failed to generate response: {}", e)))?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| ShoptalkError::Llm("Empty response from LLM".to_string()))?
            .clone();

        debug!("Generated {} characters", answer.len());
        Ok(answer)
    }
}
