//! services/api/src/adapters/chat_llm.rs
//!
//! This module contains the adapter for the conversation LLM.
//! It implements the `ConversationService` port from the `core` crate.

use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::chat::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use tracing::debug;
use tutor_core::{
    domain::{ChatMessage, ChatRole},
    ports::{ConversationService, PortError, PortResult},
};

const MAX_COMPLETION_TOKENS: u32 = 500;
const TEMPERATURE: f32 = 0.7;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `ConversationService` using an OpenAI-compatible LLM.
#[derive(Clone)]
pub struct OpenAiChatAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiChatAdapter {
    /// Creates a new `OpenAiChatAdapter`.
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

fn to_request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage, OpenAIError> {
    let content = message.content.as_str();
    Ok(match message.role {
        ChatRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        ChatRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        ChatRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()?
            .into(),
    })
}

//=========================================================================================
// `ConversationService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ConversationService for OpenAiChatAdapter {
    /// Sends the whole conversation and returns the first choice's text.
    async fn complete(&self, messages: &[ChatMessage]) -> PortResult<String> {
        let request_messages = messages
            .iter()
            .map(to_request_message)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(request_messages)
            .max_completion_tokens(MAX_COMPLETION_TOKENS)
            .temperature(TEMPERATURE)
            .n(1)
            .build()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        debug!(model = %self.model, messages = messages.len(), "Requesting chat completion");

        // Call the API and manually map the error, which respects the orphan rule.
        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e: OpenAIError| PortError::Provider(e.to_string()))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                PortError::Provider("Chat completion returned no text content.".to_string())
            })
    }
}
