//! OpenAI-backed completion client.

use super::{create_client, CompletionClient};
use crate::error::{EkkoError, Result};
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::{debug, instrument};

/// Single-shot completion via the OpenAI chat API.
pub struct OpenAICompletion {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAICompletion {
    /// Create a completion client for the given model.
    pub fn new(model: &str) -> Self {
        Self {
            client: create_client(),
            model: model.to_string(),
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAICompletion {
    #[instrument(skip(self, prompt), fields(prompt_chars = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()
                .map_err(|e| EkkoError::Completion(e.to_string()))?
                .into(),
        ];

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages)
            .temperature(0.7)
            .build()
            .map_err(|e| EkkoError::Completion(e.to_string()))?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            EkkoError::Completion(format!("Failed to generate response: {}", e))
        })?;

        let answer = response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| EkkoError::Completion("Empty response from model".to_string()))?
            .clone();

        debug!("Generated {} chars", answer.len());
        Ok(answer)
    }
}
