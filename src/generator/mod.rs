//! Boundary to the language model: a prompt goes in, raw text comes out.
//!
//! [`Oracle`] is the seam the repair loop drives; [`ChatOracle`] implements it
//! on top of any chat-completions [`LlmClient`](crate::client::LlmClient).

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::client::{
    ChatCompletionRequest, ChatMessage, DynLlmClient, JsonSchemaFormat, ResponseFormat,
};
use crate::config::{Config, GenerationSettings, ModelSettings};
use crate::prompt::PromptPayload;
use crate::tokens::completion_budget;

/// Name under which the program schema is declared to the provider.
pub const SCHEMA_NAME: &str = "ProgramSpec";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// Network failure, timeout or an error status from the provider.
    #[error("model service unavailable: {0}")]
    Unavailable(String),
    /// The call succeeded but produced no usable text.
    #[error("model returned an empty response{}", reason_suffix(.0))]
    EmptyResponse(Option<String>),
}

fn reason_suffix(reason: &Option<String>) -> String {
    reason
        .as_deref()
        .map(|reason| format!(" ({reason})"))
        .unwrap_or_default()
}

#[async_trait]
pub trait Oracle: Send + Sync {
    async fn generate(&self, prompt: &PromptPayload) -> Result<String, OracleError>;
}

pub type DynOracle = dyn Oracle;

/// [`Oracle`] backed by a chat-completions client.
pub struct ChatOracle {
    client: Arc<DynLlmClient>,
    model: String,
    max_tokens: u32,
    context_window: u32,
    temperature: f32,
    structured_output: bool,
}

impl ChatOracle {
    pub fn new(client: Arc<DynLlmClient>, models: &ModelSettings, generation: &GenerationSettings) -> Self {
        Self {
            client,
            model: models.generator.clone(),
            max_tokens: models.max_tokens,
            context_window: models.context_window,
            temperature: models.temperature,
            structured_output: generation.structured_output,
        }
    }

    pub fn from_config(client: Arc<DynLlmClient>, config: &Config) -> Self {
        Self::new(client, &config.models, &config.generation)
    }

    pub fn build_request(&self, prompt: &PromptPayload) -> ChatCompletionRequest {
        let messages = vec![
            ChatMessage::system(prompt.system.clone()),
            ChatMessage::user(prompt.user.clone()),
        ];
        let max_tokens = completion_budget(self.context_window, self.max_tokens, &messages);

        let response_format = if self.structured_output {
            ResponseFormat::JsonSchema {
                json_schema: JsonSchemaFormat {
                    name: SCHEMA_NAME.to_string(),
                    schema: prompt.schema.clone(),
                    strict: true,
                },
            }
        } else {
            ResponseFormat::JsonObject
        };

        ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            max_tokens: Some(max_tokens),
            temperature: Some(self.temperature),
            response_format: Some(response_format),
        }
    }
}

#[async_trait]
impl Oracle for ChatOracle {
    async fn generate(&self, prompt: &PromptPayload) -> Result<String, OracleError> {
        let request = self.build_request(prompt);

        let response = self
            .client
            .chat_completion(request)
            .await
            .map_err(|err| OracleError::Unavailable(format!("{err:#}")))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| OracleError::EmptyResponse(Some("no choices".to_string())))?;

        if let Some(refusal) = choice.message.refusal.filter(|r| !r.trim().is_empty()) {
            return Err(OracleError::EmptyResponse(Some(format!("refused: {refusal}"))));
        }

        let content = choice.message.content.unwrap_or_default();
        let content = content.trim();
        if content.is_empty() {
            return Err(OracleError::EmptyResponse(choice.finish_reason));
        }

        Ok(content.to_string())
    }
}
