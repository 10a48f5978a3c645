//! Grounded answer generation

use std::sync::Arc;

use super::prompt::PromptBuilder;
use crate::config::LlmConfig;
use crate::providers::LlmProvider;
use crate::types::{ChatResponse, ConversationTurn, SearchResult};

/// Reply when retrieval found nothing
pub const NOTHING_FOUND: &str =
    "I couldn't find any relevant information in your documents to answer that question.";

/// Turns retrieved sources and a question into a cited answer
pub struct AnswerGenerator {
    llm: Arc<dyn LlmProvider>,
    max_tokens: u32,
    temperature: f32,
    history_turns: usize,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, config: &LlmConfig) -> Self {
        Self {
            llm,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            history_turns: config.history_turns,
        }
    }

    /// Answer `message` from `sources`. Always returns a response; model
    /// failures become an inline error message with no sources.
    pub async fn answer(
        &self,
        message: &str,
        sources: Vec<SearchResult>,
        history: &[ConversationTurn],
    ) -> ChatResponse {
        if sources.is_empty() {
            return ChatResponse::without_sources(NOTHING_FOUND);
        }

        let messages = PromptBuilder::build_messages(message, &sources, history, self.history_turns);

        match self
            .llm
            .generate(&messages, self.max_tokens, self.temperature)
            .await
        {
            Ok(text) => {
                tracing::debug!(
                    "{} answered from {} sources ({} chars)",
                    self.llm.model(),
                    sources.len(),
                    text.len()
                );
                ChatResponse {
                    message: text,
                    sources,
                }
            }
            Err(e) => {
                tracing::warn!("Generation via {} failed: {}", self.llm.name(), e);
                ChatResponse::without_sources(format!(
                    "I encountered an error generating a response: {}",
                    e
                ))
            }
        }
    }
}
