//! Prompt templates for grounded answers

use crate::providers::ChatMessage;
use crate::types::{ConversationTurn, SearchResult};

const SYSTEM_PROMPT: &str = r#"You are a helpful AI assistant that helps users find and understand information from their Google Drive documents.

Your responsibilities:
1. Answer questions accurately based ONLY on the provided context from Google Drive documents
2. Always cite your sources by mentioning the document name when you use information from it
3. If the answer is not in the provided context, clearly say so - don't make up information
4. Be concise but thorough in your responses
5. When multiple documents contain relevant information, synthesize it clearly

Remember: Only use information from the provided sources. If you're not sure, say so."#;

/// Prompt builder for chat answers
pub struct PromptBuilder;

impl PromptBuilder {
    /// Instructions restricting the model to the supplied sources
    pub fn system_prompt() -> &'static str {
        SYSTEM_PROMPT
    }

    /// Concatenate sources, each under a provenance line
    pub fn build_context(sources: &[SearchResult]) -> String {
        let mut context = String::new();

        for (i, source) in sources.iter().enumerate() {
            context.push_str(&format!(
                "Source {} (File: {}, Link: {}):\n```{}```\n\n",
                i + 1,
                source.metadata.document_name,
                source.metadata.link(),
                source.text
            ));
        }

        context
    }

    /// Wrap the question with the assembled context
    pub fn build_user_message(question: &str, context: &str) -> String {
        format!(
            r#"Based on the following documents from Google Drive:

{context}

Question: {question}

Please provide a helpful answer based on the information above. Remember to cite which document(s) you're getting the information from."#,
            context = context,
            question = question
        )
    }

    /// System prompt, the last `history_turns` turns, then the wrapped question
    pub fn build_messages(
        question: &str,
        sources: &[SearchResult],
        history: &[ConversationTurn],
        history_turns: usize,
    ) -> Vec<ChatMessage> {
        let recent = &history[history.len().saturating_sub(history_turns)..];

        let mut messages = Vec::with_capacity(recent.len() + 2);
        messages.push(ChatMessage::system(SYSTEM_PROMPT));
        messages.extend(recent.iter().map(ChatMessage::from));
        messages.push(ChatMessage::user(Self::build_user_message(
            question,
            &Self::build_context(sources),
        )));
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::document::mime;
    use crate::types::{ChunkMetadata, Role, SourceDocument};

    fn source(name: &str, link: Option<&str>, text: &str) -> SearchResult {
        let mut doc = SourceDocument::new(name.to_lowercase(), name, mime::GOOGLE_DOCUMENT);
        doc.web_view_link = link.map(str::to_string);
        SearchResult::new(
            format!("{}_chunk_0", doc.id),
            text,
            ChunkMetadata::for_document(&doc, format!("/{}", name)).unwrap(),
            0.8,
            text,
            Vec::new(),
        )
    }

    #[test]
    fn test_context_has_provenance_lines() {
        let sources = vec![
            source("Budget", Some("https://drive/budget"), "Q3 is 1.2M"),
            source("Notes", None, "Hiring paused"),
        ];
        let context = PromptBuilder::build_context(&sources);
        assert_eq!(
            context,
            "Source 1 (File: Budget, Link: https://drive/budget):\n```Q3 is 1.2M```\n\n\
             Source 2 (File: Notes, Link: #):\n```Hiring paused```\n\n"
        );
    }

    #[test]
    fn test_messages_keep_last_history_turns() {
        let history: Vec<ConversationTurn> = (0..7)
            .map(|i| ConversationTurn::user(format!("turn {}", i)))
            .collect();
        let sources = vec![source("Budget", None, "Q3 is 1.2M")];

        let messages = PromptBuilder::build_messages("What is Q3?", &sources, &history, 5);
        assert_eq!(messages.len(), 7);
        assert_eq!(messages[0].role, Role::System);
        assert_eq!(messages[1].content, "turn 2");
        assert_eq!(messages[5].content, "turn 6");

        let last = &messages[6];
        assert_eq!(last.role, Role::User);
        assert!(last.content.contains("Question: What is Q3?"));
        assert!(last.content.contains("File: Budget"));
    }

    #[test]
    fn test_short_history_is_kept_whole() {
        let history = vec![
            ConversationTurn::user("hi"),
            ConversationTurn::assistant("hello"),
        ];
        let messages = PromptBuilder::build_messages("q", &[], &history, 5);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[2].role, Role::Assistant);
    }
}
