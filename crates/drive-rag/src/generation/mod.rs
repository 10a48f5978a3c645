//! Answer generation from retrieved sources

pub mod answer;
pub mod prompt;

pub use answer::{AnswerGenerator, NOTHING_FOUND};
pub use prompt::PromptBuilder;
