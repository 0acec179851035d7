//! Text analysis
//!
//! - `text`: sentence splitting, tokenizing, syllables, speech cleanup
//! - `readability`: Flesch reading ease and grade level
//! - `summary`: model or extractive summaries plus key points
//! - `questions`: multiple-choice and theory question generation
//! - `model`: optional hosted model client

mod model;
mod questions;
mod readability;
mod summary;
pub mod text;

pub use model::{ModelClient, ModelError};
pub use questions::{
    candidate_sentences, Question, QuestionGenerator, QuestionPlan, QuestionRequest, QuestionType,
    DEFAULT_QUESTION_COUNT, MAX_QUESTION_COUNT,
};
pub use readability::ReadabilityStats;
pub use summary::{
    extractive_summary, key_points, SummaryMethod, SummaryReport, Summarizer, SUMMARY_SENTENCES,
};
