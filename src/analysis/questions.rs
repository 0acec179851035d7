//! Exam question generation
//!
//! Sentences that look like definitions or answers to "wh-" questions are
//! turned into templated multiple-choice and theory questions. When a
//! generation model is configured its output replaces the template stem.

use serde::{Deserialize, Serialize};

use super::model::ModelClient;
use super::text::{split_sentences, words};

pub const DEFAULT_QUESTION_COUNT: usize = 5;
pub const MAX_QUESTION_COUNT: usize = 50;
/// Sentences shorter than this are not worth asking about
const MIN_SENTENCE_WORDS: usize = 4;

const QUESTION_KEYWORDS: &[&str] = &[
    "what", "how", "why", "when", "where", "which", "who", "define", "explain", "describe",
    "is", "are",
];

const MULTIPLE_CHOICE_OPTIONS: [&str; 4] = [
    "The main topic",
    "A related concept",
    "An unrelated topic",
    "None of the above",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    Theory,
}

impl QuestionType {
    pub fn label(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "Multiple Choice",
            QuestionType::Theory => "Theory",
        }
    }
}

/// A generated question, tagged by type on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Question {
    MultipleChoice {
        question: String,
        options: Vec<String>,
        correct_answer: String,
        explanation: String,
    },
    Theory {
        question: String,
        expected_answer: String,
        explanation: String,
    },
}

impl Question {
    pub fn kind(&self) -> QuestionType {
        match self {
            Question::MultipleChoice { .. } => QuestionType::MultipleChoice,
            Question::Theory { .. } => QuestionType::Theory,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Question::MultipleChoice { question, .. } | Question::Theory { question, .. } => {
                question
            }
        }
    }

    pub fn explanation(&self) -> &str {
        match self {
            Question::MultipleChoice { explanation, .. } | Question::Theory { explanation, .. } => {
                explanation
            }
        }
    }

    fn multiple_choice(sentence: &str, stem: Option<String>) -> Self {
        Question::MultipleChoice {
            question: stem.unwrap_or_else(|| {
                format!("What is the main idea of the following statement: \"{}\"?", sentence)
            }),
            options: MULTIPLE_CHOICE_OPTIONS.iter().map(|o| o.to_string()).collect(),
            correct_answer: MULTIPLE_CHOICE_OPTIONS[0].to_string(),
            explanation: format!("Based on the text: \"{}\"", sentence),
        }
    }

    fn theory(sentence: &str, stem: Option<String>) -> Self {
        Question::Theory {
            question: stem.unwrap_or_else(|| {
                format!("Explain the following concept in detail: \"{}\"", sentence)
            }),
            expected_answer: sentence.to_string(),
            explanation: format!("This question tests understanding of: \"{}\"", sentence),
        }
    }
}

/// Body of a question generation request
#[derive(Debug, Clone, Deserialize)]
pub struct QuestionRequest {
    #[serde(default)]
    pub types: Vec<String>,
    pub count: Option<usize>,
}

/// A validated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionPlan {
    pub types: Vec<QuestionType>,
    pub count: usize,
}

impl QuestionRequest {
    /// Validate types and clamp the count into `1..=MAX_QUESTION_COUNT`
    pub fn plan(&self) -> Result<QuestionPlan, String> {
        if self.types.is_empty() {
            return Err("Please select at least one question type".to_string());
        }

        let mut types = Vec::with_capacity(self.types.len());
        for raw in &self.types {
            let kind = match raw.trim().to_lowercase().as_str() {
                "multiple_choice" | "multiple-choice" | "mcq" => QuestionType::MultipleChoice,
                "theory" | "free_response" => QuestionType::Theory,
                other => return Err(format!("Unknown question type '{}'", other)),
            };
            if !types.contains(&kind) {
                types.push(kind);
            }
        }

        let count = self
            .count
            .unwrap_or(DEFAULT_QUESTION_COUNT)
            .clamp(1, MAX_QUESTION_COUNT);

        Ok(QuestionPlan { types, count })
    }
}

/// Sentences to build questions from: keyword sentences first, then the
/// rest, each in document order.
pub fn candidate_sentences(text: &str) -> Vec<String> {
    let (keyword, plain): (Vec<(String, bool)>, Vec<(String, bool)>) = split_sentences(text)
        .into_iter()
        .filter_map(|sentence| {
            let tokens = words(&sentence);
            if tokens.len() < MIN_SENTENCE_WORDS {
                return None;
            }
            let has_keyword = tokens.iter().any(|w| QUESTION_KEYWORDS.contains(&w.as_str()));
            Some((sentence, has_keyword))
        })
        .partition(|(_, has_keyword)| *has_keyword);

    keyword.into_iter().chain(plain).map(|(s, _)| s).collect()
}

/// Builds question lists from extracted text
#[derive(Clone)]
pub struct QuestionGenerator {
    model: ModelClient,
}

impl QuestionGenerator {
    pub fn new(model: ModelClient) -> Self {
        Self { model }
    }

    /// Generate up to `plan.count` questions, cycling through the requested
    /// types. Fewer are returned when the text runs out of sentences.
    pub async fn generate(&self, text: &str, plan: &QuestionPlan) -> Vec<Question> {
        let candidates = candidate_sentences(text);
        let mut questions = Vec::with_capacity(plan.count.min(candidates.len()));
        let mut use_model = self.model.has_generation_model();

        for (index, sentence) in candidates.iter().take(plan.count).enumerate() {
            let kind = plan.types[index % plan.types.len()];

            let stem = if use_model {
                match self.model.generate_question(sentence).await {
                    Ok(stem) => Some(stem),
                    Err(e) => {
                        tracing::warn!("Question model unavailable, using templates: {}", e);
                        use_model = false;
                        None
                    }
                }
            } else {
                None
            };

            questions.push(match kind {
                QuestionType::MultipleChoice => Question::multiple_choice(sentence, stem),
                QuestionType::Theory => Question::theory(sentence, stem),
            });
        }

        tracing::debug!(
            requested = plan.count,
            generated = questions.len(),
            candidates = candidates.len(),
            "Generated questions"
        );

        questions
    }
}
