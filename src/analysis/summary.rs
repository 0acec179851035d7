//! Summaries and key points
//!
//! Uses the hosted summary model when one is configured and falls back to
//! extractive summarization (word-frequency sentence scoring) otherwise.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::model::ModelClient;
use super::readability::ReadabilityStats;
use super::text::{is_stop_word, split_sentences, words};

/// Sentences kept by the extractive summary
pub const SUMMARY_SENTENCES: usize = 3;
/// Maximum key points reported
pub const MAX_KEY_POINTS: usize = 5;

const EMPHASIS_KEYWORDS: &[&str] = &[
    "important",
    "key",
    "main",
    "significant",
    "essential",
    "conclusion",
    "result",
    "therefore",
    "critical",
    "primary",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMethod {
    Model,
    Extractive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryReport {
    pub summary: String,
    pub key_points: Vec<String>,
    pub statistics: ReadabilityStats,
    pub method: SummaryMethod,
}

/// A sentence with its position and frequency score
#[derive(Debug, Clone)]
struct ScoredSentence {
    position: usize,
    text: String,
    score: usize,
}

fn score_sentences(sentences: &[String], text: &str) -> Vec<ScoredSentence> {
    let mut frequencies: HashMap<String, usize> = HashMap::new();
    for word in words(text).into_iter().filter(|w| !is_stop_word(w)) {
        *frequencies.entry(word).or_insert(0) += 1;
    }

    sentences
        .iter()
        .enumerate()
        .map(|(position, sentence)| ScoredSentence {
            position,
            text: sentence.clone(),
            score: words(sentence)
                .iter()
                .filter_map(|w| frequencies.get(w))
                .sum(),
        })
        .collect()
}

/// Highest scoring sentences first; ties go to the earlier sentence
fn rank(mut scored: Vec<ScoredSentence>) -> Vec<ScoredSentence> {
    scored.sort_by(|a, b| b.score.cmp(&a.score).then(a.position.cmp(&b.position)));
    scored
}

/// Pick the top sentences and return them in document order
pub fn extractive_summary(text: &str, sentence_count: usize) -> String {
    let sentences = split_sentences(text);
    let mut top: Vec<ScoredSentence> = rank(score_sentences(&sentences, text))
        .into_iter()
        .take(sentence_count)
        .collect();
    top.sort_by_key(|s| s.position);

    top.into_iter()
        .map(|s| s.text)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Sentences carrying emphasis keywords, or the best scored ones if none do
pub fn key_points(text: &str) -> Vec<String> {
    let sentences = split_sentences(text);

    let emphasised: Vec<String> = sentences
        .iter()
        .filter(|s| words(s).iter().any(|w| EMPHASIS_KEYWORDS.contains(&w.as_str())))
        .take(MAX_KEY_POINTS)
        .cloned()
        .collect();

    if !emphasised.is_empty() {
        return emphasised;
    }

    rank(score_sentences(&sentences, text))
        .into_iter()
        .take(MAX_KEY_POINTS)
        .map(|s| s.text)
        .collect()
}

/// Produces summary reports, preferring the model when available
#[derive(Clone)]
pub struct Summarizer {
    model: ModelClient,
}

impl Summarizer {
    pub fn new(model: ModelClient) -> Self {
        Self { model }
    }

    /// Summarize `text`. Callers must reject blank text beforehand.
    pub async fn summarize(&self, text: &str) -> SummaryReport {
        let model_summary = if self.model.has_summary_model() {
            match self.model.summarize(text).await {
                Ok(summary) => Some(summary),
                Err(e) => {
                    tracing::warn!("Summary model unavailable, using extractive summary: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let (summary, method) = match model_summary {
            Some(summary) => (summary, SummaryMethod::Model),
            None => (
                extractive_summary(text, SUMMARY_SENTENCES),
                SummaryMethod::Extractive,
            ),
        };

        SummaryReport {
            summary,
            key_points: key_points(text),
            statistics: ReadabilityStats::compute(text),
            method,
        }
    }
}
