//! Readability statistics (Flesch reading ease, Flesch-Kincaid grade)

use serde::{Deserialize, Serialize};

use super::text::{count_syllables, split_sentences, words};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReadabilityStats {
    pub word_count: usize,
    pub sentence_count: usize,
    pub syllable_count: usize,
    pub avg_words_per_sentence: f64,
    pub avg_syllables_per_word: f64,
    /// Flesch reading ease (higher is easier, roughly 0-100)
    pub readability_score: f64,
    /// Flesch-Kincaid grade level
    pub grade_level: f64,
}

impl ReadabilityStats {
    pub fn compute(text: &str) -> Self {
        let words = words(text);
        let sentence_count = split_sentences(text).len();
        let word_count = words.len();

        if word_count == 0 || sentence_count == 0 {
            return Self {
                word_count,
                sentence_count,
                ..Self::default()
            };
        }

        let syllable_count: usize = words.iter().map(|w| count_syllables(w)).sum();
        let words_per_sentence = word_count as f64 / sentence_count as f64;
        let syllables_per_word = syllable_count as f64 / word_count as f64;

        Self {
            word_count,
            sentence_count,
            syllable_count,
            avg_words_per_sentence: round2(words_per_sentence),
            avg_syllables_per_word: round2(syllables_per_word),
            readability_score: round2(
                206.835 - 1.015 * words_per_sentence - 84.6 * syllables_per_word,
            ),
            grade_level: round2(0.39 * words_per_sentence + 11.8 * syllables_per_word - 15.59),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
