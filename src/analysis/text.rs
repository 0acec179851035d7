//! Text utilities shared by the summarizer, question generator and narrator

use std::sync::OnceLock;

use regex::Regex;

fn page_marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*--- Page \d+ ---\s*$").expect("valid page marker regex"))
}

/// Remove `--- Page n ---` lines inserted during extraction
pub fn strip_page_markers(text: &str) -> String {
    page_marker_regex().replace_all(text, " ").into_owned()
}

/// Split text into sentences.
///
/// A sentence ends at `.`, `!` or `?` followed by whitespace or end of text.
/// Line breaks inside a sentence are folded into single spaces.
pub fn split_sentences(text: &str) -> Vec<String> {
    let text = strip_page_markers(text);
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            if !current.is_empty() && !current.ends_with(' ') {
                current.push(' ');
            }
            continue;
        }

        current.push(c);

        if matches!(c, '.' | '!' | '?') {
            let at_boundary = chars.peek().map_or(true, |next| next.is_whitespace());
            if at_boundary {
                push_sentence(&mut sentences, &current);
                current.clear();
            }
        }
    }
    push_sentence(&mut sentences, &current);

    sentences
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if trimmed.chars().any(char::is_alphanumeric) {
        sentences.push(trimmed.to_string());
    }
}

/// Lowercase word tokens (letters, digits and inner apostrophes)
pub fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .map(|w| w.trim_matches('\''))
        .filter(|w| w.chars().any(char::is_alphabetic))
        .map(str::to_lowercase)
        .collect()
}

/// Estimate syllables by counting vowel groups.
///
/// A trailing silent `e` is dropped (but not `-le`), and every word has at
/// least one syllable.
pub fn count_syllables(word: &str) -> usize {
    let word: Vec<char> = word
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect();

    if word.is_empty() {
        return 0;
    }
    if word.len() <= 3 {
        return 1;
    }

    let is_vowel = |c: char| matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');

    let mut count = 0;
    let mut previous_vowel = false;
    for &c in &word {
        let vowel = is_vowel(c);
        if vowel && !previous_vowel {
            count += 1;
        }
        previous_vowel = vowel;
    }

    let len = word.len();
    if word[len - 1] == 'e' && !(word[len - 2] == 'l' && !is_vowel(word[len - 3])) && count > 1 {
        count -= 1;
    }

    count.max(1)
}

/// Common English words ignored when scoring sentences
pub fn is_stop_word(word: &str) -> bool {
    const STOP_WORDS: &[&str] = &[
        "a", "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be",
        "been", "but", "by", "can", "could", "did", "do", "does", "for", "from", "had", "has",
        "have", "he", "her", "his", "i", "if", "in", "into", "is", "it", "its", "may", "more",
        "most", "no", "not", "of", "on", "or", "other", "our", "she", "so", "some", "such",
        "than", "that", "the", "their", "them", "then", "there", "these", "they", "this",
        "those", "to", "too", "very", "was", "we", "were", "which", "while", "will", "with",
        "would", "you", "your",
    ];
    STOP_WORDS.contains(&word)
}

/// Prepare text for speech synthesis: collapse whitespace and keep only word
/// characters, whitespace and `. , ! ? -`.
pub fn clean_for_speech(text: &str) -> String {
    let text = strip_page_markers(text);
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed
        .chars()
        .filter(|c| {
            c.is_alphanumeric()
                || *c == '_'
                || c.is_whitespace()
                || matches!(c, '.' | ',' | '!' | '?' | '-')
        })
        .collect()
}

/// Sentences to hand to the speech engine one at a time
pub fn speech_sentences(text: &str) -> Vec<String> {
    clean_for_speech(text)
        .split(". ")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            if s.ends_with(['.', '!', '?']) {
                s.to_string()
            } else {
                format!("{}.", s)
            }
        })
        .collect()
}
