//! Question and text export
//!
//! Renders the generated question list as JSON, plain text or a standalone
//! HTML page, and builds download file names.

use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::analysis::Question;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Txt,
    Html,
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "txt" | "text" => Ok(ExportFormat::Txt),
            "html" | "htm" => Ok(ExportFormat::Html),
            other => Err(AppError::InvalidFormat(other.to_string())),
        }
    }
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Txt => "txt",
            ExportFormat::Html => "html",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Txt => "text/plain; charset=utf-8",
            ExportFormat::Html => "text/html; charset=utf-8",
        }
    }

    pub fn file_name(&self) -> String {
        format!("questions.{}", self.extension())
    }
}

fn option_letter(index: usize) -> char {
    (b'A' + (index % 26) as u8) as char
}

/// Append `text` and a newline
fn line(out: &mut String, text: impl AsRef<str>) {
    out.push_str(text.as_ref());
    out.push('\n');
}

/// Plain text rendering of a question list
pub fn questions_to_txt(questions: &[Question], generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    line(&mut out, "Generated Questions");
    line(
        &mut out,
        format!("Generated on: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
    );
    line(&mut out, format!("Total questions: {}", questions.len()));
    line(&mut out, "=".repeat(50));

    for (index, question) in questions.iter().enumerate() {
        line(&mut out, "");
        line(
            &mut out,
            format!("Question {} ({})", index + 1, question.kind().label()),
        );
        line(&mut out, question.text());

        match question {
            Question::MultipleChoice { options, correct_answer, .. } => {
                for (i, option) in options.iter().enumerate() {
                    let marker = if option == correct_answer { " (correct)" } else { "" };
                    line(&mut out, format!("  {}. {}{}", option_letter(i), option, marker));
                }
                line(&mut out, format!("Correct answer: {}", correct_answer));
            }
            Question::Theory { expected_answer, .. } => {
                line(&mut out, format!("Expected answer: {}", expected_answer));
            }
        }

        line(&mut out, format!("Explanation: {}", question.explanation()));
        line(&mut out, "-".repeat(50));
    }

    out
}

/// Standalone HTML page for a question list
pub fn questions_to_html(questions: &[Question], generated_at: DateTime<Utc>) -> String {
    use html_escape::encode_text as esc;

    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<title>Generated Questions</title>\n<style>\n");
    out.push_str(
        "body { font-family: Arial, sans-serif; max-width: 800px; margin: 2em auto; color: #2c3e50; }\n\
         .question { border: 1px solid #ddd; border-radius: 6px; padding: 1em; margin-bottom: 1em; }\n\
         .type { font-size: 0.8em; text-transform: uppercase; color: #7f8c8d; }\n\
         .correct { color: #27ae60; font-weight: bold; }\n\
         .explanation { color: #555; font-style: italic; }\n",
    );
    out.push_str("</style>\n</head>\n<body>\n");
    out.push_str("<h1>Generated Questions</h1>\n");
    line(
        &mut out,
        format!(
            "<p>Generated on {} &middot; {} questions</p>",
            generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
            questions.len()
        ),
    );

    for (index, question) in questions.iter().enumerate() {
        out.push_str("<div class=\"question\">\n");
        line(
            &mut out,
            format!("<div class=\"type\">{}</div>", esc(question.kind().label())),
        );
        line(
            &mut out,
            format!("<h3>{}. {}</h3>", index + 1, esc(question.text())),
        );

        match question {
            Question::MultipleChoice { options, correct_answer, .. } => {
                out.push_str("<ol type=\"A\">\n");
                for option in options {
                    let class = if option == correct_answer { " class=\"correct\"" } else { "" };
                    line(&mut out, format!("<li{}>{}</li>", class, esc(option)));
                }
                out.push_str("</ol>\n");
            }
            Question::Theory { expected_answer, .. } => {
                line(
                    &mut out,
                    format!(
                        "<p><strong>Expected Answer:</strong> {}</p>",
                        esc(expected_answer)
                    ),
                );
            }
        }

        line(
            &mut out,
            format!(
                "<p class=\"explanation\"><strong>Explanation:</strong> {}</p>",
                esc(question.explanation())
            ),
        );
        out.push_str("</div>\n");
    }

    out.push_str("</body>\n</html>\n");
    out
}

/// `extracted_text_<stem>.txt` for the given upload name
pub fn text_file_name(source: Option<&str>) -> String {
    let source = source.unwrap_or("document");
    let stem = source
        .len()
        .checked_sub(4)
        .and_then(|split| source.get(split..).map(|ext| (split, ext)))
        .filter(|(_, ext)| ext.eq_ignore_ascii_case(".pdf"))
        .map_or(source, |(split, _)| &source[..split]);
    format!("extracted_text_{}.txt", stem)
}

/// `Content-Disposition` value for a download
pub fn attachment_header(file_name: &str) -> String {
    let ascii: String = file_name
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' && c != '\\' { c } else { '_' })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii,
        urlencoding::encode(file_name)
    )
}
