//! Session bookkeeping around document replacement

mod common;

use std::sync::Arc;

use pdf_study_server::analysis::{ModelClient, QuestionGenerator, QuestionRequest, Summarizer};
use pdf_study_server::pdf::PdfDocument;
use pdf_study_server::session::Session;
use pdf_study_server::speech::{Narrator, VoiceSettings};

use common::{build_pdf, sample_pdf, RecordingEngine};

fn session() -> Session {
    let narrator = Narrator::new(Arc::new(RecordingEngine::default()), VoiceSettings::default());
    Session::new(narrator, 1.5)
}

async fn open(data: Vec<u8>, name: &str) -> PdfDocument {
    PdfDocument::open(data, name.to_string(), 4).await.unwrap()
}

#[tokio::test]
async fn test_results_for_replaced_document_are_dropped() {
    let mut session = session();
    session.load(open(sample_pdf(), "first.pdf").await, "first.pdf".into(), None);
    let (first_id, text) = session.ensure_text().await.unwrap();

    // A new upload lands while the results are being computed
    let other = build_pdf(&["Compilers translate source code into machine code."]);
    session.load(open(other, "second.pdf").await, "second.pdf".into(), None);

    let report = Summarizer::new(ModelClient::disabled()).summarize(&text).await;
    let plan = QuestionRequest {
        types: vec!["theory".into()],
        count: Some(2),
    }
    .plan()
    .unwrap();
    let questions = QuestionGenerator::new(ModelClient::disabled())
        .generate(&text, &plan)
        .await;
    assert!(!questions.is_empty());

    assert!(!session.set_summary(first_id, report.clone()));
    assert!(!session.set_questions(first_id, questions.clone()));
    assert!(session.summary().is_none());
    assert!(session.questions().is_empty());

    let (second_id, _) = session.ensure_text().await.unwrap();
    assert_ne!(first_id, second_id);
    assert!(session.set_summary(second_id, report));
    assert!(session.set_questions(second_id, questions));
    assert!(session.summary().is_some());
    assert_eq!(session.questions().len(), 2);
}

#[tokio::test]
async fn test_results_after_cleanup_are_dropped() {
    let mut session = session();
    session.load(open(sample_pdf(), "first.pdf").await, "first.pdf".into(), None);
    let (id, text) = session.ensure_text().await.unwrap();

    session.clear();

    let report = Summarizer::new(ModelClient::disabled()).summarize(&text).await;
    assert!(!session.set_summary(id, report));
    assert!(session.summary().is_none());
}
