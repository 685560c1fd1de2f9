//! Fixture documents and stub collaborators for pipeline tests.

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::Mutex;

use async_trait::async_trait;
use docx_rs::{Docx, Paragraph, Run, Table, TableCell, TableRow};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::llm_client::LlmError;
use crate::models::analysis::AnalysisRow;
use crate::screening::evaluator::Evaluator;
use crate::screening::store::{RecordStore, StorageError};

/// Single-page PDF with one line of Courier text.
pub fn pdf_with_text(text: &str) -> Vec<u8> {
    build_pdf(vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 12.into()]),
        Operation::new("Td", vec![72.into(), 720.into()]),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ])
}

/// Single-page PDF with no text, like a scanned image-only resume.
pub fn blank_pdf() -> Vec<u8> {
    build_pdf(vec![])
}

fn build_pdf(operations: Vec<Operation>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// DOCX with the given body paragraphs followed by one single-row table per
/// entry in `tables`.
pub fn docx_document(paragraphs: &[&str], tables: &[&[&str]]) -> Vec<u8> {
    let mut docx = Docx::new();
    for text in paragraphs {
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)));
    }
    for cells in tables {
        let cells = cells
            .iter()
            .map(|text| {
                TableCell::new().add_paragraph(Paragraph::new().add_run(Run::new().add_text(*text)))
            })
            .collect();
        docx = docx.add_table(Table::new(vec![TableRow::new(cells)]));
    }

    let mut cursor = Cursor::new(Vec::new());
    docx.build().pack(&mut cursor).unwrap();
    cursor.into_inner()
}

/// A well-formed model answer.
pub fn canned_response(name: &str, score: u8, label: &str) -> String {
    serde_json::json!({
        "applicant_name": name,
        "years_experience": "5 years",
        "education_level": "B.Sc Computer Science",
        "match_percentage": score,
        "final_recommendation": label,
        "strengths": ["Java", "Spring Boot"],
        "missing_skills": ["Kafka"],
        "skills_gap": "No event streaming experience.",
        "summary": "Solid backend engineer."
    })
    .to_string()
}

/// Replays queued answers in order and records every prompt it receives.
/// `Err(message)` entries simulate transport failures.
#[derive(Default)]
pub struct StubEvaluator {
    answers: Mutex<VecDeque<Result<String, String>>>,
    pub prompts: Mutex<Vec<String>>,
}

impl StubEvaluator {
    pub fn new(answers: Vec<Result<String, String>>) -> Self {
        Self {
            answers: Mutex::new(answers.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Evaluator for StubEvaluator {
    async fn evaluate(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.answers.lock().unwrap().pop_front() {
            Some(Ok(answer)) => Ok(answer),
            Some(Err(message)) => Err(LlmError::Api {
                status: 503,
                message,
            }),
            None => Err(LlmError::EmptyContent),
        }
    }
}

/// Keeps persisted rows in memory, or fails every write when `failing`.
#[derive(Default)]
pub struct MemoryStore {
    pub rows: Mutex<Vec<AnalysisRow>>,
    pub failing: bool,
}

impl MemoryStore {
    pub fn failing() -> Self {
        Self {
            rows: Mutex::new(Vec::new()),
            failing: true,
        }
    }

    pub fn rows(&self) -> Vec<AnalysisRow> {
        self.rows.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn persist(&self, row: &AnalysisRow) -> Result<(), StorageError> {
        if self.failing {
            return Err(StorageError::Database(sqlx::Error::PoolTimedOut));
        }
        self.rows.lock().unwrap().push(row.clone());
        Ok(())
    }
}
