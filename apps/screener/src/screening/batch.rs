//! Runs every uploaded resume of a batch through the pipeline.
//!
//! Resumes are processed one at a time, in upload order:
//! extract → build prompt → evaluate → parse → persist. A failure only ever
//! affects the resume it happened on; the batch always completes.

use bytes::Bytes;
use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::models::analysis::AnalysisRow;
use crate::models::candidate::{Assessment, CandidateRecord};
use crate::screening::evaluator::Evaluator;
use crate::screening::extract::{extract, DocumentFormat};
use crate::screening::parser::parse;
use crate::screening::prompts::build_prompt;
use crate::screening::store::RecordStore;

/// One uploaded resume file.
#[derive(Debug, Clone)]
pub struct UploadedResume {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

/// Who asked for the batch and when. Passed explicitly into every run.
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub analyst: String,
    pub now: NaiveDateTime,
}

/// The collaborators a batch talks to.
#[derive(Clone, Copy)]
pub struct Pipeline<'a> {
    pub evaluator: &'a dyn Evaluator,
    pub store: &'a dyn RecordStore,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Not a PDF or DOCX; the file was skipped.
    UnsupportedFormat,
    /// No text could be recovered; the file was skipped.
    ExtractionEmpty,
    /// The model call failed; an error record was kept instead.
    LlmTransport,
    /// The model answer was unusable; the file was skipped.
    Parse,
    /// Saving failed; the record was kept.
    Storage,
}

/// Per-file problem surfaced to the analyst. Never fatal to the batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileNotice {
    pub file_name: String,
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
    pub current_file: Option<String>,
}

impl BatchProgress {
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

/// Observable steps of a running batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Started { file_name: String },
    Notice(FileNotice),
    Progress(BatchProgress),
}

#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    /// Successfully analysed resumes, in upload order.
    pub records: Vec<CandidateRecord>,
    pub notices: Vec<FileNotice>,
}

/// Screens every resume against `jd_text`. `on_event` sees each file start,
/// every notice, and one progress update per processed file.
pub async fn run_batch(
    pipeline: Pipeline<'_>,
    resumes: &[UploadedResume],
    jd_text: &str,
    context: &RequestContext,
    on_event: &mut (dyn FnMut(BatchEvent) + Send),
) -> BatchOutcome {
    let total = resumes.len();
    let mut outcome = BatchOutcome::default();

    info!(
        "Starting batch of {total} resume(s) for analyst {}",
        context.analyst
    );

    for (index, resume) in resumes.iter().enumerate() {
        on_event(BatchEvent::Started {
            file_name: resume.file_name.clone(),
        });

        let (record, notices) = screen_resume(pipeline, resume, jd_text, context).await;

        for notice in notices {
            on_event(BatchEvent::Notice(notice.clone()));
            outcome.notices.push(notice);
        }
        if let Some(record) = record {
            outcome.records.push(record);
        }

        on_event(BatchEvent::Progress(BatchProgress {
            completed: index + 1,
            total,
            current_file: None,
        }));
    }

    info!(
        "Batch finished: {} analysed, {} notice(s)",
        outcome.records.len(),
        outcome.notices.len()
    );
    outcome
}

async fn screen_resume(
    pipeline: Pipeline<'_>,
    resume: &UploadedResume,
    jd_text: &str,
    context: &RequestContext,
) -> (Option<CandidateRecord>, Vec<FileNotice>) {
    let mut notices = Vec::new();
    let notice = |kind, message: String| FileNotice {
        file_name: resume.file_name.clone(),
        kind,
        message,
    };

    let Some(format) = DocumentFormat::detect(&resume.file_name, &resume.mime_type) else {
        warn!(file = %resume.file_name, "Unsupported document format");
        notices.push(notice(
            NoticeKind::UnsupportedFormat,
            format!("{} is not a PDF or DOCX file", resume.file_name),
        ));
        return (None, notices);
    };

    let text = extract_off_thread(resume.bytes.clone(), format).await;
    if text.is_empty() {
        warn!(file = %resume.file_name, "No text extracted");
        notices.push(notice(
            NoticeKind::ExtractionEmpty,
            format!("Could not extract text from {}", resume.file_name),
        ));
        return (None, notices);
    }

    let prompt = build_prompt(&text, jd_text, context.now);

    let assessment = match pipeline.evaluator.evaluate(&prompt).await {
        Ok(raw) => match parse(&raw) {
            Ok(assessment) => assessment,
            Err(e) => {
                warn!(file = %resume.file_name, "Unusable model response: {e}");
                notices.push(notice(
                    NoticeKind::Parse,
                    format!("Error parsing AI response for {}: {e}", resume.file_name),
                ));
                return (None, notices);
            }
        },
        Err(e) => {
            warn!(file = %resume.file_name, "Evaluation call failed: {e}");
            notices.push(notice(
                NoticeKind::LlmTransport,
                format!("Evaluation failed for {}: {e}", resume.file_name),
            ));
            Assessment::transport_failure(&e)
        }
    };

    let record = CandidateRecord {
        id: Uuid::new_v4(),
        assessment,
        source_file_name: resume.file_name.clone(),
        source_file_bytes: resume.bytes.clone(),
        source_mime_type: if resume.mime_type.trim().is_empty() {
            format.mime_type().to_string()
        } else {
            resume.mime_type.clone()
        },
        analyzed_by: context.analyst.clone(),
        analyzed_at: context.now,
    };

    if let Err(e) = pipeline.store.persist(&AnalysisRow::from(&record)).await {
        warn!(file = %resume.file_name, "Failed to persist analysis: {e}");
        notices.push(notice(
            NoticeKind::Storage,
            format!(
                "Failed to save {} to storage: {e}",
                record.assessment.applicant_name
            ),
        ));
    }

    info!(
        file = %resume.file_name,
        score = record.assessment.match_percentage,
        verdict = %record.assessment.final_recommendation,
        "Resume analysed"
    );
    (Some(record), notices)
}

/// Extraction is CPU-bound; a panic in the worker counts as "no text".
async fn extract_off_thread(bytes: Bytes, format: DocumentFormat) -> String {
    tokio::task::spawn_blocking(move || extract(&bytes, format))
        .await
        .unwrap_or_else(|e| {
            warn!("Extraction worker failed: {e}");
            String::new()
        })
}
