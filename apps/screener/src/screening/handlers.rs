//! Axum route handlers for the Analysis API.

use anyhow::anyhow;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::Analyst;
use crate::errors::AppError;
use crate::screening::batch::{
    run_batch, BatchEvent, BatchProgress, FileNotice, Pipeline, RequestContext, UploadedResume,
};
use crate::screening::preview::{render_preview, FilePreview};
use crate::screening::ranking::{ranked_view, summarize, BatchSummary, RankedCandidate};
use crate::screening::registry::{BatchState, BatchStatus};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct CreateAnalysisQuery {
    /// Run the batch to completion before responding.
    #[serde(default)]
    pub wait: bool,
}

#[derive(Debug, Serialize)]
pub struct AnalysisResponse {
    pub id: Uuid,
    pub status: BatchStatus,
    pub analyst: String,
    pub progress: BatchProgress,
    pub fraction: f64,
    pub notices: Vec<FileNotice>,
    pub summary: BatchSummary,
    pub candidates: Vec<RankedCandidate>,
}

impl From<BatchState> for AnalysisResponse {
    fn from(batch: BatchState) -> Self {
        Self {
            id: batch.id,
            status: batch.status,
            analyst: batch.analyst,
            fraction: batch.progress.fraction(),
            progress: batch.progress,
            notices: batch.notices,
            summary: summarize(&batch.records),
            candidates: ranked_view(&batch.records),
        }
    }
}

struct AnalysisUpload {
    job_description: String,
    resumes: Vec<UploadedResume>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/analyses
///
/// Multipart body: one `job_description` text field and one or more `resumes`
/// files. Starts the batch in the background and answers 202 with its id, or
/// with `?wait=true` answers 200 with the finished report.
pub async fn handle_create_analysis(
    State(state): State<AppState>,
    analyst: Analyst,
    Query(query): Query<CreateAnalysisQuery>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<AnalysisResponse>), AppError> {
    let upload = read_upload(multipart).await?;

    if upload.resumes.is_empty() || upload.job_description.trim().is_empty() {
        return Err(AppError::Validation(
            "Upload at least one resume and provide a job description".to_string(),
        ));
    }

    let context = RequestContext {
        analyst: analyst.username,
        now: Local::now().naive_local(),
    };
    let batch_id = state
        .batches
        .start(&context.analyst, upload.resumes.len(), context.now);

    info!(
        "Batch {batch_id}: {} resume(s) submitted by {}",
        upload.resumes.len(),
        context.analyst
    );

    let registry = state.batches.clone();
    let evaluator = state.evaluator.clone();
    let store = state.store.clone();
    let task = tokio::spawn(async move {
        let mut on_event = |event: BatchEvent| registry.apply(batch_id, &event);
        let pipeline = Pipeline {
            evaluator: evaluator.as_ref(),
            store: store.as_ref(),
        };
        let outcome = run_batch(
            pipeline,
            &upload.resumes,
            &upload.job_description,
            &context,
            &mut on_event,
        )
        .await;
        registry.finish(batch_id, outcome);
    });

    if !query.wait {
        let batch = state
            .batches
            .get(batch_id)
            .ok_or_else(|| AppError::Internal(anyhow!("batch {batch_id} vanished")))?;
        return Ok((StatusCode::ACCEPTED, Json(batch.into())));
    }

    task.await
        .map_err(|e| AppError::Internal(anyhow!("batch {batch_id} failed: {e}")))?;
    let batch = state
        .batches
        .get(batch_id)
        .ok_or_else(|| AppError::Internal(anyhow!("batch {batch_id} vanished")))?;
    Ok((StatusCode::OK, Json(batch.into())))
}

/// GET /api/v1/analyses/:id
///
/// Progress while running; ranked candidates and summary once complete.
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    _analyst: Analyst,
    Path(batch_id): Path<Uuid>,
) -> Result<Json<AnalysisResponse>, AppError> {
    let batch = state
        .batches
        .get(batch_id)
        .ok_or_else(|| AppError::NotFound(format!("Analysis {batch_id} not found")))?;
    Ok(Json(batch.into()))
}

/// GET /api/v1/analyses/:id/candidates/:candidate_id/preview
pub async fn handle_candidate_preview(
    State(state): State<AppState>,
    _analyst: Analyst,
    Path((batch_id, candidate_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<FilePreview>, AppError> {
    let batch = state
        .batches
        .get(batch_id)
        .ok_or_else(|| AppError::NotFound(format!("Analysis {batch_id} not found")))?;
    let record = batch
        .records
        .into_iter()
        .find(|r| r.id == candidate_id)
        .ok_or_else(|| AppError::NotFound(format!("Candidate {candidate_id} not found")))?;
    if record.source_file_bytes.is_empty() {
        return Err(AppError::NotFound(format!(
            "Original file for candidate {candidate_id} is no longer retained"
        )));
    }

    let preview = tokio::task::spawn_blocking(move || render_preview(&record))
        .await
        .map_err(|e| AppError::Internal(anyhow!("preview failed: {e}")))?;
    Ok(Json(preview))
}

async fn read_upload(mut multipart: Multipart) -> Result<AnalysisUpload, AppError> {
    let mut job_description = String::new();
    let mut resumes = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed upload: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "job_description" => {
                job_description = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Unreadable job description: {e}")))?;
            }
            "resumes" => {
                let file_name = field.file_name().unwrap_or("resume").to_string();
                let mime_type = field.content_type().unwrap_or("").to_string();
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Unreadable file {file_name}: {e}"))
                })?;
                resumes.push(UploadedResume {
                    file_name,
                    mime_type,
                    bytes,
                });
            }
            other => debug!("Ignoring unexpected upload field '{other}'"),
        }
    }

    Ok(AnalysisUpload {
        job_description,
        resumes,
    })
}
