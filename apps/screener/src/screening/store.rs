//! Best-effort persistence of analysed candidates.

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tracing::debug;

use crate::models::analysis::AnalysisRow;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Append-only sink for analysis rows.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn persist(&self, row: &AnalysisRow) -> Result<(), StorageError>;
}

/// Appends rows to the `candidate_analyses` table.
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn persist(&self, row: &AnalysisRow) -> Result<(), StorageError> {
        sqlx::query(
            r#"INSERT INTO candidate_analyses
               (analyzed_at, analyzed_by, applicant_name, source_file_name, match_percentage,
                final_recommendation, strengths, missing_skills, summary, years_experience,
                education_level)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)"#,
        )
        .bind(row.analyzed_at)
        .bind(&row.analyzed_by)
        .bind(&row.applicant_name)
        .bind(&row.source_file_name)
        .bind(row.match_percentage)
        .bind(&row.final_recommendation)
        .bind(&row.strengths)
        .bind(&row.missing_skills)
        .bind(&row.summary)
        .bind(&row.years_experience)
        .bind(&row.education_level)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

/// Used when no database is configured: results stay in memory only.
pub struct DisabledStore;

#[async_trait]
impl RecordStore for DisabledStore {
    async fn persist(&self, row: &AnalysisRow) -> Result<(), StorageError> {
        debug!(
            "Storage not configured; skipping save of {}",
            row.applicant_name
        );
        Ok(())
    }
}
