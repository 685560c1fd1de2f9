//! Per-batch state shared between the running batch task and HTTP readers.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use bytes::Bytes;
use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use crate::models::candidate::CandidateRecord;
use crate::screening::batch::{BatchEvent, BatchOutcome, BatchProgress, FileNotice};

/// Completed batches beyond this count are evicted, oldest first.
const MAX_RETAINED_BATCHES: usize = 64;
/// Only the newest completed batches keep their uploaded files for preview.
const MAX_BATCHES_WITH_FILES: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Running,
    Complete,
}

#[derive(Debug, Clone)]
pub struct BatchState {
    pub id: Uuid,
    pub analyst: String,
    pub started_at: NaiveDateTime,
    pub status: BatchStatus,
    pub progress: BatchProgress,
    pub notices: Vec<FileNotice>,
    /// Upload order; rank on read.
    pub records: Vec<CandidateRecord>,
}

#[derive(Clone, Default)]
pub struct BatchRegistry {
    batches: Arc<RwLock<HashMap<Uuid, BatchState>>>,
}

impl BatchRegistry {
    /// Registers a new running batch and returns its id.
    pub fn start(&self, analyst: &str, total: usize, started_at: NaiveDateTime) -> Uuid {
        let id = Uuid::new_v4();
        let mut batches = self.batches.write().unwrap_or_else(PoisonError::into_inner);
        evict_completed(&mut batches);
        batches.insert(
            id,
            BatchState {
                id,
                analyst: analyst.to_string(),
                started_at,
                status: BatchStatus::Running,
                progress: BatchProgress {
                    completed: 0,
                    total,
                    current_file: None,
                },
                notices: vec![],
                records: vec![],
            },
        );
        id
    }

    pub fn apply(&self, id: Uuid, event: &BatchEvent) {
        let mut batches = self.batches.write().unwrap_or_else(PoisonError::into_inner);
        let Some(batch) = batches.get_mut(&id) else {
            return;
        };
        match event {
            BatchEvent::Started { file_name } => {
                batch.progress.current_file = Some(file_name.clone());
            }
            BatchEvent::Notice(notice) => batch.notices.push(notice.clone()),
            BatchEvent::Progress(progress) => batch.progress = progress.clone(),
        }
    }

    /// Stores the final outcome; it replaces any notices seen while running.
    pub fn finish(&self, id: Uuid, outcome: BatchOutcome) {
        let mut batches = self.batches.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(batch) = batches.get_mut(&id) {
            batch.status = BatchStatus::Complete;
            batch.progress.completed = batch.progress.total;
            batch.progress.current_file = None;
            batch.notices = outcome.notices;
            batch.records = outcome.records;
        }
        release_old_files(&mut batches);
    }

    pub fn get(&self, id: Uuid) -> Option<BatchState> {
        self.batches
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
    }
}

fn evict_completed(batches: &mut HashMap<Uuid, BatchState>) {
    while batches.len() >= MAX_RETAINED_BATCHES {
        let oldest = batches
            .values()
            .filter(|b| b.status == BatchStatus::Complete)
            .min_by_key(|b| b.started_at)
            .map(|b| b.id);
        match oldest {
            Some(id) => {
                batches.remove(&id);
            }
            None => break,
        }
    }
}

fn release_old_files(batches: &mut HashMap<Uuid, BatchState>) {
    let mut completed: Vec<&mut BatchState> = batches
        .values_mut()
        .filter(|b| b.status == BatchStatus::Complete)
        .collect();
    completed.sort_by(|a, b| b.started_at.cmp(&a.started_at));
    for batch in completed.into_iter().skip(MAX_BATCHES_WITH_FILES) {
        for record in &mut batch.records {
            record.source_file_bytes = Bytes::new();
        }
    }
}
