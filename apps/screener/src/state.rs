use std::sync::Arc;

use crate::auth::AnalystDirectory;
use crate::screening::evaluator::Evaluator;
use crate::screening::registry::BatchRegistry;
use crate::screening::store::RecordStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub evaluator: Arc<dyn Evaluator>,
    /// Postgres-backed, or a no-op when no database is configured.
    pub store: Arc<dyn RecordStore>,
    pub analysts: Arc<AnalystDirectory>,
    pub batches: BatchRegistry,
    pub max_upload_bytes: usize,
}
