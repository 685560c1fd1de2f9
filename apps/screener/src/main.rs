mod auth;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod routes;
mod screening;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::AnalystDirectory;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::screening::evaluator::LlmEvaluator;
use crate::screening::registry::BatchRegistry;
use crate::screening::store::{DisabledStore, PgRecordStore, RecordStore};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Missing LLM or analyst credentials stop the service before any batch runs
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Screener API v{}", env!("CARGO_PKG_VERSION"));

    let store = build_store(&config).await;

    let llm = LlmClient::new(&config.azure)?;
    info!(
        "LLM client initialized (deployment: {})",
        config.azure.chat_deployment
    );

    let analysts = AnalystDirectory::new(config.analysts.clone());
    info!("{} analyst account(s) configured", analysts.count());

    let state = AppState {
        evaluator: Arc::new(LlmEvaluator(llm)),
        store,
        analysts: Arc::new(analysts),
        batches: BatchRegistry::default(),
        max_upload_bytes: config.max_upload_bytes,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Postgres when configured and reachable; otherwise results stay in memory.
async fn build_store(config: &Config) -> Arc<dyn RecordStore> {
    let Some(database_url) = &config.database_url else {
        info!("DATABASE_URL not set; analyses will not be persisted");
        return Arc::new(DisabledStore);
    };

    match create_pool(database_url).await {
        Ok(pool) => Arc::new(PgRecordStore::new(pool)),
        Err(e) => {
            warn!("Storage unavailable ({e:#}); analyses will not be persisted");
            Arc::new(DisabledStore)
        }
    }
}
