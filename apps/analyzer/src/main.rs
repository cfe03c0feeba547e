mod analysis;
mod config;
mod db;
mod errors;
mod extraction;
mod llm_client;
mod models;
mod routes;
mod scoring;
mod state;
mod storage;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::{Analyzer, PgResultStore, ResultStore};
use crate::config::Config;
use crate::db::create_pool;
use crate::extraction::{DocxExtractor, Extractors};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::scoring::LlmAtsScorer;
use crate::state::AppState;
use crate::storage::S3DocumentFetcher;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; every missing or malformed variable is reported together
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume analyzer v{}", env!("CARGO_PKG_VERSION"));

    // Initialize S3 / MinIO
    let fetcher = Arc::new(S3DocumentFetcher::connect(&config).await);
    info!(bucket = %config.s3_bucket, "S3 client initialized");

    // Initialize LLM client
    let llm = LlmClient::new(
        config.scoring_api_key.clone(),
        config.scoring_api_url.clone(),
        config.scoring_model.clone(),
    )?;
    info!("LLM client initialized (model: {})", llm.model());
    let scorer = Arc::new(LlmAtsScorer::new(llm));

    let extractors = Extractors::new(DocxExtractor::new(config.docx_include_headers_footers));
    let mut analyzer = Analyzer::new(fetcher, scorer, extractors, config.deadlines());

    // Initialize PostgreSQL only when results are persisted
    let store: Option<Arc<dyn ResultStore>> = match (&config.database_url, config.persist_results) {
        (Some(url), true) => {
            let pool = create_pool(url).await?;
            Some(Arc::new(PgResultStore::new(pool)))
        }
        _ => {
            warn!("Result persistence disabled; history endpoint will answer 501");
            None
        }
    };
    if let Some(store) = &store {
        analyzer = analyzer.with_store(store.clone());
    }

    let state = AppState {
        analyzer: Arc::new(analyzer),
        store,
    };

    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
