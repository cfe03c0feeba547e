use std::sync::Arc;

use crate::analysis::{Analyzer, ResultStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
    /// Present when server-side persistence is enabled. Also backs the history read path.
    pub store: Option<Arc<dyn ResultStore>>,
}
