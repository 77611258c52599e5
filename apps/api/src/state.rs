use std::sync::Arc;

use crate::generation::GenerationService;
use crate::store::GenerationLog;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub generation: Arc<GenerationService>,
    /// Read side of the generation record sink.
    pub history: Arc<dyn GenerationLog>,
}
