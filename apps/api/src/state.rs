use std::sync::Arc;

use crate::analysis::matcher::SkillMatcher;
use crate::config::Config;
use crate::llm_client::TextGenerator;

/// Shared application state injected into all route handlers via Axum extractors.
/// Everything here is read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Built once from the taxonomy.
    pub matcher: Arc<SkillMatcher>,
    /// Absent when no credential is configured; the analysis then runs offline.
    pub generator: Option<Arc<dyn TextGenerator>>,
}
