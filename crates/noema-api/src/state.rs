//! # Application State
//!
//! Shared state for all route handlers: the resolved configuration and the
//! orchestrator (which owns the evaluator and the cached proving keys
//! indirectly through the proof subsystem).

use std::sync::Arc;

use noema_core::NoemaConfig;
use noema_eval::{GeminiEvaluator, Orchestrator};

/// Shared application state; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Resolved service configuration.
    pub config: Arc<NoemaConfig>,
    /// The evaluation pipeline.
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Build state from a configuration, wiring the Gemini evaluator only
    /// when an API key is present.
    pub fn from_config(config: NoemaConfig) -> Self {
        let evaluator = if config.gemini_api_key.is_empty() {
            None
        } else {
            Some(Arc::new(GeminiEvaluator::new(
                config.gemini_api_key.clone(),
                config.gemini_model.clone(),
            )) as Arc<dyn noema_eval::Evaluator>)
        };
        let orchestrator = Arc::new(Orchestrator::new(config.clone(), evaluator));
        Self {
            config: Arc::new(config),
            orchestrator,
        }
    }
}
