//! Decision → handler registry
//!
//! Adding a handler means registering it here; the orchestrator only ever
//! asks the registry to resolve a decision.

use crate::agent::handlers::{AnalysisHandler, DataHandler, FallbackHandler, Handler};
use crate::routing::decision::Decision;
use std::collections::HashMap;
use std::sync::Arc;

/// Maps routable decisions to handlers, with a mandatory fallback
#[derive(Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<Decision, Arc<dyn Handler>>,
    fallback: Arc<dyn Handler>,
}

impl HandlerRegistry {
    /// Registry with no routable handlers; everything resolves to `fallback`
    pub fn new(fallback: Arc<dyn Handler>) -> Self {
        Self {
            handlers: HashMap::new(),
            fallback,
        }
    }

    /// Register (or replace) the handler for `decision`
    ///
    /// Registering for `Unrecognized` replaces the fallback, which also
    /// serves every routable decision left unregistered.
    pub fn register(mut self, decision: Decision, handler: Arc<dyn Handler>) -> Self {
        match decision {
            Decision::Unrecognized => self.fallback = handler,
            Decision::Data | Decision::Analysis => {
                self.handlers.insert(decision, handler);
            }
        }
        self
    }

    /// Handler that runs for `decision`
    pub fn resolve(&self, decision: Decision) -> Arc<dyn Handler> {
        match decision {
            Decision::Unrecognized => self.fallback.clone(),
            Decision::Data | Decision::Analysis => self
                .handlers
                .get(&decision)
                .cloned()
                .unwrap_or_else(|| self.fallback.clone()),
        }
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new(Arc::new(FallbackHandler))
            .register(Decision::Data, Arc::new(DataHandler::new()))
            .register(Decision::Analysis, Arc::new(AnalysisHandler::new()))
    }
}
