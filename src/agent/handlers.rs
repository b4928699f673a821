//! Handler stages selected by the routing decision
//!
//! Every handler shares one capability: take the conversation state and the
//! triggering text, append exactly one agent message and report a status.
//! Real data fetching or analysis lives behind a [`HandlerBackend`]; the
//! handlers here only frame its output.

use crate::agent::conversation::{ConversationState, Message};
use crate::error::StageError;
use async_trait::async_trait;
use std::sync::Arc;

/// Result of a successful handler run
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerOutcome {
    pub state: ConversationState,
    pub status: String,
}

/// A pipeline stage that performs a decision-specific action
#[async_trait]
pub trait Handler: Send + Sync {
    /// Short name used in logs, metadata and the routing annotation
    fn name(&self) -> &str;

    /// Append exactly one agent message describing the outcome
    async fn handle(
        &self,
        state: ConversationState,
        trigger: &str,
    ) -> Result<HandlerOutcome, StageError>;
}

/// Opaque collaborator that does the handler's real work
#[async_trait]
pub trait HandlerBackend: Send + Sync {
    async fn run(&self, trigger: &str) -> Result<String, StageError>;
}

async fn run_backend(
    backend: Option<&Arc<dyn HandlerBackend>>,
    marker: &str,
    trigger: &str,
) -> Result<String, StageError> {
    match backend {
        Some(backend) => {
            let detail = backend.run(trigger).await?;
            let detail = detail.trim();
            if detail.is_empty() {
                Ok(marker.to_string())
            } else {
                Ok(format!("{marker} {detail}"))
            }
        }
        None => Ok(marker.to_string()),
    }
}

/// Handler for data retrieval requests
#[derive(Clone, Default)]
pub struct DataHandler {
    backend: Option<Arc<dyn HandlerBackend>>,
}

impl DataHandler {
    pub const MARKER: &'static str = "DataAgent: Fetched and processed the required data.";
    pub const STATUS: &'static str = "Data fetched successfully";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(backend: Arc<dyn HandlerBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }
}

#[async_trait]
impl Handler for DataHandler {
    fn name(&self) -> &str {
        "data"
    }

    async fn handle(
        &self,
        mut state: ConversationState,
        trigger: &str,
    ) -> Result<HandlerOutcome, StageError> {
        let content = run_backend(self.backend.as_ref(), Self::MARKER, trigger).await?;
        state.push(Message::agent(content));
        Ok(HandlerOutcome {
            state,
            status: Self::STATUS.to_string(),
        })
    }
}

/// Handler for analysis and summary requests
#[derive(Clone, Default)]
pub struct AnalysisHandler {
    backend: Option<Arc<dyn HandlerBackend>>,
}

impl AnalysisHandler {
    pub const MARKER: &'static str = "AnalysisAgent: Performed analysis on the given input.";
    pub const STATUS: &'static str = "Analysis completed successfully";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_backend(backend: Arc<dyn HandlerBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }
}

#[async_trait]
impl Handler for AnalysisHandler {
    fn name(&self) -> &str {
        "analysis"
    }

    async fn handle(
        &self,
        mut state: ConversationState,
        trigger: &str,
    ) -> Result<HandlerOutcome, StageError> {
        let content = run_backend(self.backend.as_ref(), Self::MARKER, trigger).await?;
        state.push(Message::agent(content));
        Ok(HandlerOutcome {
            state,
            status: Self::STATUS.to_string(),
        })
    }
}

/// Handler for messages no keyword set matched; never fails
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackHandler;

impl FallbackHandler {
    pub const MARKER: &'static str =
        "FallbackAgent: I could not classify this request, so no specialised agent was called.";
    pub const STATUS: &'static str = "Request could not be classified";
}

#[async_trait]
impl Handler for FallbackHandler {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn handle(
        &self,
        mut state: ConversationState,
        _trigger: &str,
    ) -> Result<HandlerOutcome, StageError> {
        state.push(Message::agent(Self::MARKER));
        Ok(HandlerOutcome {
            state,
            status: Self::STATUS.to_string(),
        })
    }
}
