//! Pipeline orchestrator
//!
//! `AgentPipeline` wires classifier → handler → composer for one request.
//! It holds no per-request state, so a single instance is built at startup
//! and shared across concurrent requests behind an `Arc`.
//!
//! Only invalid input escapes `execute` as an error. A failing or panicking
//! handler or composer is turned into [`GENERIC_FAILURE_MESSAGE`] inside an
//! otherwise normal [`PipelineResult`].

use crate::agent::composer::{Composer, ResponseComposer, NO_RESPONSE_PLACEHOLDER};
use crate::agent::conversation::{ConversationState, Message, Role};
use crate::agent::handlers::Handler;
use crate::agent::pipeline::stage::{PipelineStage, StageTracker};
use crate::config::{AppConfig, PipelineSection};
use crate::error::{sanitize_error_message, AgentError, AgentResult, StageKind};
use crate::observability::metrics::metrics;
use crate::request_span;
use crate::routing::{Classification, Decision, HandlerRegistry, KeywordClassifier};
use chrono::Utc;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, Instrument};
use uuid::Uuid;

/// Response text substituted when a handler or the composer fails
pub const GENERIC_FAILURE_MESSAGE: &str = "Error processing message. Please try again later.";

/// How a pipeline run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    Completed,
    Failed,
}

/// Metadata attached to every pipeline result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    pub thread_id: String,
    pub decision: Decision,
    pub handler: String,
    pub outcome: RunOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handler_status: Option<String>,
}

/// Externally observable output of one invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub response_id: Uuid,
    pub message: String,
    pub timestamp: String,
    pub metadata: ResultMetadata,
}

/// Options controlling pipeline behaviour
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Append a routing annotation and re-append the user message before
    /// composing, so the composer sees the same trailing shape for every handler
    pub normalize_state: bool,
    pub max_message_chars: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from(&PipelineSection::default())
    }
}

impl From<&PipelineSection> for PipelineOptions {
    fn from(section: &PipelineSection) -> Self {
        Self {
            normalize_state: section.normalize_state,
            max_message_chars: section.max_message_chars,
        }
    }
}

/// Successful handler + composer run
struct StageRun {
    message: String,
    handler_status: String,
}

/// Stateless, shareable orchestrator
#[derive(Clone)]
pub struct AgentPipeline {
    classifier: KeywordClassifier,
    registry: HandlerRegistry,
    composer: Arc<dyn Composer>,
    options: PipelineOptions,
}

impl AgentPipeline {
    pub fn new(
        classifier: KeywordClassifier,
        registry: HandlerRegistry,
        composer: Arc<dyn Composer>,
        options: PipelineOptions,
    ) -> Self {
        Self {
            classifier,
            registry,
            composer,
            options,
        }
    }

    /// Pipeline with the built-in handlers and composer
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            KeywordClassifier::from_config(&config.classifier),
            HandlerRegistry::default(),
            Arc::new(ResponseComposer),
            PipelineOptions::from(&config.pipeline),
        )
    }

    /// Run one message through the pipeline
    pub async fn execute(&self, user_message: &str, thread_id: &str) -> AgentResult<PipelineResult> {
        let span = request_span!(thread_id = %thread_id);
        self.execute_inner(user_message, thread_id)
            .instrument(span)
            .await
    }

    async fn execute_inner(
        &self,
        user_message: &str,
        thread_id: &str,
    ) -> AgentResult<PipelineResult> {
        let started = Instant::now();
        let collector = metrics();
        collector.request_received();

        let Classification { decision, state } =
            match self.validate(user_message).and_then(|_| {
                self.classifier
                    .classify(ConversationState::from_user_message(user_message))
            }) {
                Ok(classification) => classification,
                Err(e) => {
                    collector.request_rejected();
                    info!(error = %sanitize_error_message(&e.to_string()), "Rejected message");
                    return Err(e);
                }
            };

        let mut tracker = StageTracker::new();
        tracker.advance(PipelineStage::Classified);
        collector.decision_made(decision.label());

        let handler = self.registry.resolve(decision);
        let handler_name = handler.name().to_string();

        let (message, outcome, handler_status) = match self
            .run_stages(handler.as_ref(), state, user_message, &mut tracker)
            .await
        {
            Ok(run) => {
                collector.request_completed(started.elapsed());
                (run.message, RunOutcome::Completed, Some(run.handler_status))
            }
            Err(e) => {
                let reached = tracker.current();
                tracker.advance(PipelineStage::Failed);
                collector.stage_failed(started.elapsed());
                error!(
                    decision = %decision,
                    handler = %handler_name,
                    reached = %reached,
                    error = %sanitize_error_message(&e.to_string()),
                    "Pipeline stage failed, returning generic response"
                );
                (GENERIC_FAILURE_MESSAGE.to_string(), RunOutcome::Failed, None)
            }
        };
        tracker.advance(PipelineStage::Done);

        info!(
            decision = %decision,
            handler = %handler_name,
            outcome = ?outcome,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Message processed"
        );

        Ok(PipelineResult {
            response_id: Uuid::new_v4(),
            message,
            timestamp: Utc::now().to_rfc3339(),
            metadata: ResultMetadata {
                thread_id: thread_id.to_string(),
                decision,
                handler: handler_name,
                outcome,
                handler_status,
            },
        })
    }

    fn validate(&self, user_message: &str) -> AgentResult<()> {
        if user_message.trim().is_empty() {
            return Err(AgentError::invalid_input("message must not be empty"));
        }
        let length = user_message.chars().count();
        if length > self.options.max_message_chars {
            return Err(AgentError::invalid_input(format!(
                "message is {length} characters, maximum is {}",
                self.options.max_message_chars
            )));
        }
        Ok(())
    }

    /// Handler, optional normalization and composer; any failure is a stage error
    async fn run_stages(
        &self,
        handler: &dyn Handler,
        state: ConversationState,
        trigger: &str,
        tracker: &mut StageTracker,
    ) -> AgentResult<StageRun> {
        let before = state.clone();
        let outcome = AssertUnwindSafe(handler.handle(state, trigger))
            .catch_unwind()
            .await
            .map_err(|panic| panic_to_stage_error(StageKind::Handler, panic))?
            .map_err(|e| AgentError::stage_failed(StageKind::Handler, e.message))?;
        ensure_single_agent_append(&outcome.state, &before, StageKind::Handler)?;
        tracker.advance(PipelineStage::Handled);

        let mut state = outcome.state;
        if self.options.normalize_state {
            state.push(Message::agent(format!(
                "Processing with {} agent...",
                handler.name()
            )));
            state.push(Message::user(trigger));
        }

        let before = state.clone();
        let composed = AssertUnwindSafe(self.composer.compose(state))
            .catch_unwind()
            .await
            .map_err(|panic| panic_to_stage_error(StageKind::Composer, panic))?
            .map_err(|e| AgentError::stage_failed(StageKind::Composer, e.message))?;
        ensure_single_agent_append(&composed, &before, StageKind::Composer)?;
        tracker.advance(PipelineStage::Composed);

        let message = composed
            .last()
            .map(Message::content)
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(NO_RESPONSE_PLACEHOLDER)
            .to_string();

        Ok(StageRun {
            message,
            handler_status: outcome.status,
        })
    }
}

impl Default for AgentPipeline {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

fn panic_to_stage_error(stage: StageKind, panic: Box<dyn Any + Send>) -> AgentError {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    AgentError::stage_failed(stage, format!("panicked: {detail}"))
}

fn ensure_single_agent_append(
    after: &ConversationState,
    before: &ConversationState,
    stage: StageKind,
) -> AgentResult<()> {
    let appended_agent = after.last().map(Message::role) == Some(Role::Agent);
    if after.extends(before, 1) && appended_agent {
        Ok(())
    } else {
        Err(AgentError::stage_failed(
            stage,
            "stage must append exactly one agent message and keep prior messages intact",
        ))
    }
}
