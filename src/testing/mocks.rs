//! Mock implementations for testing
//!
//! Test doubles for handlers, the composer and handler backends, so pipeline
//! failure paths can be driven deterministically.

use crate::agent::composer::Composer;
use crate::agent::conversation::{ConversationState, Message};
use crate::agent::handlers::{Handler, HandlerBackend, HandlerOutcome};
use crate::error::StageError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Handler that always fails with the given message
#[derive(Debug, Clone)]
pub struct FailingHandler {
    message: String,
}

impl FailingHandler {
    pub fn new<S: Into<String>>(message: S) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl Handler for FailingHandler {
    fn name(&self) -> &str {
        "failing"
    }

    async fn handle(
        &self,
        _state: ConversationState,
        _trigger: &str,
    ) -> Result<HandlerOutcome, StageError> {
        Err(StageError::new(self.message.clone()))
    }
}

/// Handler that breaks the append-exactly-one contract by appending two messages
#[derive(Debug, Clone, Copy, Default)]
pub struct MisbehavingHandler;

#[async_trait]
impl Handler for MisbehavingHandler {
    fn name(&self) -> &str {
        "misbehaving"
    }

    async fn handle(
        &self,
        state: ConversationState,
        _trigger: &str,
    ) -> Result<HandlerOutcome, StageError> {
        Ok(HandlerOutcome {
            state: state
                .with(Message::agent("first"))
                .with(Message::agent("second")),
            status: "ok".to_string(),
        })
    }
}

/// Handler that panics instead of returning
#[derive(Debug, Clone, Copy, Default)]
pub struct PanickingHandler;

#[async_trait]
impl Handler for PanickingHandler {
    fn name(&self) -> &str {
        "panicking"
    }

    async fn handle(
        &self,
        _state: ConversationState,
        trigger: &str,
    ) -> Result<HandlerOutcome, StageError> {
        panic!("handler crashed while processing '{trigger}'")
    }
}

/// Handler that sleeps before appending its message
#[derive(Debug, Clone)]
pub struct DelayedHandler {
    delay: Duration,
}

impl DelayedHandler {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Handler for DelayedHandler {
    fn name(&self) -> &str {
        "delayed"
    }

    async fn handle(
        &self,
        mut state: ConversationState,
        trigger: &str,
    ) -> Result<HandlerOutcome, StageError> {
        tokio::time::sleep(self.delay).await;
        state.push(Message::agent(format!("DelayedAgent: handled '{trigger}'")));
        Ok(HandlerOutcome {
            state,
            status: "Delayed handling complete".to_string(),
        })
    }
}

/// Composer that always fails
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingComposer;

#[async_trait]
impl Composer for FailingComposer {
    async fn compose(&self, _state: ConversationState) -> Result<ConversationState, StageError> {
        Err(StageError::new("composer unavailable"))
    }
}

/// Composer that panics instead of returning
#[derive(Debug, Clone, Copy, Default)]
pub struct PanickingComposer;

#[async_trait]
impl Composer for PanickingComposer {
    async fn compose(&self, _state: ConversationState) -> Result<ConversationState, StageError> {
        panic!("composer crashed")
    }
}

/// Composer that appends a user message instead of an agent answer
#[derive(Debug, Clone, Copy, Default)]
pub struct MisbehavingComposer;

#[async_trait]
impl Composer for MisbehavingComposer {
    async fn compose(&self, state: ConversationState) -> Result<ConversationState, StageError> {
        Ok(state.with(Message::user("rewritten by composer")))
    }
}

/// Backend returning a canned response or failure, recording each call
#[derive(Debug, Clone)]
pub struct MockBackend {
    response: Result<String, StageError>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    pub fn responding<S: Into<String>>(response: S) -> Self {
        Self {
            response: Ok(response.into()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing<S: Into<String>>(message: S) -> Self {
        Self {
            response: Err(StageError::new(message)),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }
}

#[async_trait]
impl HandlerBackend for MockBackend {
    async fn run(&self, trigger: &str) -> Result<String, StageError> {
        self.calls.lock().await.push(trigger.to_string());
        self.response.clone()
    }
}
