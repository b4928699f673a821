//! Final response composition

use crate::agent::conversation::{ConversationState, Message};
use crate::error::StageError;
use async_trait::async_trait;

/// Text used when the latest message has no displayable content
pub const NO_RESPONSE_PLACEHOLDER: &str = "No response generated";

/// Final pipeline stage producing the outward-facing message
#[async_trait]
pub trait Composer: Send + Sync {
    /// Append exactly one agent message closing the conversation
    async fn compose(&self, state: ConversationState) -> Result<ConversationState, StageError>;
}

/// Wraps the latest message into a closing statement
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseComposer;

impl ResponseComposer {
    pub const PREFIX: &'static str = "ResponseAgent: Here is your final answer →";

    /// Displayable text of the latest message, or the placeholder
    pub fn latest_content(state: &ConversationState) -> &str {
        state
            .last()
            .map(Message::content)
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(NO_RESPONSE_PLACEHOLDER)
    }
}

#[async_trait]
impl Composer for ResponseComposer {
    async fn compose(
        &self,
        mut state: ConversationState,
    ) -> Result<ConversationState, StageError> {
        let closing = format!("{} {}", Self::PREFIX, Self::latest_content(&state));
        state.push(Message::agent(closing));
        Ok(state)
    }
}
