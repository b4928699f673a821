//! Conversation state threaded through every pipeline stage
//!
//! A `ConversationState` is created fresh for each request and only grows:
//! stages receive it by value, push their messages and hand it on.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Agent => f.write_str("agent"),
        }
    }
}

/// One turn in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    content: String,
}

impl Message {
    pub fn new<S: Into<String>>(role: Role, content: S) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user<S: Into<String>>(content: S) -> Self {
        Self::new(Role::User, content)
    }

    pub fn agent<S: Into<String>>(content: S) -> Self {
        Self::new(Role::Agent, content)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Append-only ordered log of messages for one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversationState {
    messages: Vec<Message>,
}

impl ConversationState {
    /// Empty state; pipelines start from [`ConversationState::from_user_message`]
    pub fn new() -> Self {
        Self::default()
    }

    /// State holding the single triggering user message
    pub fn from_user_message<S: Into<String>>(content: S) -> Self {
        Self {
            messages: vec![Message::user(content)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Builder-style push
    pub fn with(mut self, message: Message) -> Self {
        self.push(message);
        self
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Most recent message authored by the user
    pub fn last_user_message(&self) -> Option<&Message> {
        self.messages.iter().rev().find(|m| m.role == Role::User)
    }

    /// True when `self` is `earlier` followed by exactly `added` more messages
    pub fn extends(&self, earlier: &ConversationState, added: usize) -> bool {
        self.messages.len() == earlier.messages.len() + added
            && self.messages[..earlier.messages.len()] == earlier.messages[..]
    }
}
