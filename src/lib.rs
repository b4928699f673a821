//! Agentic Chat
//!
//! A conversational backend that routes each chat message through a small
//! agent pipeline: a keyword classifier picks a handler (data, analysis or
//! fallback), the handler records its outcome, and a composer produces the
//! final response.
//!
//! # Quick Start
//!
//! ```rust
//! use agentic_chat::agent::AgentPipeline;
//! use agentic_chat::routing::Decision;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let pipeline = AgentPipeline::default();
//! let result = pipeline
//!     .execute("please fetch the latest data", "thread-42")
//!     .await
//!     .unwrap();
//!
//! assert_eq!(result.metadata.decision, Decision::Data);
//! assert!(result.message.contains("DataAgent"));
//! # }
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod observability;
pub mod routing;
pub mod testing;

pub use agent::{AgentPipeline, ConversationState, Message, PipelineResult, Role};
pub use config::*;
pub use error::{AgentError, AgentResult, StageError};
pub use routing::{Decision, HandlerRegistry, KeywordClassifier};
