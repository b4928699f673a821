//! Agent stages and the pipeline that runs them
//!
//! Conversation state flows classifier → handler → composer inside
//! [`AgentPipeline`]; this module holds the state type, the handler and
//! composer stages, and the orchestrator.

pub mod composer;
pub mod conversation;
pub mod handlers;
pub mod pipeline;

pub use composer::*;
pub use conversation::*;
pub use handlers::*;
pub use pipeline::*;
