//! Message routing
//!
//! The classifier turns the latest user message into a [`Decision`]; the
//! registry turns a decision into the handler that runs for it.

pub mod classifier;
pub mod decision;
pub mod registry;

pub use classifier::{Classification, KeywordClassifier};
pub use decision::Decision;
pub use registry::HandlerRegistry;
