//! Testing utilities and mock implementations
//!
//! Mock handlers, composers and backends for exercising the pipeline
//! without real data or analysis services.

pub mod mocks;

pub use mocks::*;
