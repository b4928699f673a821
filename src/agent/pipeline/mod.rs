//! Pipeline orchestration for chat requests

pub mod pipeline_orchestrator;
pub mod stage;

pub use pipeline_orchestrator::{
    AgentPipeline, PipelineOptions, PipelineResult, ResultMetadata, RunOutcome,
    GENERIC_FAILURE_MESSAGE,
};
pub use stage::{PipelineStage, StageTracker};
