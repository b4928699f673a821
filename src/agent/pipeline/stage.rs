//! Stage progression for a single pipeline run
//!
//! ```text
//! Start → Classified → Handled → Composed → Done
//!                  ╲         ╲
//!                   ╲─────────╲──→ Failed → Done
//! ```
//!
//! The Classified → Handled edge is where the decision fans out to one
//! handler; it joins again before composition. No stage is revisited.

use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Start,
    Classified,
    Handled,
    Composed,
    Failed,
    Done,
}

impl PipelineStage {
    pub fn can_transition_to(self, next: PipelineStage) -> bool {
        use PipelineStage::*;
        matches!(
            (self, next),
            (Start, Classified)
                | (Classified, Handled)
                | (Classified, Failed)
                | (Handled, Composed)
                | (Handled, Failed)
                | (Composed, Done)
                | (Failed, Done)
        )
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Start => "start",
            PipelineStage::Classified => "classified",
            PipelineStage::Handled => "handled",
            PipelineStage::Composed => "composed",
            PipelineStage::Failed => "failed",
            PipelineStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Tracks the stage one run has reached
#[derive(Debug, Clone)]
pub struct StageTracker {
    current: PipelineStage,
}

impl StageTracker {
    pub fn new() -> Self {
        Self {
            current: PipelineStage::Start,
        }
    }

    pub fn current(&self) -> PipelineStage {
        self.current
    }

    pub fn advance(&mut self, next: PipelineStage) {
        let current = self.current();
        if !current.can_transition_to(next) {
            warn!(from = %current, to = %next, "Unexpected pipeline stage transition");
        }
        debug!(from = %current, to = %next, "Pipeline stage transition");
        self.current = next;
    }
}

impl Default for StageTracker {
    fn default() -> Self {
        Self::new()
    }
}
