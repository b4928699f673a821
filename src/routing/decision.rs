//! Routing decision produced by the classifier

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which handler a message is routed to
///
/// `Unrecognized` is the reserved fallback label: any message that matches no
/// keyword set ends up here, so classification always yields a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Data,
    Analysis,
    Unrecognized,
}

impl Decision {
    pub fn label(&self) -> &'static str {
        match self {
            Decision::Data => "data",
            Decision::Analysis => "analysis",
            Decision::Unrecognized => "unrecognized",
        }
    }

    /// Message the classifier appends to describe its choice
    pub fn routing_message(&self) -> &'static str {
        match self {
            Decision::Data => "DeciderAgent: I will call DataAgent for this task.",
            Decision::Analysis => "DeciderAgent: I will call AnalysisAgent for this task.",
            Decision::Unrecognized => "DeciderAgent: I couldn't decide which agent to call.",
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
