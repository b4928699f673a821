//! Property tests for message routing

use agentic_chat::agent::{AgentPipeline, AnalysisHandler, DataHandler, FallbackHandler};
use agentic_chat::routing::{Decision, KeywordClassifier};
use proptest::prelude::*;

const DATA_KEYWORDS: [&str; 2] = ["data", "fetch"];
const ANALYSIS_KEYWORDS: [&str; 2] = ["analyze", "summary"];

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Text that cannot contain any default keyword: digits, spaces and a few
/// consonants that never spell one
fn neutral_text() -> impl Strategy<Value = String> {
    "[0-9 bcghjkmpqvwxz]{1,40}".prop_filter("must not be blank", |s| !s.trim().is_empty())
}

fn random_case(word: &str, mask: u64) -> String {
    word.chars()
        .enumerate()
        .map(|(i, c)| {
            if mask & (1 << (i % 64)) != 0 {
                c.to_ascii_uppercase()
            } else {
                c
            }
        })
        .collect()
}

proptest! {
    #[test]
    fn data_keyword_routes_to_data(
        prefix in neutral_text(),
        suffix in neutral_text(),
        idx in 0usize..2,
        mask in any::<u64>(),
    ) {
        let text = format!("{prefix} {} {suffix}", random_case(DATA_KEYWORDS[idx], mask));
        let result = runtime().block_on(AgentPipeline::default().execute(&text, "prop")).unwrap();

        prop_assert_eq!(result.metadata.decision, Decision::Data);
        prop_assert!(result.message.contains(DataHandler::MARKER));
    }

    #[test]
    fn analysis_keyword_routes_to_analysis(
        prefix in neutral_text(),
        idx in 0usize..2,
        mask in any::<u64>(),
    ) {
        let text = format!("{prefix} {}", random_case(ANALYSIS_KEYWORDS[idx], mask));
        let result = runtime().block_on(AgentPipeline::default().execute(&text, "prop")).unwrap();

        prop_assert_eq!(result.metadata.decision, Decision::Analysis);
        prop_assert!(result.message.contains(AnalysisHandler::MARKER));
    }

    #[test]
    fn neutral_text_routes_to_fallback(text in neutral_text()) {
        let result = runtime().block_on(AgentPipeline::default().execute(&text, "prop")).unwrap();

        prop_assert_eq!(result.metadata.decision, Decision::Unrecognized);
        prop_assert!(result.message.contains(FallbackHandler::MARKER));
        prop_assert!(!result.message.is_empty());
        prop_assert!(chrono::DateTime::parse_from_rfc3339(&result.timestamp).is_ok());
    }

    #[test]
    fn data_keywords_win_over_analysis(
        a in 0usize..2,
        d in 0usize..2,
        analysis_first in any::<bool>(),
    ) {
        let text = if analysis_first {
            format!("{} then {}", ANALYSIS_KEYWORDS[a], DATA_KEYWORDS[d])
        } else {
            format!("{} then {}", DATA_KEYWORDS[d], ANALYSIS_KEYWORDS[a])
        };
        prop_assert_eq!(KeywordClassifier::default().decide(&text), Decision::Data);
    }
}
