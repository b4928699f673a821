//! Keyword classifier for incoming chat messages
//!
//! The classifier lower-cases the most recent user message and checks it
//! against ordered keyword sets. The first set with a substring hit wins;
//! no hit yields [`Decision::Unrecognized`].

use crate::agent::conversation::{ConversationState, Message};
use crate::config::ClassifierSection;
use crate::error::{AgentError, AgentResult};
use crate::routing::decision::Decision;
use tracing::debug;

/// Output of the classifier stage
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub decision: Decision,
    pub state: ConversationState,
}

/// Ordered keyword sets, one per routable decision
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    rules: Vec<(Decision, Vec<String>)>,
}

impl KeywordClassifier {
    /// Build from explicit rules; keywords are lower-cased once here
    pub fn new(rules: Vec<(Decision, Vec<String>)>) -> Self {
        let rules = rules
            .into_iter()
            .map(|(decision, keywords)| {
                let keywords = keywords
                    .into_iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect();
                (decision, keywords)
            })
            .collect();
        Self { rules }
    }

    pub fn from_config(section: &ClassifierSection) -> Self {
        Self::new(vec![
            (Decision::Data, section.data_keywords.clone()),
            (Decision::Analysis, section.analysis_keywords.clone()),
        ])
    }

    /// Decide on a label for `text` without touching any state
    pub fn decide(&self, text: &str) -> Decision {
        let text = text.to_lowercase();
        self.rules
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k.as_str())))
            .map(|(decision, _)| *decision)
            .unwrap_or(Decision::Unrecognized)
    }

    /// Classify the latest user message and append the routing message
    pub fn classify(&self, mut state: ConversationState) -> AgentResult<Classification> {
        let text = state
            .last_user_message()
            .map(|m| m.content().to_string())
            .ok_or_else(|| AgentError::invalid_input("conversation has no user message"))?;

        if text.trim().is_empty() {
            return Err(AgentError::invalid_input("user message must not be empty"));
        }

        let decision = self.decide(&text);
        debug!(decision = %decision, "Message classified");

        state.push(Message::agent(decision.routing_message()));
        Ok(Classification { decision, state })
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::from_config(&ClassifierSection::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::conversation::Role;

    #[test]
    fn test_data_keywords() {
        let classifier = KeywordClassifier::default();
        assert_eq!(classifier.decide("please fetch the latest data"), Decision::Data);
        assert_eq!(classifier.decide("FETCH it"), Decision::Data);
    }

    #[test]
    fn test_analysis_keywords() {
        let classifier = KeywordClassifier::default();
        assert_eq!(
            classifier.decide("give me a summary analysis"),
            Decision::Analysis
        );
        assert_eq!(classifier.decide("Analyze this"), Decision::Analysis);
    }

    #[test]
    fn test_declaration_order_breaks_ties() {
        let classifier = KeywordClassifier::default();
        assert_eq!(
            classifier.decide("summary of the data please"),
            Decision::Data
        );
    }

    #[test]
    fn test_no_match_is_unrecognized() {
        let classifier = KeywordClassifier::default();
        assert_eq!(classifier.decide("hello there"), Decision::Unrecognized);
    }

    #[test]
    fn test_custom_rules_are_normalized() {
        let classifier = KeywordClassifier::new(vec![(
            Decision::Analysis,
            vec!["  Report ".to_string(), "".to_string()],
        )]);
        assert_eq!(classifier.decide("weekly REPORT"), Decision::Analysis);
        assert_eq!(classifier.decide("anything else"), Decision::Unrecognized);
    }

    #[test]
    fn test_classify_appends_routing_message() {
        let classifier = KeywordClassifier::default();
        let state = ConversationState::from_user_message("fetch data");

        let classification = classifier.classify(state).unwrap();

        assert_eq!(classification.decision, Decision::Data);
        assert_eq!(classification.state.len(), 2);
        let last = classification.state.last().unwrap();
        assert_eq!(last.role(), Role::Agent);
        assert_eq!(last.content(), Decision::Data.routing_message());
    }

    #[test]
    fn test_classify_empty_state_is_invalid_input() {
        let classifier = KeywordClassifier::default();
        let result = classifier.classify(ConversationState::new());
        assert!(matches!(result, Err(AgentError::InvalidInput { .. })));
    }

    #[test]
    fn test_classify_blank_message_is_invalid_input() {
        let classifier = KeywordClassifier::default();
        let result = classifier.classify(ConversationState::from_user_message("   "));
        assert!(matches!(result, Err(AgentError::InvalidInput { .. })));
    }
}
