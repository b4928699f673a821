//! End-to-end tests for the chat pipeline
//!
//! Covers:
//! - Routing of each decision through its handler and the composer
//! - Failure swallowing for handlers, backends and the composer, including panics
//! - Identifier uniqueness and concurrent invocations
//! - Registering additional handlers without touching the orchestrator


use agentic_chat::agent::{
    AgentPipeline, AnalysisHandler, ConversationState, DataHandler, FallbackHandler, Handler,
    HandlerBackend, HandlerOutcome, Message, ResponseComposer, RunOutcome,
    GENERIC_FAILURE_MESSAGE,
};
use agentic_chat::error::{AgentError, StageError};
use agentic_chat::routing::Decision;
use agentic_chat::testing::mocks::{
    DelayedHandler, FailingComposer, FailingHandler, MisbehavingComposer, MockBackend,
    PanickingComposer, PanickingHandler,
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[tokio::test]
async fn test_fetch_data_example() {
    let pipeline = AgentPipeline::default();

    let result = pipeline
        .execute("please fetch the latest data", "thread-1")
        .await
        .unwrap();

    assert_eq!(result.metadata.decision, Decision::Data);
    assert!(result.message.contains(DataHandler::MARKER));
    assert!(result.message.contains("Here is your final answer"));
    assert_eq!(
        result.message,
        format!("{} {}", ResponseComposer::PREFIX, DataHandler::MARKER)
    );
}

#[tokio::test]
async fn test_summary_analysis_example() {
    let result = AgentPipeline::default()
        .execute("give me a summary analysis", "thread-1")
        .await
        .unwrap();

    assert_eq!(result.metadata.decision, Decision::Analysis);
    assert!(result.message.contains(AnalysisHandler::MARKER));
}

#[tokio::test]
async fn test_hello_there_example() {
    let result = AgentPipeline::default()
        .execute("hello there", "thread-1")
        .await
        .unwrap();

    assert_eq!(result.metadata.decision, Decision::Unrecognized);
    assert_eq!(result.metadata.outcome, RunOutcome::Completed);
    assert!(result.message.contains("could not classify"));
    assert!(result.message.contains(FallbackHandler::MARKER));
}

#[tokio::test]
async fn test_identical_requests_get_distinct_ids() {
    let pipeline = AgentPipeline::default();

    let first = pipeline.execute("fetch data", "same-thread").await.unwrap();
    let second = pipeline.execute("fetch data", "same-thread").await.unwrap();

    assert_ne!(first.response_id, second.response_id);
    assert_eq!(first.message, second.message);
    assert_eq!(first.metadata.thread_id, second.metadata.thread_id);
}

#[tokio::test]
async fn test_failing_handler_returns_generic_message() {
    let pipeline = test_helpers::pipeline_with_handler(
        Decision::Data,
        Arc::new(FailingHandler::new("upstream exploded")),
    );

    let result = pipeline.execute("fetch data", "thread-2").await.unwrap();

    assert_eq!(result.message, GENERIC_FAILURE_MESSAGE);
    assert!(!result.message.contains("exploded"));
    assert_eq!(result.metadata.outcome, RunOutcome::Failed);
    assert_eq!(result.metadata.thread_id, "thread-2");
    assert!(chrono::DateTime::parse_from_rfc3339(&result.timestamp).is_ok());
}

#[tokio::test]
async fn test_failing_backend_returns_generic_message() {
    let backend = Arc::new(MockBackend::failing("warehouse timeout"));
    let pipeline = test_helpers::pipeline_with_handler(
        Decision::Analysis,
        Arc::new(AnalysisHandler::with_backend(backend.clone())),
    );

    let result = pipeline.execute("analyze sales", "t").await.unwrap();

    assert_eq!(result.message, GENERIC_FAILURE_MESSAGE);
    assert_eq!(backend.calls().await, vec!["analyze sales".to_string()]);
}

#[tokio::test]
async fn test_backend_output_reaches_response() {
    let backend = Arc::new(MockBackend::responding("42 records"));
    let pipeline = test_helpers::pipeline_with_handler(
        Decision::Data,
        Arc::new(DataHandler::with_backend(backend)),
    );

    let result = pipeline.execute("fetch records data", "t").await.unwrap();

    assert!(result.message.contains(DataHandler::MARKER));
    assert!(result.message.ends_with("42 records"));
}

#[tokio::test]
async fn test_failing_composer_returns_generic_message() {
    let pipeline = test_helpers::pipeline_with_composer(Arc::new(FailingComposer));

    let result = pipeline.execute("hello there", "t").await.unwrap();

    assert_eq!(result.message, GENERIC_FAILURE_MESSAGE);
    assert_eq!(result.metadata.outcome, RunOutcome::Failed);
}

#[tokio::test]
async fn test_misbehaving_composer_returns_generic_message() {
    let pipeline = test_helpers::pipeline_with_composer(Arc::new(MisbehavingComposer));

    let result = pipeline.execute("fetch data", "t").await.unwrap();

    assert_eq!(result.message, GENERIC_FAILURE_MESSAGE);
    assert!(!result.message.contains("rewritten"));
    assert_eq!(result.metadata.outcome, RunOutcome::Failed);
}

#[tokio::test]
async fn test_panicking_handler_returns_generic_message() {
    let pipeline =
        test_helpers::pipeline_with_handler(Decision::Data, Arc::new(PanickingHandler));

    // Spawned so a panic escaping execute would surface as a JoinError
    let joined = tokio::spawn(async move { pipeline.execute("fetch data", "t").await }).await;

    let result = joined.expect("panic escaped the pipeline").unwrap();
    assert_eq!(result.message, GENERIC_FAILURE_MESSAGE);
    assert_eq!(result.metadata.outcome, RunOutcome::Failed);
    assert!(result.metadata.handler_status.is_none());
}

#[tokio::test]
async fn test_panicking_composer_returns_generic_message() {
    let pipeline = test_helpers::pipeline_with_composer(Arc::new(PanickingComposer));

    let result = pipeline.execute("summary please", "t").await.unwrap();

    assert_eq!(result.message, GENERIC_FAILURE_MESSAGE);
    assert_eq!(result.metadata.decision, Decision::Analysis);
}

struct PanickingBackend;

#[async_trait]
impl HandlerBackend for PanickingBackend {
    async fn run(&self, _trigger: &str) -> Result<String, StageError> {
        let rows: Vec<String> = Vec::new();
        Ok(rows[3].clone())
    }
}

#[tokio::test]
async fn test_panicking_backend_returns_generic_message() {
    let pipeline = test_helpers::pipeline_with_handler(
        Decision::Data,
        Arc::new(DataHandler::with_backend(Arc::new(PanickingBackend))),
    );

    let result = pipeline.execute("fetch data", "t").await.unwrap();

    assert_eq!(result.message, GENERIC_FAILURE_MESSAGE);
    assert_eq!(result.metadata.handler, "data");
}

#[tokio::test]
async fn test_invalid_input_is_not_swallowed() {
    let pipeline = AgentPipeline::default();

    for input in ["", "   ", "\n\t"] {
        let result = pipeline.execute(input, "t").await;
        assert!(
            matches!(result, Err(AgentError::InvalidInput { .. })),
            "expected invalid input for {input:?}"
        );
    }
}

struct EchoHandler;

#[async_trait]
impl Handler for EchoHandler {
    fn name(&self) -> &str {
        "echo"
    }

    async fn handle(
        &self,
        mut state: ConversationState,
        trigger: &str,
    ) -> Result<HandlerOutcome, StageError> {
        state.push(Message::agent(format!("EchoAgent: {trigger}")));
        Ok(HandlerOutcome {
            state,
            status: "Echoed".to_string(),
        })
    }
}

#[tokio::test]
async fn test_registering_custom_handler() {
    let pipeline = test_helpers::pipeline_with_handler(Decision::Analysis, Arc::new(EchoHandler));

    let result = pipeline.execute("summary please", "t").await.unwrap();

    assert_eq!(result.metadata.handler, "echo");
    assert_eq!(result.metadata.handler_status.as_deref(), Some("Echoed"));
    assert!(result.message.ends_with("EchoAgent: summary please"));
}

#[tokio::test]
async fn test_registering_handler_for_unrecognized_replaces_fallback() {
    let pipeline =
        test_helpers::pipeline_with_handler(Decision::Unrecognized, Arc::new(EchoHandler));

    let result = pipeline.execute("hello there", "t").await.unwrap();

    assert_eq!(result.metadata.decision, Decision::Unrecognized);
    assert_eq!(result.metadata.handler, "echo");
    assert!(result.message.ends_with("EchoAgent: hello there"));
    assert!(!result.message.contains(FallbackHandler::MARKER));
}

#[tokio::test]
async fn test_concurrent_invocations_are_independent() {
    let pipeline = Arc::new(AgentPipeline::default());
    let inputs = ["fetch data", "summary", "hello", "analyze", "data please"];

    let results = futures::future::join_all(inputs.iter().enumerate().map(|(i, text)| {
        let pipeline = pipeline.clone();
        async move { pipeline.execute(text, &format!("thread-{i}")).await }
    }))
    .await;

    let mut ids = HashSet::new();
    for (i, result) in results.into_iter().enumerate() {
        let result = result.unwrap();
        assert_eq!(result.metadata.thread_id, format!("thread-{i}"));
        assert!(ids.insert(result.response_id));
    }

    let decisions = [
        Decision::Data,
        Decision::Analysis,
        Decision::Unrecognized,
        Decision::Analysis,
        Decision::Data,
    ];
    for (text, expected) in inputs.iter().zip(decisions) {
        let result = pipeline.execute(text, "check").await.unwrap();
        assert_eq!(result.metadata.decision, expected, "input {text:?}");
    }
}

#[tokio::test]
async fn test_slow_handler_does_not_block_other_requests() {
    let slow = Arc::new(test_helpers::pipeline_with_handler(
        Decision::Data,
        Arc::new(DelayedHandler::new(Duration::from_millis(300))),
    ));
    let fast = Arc::new(AgentPipeline::default());

    let slow_task = {
        let slow = slow.clone();
        tokio::spawn(async move { slow.execute("fetch data", "slow").await })
    };

    let started = Instant::now();
    let fast_result = fast.execute("hello", "fast").await.unwrap();
    assert!(started.elapsed() < Duration::from_millis(300));
    assert_eq!(fast_result.metadata.decision, Decision::Unrecognized);

    let slow_result = slow_task.await.unwrap().unwrap();
    assert_eq!(slow_result.metadata.handler, "delayed");
    assert!(slow_result.message.contains("DelayedAgent"));
}

#[tokio::test]
async fn test_result_serialization_shape() {
    let result = AgentPipeline::default()
        .execute("fetch data", "thread-json")
        .await
        .unwrap();

    let json = serde_json::to_value(&result).unwrap();
    assert!(json["response_id"].is_string());
    assert!(json["message"].is_string());
    assert!(json["timestamp"].is_string());
    assert_eq!(json["metadata"]["thread_id"], "thread-json");
    assert_eq!(json["metadata"]["decision"], "data");
    assert_eq!(json["metadata"]["outcome"], "completed");
}
