//! HTTP surface for the chat pipeline
//!
//! `POST /{api_prefix}/chat/chat` runs one message through the shared
//! [`AgentPipeline`]. Errors are returned as `{"detail": "..."}`.

pub mod server;

use crate::agent::pipeline::AgentPipeline;
use crate::error::{sanitize_error_message, AgentError};
use crate::http_span;
use crate::observability::health::{self, HealthState};
use crate::observability::metrics::metrics;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use warp::filters::BoxedFilter;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

pub use server::serve;

/// Maximum accepted request body size in bytes
const MAX_BODY_BYTES: u64 = 64 * 1024;

/// Chat request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub thread_id: String,
}

/// Error body, mirroring the `detail` convention of the chat clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// State shared by every request handler
pub struct ApiContext {
    pub pipeline: Arc<AgentPipeline>,
    pub health: Arc<HealthState>,
    pub request_timeout: Duration,
}

impl ApiContext {
    pub fn new(
        pipeline: Arc<AgentPipeline>,
        health: Arc<HealthState>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            pipeline,
            health,
            request_timeout,
        }
    }
}

/// Filter matching each non-empty segment of `prefix`
fn prefix_filter(prefix: &str) -> BoxedFilter<()> {
    prefix
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(warp::any().boxed(), |filter, segment| {
            filter.and(warp::path(segment.to_string())).boxed()
        })
}

/// Chat API plus observability routes, with rejection recovery and tracing
pub fn routes(
    ctx: Arc<ApiContext>,
    api_prefix: &str,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let health_routes = health::routes(ctx.health.clone());
    let with_ctx = warp::any().map(move || ctx.clone());

    let chat = prefix_filter(api_prefix)
        .and(warp::path("chat"))
        .and(warp::path("chat"))
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(with_ctx)
        .and_then(handle_chat);

    chat.or(health_routes)
        .with(warp::cors().allow_any_origin())
        .with(warp::trace(|info| {
            http_span!(method = %info.method(), path = %info.path())
        }))
        .recover(handle_rejection)
}

fn error_reply(status: StatusCode, detail: String) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(warp::reply::json(&ErrorResponse { detail }), status)
}

async fn handle_chat(
    request: ChatRequest,
    ctx: Arc<ApiContext>,
) -> Result<warp::reply::WithStatus<warp::reply::Json>, Infallible> {
    if request.thread_id.trim().is_empty() {
        let error = AgentError::invalid_input("thread_id must not be empty");
        return Ok(error_reply(error.status_code(), error.detail()));
    }

    let execution = ctx
        .pipeline
        .execute(&request.message, &request.thread_id);

    let reply = match tokio::time::timeout(ctx.request_timeout, execution).await {
        Ok(Ok(result)) => {
            ctx.health.mark_request_processed();
            warp::reply::with_status(warp::reply::json(&result), StatusCode::OK)
        }
        Ok(Err(error)) => error_reply(error.status_code(), error.detail()),
        Err(_) => {
            metrics().request_timed_out();
            let error = AgentError::Timeout {
                seconds: ctx.request_timeout.as_secs(),
            };
            warn!(thread_id = %request.thread_id, "Chat request timed out");
            error_reply(error.status_code(), error.detail())
        }
    };

    Ok(reply)
}

async fn handle_rejection(
    err: Rejection,
) -> Result<warp::reply::WithStatus<warp::reply::Json>, Infallible> {
    let (status, detail) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            sanitize_error_message(&e.to_string()),
        )
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            "Request body too large".to_string(),
        )
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "Expected application/json body".to_string(),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            "Method Not Allowed".to_string(),
        )
    } else {
        warn!(rejection = ?err, "Unhandled rejection");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal Server Error".to_string(),
        )
    };

    Ok(error_reply(status, detail))
}
