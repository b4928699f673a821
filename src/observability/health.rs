//! Health, readiness and metrics HTTP endpoints
//!
//! Served on the same listener as the chat API.

use crate::observability::metrics::metrics;
use serde::Serialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

/// Seconds without a chat request after which the pipeline is reported idle
const IDLE_THRESHOLD_SECONDS: u64 = 300;

/// Shared service health state
#[derive(Debug)]
pub struct HealthState {
    service_name: String,
    version: String,
    ready: AtomicBool,
    last_request_processed: AtomicU64,
}

impl HealthState {
    pub fn new<S: Into<String>>(service_name: S, version: S) -> Self {
        Self {
            service_name: service_name.into(),
            version: version.into(),
            ready: AtomicBool::new(false),
            last_request_processed: AtomicU64::new(0),
        }
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Relaxed);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    pub fn mark_request_processed(&self) {
        self.last_request_processed
            .store(current_timestamp(), Ordering::Relaxed);
    }

    fn set_last_request_processed(&self, timestamp: u64) {
        self.last_request_processed.store(timestamp, Ordering::Relaxed);
    }

    fn check_pipeline(&self) -> HealthCheck {
        let now = current_timestamp();
        let last = self.last_request_processed.load(Ordering::Relaxed);

        let message = if last == 0 {
            "No requests processed yet".to_string()
        } else if now.saturating_sub(last) > IDLE_THRESHOLD_SECONDS {
            format!("Idle for {} seconds", now.saturating_sub(last))
        } else {
            "Recent request activity".to_string()
        };

        // Idle is not unhealthy for a request-driven service
        HealthCheck {
            status: "healthy".to_string(),
            message: Some(message),
            last_check: now,
        }
    }

    fn check_readiness(&self) -> HealthCheck {
        let ready = self.is_ready();
        HealthCheck {
            status: if ready { "healthy" } else { "unhealthy" }.to_string(),
            message: Some(
                if ready {
                    "Accepting requests"
                } else {
                    "Server not ready"
                }
                .to_string(),
            ),
            last_check: current_timestamp(),
        }
    }

    fn health_status(&self) -> HealthStatus {
        let mut checks = HashMap::new();
        checks.insert("pipeline".to_string(), self.check_pipeline());
        checks.insert("readiness".to_string(), self.check_readiness());

        let healthy = checks.values().all(|c| c.status == "healthy");

        HealthStatus {
            status: if healthy { "healthy" } else { "degraded" }.to_string(),
            timestamp: current_timestamp(),
            service: self.service_name.clone(),
            version: self.version.clone(),
            uptime_seconds: metrics().get_metrics().uptime_seconds,
            checks,
        }
    }
}

/// All observability routes: `/health`, `/ready`, `/live`, `/metrics`, `/`
pub fn routes(
    state: Arc<HealthState>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let with_state = warp::any().map(move || state.clone());

    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state.clone())
        .and_then(|state: Arc<HealthState>| async move {
            let status = state.health_status();
            let code = if status.status == "healthy" {
                StatusCode::OK
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            };
            Ok::<_, Infallible>(warp::reply::with_status(warp::reply::json(&status), code))
        });

    let ready = warp::path("ready")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_state)
        .and_then(|state: Arc<HealthState>| async move {
            let ready = state.is_ready();
            let response = ReadinessResponse {
                ready,
                timestamp: current_timestamp(),
            };
            let code = if ready {
                StatusCode::OK
            } else {
                StatusCode::SERVICE_UNAVAILABLE
            };
            Ok::<_, Infallible>(warp::reply::with_status(warp::reply::json(&response), code))
        });

    let live = warp::path("live")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| {
            warp::reply::json(&LivenessResponse {
                alive: true,
                timestamp: current_timestamp(),
            })
        });

    let metrics_route = warp::path("metrics")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| warp::reply::json(&metrics().get_metrics()));

    let root = warp::path::end().and(warp::get()).map(|| {
        let mut endpoints = HashMap::new();
        endpoints.insert("/health", "Overall health status with detailed checks");
        endpoints.insert("/ready", "Readiness probe");
        endpoints.insert("/live", "Liveness probe");
        endpoints.insert("/metrics", "Request and routing metrics");
        warp::reply::json(&ApiDocumentationResponse { endpoints })
    });

    health.or(ready).or(live).or(metrics_route).or(root)
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    pub status: String,
    pub message: Option<String>,
    pub last_check: u64,
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: String,
    timestamp: u64,
    service: String,
    version: String,
    uptime_seconds: u64,
    checks: HashMap<String, HealthCheck>,
}

#[derive(Debug, Serialize)]
struct ReadinessResponse {
    ready: bool,
    timestamp: u64,
}

#[derive(Debug, Serialize)]
struct LivenessResponse {
    alive: bool,
    timestamp: u64,
}

#[derive(Debug, Serialize)]
struct ApiDocumentationResponse {
    endpoints: HashMap<&'static str, &'static str>,
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
