//! HTTP server bootstrap with graceful shutdown

use crate::agent::pipeline::AgentPipeline;
use crate::api::{routes, ApiContext};
use crate::config::{AppConfig, ConfigError};
use crate::error::{AgentError, AgentResult};
use crate::observability::health::HealthState;
use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Resolve the configured bind address
pub fn bind_address(config: &AppConfig) -> AgentResult<SocketAddr> {
    let ip: IpAddr = config.server.host.parse().map_err(|e| {
        AgentError::ConfigError(ConfigError::InvalidConfig(format!(
            "server.host '{}' is not an IP address: {e}",
            config.server.host
        )))
    })?;
    Ok(SocketAddr::new(ip, config.server.port))
}

/// Serve the chat API until `shutdown` resolves
pub async fn serve<S>(
    config: &AppConfig,
    pipeline: Arc<AgentPipeline>,
    shutdown: S,
) -> AgentResult<()>
where
    S: Future<Output = ()> + Send + 'static,
{
    let addr = bind_address(config)?;
    let health = Arc::new(HealthState::new(
        config.project.name.clone(),
        config.project.version.clone(),
    ));
    let ctx = Arc::new(ApiContext::new(
        pipeline,
        health.clone(),
        Duration::from_secs(config.server.request_timeout_secs),
    ));

    let (bound, server) = warp::serve(routes(ctx, config.api_prefix()))
        .try_bind_with_graceful_shutdown(addr, shutdown)
        .map_err(|e| AgentError::internal_error(format!("failed to bind {addr}: {e}")))?;

    health.set_ready(true);
    info!(
        address = %bound,
        chat_endpoint = %format!("/{}/chat/chat", config.api_prefix()),
        "Chat API listening"
    );

    server.await;

    health.set_ready(false);
    info!("Chat API stopped");
    Ok(())
}
