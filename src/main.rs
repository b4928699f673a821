//! Agentic Chat - main entry point

use agentic_chat::agent::AgentPipeline;
use agentic_chat::config::AppConfig;
use agentic_chat::observability::init_default_logging;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use uuid::Uuid;

/// Conversational backend with a rule-based agent pipeline
#[derive(Parser)]
#[command(name = "agentic-chat")]
#[command(about = "Routes chat messages through classifier, handler and composer agents")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", env = "AGENTIC_CHAT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the chat API over HTTP
    Serve,
    /// Validate configuration
    Config {
        /// Print the effective configuration
        #[arg(long)]
        show: bool,
    },
    /// Run a single message through the pipeline and print the result
    Ask {
        /// Message text
        message: String,
        /// Conversation thread identifier (random when omitted)
        #[arg(long)]
        thread_id: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_default_logging();

    info!("Starting agentic-chat v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve => run_server(config).await,
        Commands::Config { show } => handle_config_command(&config, show),
        Commands::Ask { message, thread_id } => ask(&config, &message, thread_id).await,
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }

    info!("Application shutdown complete");
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<AppConfig, Box<dyn std::error::Error>> {
    if let Some(path) = config_path {
        info!("Loading configuration from: {}", path.display());
        return Ok(AppConfig::load_from_file(path)?);
    }

    for path_str in ["agentic-chat.toml", "config/agentic-chat.toml"] {
        let path = PathBuf::from(path_str);
        if path.exists() {
            info!("Loading configuration from: {}", path.display());
            return Ok(AppConfig::load_from_file(&path)?);
        }
    }

    info!("No configuration file found, using defaults");
    Ok(AppConfig::from_env()?)
}

async fn run_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    // One pipeline for the whole process, shared by every request
    let pipeline = Arc::new(AgentPipeline::from_config(&config));

    info!(
        project = %config.project.name,
        version = %config.project.version,
        normalize_state = config.pipeline.normalize_state,
        "Pipeline initialized"
    );

    agentic_chat::api::serve(&config, pipeline, shutdown_signal()).await?;
    Ok(())
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down gracefully..."),
        _ = terminate => info!("Received SIGTERM, shutting down gracefully..."),
    }
}

fn handle_config_command(config: &AppConfig, show: bool) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("{}", toml::to_string_pretty(config)?);
    }

    info!("Configuration validation complete");
    Ok(())
}

async fn ask(
    config: &AppConfig,
    message: &str,
    thread_id: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let pipeline = AgentPipeline::from_config(config);
    let thread_id = thread_id.unwrap_or_else(|| Uuid::new_v4().to_string());

    let result = pipeline.execute(message, &thread_id).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
