//! Socksgate - SOCKS5 proxy server
//!
//! This is the main entry point for the Socksgate application.

use anyhow::Result;
use clap::Parser;
use socksgate::config::{load_config, ServerConfig};
use socksgate::error::ProxyError;
use socksgate::server::Server;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Socksgate - SOCKS5 proxy with username/password authentication
#[derive(Parser, Debug)]
#[command(name = "socksgate")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the listen address from the configuration file
    #[arg(long)]
    listen: Option<String>,

    /// Log level or filter directives (RUST_LOG takes precedence)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable JSON logging format
    #[arg(long)]
    json_log: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = load_server_config(&args)?;

    setup_logging(&args.log_level, args.json_log, config.log_file.as_deref())?;

    info!("Socksgate v{}", socksgate::VERSION);
    info!("Configuration loaded from: {:?}", args.config);

    let server = Server::bind(Arc::new(config)).await?;

    // Setup shutdown signal
    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

    // Handle Ctrl+C and termination signals (cross-platform)
    tokio::spawn(async move {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};

            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => {
                            info!("Received Ctrl+C, shutting down...");
                        }
                        _ = sigterm.recv() => {
                            info!("Received SIGTERM, shutting down...");
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to setup SIGTERM handler: {}", e);
                    let _ = tokio::signal::ctrl_c().await;
                    info!("Received Ctrl+C, shutting down...");
                }
            }
        }

        #[cfg(not(unix))]
        {
            // On Windows, only handle Ctrl+C
            let _ = tokio::signal::ctrl_c().await;
            info!("Received Ctrl+C, shutting down...");
        }

        let _ = shutdown_tx.send(true);
    });

    server.serve(shutdown_rx).await
}

/// Load the config file, apply CLI overrides and validate
fn load_server_config(args: &Args) -> Result<ServerConfig> {
    let mut config = load_config(&args.config)?;

    if let Some(listen) = &args.listen {
        config.listen_addr = listen.clone();
    }

    config.validate().map_err(ProxyError::Config)?;

    Ok(config)
}

/// Build the log filter from `RUST_LOG`, falling back to the CLI level
fn log_filter(level: &str, env: Option<&str>) -> EnvFilter {
    if let Some(directives) = env.filter(|d| !d.trim().is_empty()) {
        match EnvFilter::try_new(directives) {
            Ok(filter) => return filter,
            Err(e) => eprintln!("Ignoring invalid RUST_LOG {:?}: {}", directives, e),
        }
    }

    let lowered = level.to_lowercase();
    let level = match lowered.as_str() {
        "warning" => "warn",
        other => other,
    };

    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Setup logging based on configuration
fn setup_logging(level: &str, json: bool, log_file: Option<&Path>) -> Result<()> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = log_filter(level, rust_log.as_deref());

    let (writer, ansi) = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    ProxyError::Logging(format!("cannot open log file {}: {}", path.display(), e))
                })?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stdout), true),
    };

    let result = if json {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(ansi)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(ansi)
            .with_target(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    };

    result.map_err(|e| ProxyError::Logging(e.to_string()))?;

    Ok(())
}
