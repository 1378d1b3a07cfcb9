//! wshub - WebSocket connection hub
//!
//! Main entry point for the wshub server.

mod cli;
mod relay;

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use wshub_api::{build_manager, WsServer};
use wshub_config::{ConfigLoader, ConfigValidator, LoggingConfig};
use wshub_core::Hub;

use crate::cli::Cli;
use crate::relay::RelayHandler;

fn init_tracing(logging: &LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    let file_layer = if logging.file {
        let log_dir = ConfigLoader::expand_path(&logging.dir);
        std::fs::create_dir_all(&log_dir)?;

        let file_appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix("wshub")
            .filename_suffix("log")
            .max_log_files(30)
            .build(&log_dir)?;

        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // Dropping the guard stops the background writer.
        static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
            std::sync::OnceLock::new();
        let _ = GUARD.set(guard);

        Some(fmt::layer().with_writer(non_blocking).with_ansi(false))
    } else {
        None
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_ansi(true))
        .with(file_layer)
        .init();

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = ConfigLoader::load_or_default(&cli.config)?;
    cli.apply(&mut config);

    init_tracing(&config.logging)?;

    let warnings = ConfigValidator::validate(&config).into_result()?;
    for warning in &warnings {
        warn!("Config {}: {}", warning.path, warning.message);
    }

    info!("Starting wshub v{}", env!("CARGO_PKG_VERSION"));
    if cli.config.exists() {
        info!("Loaded configuration from {}", cli.config.display());
    } else {
        info!("No configuration at {}, using defaults", cli.config.display());
    }

    let manager = Arc::new(build_manager(&config.websocket));
    let hub = Hub::new(manager.clone(), Arc::new(RelayHandler::new(manager)));

    let server = WsServer::new(config.server, config.websocket, hub);
    server.run().await?;

    info!("wshub stopped");
    Ok(())
}
