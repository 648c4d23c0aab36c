//! catsapp - a command line front end for the cats catalog.
//!
//! Provides login/registration, a profile view and breed/image listings on
//! top of `catsapp-core`. The session persists between runs, so a single
//! `catsapp login` covers later commands until the token expires.

mod commands;
mod navigator;

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use catsapp_core::{ApiClient, Config, FileStore, SessionStore};

use commands::Cli;
use navigator::TerminalNavigator;

// ============================================================================
// Constants
// ============================================================================

/// Directory for rolling log files; file logging is off when unset
const LOG_DIR_ENV: &str = "CATSAPP_LOG_DIR";

/// Log file name prefix inside `CATSAPP_LOG_DIR`
const LOG_FILE_PREFIX: &str = "catsapp.log";

/// Initialize the tracing subscriber for logging.
/// The returned guard flushes the file writer on drop and must be held until exit.
fn init_tracing() -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var_os(LOG_DIR_ENV) {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    let _log_guard = init_tracing();

    let cli = Cli::parse();
    let config = Config::load()?;
    debug!(api_url = %config.api_url, "Configuration loaded");

    let storage_path = config.storage_path()?;
    let storage = FileStore::open(&storage_path)
        .with_context(|| format!("Failed to open session storage at {}", storage_path.display()))?;
    let session = Arc::new(SessionStore::new(storage, Arc::new(TerminalNavigator)));
    session.restore_from_storage();

    let client = ApiClient::new(&config, session)?;
    info!("catsapp starting");

    commands::run(cli.command, &client).await
}
