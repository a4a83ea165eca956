// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `cnsd` - the ConsulNS daemon.
//!
//! Serves the PowerDNS remote backend protocol on a UNIX socket, backed by
//! zone state in Consul.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, info};

use consulns::config::Config;
use consulns::constants::TOKIO_WORKER_THREADS;
use consulns::daemon::run_daemon;
use consulns::metrics::start_metrics_server;

/// Daemon command line.
#[derive(Parser, Debug)]
#[command(
    name = "cnsd",
    about = "ConsulNS daemon implementing the PowerDNS remote backend",
    version
)]
struct Args {
    /// Path of the UNIX socket to listen on
    socket_path: PathBuf,
}

fn main() -> Result<()> {
    // Build the Tokio runtime with custom thread names
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(TOKIO_WORKER_THREADS)
        .thread_name("cnsd-worker")
        .enable_all()
        .build()?;

    runtime.block_on(async_main())
}

/// Initialize logging with custom format
///
/// Respects `RUST_LOG` environment variable if set, otherwise defaults to INFO level.
/// Respects `RUST_LOG_FORMAT` environment variable for output format (json or text).
fn initialize_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    match log_format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_thread_names(true)
                .with_target(false)
                .json()
                .init();
        }
        _ => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_thread_names(true)
                .with_target(false)
                .with_ansi(true)
                .compact()
                .init();
        }
    }

    info!("starting ConsulNS daemon");
    debug!("logging initialized");
}

async fn async_main() -> Result<()> {
    initialize_logging();

    let args = Args::parse();
    let config = Config::from_env()?;
    info!(consul = %config.consul_addr, "loaded config");

    let _metrics_handle = start_metrics_server(config.metrics_addr.clone());

    run_daemon(&config, &args.socket_path).await
}
