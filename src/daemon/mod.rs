// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! The ConsulNS daemon: UNIX socket server for the PowerDNS remote backend.
//!
//! The daemon loads an immutable cache snapshot of every zone at startup,
//! binds a stream socket at the configured path and spawns one handler
//! task per accepted connection. Writes that reach the store (metadata and
//! key mutation) are serialised behind a process-wide lock so concurrent
//! handlers cannot race on one zone's documents.
//!
//! The cache is rebuilt only at process start; administrative mutations
//! become visible on daemon restart.

pub mod cache;
pub mod handler;
pub mod proto;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::net::UnixListener;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::daemon::cache::Cache;
use crate::daemon::handler::Handler;
use crate::metrics;
use crate::store::Consul;

/// Accept connections forever, spawning one handler task per peer.
///
/// # Errors
///
/// Returns an error when the listener itself fails; per-connection errors
/// stay inside their handler task.
pub async fn serve(
    listener: UnixListener,
    cache: Arc<Cache>,
    store: Arc<Mutex<Consul>>,
) -> Result<()> {
    loop {
        let (stream, _) = listener
            .accept()
            .await
            .context("failed to accept connection")?;
        metrics::record_connection();
        let handler = Handler::new(cache.clone(), store.clone());
        tokio::spawn(handler.run(stream));
    }
}

/// Bind the daemon socket, unlinking a pre-existing path first.
///
/// # Errors
///
/// Returns an error when the stale socket cannot be removed or the path
/// cannot be bound.
pub fn bind_socket(socket_path: &Path) -> Result<UnixListener> {
    if socket_path.exists() {
        warn!(path = %socket_path.display(), "deleting old socket");
        std::fs::remove_file(socket_path)
            .with_context(|| format!("failed to unlink {}", socket_path.display()))?;
    }
    let listener = UnixListener::bind(socket_path)
        .with_context(|| format!("failed to bind {}", socket_path.display()))?;
    info!(path = %socket_path.display(), "listening on UNIX socket");
    Ok(listener)
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() -> Result<()> {
    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            info!("received SIGINT, shutting down");
            result.map_err(anyhow::Error::from)
        }
        result = async {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm = signal(SignalKind::terminate())?;
            sigterm.recv().await;
            Ok::<(), anyhow::Error>(())
        } => {
            info!("received SIGTERM, shutting down");
            result
        }
    }
}

/// Load the cache, serve the socket and clean up on shutdown.
///
/// # Errors
///
/// Returns an error when the store is unreachable, the snapshot cannot be
/// loaded or the socket cannot be bound.
pub async fn run_daemon(config: &Config, socket_path: &Path) -> Result<()> {
    let consul =
        Consul::connect(&config.consul_addr).context("failed to build consul client")?;

    info!(consul = %config.consul_addr, "loading zone snapshot");
    let cache = Cache::load(&consul)
        .await
        .context("failed to load zone snapshot from consul")?;
    info!(zones = cache.len(), "zone snapshot loaded");
    metrics::set_zones_loaded(i64::try_from(cache.len()).unwrap_or(i64::MAX));

    let cache = Arc::new(cache);
    let store = Arc::new(Mutex::new(consul));

    let listener = bind_socket(socket_path)?;

    let result = tokio::select! {
        result = serve(listener, cache, store) => {
            error!("server loop exited unexpectedly");
            result
        }
        result = shutdown_signal() => result,
    };

    // The listening socket is gone with the select; the path is ours to
    // release regardless of how the server came down.
    info!("shutting down server");
    if let Err(err) = std::fs::remove_file(socket_path) {
        warn!(path = %socket_path.display(), %err, "failed to unlink socket path");
    }

    result
}
