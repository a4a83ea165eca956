// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the ConsulNS daemon.
//!
//! All metrics live in one registry under the `consulns_` prefix and are
//! exposed by a small HTTP server on the configured metrics address.
//!
//! # Example
//!
//! ```rust,no_run
//! use consulns::metrics::record_connection;
//!
//! // Count an accepted front-end connection
//! record_connection();
//! ```

use axum::{routing::get, Router};
use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, IntCounter, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::LazyLock;
use std::time::Duration;
use tracing::{error, info};

use crate::constants::METRICS_SERVER_PATH;

/// Namespace prefix for all ConsulNS metrics
const METRICS_NAMESPACE: &str = "consulns";

/// Global Prometheus metrics registry
///
/// All metrics are registered here and exposed via the `/metrics` endpoint.
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

/// Total number of backend queries by method and outcome
///
/// Labels:
/// - `method`: wire method name (`lookup`, `getAllDomains`, ...)
/// - `status`: outcome (`ok`, `error`, `decode_error`)
pub static QUERIES_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    let opts = Opts::new(
        format!("{METRICS_NAMESPACE}_queries_total"),
        "Total number of backend queries by method and outcome",
    );
    let counter = CounterVec::new(opts, &["method", "status"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Duration of query dispatch in seconds
///
/// Labels:
/// - `method`: wire method name
pub static QUERY_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    let opts = HistogramOpts::new(
        format!("{METRICS_NAMESPACE}_query_duration_seconds"),
        "Duration of query dispatch in seconds by method",
    )
    .buckets(vec![0.0001, 0.001, 0.01, 0.1, 0.5, 1.0, 5.0]);
    let histogram = HistogramVec::new(opts, &["method"]).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
});

/// Total number of accepted front-end connections
pub static CONNECTIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    let counter = IntCounter::new(
        format!("{METRICS_NAMESPACE}_connections_total"),
        "Total number of accepted front-end connections",
    )
    .unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
});

/// Number of zones in the loaded snapshot
pub static ZONES_LOADED: LazyLock<IntGauge> = LazyLock::new(|| {
    let gauge = IntGauge::new(
        format!("{METRICS_NAMESPACE}_zones_loaded"),
        "Number of zones in the loaded snapshot",
    )
    .unwrap();
    METRICS_REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
});

/// Record one dispatched query.
pub fn record_query(method: &str, status: &str, duration: Option<Duration>) {
    QUERIES_TOTAL.with_label_values(&[method, status]).inc();
    if let Some(duration) = duration {
        QUERY_DURATION_SECONDS
            .with_label_values(&[method])
            .observe(duration.as_secs_f64());
    }
}

/// Record one accepted connection.
pub fn record_connection() {
    CONNECTIONS_TOTAL.inc();
}

/// Publish the snapshot size.
pub fn set_zones_loaded(count: i64) {
    ZONES_LOADED.set(count);
}

/// Render every registered metric in the Prometheus text format.
///
/// # Errors
///
/// Returns an error when encoding fails or produces invalid UTF-8.
pub fn gather_metrics() -> anyhow::Result<String> {
    let encoder = TextEncoder::new();
    let families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

/// Start the Prometheus metrics HTTP server.
///
/// A bind failure is logged and tolerated; metrics are an observability
/// aid, not a precondition for serving DNS queries.
///
/// # Returns
/// A `JoinHandle` that can be used to monitor the server task
pub fn start_metrics_server(bind_addr: String) -> tokio::task::JoinHandle<()> {
    info!(bind_address = %bind_addr, path = METRICS_SERVER_PATH,
        "starting Prometheus metrics HTTP server");

    tokio::spawn(async move {
        async fn metrics_handler() -> String {
            match gather_metrics() {
                Ok(text) => text,
                Err(err) => {
                    error!("failed to gather metrics: {err}");
                    String::from("# Error gathering metrics\n")
                }
            }
        }

        let app = Router::new().route(METRICS_SERVER_PATH, get(metrics_handler));

        let listener = match tokio::net::TcpListener::bind(&bind_addr).await {
            Ok(listener) => listener,
            Err(err) => {
                error!("failed to bind metrics server to {bind_addr}: {err}");
                return;
            }
        };

        info!("metrics server listening on http://{bind_addr}{METRICS_SERVER_PATH}");

        if let Err(err) = axum::serve(listener, app).await {
            error!("metrics server error: {err}");
        }
    })
}
