// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `cnsc` - the ConsulNS administrative command line.
//!
//! Manages zones and staged changes directly against the Consul store.
//! Exits zero on success, 1 on user errors (missing zone, invalid domain
//! name, missing staged change) and 2 on infrastructure failures such as
//! an unreachable Consul agent.

use std::process::ExitCode;

use clap::Parser;

use consulns::cli::{run, Cli};
use consulns::errors::StoreError;

#[tokio::main]
async fn main() -> ExitCode {
    // Keep CLI output clean; diagnostics go to stderr behind RUST_LOG.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            if err
                .downcast_ref::<StoreError>()
                .is_some_and(StoreError::is_user_error)
            {
                ExitCode::from(1)
            } else {
                ExitCode::from(2)
            }
        }
    }
}
