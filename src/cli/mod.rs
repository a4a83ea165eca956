// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Administrative command line for the zone store.
//!
//! `cnsc` talks directly to Consul: `zone` subcommands manage the zone
//! index and the current-zone pointer, `stage` subcommands edit the
//! staged change set of the current zone and commit it. The running
//! daemon picks the result up on its next restart.

pub mod ansi;
pub mod stage;
pub mod zone;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::errors::StoreError;
use crate::store::zone::Zone;
use crate::store::Consul;

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(
    name = "cnsc",
    about = "Manage ConsulNS zones and staged changes",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage zones and the current-zone selection
    #[command(subcommand)]
    Zone(zone::ZoneCommand),

    /// Manage the staged change set of the current zone
    #[command(subcommand)]
    Stage(stage::StageCommand),
}

/// Execute a parsed CLI invocation against the configured store.
///
/// # Errors
///
/// Returns an error on user errors (missing zone, invalid domain, missing
/// change) and on store failures; the binary maps both to a nonzero exit.
pub async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_env()?;
    let consul = Consul::connect(&config.consul_addr)?;

    match cli.command {
        Command::Zone(command) => zone::run(&consul, command).await,
        Command::Stage(command) => stage::run(&consul, command).await,
    }
}

/// The zone named by the current-zone pointer.
///
/// # Errors
///
/// Returns [`StoreError::NoZoneSelected`] when no pointer is set or it
/// dangles.
pub(crate) async fn current_zone(consul: &Consul) -> Result<Zone<'_>, StoreError> {
    consul
        .current_zone()
        .await?
        .ok_or(StoreError::NoZoneSelected)
}
