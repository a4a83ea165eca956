// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `cnsc zone` subcommands.

use anyhow::Result;
use clap::Subcommand;

use crate::cli::ansi::green;
use crate::cli::current_zone;
use crate::errors::StoreError;
use crate::name::DnsName;
use crate::store::Consul;

/// Zone management subcommands.
#[derive(Subcommand, Debug)]
pub enum ZoneCommand {
    /// List every zone, marking the currently selected one
    List,

    /// Add a new zone to the store
    Add {
        /// Fully-qualified zone name, e.g. example.com
        zone_name: String,
    },

    /// Show the current zone's serial and records
    Show,

    /// Select the zone later stage commands operate on
    Use {
        /// Name of an existing zone
        zone_name: String,
    },
}

/// Parse and validate a zone name from the command line.
///
/// Zone names are stricter than record owner labels: at least two labels,
/// each made of alphanumerics and inner hyphens.
///
/// # Errors
///
/// Returns [`StoreError::InvalidDomain`] for names that do not pass.
pub fn parse_zone_name(text: &str) -> Result<DnsName, StoreError> {
    let Ok(name) = DnsName::from_text(text) else {
        return Err(StoreError::InvalidDomain(text.to_string()));
    };
    if name.label_count() < 2 {
        return Err(StoreError::InvalidDomain(text.to_string()));
    }
    let valid = text
        .trim_end_matches('.')
        .split('.')
        .all(|label| {
            !label.starts_with('-')
                && !label.ends_with('-')
                && label
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-')
        });
    if !valid {
        return Err(StoreError::InvalidDomain(text.to_string()));
    }
    Ok(name)
}

/// Execute one zone subcommand.
///
/// # Errors
///
/// Returns user errors (invalid or missing zone) and store failures.
pub async fn run(consul: &Consul, command: ZoneCommand) -> Result<()> {
    match command {
        ZoneCommand::List => {
            let current = consul.current_zone().await?.map(|z| z.name().clone());
            for mut zone in consul.zones().await? {
                let selected = if current.as_ref() == Some(zone.name()) {
                    "*\t"
                } else {
                    "\t"
                };
                let serial = zone.serial().await?;
                println!("{selected}{}\t{serial}", zone.name());
            }
            Ok(())
        }
        ZoneCommand::Add { zone_name } => {
            let name = parse_zone_name(&zone_name)?;
            consul.add_zone(&name).await?;
            println!("{}", green(format!("Zone added: {name}")));
            Ok(())
        }
        ZoneCommand::Show => {
            let mut zone = current_zone(consul).await?;
            println!("Zone: {}", zone.name());
            println!("Serial: {}", zone.serial().await?);

            let records = zone.records().await?;
            if records.is_empty() {
                println!("No records defined");
                return Ok(());
            }
            println!("Records:");
            for record in records {
                println!(
                    "  {}\t{}\t{}\t{}\t({})",
                    record.record, record.record_type, record.ttl, record.value, record.id
                );
            }
            Ok(())
        }
        ZoneCommand::Use { zone_name } => {
            let name = parse_zone_name(&zone_name)?;
            consul.use_zone(&name).await?;
            println!("{}", green(format!("Selected zone: {name}")));
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "zone_tests.rs"]
mod zone_tests;
