// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `cnsc stage` subcommands.

use anyhow::Result;
use clap::Subcommand;
use uuid::Uuid;

use crate::cli::ansi::{green, red, yellow};
use crate::cli::current_zone;
use crate::constants::DEFAULT_DNS_RECORD_TTL_SECS;
use crate::errors::StoreError;
use crate::store::record::{Record, RecordType, RecordValue};
use crate::store::stage::Change;
use crate::store::Consul;

/// Staged change management subcommands.
#[derive(Subcommand, Debug)]
pub enum StageCommand {
    /// Show the pending changes of the current zone
    Status,

    /// Stage the addition of a record
    Add {
        /// Owner label relative to the zone root; `@` for the apex
        record: String,
        /// Record type: A, AAAA, CNAME, MX, NS or CONSUL
        record_type: RecordType,
        /// Record value: an IP address for A/AAAA, free text otherwise
        value: String,
        /// Time to live in seconds
        #[arg(long, default_value_t = DEFAULT_DNS_RECORD_TTL_SECS)]
        ttl: u32,
    },

    /// Stage the deletion of a record by id
    Del {
        /// Id of a committed record in the current zone
        id: Uuid,
    },

    /// Remove a pending change by its index in `stage status`
    Revert {
        /// Index of the change to drop
        index: usize,
    },

    /// Apply all pending changes to the zone and bump the serial
    Commit,
}

/// Execute one stage subcommand against the current zone.
///
/// # Errors
///
/// Returns user errors (no zone selected, missing record, missing change)
/// and store failures.
pub async fn run(consul: &Consul, command: StageCommand) -> Result<()> {
    let mut zone = current_zone(consul).await?;

    match command {
        StageCommand::Status => {
            println!("On zone {}", zone.name());
            let changes = zone.stage().changes().await?;
            if changes.is_empty() {
                println!("No changes staged");
                return Ok(());
            }
            println!("Changes staged for commit:");
            println!("  (use cnsc stage revert <index> to revert a change)");
            println!("  (use cnsc stage commit to publish all changes)");
            for (index, change) in changes.iter().enumerate() {
                // Additions in green, deletions in red.
                let line = match change {
                    Change::Add { .. } => green(change),
                    Change::Del { .. } => red(change),
                };
                println!("{index}\t{line}");
            }
            Ok(())
        }
        StageCommand::Add {
            record,
            record_type,
            value,
            ttl,
        } => {
            let record = Record::new(record, record_type, RecordValue::parse(&value), ttl);
            zone.stage().add_record(record.clone()).await?;
            println!("On zone {}", zone.name());
            println!("Added record:");
            println!("\t{}", green(&record));
            Ok(())
        }
        StageCommand::Del { id } => {
            let record = zone
                .record(id)
                .await?
                .ok_or(StoreError::MissingRecord(id))?;
            zone.stage().del_record(&record).await?;
            println!("On zone {}", zone.name());
            println!("Staged deletion:");
            println!("\t{}", red(&record));
            Ok(())
        }
        StageCommand::Revert { index } => {
            zone.stage().revert(index).await?;
            println!("{}", yellow(format!("Reverted staged change {index}")));
            Ok(())
        }
        StageCommand::Commit => {
            let pending = zone.stage().changes().await?.len();
            zone.commit().await?;
            let serial = zone.serial().await?;
            zone.set_serial(serial + 1).await?;
            println!(
                "Committed {pending} change(s) on zone {}, serial is now {}",
                zone.name(),
                serial + 1
            );
            Ok(())
        }
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod stage_tests;
