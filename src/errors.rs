// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Store and KV error types for ConsulNS.
//!
//! This module provides specialized error types for:
//! - Consul KV transport operations (typed get/put of JSON documents)
//! - Zone store operations (zone lifecycle, staging, commit)
//!
//! These errors provide structured error handling for the administrative
//! surface, enabling precise exit codes in the CLI and structured logging
//! in the daemon.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur while talking to the Consul KV HTTP API.
#[derive(Error, Debug)]
pub enum KvError {
    /// Consul acknowledged the PUT with `false`
    ///
    /// Returned when the agent refuses a write. The write carried no
    /// check-and-set index, so the caller may simply retry.
    #[error("key '{key}' was not inserted (consul refused the write)")]
    KeyNotInserted {
        /// The KV key that was being written
        key: String,
    },

    /// The stored value could not be decoded
    ///
    /// Returned when the base64 `Value` field is malformed or the contained
    /// UTF-8 JSON does not match the expected document schema.
    #[error("invalid value stored at '{key}': {reason}")]
    InvalidValue {
        /// The KV key that was being read
        key: String,
        /// Explanation of what failed to decode
        reason: String,
    },

    /// Consul returned an HTTP status the adapter does not understand
    #[error("unexpected status {status} from consul for key '{key}'")]
    UnexpectedStatus {
        /// The KV key of the failing request
        key: String,
        /// The HTTP status code returned by the agent
        status: u16,
    },

    /// Transport-level HTTP failure (connection refused, timeout, ...)
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors surfaced by the zone store.
///
/// This is the primary error type returned by store operations. The first
/// four variants are user errors on the administrative surface and map to
/// nonzero CLI exit codes.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A zone name on the admin surface failed validation
    #[error("invalid domain name '{0}'")]
    InvalidDomain(String),

    /// Attempted to add a zone that is already in the zones index
    #[error("zone '{0}' already exists")]
    ZoneAlreadyExists(String),

    /// Requested a zone that is not in the zones index
    #[error("zone '{0}' does not exist")]
    MissingZone(String),

    /// A zone-scoped command ran without a current zone selected
    #[error("no zone selected, run `cnsc zone use <name>` first")]
    NoZoneSelected,

    /// `revert` was called with an index past the end of the stage
    #[error("no staged change with index {0}")]
    MissingChange(usize),

    /// A record id was referenced that is not present in the zone
    #[error("record '{0}' does not exist in this zone")]
    MissingRecord(Uuid),

    /// A staged deletion references a record id missing from the records
    /// document. The stage no longer matches the zone it was created for.
    #[error("staged deletion references unknown record '{id}' in zone '{zone}'")]
    CorruptStage {
        /// The zone whose commit failed
        zone: String,
        /// The record id the staged deletion points at
        id: Uuid,
    },

    /// KV transport or decoding failure
    #[error(transparent)]
    Kv(#[from] KvError),
}

impl StoreError {
    /// Returns true if this error is a user error on the admin surface
    /// rather than an infrastructure failure.
    ///
    /// The CLI exits 1 for user errors and 2 for everything else.
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidDomain(_)
                | Self::ZoneAlreadyExists(_)
                | Self::MissingZone(_)
                | Self::NoZoneSelected
                | Self::MissingChange(_)
                | Self::MissingRecord(_)
        )
    }
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod errors_tests;
