// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Staged zone edits.
//!
//! Every zone carries an ordered set of pending changes in its staging
//! document. A change is either the addition of a full record or the
//! deletion of a record by id; the change key derives from record content
//! for additions and from the record id for deletions, so re-staging the
//! same edit collapses onto the existing entry while preserving its
//! original position.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::StoreError;
use crate::store::record::Record;

/// A pending edit, discriminated by `change_type` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change_type", rename_all = "lowercase")]
pub enum Change {
    /// Insert or overwrite `record` on commit
    Add {
        /// The record to insert, keyed by its id
        record: Record,
    },
    /// Remove the record with this id on commit
    Del {
        /// Id of the record to remove
        id: Uuid,
    },
}

impl Change {
    /// The stable identity of this change inside the staging document.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Add { record } => format!("add.{}", record.content_key()),
            Self::Del { id } => format!("del.{}", BASE64.encode(id.to_string().as_bytes())),
        }
    }
}

impl std::fmt::Display for Change {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Add { record } => write!(f, "add {record}"),
            Self::Del { id } => write!(f, "del {id}"),
        }
    }
}

/// The staging document: pending changes in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Staging {
    /// Change key to change, insertion-ordered
    #[serde(default)]
    pub changes: IndexMap<String, Change>,
}

impl Staging {
    /// Stage the addition of `record`. A change with the same content key
    /// is overwritten in place, keeping its original position.
    pub fn add_record(&mut self, record: Record) {
        let change = Change::Add { record };
        self.changes.insert(change.key(), change);
    }

    /// Stage the deletion of `record`, collapsing onto an existing
    /// deletion of the same id.
    pub fn del_record(&mut self, record: &Record) {
        let change = Change::Del { id: record.id };
        self.changes.insert(change.key(), change);
    }

    /// Remove the `index`-th change by insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingChange`] when `index` is out of range.
    pub fn revert(&mut self, index: usize) -> Result<(), StoreError> {
        self.changes
            .shift_remove_index(index)
            .map(|_| ())
            .ok_or(StoreError::MissingChange(index))
    }

    /// Drop every pending change.
    pub fn clear(&mut self) {
        self.changes.clear();
    }

    /// Pending changes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Change> {
        self.changes.values()
    }

    /// Number of pending changes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// True when no change is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}

#[cfg(test)]
#[path = "stage_tests.rs"]
mod stage_tests;
