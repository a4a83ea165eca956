// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone state persistence against the Consul KV store.
//!
//! The [`Consul`] façade owns the KV transport and hands out [`Zone`]
//! handles for per-zone document access. Zone membership lives in a single
//! index document; a separate pointer document remembers the zone the CLI
//! currently operates on.
//!
//! Adding a zone first extends the index and then writes the default info
//! document, in that order: a crash in between leaves a zone in the index
//! whose info materialises from defaults on the next read, preserving the
//! index invariant.

pub mod kv;
pub mod record;
pub mod stage;
pub mod zone;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

use crate::config::ConsulDsn;
use crate::constants::{CONSUL_PATH_CURRENT_ZONE, CONSUL_PATH_ZONES};
use crate::errors::{KvError, StoreError};
use crate::name::DnsName;
use crate::store::kv::KvClient;
use crate::store::zone::Zone;

/// The zones index document: the set of all zone names.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ZoneNames {
    #[serde(default)]
    zones: BTreeSet<String>,
}

/// The current-zone pointer document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CurrentZone {
    zone: String,
}

/// Store façade over one Consul agent.
pub struct Consul {
    kv: KvClient,
}

impl Consul {
    /// Wrap an existing KV client.
    #[must_use]
    pub fn new(kv: KvClient) -> Self {
        Self { kv }
    }

    /// Build a store for the agent named by `dsn`.
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be built.
    pub fn connect(dsn: &ConsulDsn) -> Result<Self, KvError> {
        Ok(Self::new(KvClient::new(dsn)?))
    }

    pub(crate) fn kv(&self) -> &KvClient {
        &self.kv
    }

    async fn zone_names_doc(&self) -> Result<ZoneNames, StoreError> {
        let (_, doc) = self.kv.get::<ZoneNames>(CONSUL_PATH_ZONES).await?;
        Ok(doc.unwrap_or_default())
    }

    /// Every zone name in the index, in index (lexicographic) order.
    ///
    /// Index entries that do not parse as DNS names are skipped with a
    /// warning rather than failing the enumeration.
    pub async fn zone_names(&self) -> Result<Vec<DnsName>, StoreError> {
        let doc = self.zone_names_doc().await?;
        let mut names = Vec::with_capacity(doc.zones.len());
        for raw in &doc.zones {
            match DnsName::from_text(raw) {
                Ok(name) => names.push(name),
                Err(err) => warn!(zone = %raw, %err, "skipping invalid zone name in index"),
            }
        }
        Ok(names)
    }

    /// Handles for every zone in the index.
    pub async fn zones(&self) -> Result<Vec<Zone<'_>>, StoreError> {
        Ok(self
            .zone_names()
            .await?
            .into_iter()
            .map(|name| Zone::new(self, name))
            .collect())
    }

    /// Add a zone to the index and write its default info document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ZoneAlreadyExists`] when the name is already
    /// in the index.
    pub async fn add_zone(&self, name: &DnsName) -> Result<Zone<'_>, StoreError> {
        let mut doc = self.zone_names_doc().await?;
        if !doc.zones.insert(name.to_string()) {
            return Err(StoreError::ZoneAlreadyExists(name.to_string()));
        }
        self.kv.put(CONSUL_PATH_ZONES, &doc).await?;

        let mut zone = Zone::new(self, name.clone());
        zone.init_info().await?;
        Ok(zone)
    }

    /// A handle on the named zone.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingZone`] when the name is not in the
    /// index.
    pub async fn zone(&self, name: &DnsName) -> Result<Zone<'_>, StoreError> {
        let doc = self.zone_names_doc().await?;
        if !doc.zones.contains(&name.to_string()) {
            return Err(StoreError::MissingZone(name.to_string()));
        }
        Ok(Zone::new(self, name.clone()))
    }

    /// The zone the current-zone pointer names, if any.
    ///
    /// A pointer naming a zone that is no longer in the index is treated
    /// as absent.
    pub async fn current_zone(&self) -> Result<Option<Zone<'_>>, StoreError> {
        let (_, doc) = self.kv.get::<CurrentZone>(CONSUL_PATH_CURRENT_ZONE).await?;
        let Some(doc) = doc else {
            return Ok(None);
        };

        let name = match DnsName::from_text(&doc.zone) {
            Ok(name) => name,
            Err(err) => {
                warn!(zone = %doc.zone, %err, "ignoring invalid current-zone pointer");
                return Ok(None);
            }
        };
        match self.zone(&name).await {
            Ok(zone) => Ok(Some(zone)),
            Err(StoreError::MissingZone(zone)) => {
                warn!(%zone, "current-zone pointer names a missing zone");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Point the current-zone pointer at `name`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingZone`] when the name is not in the
    /// index.
    pub async fn use_zone(&self, name: &DnsName) -> Result<(), StoreError> {
        // Make sure the zone actually exists before writing the pointer.
        self.zone(name).await?;
        let doc = CurrentZone {
            zone: name.to_string(),
        };
        self.kv.put(CONSUL_PATH_CURRENT_ZONE, &doc).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod mod_tests;
