// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Lazy-loaded, lazily-persisted view of a single zone.
//!
//! A [`Zone`] mediates access to the five per-zone documents in Consul:
//! info, records, staging, metadata and keys. Each document is fetched on
//! first access, cached on the handle and rewritten in full by every
//! mutator. A handle exclusively owns its cached documents; two handles to
//! the same zone must not be mutated concurrently.

use chrono::Utc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::constants::{
    CONSUL_PATH_ZONES, ZONE_DOC_INFO, ZONE_DOC_KEYS, ZONE_DOC_METADATA, ZONE_DOC_RECORDS,
    ZONE_DOC_STAGING,
};
use crate::errors::StoreError;
use crate::name::DnsName;
use crate::store::record::Record;
use crate::store::stage::{Change, Staging};
use crate::store::Consul;

fn default_true() -> bool {
    true
}

fn now_epoch() -> i64 {
    Utc::now().timestamp()
}

/// The info document: serial and liveness flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneInfo {
    /// Zone serial, monotonic across successful commits
    #[serde(default)]
    pub serial: u32,

    /// Serial last notified to secondaries, if any
    #[serde(default)]
    pub notified_serial: Option<u32>,

    /// Disabled zones are hidden from `getAllDomains` by default
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Epoch seconds of the last front-end check
    #[serde(default = "now_epoch")]
    pub last_check: i64,
}

impl Default for ZoneInfo {
    fn default() -> Self {
        Self {
            serial: 0,
            notified_serial: None,
            enabled: true,
            last_check: now_epoch(),
        }
    }
}

/// One DNSSEC key as persisted in the keys document and exchanged with the
/// DNS front-end. The key material is an opaque payload; ids are assigned
/// by the front-end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneKey {
    /// Front-end assigned key id
    #[serde(default)]
    pub id: i64,

    /// DNSKEY flags (256 ZSK, 257 KSK)
    pub flags: u32,

    /// Whether the key is used for signing
    pub active: bool,

    /// Whether the key is published in the zone
    #[serde(default = "default_true")]
    pub published: bool,

    /// Opaque key material
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ZoneRecords {
    #[serde(default)]
    records: IndexMap<Uuid, Record>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ZoneMetadata {
    #[serde(default)]
    metadata: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ZoneKeys {
    #[serde(default)]
    keys: Vec<ZoneKey>,
}

/// Handle on one zone's persisted state.
///
/// The handle borrows the owning [`Consul`] store for KV I/O and does not
/// own it; the store outlives every handle it produces.
pub struct Zone<'a> {
    consul: &'a Consul,
    name: DnsName,
    info: Option<ZoneInfo>,
    records: Option<ZoneRecords>,
    staging: Option<Staging>,
    metadata: Option<ZoneMetadata>,
    keys: Option<ZoneKeys>,
}

impl<'a> Zone<'a> {
    pub(crate) fn new(consul: &'a Consul, name: DnsName) -> Self {
        Self {
            consul,
            name,
            info: None,
            records: None,
            staging: None,
            metadata: None,
            keys: None,
        }
    }

    /// The zone's fully-qualified name.
    #[must_use]
    pub fn name(&self) -> &DnsName {
        &self.name
    }

    fn doc_path(&self, doc: &str) -> String {
        format!("{CONSUL_PATH_ZONES}/{}/{doc}", self.name)
    }

    // ------------------------------------------------------------------
    // info
    // ------------------------------------------------------------------

    async fn info_doc(&mut self) -> Result<&mut ZoneInfo, StoreError> {
        if self.info.is_none() {
            let (_, doc) = self.consul.kv().get(&self.doc_path(ZONE_DOC_INFO)).await?;
            self.info = Some(doc.unwrap_or_default());
        }
        Ok(self.info.as_mut().unwrap())
    }

    async fn persist_info(&mut self) -> Result<(), StoreError> {
        let consul = self.consul;
        let path = self.doc_path(ZONE_DOC_INFO);
        let doc = self.info_doc().await?;
        consul.kv().put(&path, doc).await?;
        Ok(())
    }

    /// Write the default info document. Called once when a zone is added,
    /// right after the zones index gains its name.
    pub(crate) async fn init_info(&mut self) -> Result<(), StoreError> {
        self.info = Some(ZoneInfo::default());
        self.persist_info().await
    }

    /// A copy of the zone's info document.
    pub async fn info(&mut self) -> Result<ZoneInfo, StoreError> {
        Ok(self.info_doc().await?.clone())
    }

    /// The zone serial.
    pub async fn serial(&mut self) -> Result<u32, StoreError> {
        Ok(self.info_doc().await?.serial)
    }

    /// Replace the zone serial and persist the info document.
    pub async fn set_serial(&mut self, serial: u32) -> Result<(), StoreError> {
        self.info_doc().await?.serial = serial;
        self.persist_info().await
    }

    // ------------------------------------------------------------------
    // records
    // ------------------------------------------------------------------

    async fn records_doc(&mut self) -> Result<&mut ZoneRecords, StoreError> {
        if self.records.is_none() {
            let (_, doc) = self
                .consul
                .kv()
                .get(&self.doc_path(ZONE_DOC_RECORDS))
                .await?;
            self.records = Some(doc.unwrap_or_default());
        }
        Ok(self.records.as_mut().unwrap())
    }

    async fn persist_records(&mut self) -> Result<(), StoreError> {
        let consul = self.consul;
        let path = self.doc_path(ZONE_DOC_RECORDS);
        let doc = self.records_doc().await?;
        consul.kv().put(&path, doc).await?;
        Ok(())
    }

    /// The current record set, in document order.
    pub async fn records(&mut self) -> Result<Vec<Record>, StoreError> {
        Ok(self.records_doc().await?.records.values().cloned().collect())
    }

    /// Point lookup of a record by id.
    pub async fn record(&mut self, id: Uuid) -> Result<Option<Record>, StoreError> {
        Ok(self.records_doc().await?.records.get(&id).cloned())
    }

    // ------------------------------------------------------------------
    // staging
    // ------------------------------------------------------------------

    async fn staging_doc(&mut self) -> Result<&mut Staging, StoreError> {
        if self.staging.is_none() {
            let (_, doc) = self
                .consul
                .kv()
                .get(&self.doc_path(ZONE_DOC_STAGING))
                .await?;
            self.staging = Some(doc.unwrap_or_default());
        }
        Ok(self.staging.as_mut().unwrap())
    }

    async fn persist_staging(&mut self) -> Result<(), StoreError> {
        let consul = self.consul;
        let path = self.doc_path(ZONE_DOC_STAGING);
        let doc = self.staging_doc().await?;
        consul.kv().put(&path, doc).await?;
        Ok(())
    }

    /// The staged change set of this zone.
    pub fn stage(&mut self) -> Stage<'_, 'a> {
        Stage { zone: self }
    }

    /// Apply every staged change to the record set and persist.
    ///
    /// Changes apply in insertion order: an addition inserts or overwrites
    /// by record id, a deletion removes by id. The records document is
    /// written first; only a successful write clears and persists the
    /// stage, so a crash in between replays the same changes on the next
    /// commit, which is idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::CorruptStage`] when a staged deletion names a
    /// record id that is not in the zone; nothing is persisted in that case.
    pub async fn commit(&mut self) -> Result<(), StoreError> {
        let zone_name = self.name.to_string();
        let staged: Vec<Change> = self.staging_doc().await?.iter().cloned().collect();

        let mut updated = self.records_doc().await?.clone();
        for change in &staged {
            match change {
                Change::Add { record } => {
                    updated.records.insert(record.id, record.clone());
                }
                Change::Del { id } => {
                    if updated.records.shift_remove(id).is_none() {
                        return Err(StoreError::CorruptStage {
                            zone: zone_name,
                            id: *id,
                        });
                    }
                }
            }
        }

        self.records = Some(updated);
        self.persist_records().await?;

        self.staging_doc().await?.clear();
        self.persist_staging().await
    }

    // ------------------------------------------------------------------
    // metadata
    // ------------------------------------------------------------------

    async fn metadata_doc(&mut self) -> Result<&mut ZoneMetadata, StoreError> {
        if self.metadata.is_none() {
            let (_, doc) = self
                .consul
                .kv()
                .get(&self.doc_path(ZONE_DOC_METADATA))
                .await?;
            self.metadata = Some(doc.unwrap_or_default());
        }
        Ok(self.metadata.as_mut().unwrap())
    }

    async fn persist_metadata(&mut self) -> Result<(), StoreError> {
        let consul = self.consul;
        let path = self.doc_path(ZONE_DOC_METADATA);
        let doc = self.metadata_doc().await?;
        consul.kv().put(&path, doc).await?;
        Ok(())
    }

    /// All metadata of this zone, kind to ordered values.
    pub async fn metadata(&mut self) -> Result<BTreeMap<String, Vec<String>>, StoreError> {
        Ok(self.metadata_doc().await?.metadata.clone())
    }

    /// Replace the value list stored under `kind` and persist.
    pub async fn set_metadata(&mut self, kind: &str, values: Vec<String>) -> Result<(), StoreError> {
        self.metadata_doc()
            .await?
            .metadata
            .insert(kind.to_string(), values);
        self.persist_metadata().await
    }

    // ------------------------------------------------------------------
    // keys
    // ------------------------------------------------------------------

    async fn keys_doc(&mut self) -> Result<&mut ZoneKeys, StoreError> {
        if self.keys.is_none() {
            let (_, doc) = self.consul.kv().get(&self.doc_path(ZONE_DOC_KEYS)).await?;
            self.keys = Some(doc.unwrap_or_default());
        }
        Ok(self.keys.as_mut().unwrap())
    }

    async fn persist_keys(&mut self) -> Result<(), StoreError> {
        let consul = self.consul;
        let path = self.doc_path(ZONE_DOC_KEYS);
        let doc = self.keys_doc().await?;
        consul.kv().put(&path, doc).await?;
        Ok(())
    }

    /// The zone's DNSSEC keys, in stored order.
    pub async fn keys(&mut self) -> Result<Vec<ZoneKey>, StoreError> {
        Ok(self.keys_doc().await?.keys.clone())
    }

    /// Append a key and persist the keys document.
    pub async fn add_key(&mut self, key: ZoneKey) -> Result<(), StoreError> {
        self.keys_doc().await?.keys.push(key);
        self.persist_keys().await
    }

    /// Remove the key with the given id. Returns false when no key
    /// carries that id; nothing is persisted in that case.
    pub async fn remove_key(&mut self, id: i64) -> Result<bool, StoreError> {
        let keys = &mut self.keys_doc().await?.keys;
        let before = keys.len();
        keys.retain(|key| key.id != id);
        if keys.len() == before {
            return Ok(false);
        }
        self.persist_keys().await?;
        Ok(true)
    }

    /// Replace the key sharing `key.id` in place. Returns false when no
    /// key carries that id; nothing is persisted in that case.
    pub async fn update_key(&mut self, key: ZoneKey) -> Result<bool, StoreError> {
        let keys = &mut self.keys_doc().await?.keys;
        let Some(existing) = keys.iter_mut().find(|k| k.id == key.id) else {
            return Ok(false);
        };
        *existing = key;
        self.persist_keys().await?;
        Ok(true)
    }
}

/// Persistence-coupled view of a zone's staged change set.
///
/// Every mutating operation rewrites the staging document as a whole.
pub struct Stage<'z, 'a> {
    zone: &'z mut Zone<'a>,
}

impl Stage<'_, '_> {
    /// Pending changes in insertion order.
    pub async fn changes(&mut self) -> Result<Vec<Change>, StoreError> {
        Ok(self.zone.staging_doc().await?.iter().cloned().collect())
    }

    /// Stage the addition of `record` and persist.
    pub async fn add_record(&mut self, record: Record) -> Result<(), StoreError> {
        self.zone.staging_doc().await?.add_record(record);
        self.zone.persist_staging().await
    }

    /// Stage the deletion of `record` by id and persist.
    pub async fn del_record(&mut self, record: &Record) -> Result<(), StoreError> {
        self.zone.staging_doc().await?.del_record(record);
        self.zone.persist_staging().await
    }

    /// Remove the `index`-th pending change and persist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingChange`] when `index` is out of range;
    /// nothing is persisted in that case.
    pub async fn revert(&mut self, index: usize) -> Result<(), StoreError> {
        self.zone.staging_doc().await?.revert(index)?;
        self.zone.persist_staging().await
    }

    /// Drop all pending changes and persist.
    pub async fn clear(&mut self) -> Result<(), StoreError> {
        self.zone.staging_doc().await?.clear();
        self.zone.persist_staging().await
    }
}

#[cfg(test)]
#[path = "zone_tests.rs"]
mod zone_tests;
