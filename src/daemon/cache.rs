// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory authoritative cache and lookup engine.
//!
//! The cache is an immutable snapshot of every zone in the store, built
//! once at daemon startup. Each [`CachedZone`] keeps its records twice: as
//! an ordered list of `(absolute owner, record)` pairs and as a bucket
//! index by owner name. Lookups, listings, SOA synthesis and NSEC
//! before/after ordering all run against the snapshot; the hot path never
//! touches the KV store.

use std::collections::HashMap;
use tracing::warn;

use crate::constants::{
    SOA_EXPIRE_SECS, SOA_NEGATIVE_TTL_SECS, SOA_REFRESH_SECS, SOA_RETRY_SECS, SOA_TTL_SECS,
};
use crate::daemon::proto::{BeforeAndAfterNames, QType, RecordInfo};
use crate::errors::StoreError;
use crate::name::DnsName;
use crate::store::record::Record;
use crate::store::zone::ZoneInfo;
use crate::store::Consul;

/// Sentinel id returned when no zone matches a qname.
pub const NO_ZONE_ID: i64 = -1;

/// One zone's snapshot: info plus indexed records.
pub struct CachedZone {
    name: DnsName,
    info: ZoneInfo,
    /// `(absolute owner, record)` pairs in snapshot iteration order
    records: Vec<(DnsName, Record)>,
    /// Owner name to indices into `records`
    by_owner: HashMap<DnsName, Vec<usize>>,
}

impl CachedZone {
    /// Index a zone snapshot.
    ///
    /// Owner names become absolute here: the apex label `@` maps to the
    /// zone name itself, anything else is concatenated with it. Records
    /// whose owner label does not parse are skipped with a warning.
    #[must_use]
    pub fn build(name: DnsName, info: ZoneInfo, zone_records: Vec<Record>) -> Self {
        let mut records = Vec::with_capacity(zone_records.len());
        let mut by_owner: HashMap<DnsName, Vec<usize>> = HashMap::new();

        for record in zone_records {
            let owner = match DnsName::from_text(&record.record) {
                Ok(rel) => rel.concatenate(&name),
                Err(err) => {
                    warn!(zone = %name, record = %record.record, %err,
                        "skipping record with invalid owner label");
                    continue;
                }
            };
            by_owner.entry(owner.clone()).or_default().push(records.len());
            records.push((owner, record));
        }

        Self {
            name,
            info,
            records,
            by_owner,
        }
    }

    /// The zone's fully-qualified name.
    #[must_use]
    pub fn name(&self) -> &DnsName {
        &self.name
    }

    /// The zone's info snapshot.
    #[must_use]
    pub fn info(&self) -> &ZoneInfo {
        &self.info
    }

    /// The synthesised start-of-authority record for this zone.
    ///
    /// ConsulNS does not store SOA records; the answer is derived from the
    /// zone name and serial with fixed timers.
    #[must_use]
    pub fn soa(&self) -> RecordInfo {
        let apex = self.name.to_string();
        RecordInfo {
            qtype: QType::SOA,
            qname: apex.clone(),
            content: format!(
                "ns1.{apex} root.{apex} {} {SOA_REFRESH_SECS} {SOA_RETRY_SECS} {SOA_EXPIRE_SECS} {SOA_NEGATIVE_TTL_SECS}",
                self.info.serial
            ),
            ttl: SOA_TTL_SECS,
            auth: true,
        }
    }

    fn record_info(&self, qname: &DnsName, record: &Record) -> Option<RecordInfo> {
        let qtype = QType::from_record_type(record.record_type)?;
        Some(RecordInfo {
            qtype,
            qname: qname.to_string(),
            content: record.value.to_string(),
            ttl: record.ttl,
            auth: true,
        })
    }

    /// Every answerable record of the zone, SOA first. This backs the
    /// front-end's `list` (zone transfer) operation.
    #[must_use]
    pub fn record_infos(&self) -> Vec<RecordInfo> {
        let mut out = vec![self.soa()];
        out.extend(
            self.records
                .iter()
                .filter_map(|(owner, record)| self.record_info(owner, record)),
        );
        out
    }

    /// Answer a lookup against the snapshot.
    ///
    /// A qname whose leftmost label is `*` fans out to every owned record.
    /// Otherwise the owner bucket for the qname answers; an empty bucket
    /// below the apex falls back to the `*` sibling bucket, echoing the
    /// queried name. Apex queries for `ANY` or `SOA` yield the synthesised
    /// SOA first, and `SOA` queries stop there.
    #[must_use]
    pub fn lookup(&self, qtype: QType, qname: &DnsName) -> Vec<RecordInfo> {
        let mut out = Vec::new();
        let is_apex = *qname == self.name;

        if is_apex && (qtype == QType::ANY || qtype == QType::SOA) {
            out.push(self.soa());
        }
        if qtype == QType::SOA {
            return out;
        }

        let wildcard_query = qname.first_label() == Some("*");
        let indices: Vec<usize> = if wildcard_query {
            (0..self.records.len()).collect()
        } else if let Some(bucket) = self.by_owner.get(qname) {
            bucket.clone()
        } else if !is_apex && qname.is_subdomain(&self.name) {
            qname
                .wildcard_sibling()
                .and_then(|wildcard| self.by_owner.get(&wildcard).cloned())
                .unwrap_or_default()
        } else {
            Vec::new()
        };

        for index in indices {
            let (owner, record) = &self.records[index];
            if qtype != QType::ANY && qtype.record_type() != Some(record.record_type) {
                continue;
            }
            // Fan-out answers name their true owner; single-name answers
            // echo the queried name, wildcard matches included.
            let answer_name = if wildcard_query { owner } else { qname };
            if let Some(info) = self.record_info(answer_name, record) {
                out.push(info);
            }
        }
        out
    }

    /// Predecessor and successor of `qname` in the zone's cyclic owner
    /// sequence, used by the front-end for NSEC denial-of-existence.
    ///
    /// Owner names are relative to the zone root, in snapshot iteration
    /// order, apex rendered as `@`. An empty zone yields two empty
    /// strings; a qname not in the sequence is treated as sitting after
    /// the last owner.
    #[must_use]
    pub fn before_and_after(&self, qname: &DnsName) -> BeforeAndAfterNames {
        let sequence: Vec<DnsName> = self
            .records
            .iter()
            .filter_map(|(owner, _)| owner.relativize(&self.name))
            .collect();

        if sequence.is_empty() {
            return BeforeAndAfterNames {
                before: String::new(),
                after: String::new(),
                unhashed: String::new(),
            };
        }

        let len = sequence.len();
        let target = qname.relativize(&self.name);
        let position = target.and_then(|target| sequence.iter().position(|owner| *owner == target));

        let (before, after) = match position {
            Some(position) => (
                &sequence[(position + len - 1) % len],
                &sequence[(position + 1) % len],
            ),
            // A name that owns no record sits past the last owner in the
            // cyclic sequence.
            None => (&sequence[len - 1], &sequence[0]),
        };
        BeforeAndAfterNames {
            before: before.to_string(),
            after: after.to_string(),
            unhashed: String::new(),
        }
    }
}

/// Immutable snapshot of every zone in the store.
pub struct Cache {
    zones: Vec<CachedZone>,
    by_name: HashMap<DnsName, usize>,
}

impl Cache {
    /// Build a cache from already-indexed zones. Zone ids are positions in
    /// the given order.
    #[must_use]
    pub fn from_zones(zones: Vec<CachedZone>) -> Self {
        let by_name = zones
            .iter()
            .enumerate()
            .map(|(index, zone)| (zone.name().clone(), index))
            .collect();
        Self { zones, by_name }
    }

    /// Load a snapshot of every zone from the store.
    ///
    /// # Errors
    ///
    /// Returns an error when the zones index or any zone document cannot
    /// be read.
    pub async fn load(consul: &Consul) -> Result<Self, StoreError> {
        let mut zones = Vec::new();
        for name in consul.zone_names().await? {
            let mut zone = consul.zone(&name).await?;
            let info = zone.info().await?;
            let records = zone.records().await?;
            zones.push(CachedZone::build(name, info, records));
        }
        Ok(Self::from_zones(zones))
    }

    /// Number of zones in the snapshot.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// True when the snapshot holds no zones.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Every zone with its id, in load order.
    pub fn zones(&self) -> impl Iterator<Item = (i64, &CachedZone)> {
        self.zones
            .iter()
            .enumerate()
            .map(|(index, zone)| (index as i64, zone))
    }

    /// The zone with the given cache id.
    #[must_use]
    pub fn zone_by_id(&self, id: i64) -> Option<&CachedZone> {
        usize::try_from(id).ok().and_then(|id| self.zones.get(id))
    }

    /// Longest-suffix zone match for a qname.
    ///
    /// Among zones whose name is a suffix of `qname` (equal to it, when
    /// `exact`), the one with the most labels wins. Returns
    /// `(NO_ZONE_ID, None)` when nothing matches.
    #[must_use]
    pub fn zone_by_qname(&self, qname: &DnsName, exact: bool) -> (i64, Option<&CachedZone>) {
        if exact {
            return match self.by_name.get(qname) {
                Some(&index) => (index as i64, self.zones.get(index)),
                None => (NO_ZONE_ID, None),
            };
        }

        let mut best: Option<(i64, &CachedZone)> = None;
        for (id, zone) in self.zones() {
            if qname.is_subdomain(zone.name())
                && best.is_none_or(|(_, current)| {
                    zone.name().label_count() > current.name().label_count()
                })
            {
                best = Some((id, zone));
            }
        }
        match best {
            Some((id, zone)) => (id, Some(zone)),
            None => (NO_ZONE_ID, None),
        }
    }
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod cache_tests;
