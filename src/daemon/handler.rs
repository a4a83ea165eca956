// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Per-connection protocol handler.
//!
//! Each accepted connection gets its own handler task identified by a
//! process-monotonic connection id. The handler reads newline-framed JSON
//! queries, dispatches them against the shared cache snapshot (and, for
//! metadata and key operations, the live store) and writes one reply per
//! query in request order.
//!
//! Failure discipline: a line that does not decode is answered with
//! `{"result": false}` and the connection stays alive; a dispatch error is
//! logged with its query context and goes unanswered; only socket errors
//! terminate the connection.

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::daemon::cache::{Cache, CachedZone};
use crate::daemon::proto::{
    AddDomainKeyParameters, DomainInfo, GetAllDomainMetadataParameters, GetAllDomainsParameters,
    GetBeforeAndAfterNamesAbsoluteParameters, GetDomainInfoParameters, GetDomainKeysParameters,
    GetDomainMetadataParameters, InitializeParameters, ListParameters, LookupParameters, Query,
    RemoveDomainKeyParameters, Response, ResultPayload, SetDomainMetadataParameters, ZoneKind,
};
use crate::metrics;
use crate::name::DnsName;
use crate::store::Consul;

static NEXT_CONN_ID: AtomicU64 = AtomicU64::new(0);

/// One connection's dispatch state.
pub struct Handler {
    id: u64,
    cache: Arc<Cache>,
    store: Arc<Mutex<Consul>>,
}

impl Handler {
    /// Build a handler with a freshly assigned connection id.
    #[must_use]
    pub fn new(cache: Arc<Cache>, store: Arc<Mutex<Consul>>) -> Self {
        Self {
            id: NEXT_CONN_ID.fetch_add(1, Ordering::Relaxed),
            cache,
            store,
        }
    }

    /// Drive the connection until EOF or a socket error.
    pub async fn run(self, stream: UnixStream) {
        info!(conn_id = self.id, "connection established");
        let (read_half, mut write_half) = stream.into_split();
        let mut lines = BufReader::new(read_half).lines();

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(err) => {
                    error!(conn_id = self.id, %err, "error reading from socket");
                    break;
                }
            };
            debug!(conn_id = self.id, raw_query = %line, "received raw query");

            let query = match serde_json::from_str::<Query>(&line) {
                Ok(query) => query,
                Err(err) => {
                    error!(conn_id = self.id, raw_query = %line, %err, "invalid query");
                    metrics::record_query("unknown", "decode_error", None);
                    if let Err(err) = self.reply(&mut write_half, &Response::fail()).await {
                        error!(conn_id = self.id, %err, "error writing to socket");
                        break;
                    }
                    continue;
                }
            };

            let method = query.method();
            let start = std::time::Instant::now();
            match self.dispatch(&query).await {
                Ok(response) => {
                    metrics::record_query(method, "ok", Some(start.elapsed()));
                    if let Err(err) = self.reply(&mut write_half, &response).await {
                        error!(conn_id = self.id, %err, "error writing to socket");
                        break;
                    }
                }
                Err(err) => {
                    // Best effort: the error is logged with its query and
                    // the next line is still processed.
                    error!(conn_id = self.id, method, query = ?query, err = ?err,
                        "error while handling query");
                    metrics::record_query(method, "error", Some(start.elapsed()));
                }
            }
        }

        info!(conn_id = self.id, "connection closed");
    }

    async fn reply(
        &self,
        write_half: &mut tokio::net::unix::OwnedWriteHalf,
        response: &Response,
    ) -> Result<()> {
        let json = serde_json::to_string(response).context("failed to serialise response")?;
        debug!(conn_id = self.id, raw_response = %json, "sending response");
        write_half
            .write_all(json.as_bytes())
            .await
            .context("failed to write response")?;
        write_half
            .write_all(b"\n")
            .await
            .context("failed to write response terminator")?;
        Ok(())
    }

    async fn dispatch(&self, query: &Query) -> Result<Response> {
        match query {
            Query::Initialize(params) => Ok(self.handle_initialize(params)),
            Query::GetAllDomains(params) => Ok(self.handle_get_all_domains(params)),
            Query::GetDomainInfo(params) => Ok(self.handle_get_domain_info(params)),
            Query::Lookup(params) => Ok(self.handle_lookup(params)),
            Query::List(params) => Ok(self.handle_list(params)),
            Query::GetAllDomainMetadata(params) => self.handle_get_all_domain_metadata(params).await,
            Query::GetDomainMetadata(params) => self.handle_get_domain_metadata(params).await,
            Query::SetDomainMetadata(params) => self.handle_set_domain_metadata(params).await,
            Query::GetDomainKeys(params) => self.handle_get_domain_keys(params).await,
            Query::AddDomainKey(params) => self.handle_add_domain_key(params).await,
            Query::RemoveDomainKey(params) => self.handle_remove_domain_key(params).await,
            Query::GetBeforeAndAfterNamesAbsolute(params) => {
                Ok(self.handle_before_and_after(params))
            }
            // Multi-key atomicity is not implemented; transactions are
            // acknowledged to keep the front-end happy.
            Query::StartTransaction(_) | Query::CommitTransaction(_) => Ok(Response::ok()),
        }
    }

    /// Resolve an exact zone name against the cache snapshot.
    fn zone_checked(&self, name: &str) -> Option<(i64, &CachedZone)> {
        let qname = match DnsName::from_text(name) {
            Ok(qname) => qname,
            Err(err) => {
                warn!(conn_id = self.id, zone = %name, %err, "unparseable zone name");
                return None;
            }
        };
        match self.cache.zone_by_qname(&qname, true) {
            (id, Some(zone)) => Some((id, zone)),
            (_, None) => {
                warn!(conn_id = self.id, zone = %name, "requested missing zone");
                None
            }
        }
    }

    fn domain_info(id: i64, zone: &CachedZone) -> DomainInfo {
        let info = zone.info();
        DomainInfo {
            id,
            zone: zone.name().to_string(),
            serial: info.serial,
            notified_serial: info.notified_serial,
            last_check: info.last_check,
            kind: ZoneKind::Master,
        }
    }

    fn handle_initialize(&self, params: &InitializeParameters) -> Response {
        info!(conn_id = self.id, path = %params.path, "front-end initialised");
        Response::ok()
    }

    fn handle_get_all_domains(&self, params: &GetAllDomainsParameters) -> Response {
        let domains: Vec<DomainInfo> = self
            .cache
            .zones()
            .filter(|(_, zone)| params.include_disabled || zone.info().enabled)
            .map(|(id, zone)| Self::domain_info(id, zone))
            .collect();
        debug!(conn_id = self.id, count = domains.len(), "listing domains");
        ResultPayload::Domains(domains).into()
    }

    fn handle_get_domain_info(&self, params: &GetDomainInfoParameters) -> Response {
        match self.zone_checked(&params.name) {
            Some((id, zone)) => ResultPayload::Domain(Box::new(Self::domain_info(id, zone))).into(),
            None => Response::fail(),
        }
    }

    fn handle_lookup(&self, params: &LookupParameters) -> Response {
        debug!(conn_id = self.id, qtype = ?params.qtype, qname = %params.qname,
            "performing lookup");
        let qname = match DnsName::from_text(&params.qname) {
            Ok(qname) => qname,
            Err(err) => {
                warn!(conn_id = self.id, qname = %params.qname, %err, "unparseable qname");
                return Response::fail();
            }
        };

        let zone = match params.zone_id {
            Some(id) if id >= 0 => self.cache.zone_by_id(id),
            _ => self.cache.zone_by_qname(&qname, false).1,
        };
        let Some(zone) = zone else {
            warn!(conn_id = self.id, qname = %params.qname,
                "lookup is requesting domain in missing zone");
            return Response::fail();
        };

        ResultPayload::Records(zone.lookup(params.qtype, &qname)).into()
    }

    fn handle_list(&self, params: &ListParameters) -> Response {
        match self.zone_checked(&params.zonename) {
            Some((_, zone)) => {
                info!(conn_id = self.id, zone = %zone.name(), "listing zone");
                ResultPayload::Records(zone.record_infos()).into()
            }
            None => Response::fail(),
        }
    }

    async fn handle_get_all_domain_metadata(
        &self,
        params: &GetAllDomainMetadataParameters,
    ) -> Result<Response> {
        let Some((_, cached)) = self.zone_checked(&params.name) else {
            return Ok(Response::fail());
        };
        let store = self.store.lock().await;
        let mut zone = store.zone(cached.name()).await?;
        Ok(ResultPayload::Metadata(zone.metadata().await?).into())
    }

    async fn handle_get_domain_metadata(
        &self,
        params: &GetDomainMetadataParameters,
    ) -> Result<Response> {
        let Some((_, cached)) = self.zone_checked(&params.name) else {
            return Ok(Response::fail());
        };
        let store = self.store.lock().await;
        let mut zone = store.zone(cached.name()).await?;
        let values = zone
            .metadata()
            .await?
            .get(&params.kind)
            .cloned()
            .unwrap_or_default();
        Ok(ResultPayload::Values(values).into())
    }

    async fn handle_set_domain_metadata(
        &self,
        params: &SetDomainMetadataParameters,
    ) -> Result<Response> {
        let Some((_, cached)) = self.zone_checked(&params.name) else {
            return Ok(Response::fail());
        };
        let store = self.store.lock().await;
        let mut zone = store.zone(cached.name()).await?;
        zone.set_metadata(&params.kind, params.value.clone()).await?;
        Ok(Response::ok())
    }

    async fn handle_get_domain_keys(&self, params: &GetDomainKeysParameters) -> Result<Response> {
        let Some((_, cached)) = self.zone_checked(&params.name) else {
            return Ok(Response::fail());
        };
        let store = self.store.lock().await;
        let mut zone = store.zone(cached.name()).await?;
        Ok(ResultPayload::Keys(zone.keys().await?).into())
    }

    async fn handle_add_domain_key(&self, params: &AddDomainKeyParameters) -> Result<Response> {
        let Some((_, cached)) = self.zone_checked(&params.name) else {
            return Ok(Response::fail());
        };
        let store = self.store.lock().await;
        let mut zone = store.zone(cached.name()).await?;
        zone.add_key(params.key.clone()).await?;
        Ok(Response::ok())
    }

    async fn handle_remove_domain_key(
        &self,
        params: &RemoveDomainKeyParameters,
    ) -> Result<Response> {
        let Some((_, cached)) = self.zone_checked(&params.name) else {
            return Ok(Response::fail());
        };
        let store = self.store.lock().await;
        let mut zone = store.zone(cached.name()).await?;
        if zone.remove_key(params.id).await? {
            Ok(Response::ok())
        } else {
            warn!(conn_id = self.id, key_id = params.id,
                "attempted to remove non-existing key");
            Ok(Response::fail())
        }
    }

    fn handle_before_and_after(
        &self,
        params: &GetBeforeAndAfterNamesAbsoluteParameters,
    ) -> Response {
        let qname = match DnsName::from_text(&params.qname) {
            Ok(qname) => qname,
            Err(err) => {
                warn!(conn_id = self.id, qname = %params.qname, %err, "unparseable qname");
                return Response::fail();
            }
        };
        let (_, zone) = self.cache.zone_by_qname(&qname, false);
        let Some(zone) = zone else {
            warn!(conn_id = self.id, qname = %params.qname,
                "could not get before/after for missing zone");
            return Response::fail();
        };
        ResultPayload::BeforeAndAfter(zone.before_and_after(&qname)).into()
    }
}
