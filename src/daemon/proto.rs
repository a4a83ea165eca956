// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! PowerDNS remote backend protocol codec.
//!
//! Queries arrive as single-line JSON objects tagged by `method`, with a
//! method-specific `parameters` object. Responses carry a single `result`
//! field whose shape depends on the method. The `zone-id` discriminator
//! keeps its hyphen on the wire; `-1` and absent both mean "resolve the
//! zone by name".

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::store::record::RecordType;
use crate::store::zone::ZoneKey;

/// Query types the front-end asks for.
///
/// `ANY` and `SOA` are query-side only; the remaining variants map onto
/// stored [`RecordType`]s. The reserved `CONSUL` record type has no query
/// equivalent and is therefore never emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum QType {
    A,
    AAAA,
    CNAME,
    MX,
    NS,
    SOA,
    ANY,
}

impl QType {
    /// The stored record type matching this query type, if any.
    #[must_use]
    pub fn record_type(self) -> Option<RecordType> {
        match self {
            Self::A => Some(RecordType::A),
            Self::AAAA => Some(RecordType::AAAA),
            Self::CNAME => Some(RecordType::CNAME),
            Self::MX => Some(RecordType::MX),
            Self::NS => Some(RecordType::NS),
            Self::SOA | Self::ANY => None,
        }
    }

    /// The query type under which a stored record type is answered, if any.
    #[must_use]
    pub fn from_record_type(record_type: RecordType) -> Option<Self> {
        match record_type {
            RecordType::A => Some(Self::A),
            RecordType::AAAA => Some(Self::AAAA),
            RecordType::CNAME => Some(Self::CNAME),
            RecordType::MX => Some(Self::MX),
            RecordType::NS => Some(Self::NS),
            RecordType::CONSUL => None,
        }
    }
}

/// How the front-end should treat a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoneKind {
    Master,
    Slave,
    Native,
}

/// Zone summary returned by `getAllDomains` and `getDomainInfo`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainInfo {
    /// Cache-assigned zone id
    pub id: i64,
    /// Zone name in canonical text form
    pub zone: String,
    /// Zone serial
    pub serial: u32,
    /// Serial last notified to secondaries
    pub notified_serial: Option<u32>,
    /// Epoch seconds of the last front-end check
    pub last_check: i64,
    /// Zone kind, always `master` here
    pub kind: ZoneKind,
}

/// One answer row returned by `lookup` and `list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordInfo {
    /// Query type of the answer
    pub qtype: QType,
    /// Owner name of the answer
    pub qname: String,
    /// Record data in presentation form
    pub content: String,
    /// Time to live in seconds
    pub ttl: u32,
    /// Whether the answer is authoritative; always true here
    pub auth: bool,
}

/// Result of `getBeforeAndAfterNamesAbsolute`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeforeAndAfterNames {
    /// Predecessor in the zone's cyclic owner ordering, `""` when none
    pub before: String,
    /// Successor in the zone's cyclic owner ordering
    pub after: String,
    /// Unhashed owner name, unused by this backend
    pub unhashed: String,
}

// ----------------------------------------------------------------------
// Query parameters, one struct per method
// ----------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializeParameters {
    /// Socket path the front-end was configured with
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetAllDomainsParameters {
    /// Whether disabled zones are included in the listing
    #[serde(default)]
    pub include_disabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetDomainInfoParameters {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupParameters {
    pub qname: String,
    pub qtype: QType,
    /// Zone id from a previous `getDomainInfo`; `-1` or absent resolves
    /// the zone by qname suffix instead
    #[serde(rename = "zone-id", default)]
    pub zone_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListParameters {
    pub zonename: String,
    #[serde(default)]
    pub domain_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetAllDomainMetadataParameters {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetDomainMetadataParameters {
    pub name: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetDomainMetadataParameters {
    pub name: String,
    pub kind: String,
    #[serde(default)]
    pub value: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetDomainKeysParameters {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddDomainKeyParameters {
    pub name: String,
    pub key: ZoneKey,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoveDomainKeyParameters {
    pub name: String,
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetBeforeAndAfterNamesAbsoluteParameters {
    pub qname: String,
}

/// A decoded front-end query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", content = "parameters", rename_all = "camelCase")]
pub enum Query {
    Initialize(InitializeParameters),
    GetAllDomains(GetAllDomainsParameters),
    GetDomainInfo(GetDomainInfoParameters),
    Lookup(LookupParameters),
    List(ListParameters),
    GetAllDomainMetadata(GetAllDomainMetadataParameters),
    GetDomainMetadata(GetDomainMetadataParameters),
    SetDomainMetadata(SetDomainMetadataParameters),
    GetDomainKeys(GetDomainKeysParameters),
    AddDomainKey(AddDomainKeyParameters),
    RemoveDomainKey(RemoveDomainKeyParameters),
    GetBeforeAndAfterNamesAbsolute(GetBeforeAndAfterNamesAbsoluteParameters),
    /// Accepted for protocol compatibility, acknowledged with `true`
    StartTransaction(serde_json::Value),
    /// Accepted for protocol compatibility, acknowledged with `true`
    CommitTransaction(serde_json::Value),
}

impl Query {
    /// The wire method name, for logs and metrics.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::Initialize(_) => "initialize",
            Self::GetAllDomains(_) => "getAllDomains",
            Self::GetDomainInfo(_) => "getDomainInfo",
            Self::Lookup(_) => "lookup",
            Self::List(_) => "list",
            Self::GetAllDomainMetadata(_) => "getAllDomainMetadata",
            Self::GetDomainMetadata(_) => "getDomainMetadata",
            Self::SetDomainMetadata(_) => "setDomainMetadata",
            Self::GetDomainKeys(_) => "getDomainKeys",
            Self::AddDomainKey(_) => "addDomainKey",
            Self::RemoveDomainKey(_) => "removeDomainKey",
            Self::GetBeforeAndAfterNamesAbsolute(_) => "getBeforeAndAfterNamesAbsolute",
            Self::StartTransaction(_) => "startTransaction",
            Self::CommitTransaction(_) => "commitTransaction",
        }
    }
}

/// The payload of a response's single `result` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResultPayload {
    Bool(bool),
    Records(Vec<RecordInfo>),
    Domain(Box<DomainInfo>),
    Domains(Vec<DomainInfo>),
    Keys(Vec<ZoneKey>),
    Metadata(BTreeMap<String, Vec<String>>),
    Values(Vec<String>),
    BeforeAndAfter(BeforeAndAfterNames),
}

/// A reply to one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub result: ResultPayload,
}

impl Response {
    /// The generic success acknowledgement, `{"result": true}`.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            result: ResultPayload::Bool(true),
        }
    }

    /// The generic failure reply, `{"result": false}`.
    #[must_use]
    pub fn fail() -> Self {
        Self {
            result: ResultPayload::Bool(false),
        }
    }
}

impl From<ResultPayload> for Response {
    fn from(result: ResultPayload) -> Self {
        Self { result }
    }
}

#[cfg(test)]
#[path = "proto_tests.rs"]
mod proto_tests;
