// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Record model: value, type enum and the stable content key.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use uuid::Uuid;

/// The closed set of record types the store persists.
///
/// `CONSUL` is a reserved extension point: it is stored and staged like any
/// other type but never leaves through the lookup path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(clippy::upper_case_acronyms)]
pub enum RecordType {
    A,
    AAAA,
    CNAME,
    MX,
    NS,
    CONSUL,
}

impl RecordType {
    /// The bare type mnemonic, as persisted and as keyed into content keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::AAAA => "AAAA",
            Self::CNAME => "CNAME",
            Self::MX => "MX",
            Self::NS => "NS",
            Self::CONSUL => "CONSUL",
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IN {}", self.as_str())
    }
}

impl std::str::FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A" => Ok(Self::A),
            "AAAA" => Ok(Self::AAAA),
            "CNAME" => Ok(Self::CNAME),
            "MX" => Ok(Self::MX),
            "NS" => Ok(Self::NS),
            "CONSUL" => Ok(Self::CONSUL),
            other => Err(format!("unknown record type '{other}'")),
        }
    }
}

/// A record value: an IP address for A/AAAA, an opaque string otherwise.
///
/// Serialised untagged, so both forms appear as a plain JSON string and a
/// value that parses as an IP address deserialises as one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordValue {
    /// An IPv4 or IPv6 address
    Ip(IpAddr),
    /// Any other record data, kept verbatim
    Text(String),
}

impl RecordValue {
    /// Parse a value, preferring the IP form when the text is an address.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        match text.parse::<IpAddr>() {
            Ok(ip) => Self::Ip(ip),
            Err(_) => Self::Text(text.to_string()),
        }
    }
}

impl std::fmt::Display for RecordValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ip(ip) => write!(f, "{ip}"),
            Self::Text(text) => write!(f, "{text}"),
        }
    }
}

/// A single resource record as stored in a zone's records document.
///
/// `record` is the owner label relative to the zone root: the literal `@`
/// denotes the apex and a leftmost `*` denotes a wildcard. The id is a
/// version-4 UUID generated freshly for every constructed instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Stable identity of the record for its whole lifetime
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,

    /// Owner label relative to the zone root
    pub record: String,

    /// Record type drawn from the closed [`RecordType`] set
    pub record_type: RecordType,

    /// Record data
    pub value: RecordValue,

    /// Time to live in seconds
    pub ttl: u32,
}

impl Record {
    /// Build a record with a freshly generated id.
    #[must_use]
    pub fn new(record: String, record_type: RecordType, value: RecordValue, ttl: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            record,
            record_type,
            value,
            ttl,
        }
    }

    /// The stable content key of this record.
    ///
    /// Two records collide on this key iff they are semantically identical,
    /// i.e. share owner, type and value. The staging layer relies on this to
    /// collapse duplicate additions.
    #[must_use]
    pub fn content_key(&self) -> String {
        let owner = BASE64.encode(self.record.as_bytes());
        let content = format!("{}.{}", self.record_type.as_str(), self.value);
        format!("{owner}.{}", BASE64.encode(content.as_bytes()))
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} IN {} {} {}",
            self.record,
            self.record_type.as_str(),
            self.ttl,
            self.value
        )
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod record_tests;
