// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Typed Consul KV adapter.
//!
//! Every document ConsulNS persists is a whole JSON value written to a
//! single key through the agent HTTP API (`/v1/kv/...`). Reads decode the
//! base64 `Value` field of the returned entry and parse it against the
//! caller's document type; a missing key is `None`, not an error. Writes
//! serialise the document and treat a `false` acknowledgement from the
//! agent as [`KvError::KeyNotInserted`].

use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::config::ConsulDsn;
use crate::constants::KV_HTTP_TIMEOUT_SECS;
use crate::errors::KvError;

/// Header carrying the agent's current KV raft index
const CONSUL_INDEX_HEADER: &str = "x-consul-index";

/// One entry of a `/v1/kv` read response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KvEntry {
    #[allow(dead_code)]
    lock_index: u64,
    #[allow(dead_code)]
    key: String,
    #[allow(dead_code)]
    flags: u64,
    /// Base64-encoded raw value; null for zero-length values
    value: Option<String>,
    #[allow(dead_code)]
    create_index: u64,
    modify_index: u64,
}

/// Typed get/put of JSON documents against one Consul agent.
#[derive(Debug, Clone)]
pub struct KvClient {
    http: HttpClient,
    base_url: String,
}

impl KvClient {
    /// Build a client for the agent named by `dsn`.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying HTTP client cannot be built.
    pub fn new(dsn: &ConsulDsn) -> Result<Self, KvError> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(KV_HTTP_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base_url: dsn.base_url(),
        })
    }

    fn kv_url(&self, key: &str) -> String {
        format!("{}/v1/kv/{key}", self.base_url)
    }

    /// Fetch and decode the document stored at `key`.
    ///
    /// Returns the store's modify index together with the parsed value, or
    /// `None` when the key does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`KvError`] on transport failures, unexpected HTTP statuses
    /// and documents that do not decode as `T`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<(u64, Option<T>), KvError> {
        let url = self.kv_url(key);
        debug!(key, "consul kv get");

        let response = self.http.get(&url).send().await?;
        let index = response
            .headers()
            .get(CONSUL_INDEX_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(0);

        if response.status() == StatusCode::NOT_FOUND {
            return Ok((index, None));
        }
        if !response.status().is_success() {
            return Err(KvError::UnexpectedStatus {
                key: key.to_string(),
                status: response.status().as_u16(),
            });
        }

        let mut entries: Vec<KvEntry> = response.json().await?;
        let Some(entry) = entries.pop() else {
            return Ok((index, None));
        };

        let raw = entry.value.unwrap_or_default();
        let bytes = BASE64.decode(raw).map_err(|err| KvError::InvalidValue {
            key: key.to_string(),
            reason: err.to_string(),
        })?;
        let value = serde_json::from_slice(&bytes).map_err(|err| KvError::InvalidValue {
            key: key.to_string(),
            reason: err.to_string(),
        })?;

        Ok((entry.modify_index, Some(value)))
    }

    /// Serialise `value` and write it to `key`, replacing any previous
    /// document as a whole.
    ///
    /// # Errors
    ///
    /// Returns [`KvError::KeyNotInserted`] when the agent acknowledges the
    /// write with `false`, and [`KvError`] transport variants otherwise.
    pub async fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), KvError> {
        let url = self.kv_url(key);
        debug!(key, "consul kv put");

        let response = self.http.put(&url).json(value).send().await?;
        if !response.status().is_success() {
            return Err(KvError::UnexpectedStatus {
                key: key.to_string(),
                status: response.status().as_u16(),
            });
        }

        let inserted: bool = response.json().await?;
        if !inserted {
            return Err(KvError::KeyNotInserted {
                key: key.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "kv_tests.rs"]
mod kv_tests;
