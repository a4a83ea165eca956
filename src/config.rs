// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Environment-driven configuration for the daemon and the CLI.
//!
//! Configuration is intentionally small: a Consul DSN and the metrics bind
//! address, both read from the environment with sensible defaults. Everything
//! else (the socket path) arrives on the command line.

use anyhow::{bail, Context, Result};
use url::Url;

use crate::constants::{DEFAULT_CONSUL_PORT, METRICS_SERVER_BIND_ADDRESS};

/// Environment variable naming the Consul agent, e.g. `http://10.0.0.2:8500`
pub const ENV_CONSUL_ADDR: &str = "CONSUL_ADDR";

/// Environment variable overriding the metrics server bind address
pub const ENV_METRICS_ADDR: &str = "CONSULNS_METRICS_ADDR";

/// A Consul DSN: `http[s]://host[:port]`.
///
/// * Host required
/// * Port not required (defaulted to 8500)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsulDsn {
    scheme: String,
    host: String,
    port: u16,
}

impl ConsulDsn {
    /// Parse a DSN string, accepting only http/https schemes.
    ///
    /// # Errors
    ///
    /// Returns an error when the string is not a URL, uses a scheme other
    /// than http/https, or carries no host.
    pub fn parse(s: &str) -> Result<Self> {
        let url = Url::parse(s).with_context(|| format!("invalid consul DSN: {s}"))?;
        let scheme = url.scheme().to_string();
        if scheme != "http" && scheme != "https" {
            bail!("consul DSN must use http or https, got '{scheme}'");
        }
        let Some(host) = url.host_str() else {
            bail!("consul DSN '{s}' has no host");
        };
        Ok(Self {
            scheme,
            host: host.to_string(),
            port: url.port().unwrap_or(DEFAULT_CONSUL_PORT),
        })
    }

    /// The URL scheme, `http` or `https`.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The required URL host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The URL port, defaulted to 8500 when absent.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Base URL of the agent HTTP API, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }
}

impl Default for ConsulDsn {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            host: "127.0.0.1".to_string(),
            port: DEFAULT_CONSUL_PORT,
        }
    }
}

impl std::fmt::Display for ConsulDsn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.base_url())
    }
}

impl std::str::FromStr for ConsulDsn {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Runtime configuration shared by the daemon and the CLI.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address of the Consul agent backing the zone store
    pub consul_addr: ConsulDsn,

    /// Bind address for the Prometheus metrics HTTP server
    pub metrics_addr: String,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error when `CONSUL_ADDR` is set but not a valid DSN.
    pub fn from_env() -> Result<Self> {
        let consul_addr = match std::env::var(ENV_CONSUL_ADDR) {
            Ok(raw) => ConsulDsn::parse(&raw)?,
            Err(_) => ConsulDsn::default(),
        };

        let metrics_addr = std::env::var(ENV_METRICS_ADDR)
            .unwrap_or_else(|_| METRICS_SERVER_BIND_ADDRESS.to_string());

        Ok(Self {
            consul_addr,
            metrics_addr,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            consul_addr: ConsulDsn::default(),
            metrics_addr: METRICS_SERVER_BIND_ADDRESS.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
