// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for ConsulNS.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Consul Key Layout
// ============================================================================

/// Root prefix under which all ConsulNS state lives in the Consul KV store
pub const CONSUL_BASE_PATH: &str = "consulns";

/// Index document listing every zone name: `{"zones": [...]}`
pub const CONSUL_PATH_ZONES: &str = "consulns/zones";

/// Pointer document naming the zone the CLI currently operates on
pub const CONSUL_PATH_CURRENT_ZONE: &str = "consulns/current-zone";

/// Per-zone sub-document holding serial and flags
pub const ZONE_DOC_INFO: &str = "info";

/// Per-zone sub-document mapping record ids to records
pub const ZONE_DOC_RECORDS: &str = "records";

/// Per-zone sub-document holding the staged change set
pub const ZONE_DOC_STAGING: &str = "staging";

/// Per-zone sub-document mapping metadata kinds to value lists
pub const ZONE_DOC_METADATA: &str = "metadata";

/// Per-zone sub-document holding DNSSEC key material
pub const ZONE_DOC_KEYS: &str = "keys";

// ============================================================================
// Consul Client Constants
// ============================================================================

/// Default Consul agent port when the DSN does not carry one
pub const DEFAULT_CONSUL_PORT: u16 = 8500;

/// Timeout for HTTP requests against the Consul agent
pub const KV_HTTP_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// DNS Protocol Constants
// ============================================================================

/// Default TTL for staged DNS records (5 minutes)
pub const DEFAULT_DNS_RECORD_TTL_SECS: u32 = 300;

/// TTL attached to synthesised SOA records
pub const SOA_TTL_SECS: u32 = 300;

/// Refresh timer advertised in synthesised SOA records (2 hours)
pub const SOA_REFRESH_SECS: u32 = 7200;

/// Retry timer advertised in synthesised SOA records (1 hour)
pub const SOA_RETRY_SECS: u32 = 3600;

/// Expire timer advertised in synthesised SOA records (14 days)
pub const SOA_EXPIRE_SECS: u32 = 1_209_600;

/// Negative-answer TTL advertised in synthesised SOA records (1 hour)
pub const SOA_NEGATIVE_TTL_SECS: u32 = 3600;

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for the Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Default bind address for the Prometheus metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0:9135";

/// Path for the Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";
