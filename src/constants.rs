// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for mech.
//!
//! This module contains all numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// Constellix API Endpoints
// ============================================================================

/// Base URL of the Constellix DNS v4 API
pub const DNS_API_BASE_URL: &str = "https://api.dns.constellix.com/v4";

/// Base URL of the Constellix Sonar REST API
pub const SONAR_API_BASE_URL: &str = "https://api.sonar.constellix.com/rest/api";

/// Header carrying the HMAC security token on every request
pub const SECURITY_TOKEN_HEADER: &str = "x-cns-security-token";

/// Sonar collection path for HTTP checks
pub const SONAR_HTTP_PATH: &str = "http";

/// Sonar collection path for TCP checks
pub const SONAR_TCP_PATH: &str = "tcp";

/// Sonar sub-resource holding the runtime status of a check
pub const SONAR_STATUS_PATH: &str = "status";

/// DNS v4 collection path for domains
pub const DNS_DOMAINS_PATH: &str = "domains";

/// DNS v4 sub-collection path for the records of a domain
pub const DNS_RECORDS_PATH: &str = "records";

/// DNS v4 collection path for geoproximity definitions
pub const DNS_GEOPROXIMITIES_PATH: &str = "geoproximities";

// ============================================================================
// Environment Variables
// ============================================================================

/// Environment variable holding the Constellix API key
pub const ENV_API_KEY: &str = "CONSTELLIX_API_KEY";

/// Environment variable holding the Constellix secret key
pub const ENV_SECRET_KEY: &str = "CONSTELLIX_SECRET_KEY";

/// Environment variable overriding the DNS v4 base URL
pub const ENV_DNS_API_URL: &str = "CONSTELLIX_DNS_API_URL";

/// Environment variable overriding the Sonar base URL
pub const ENV_SONAR_API_URL: &str = "CONSTELLIX_SONAR_API_URL";

/// Environment variable selecting the log output format (`json` or `text`)
pub const ENV_LOG_FORMAT: &str = "RUST_LOG_FORMAT";

// ============================================================================
// HTTP Transport
// ============================================================================

/// Timeout applied to every HTTP request (seconds)
pub const HTTP_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of status calls in flight during `mech status`
pub const STATUS_POLL_CONCURRENCY: usize = 8;

/// User agent sent with every request
pub const USER_AGENT: &str = concat!("mech/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// Symbolic References
// ============================================================================

/// Prefix of a health check reference (`@sonar,http:<name>` or `@sonar,tcp:<name>`)
pub const SONAR_REFERENCE_PREFIX: &str = "@sonar,";

/// Prefix of a geoproximity reference (`@geoproximity:<name>`)
pub const GEOPROXIMITY_REFERENCE_PREFIX: &str = "@geoproximity:";

// ============================================================================
// DNS Record Defaults
// ============================================================================

/// Record mode assumed when a record does not declare one
pub const DEFAULT_RECORD_MODE: &str = "standard";

/// Routing region assumed when a record does not declare one
pub const DEFAULT_RECORD_REGION: &str = "default";

// ============================================================================
// CLI Messages
// ============================================================================

/// Closing message of a dry run
pub const DRY_RUN_HINT: &str =
    "apply changes by passing --doit flag; allow removing of resources by passing --remove flag";

/// Closing message of an applied run
pub const APPLIED_MESSAGE: &str = "done";
