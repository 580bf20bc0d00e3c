// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Polymorphic DNS record values.
//!
//! The shape of a record's `value` depends on the record type and mode:
//!
//! | Type | Mode | Value |
//! |------|------|-------|
//! | A, AAAA, ANAME, CNAME | standard | `[{value, enabled}]` |
//! | A, AAAA, ANAME, CNAME | failover | `{mode, enabled, values: [{value, enabled, order, sonarCheckId}]}` |
//! | A, AAAA | roundrobin-failover | `[{value, enabled, order, sonarCheckId}]` |
//! | A, AAAA, ANAME, CNAME | pools | `[poolId]` |
//! | MX | standard | `[{server, priority, enabled}]` |
//! | TXT | standard | `[{value, enabled}]` |
//!
//! `sonarCheckId` accepts an integer or a `@sonar,<http|tcp>:<name>` reference.

use crate::errors::DecodeError;
use crate::references::{ReferenceResolver, ReferenceTarget};
use crate::resource::ResourceKind;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Record mode as understood by Constellix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordMode {
    Standard,
    Failover,
    RoundRobinFailover,
    Pools,
}

impl RecordMode {
    #[must_use]
    pub fn parse(mode: &str) -> Option<Self> {
        match mode {
            "standard" => Some(Self::Standard),
            "failover" => Some(Self::Failover),
            "roundrobin-failover" => Some(Self::RoundRobinFailover),
            "pools" => Some(Self::Pools),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Failover => "failover",
            Self::RoundRobinFailover => "roundrobin-failover",
            Self::Pools => "pools",
        }
    }
}

impl fmt::Display for RecordMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value of a DNS record, keyed by (type, mode).
///
/// Serializes to the exact JSON shape the DNS v4 API expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DnsValue {
    Standard(Vec<StandardItem>),
    Failover(FailoverValue),
    RoundRobinFailover(Vec<FailoverItem>),
    Pools(Vec<i64>),
    Mx(Vec<MxItem>),
    Txt(Vec<TxtItem>),
}

impl Default for DnsValue {
    fn default() -> Self {
        Self::Standard(Vec::new())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardItem {
    #[serde(rename = "value")]
    pub address: String,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailoverValue {
    pub mode: String,
    pub enabled: bool,
    pub values: Vec<FailoverItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailoverItem {
    #[serde(rename = "value")]
    pub address: String,
    pub enabled: bool,
    pub order: i64,
    /// Resolved Sonar check identifier (0 when the item is not monitored)
    #[serde(rename = "sonarCheckId")]
    pub health_check: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MxItem {
    pub server: String,
    pub priority: i64,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxtItem {
    #[serde(rename = "value")]
    pub text: String,
    #[serde(default)]
    pub enabled: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CheckRef {
    Id(i64),
    Symbolic(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFailoverItem {
    value: String,
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    order: i64,
    #[serde(default)]
    sonar_check_id: Option<CheckRef>,
}

#[derive(Deserialize)]
struct RawFailoverValue {
    #[serde(default = "default_failover_mode")]
    mode: String,
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    values: Vec<RawFailoverItem>,
}

fn default_failover_mode() -> String {
    "normal".to_string()
}

/// Decode the `value` of a DNS record.
///
/// # Errors
///
/// - [`DecodeError::UnsupportedCombination`] for any (type, mode) pair not listed
///   in the module table, including roundrobin-failover on CNAME and ANAME
/// - [`DecodeError::UnexpectedShape`] when the value is not a sequence or mapping
///   as the mode requires
/// - [`DecodeError::Malformed`] when items do not fit their schema
/// - [`DecodeError::Reference`] when a `sonarCheckId` reference cannot be resolved
pub fn decode_value(
    record_type: &str,
    mode: &str,
    raw: &Value,
    resolver: &mut ReferenceResolver<'_>,
) -> Result<DnsValue, DecodeError> {
    let unsupported = || DecodeError::UnsupportedCombination {
        record_type: record_type.to_string(),
        mode: mode.to_string(),
    };
    let parsed = RecordMode::parse(mode).ok_or_else(unsupported)?;

    match (record_type, parsed) {
        ("A" | "AAAA" | "ANAME" | "CNAME", RecordMode::Standard) => {
            sequence(record_type, mode, raw).map(DnsValue::Standard)
        }
        ("A" | "AAAA" | "ANAME" | "CNAME", RecordMode::Failover) => {
            if !raw.is_object() {
                return Err(shape_error(record_type, mode, "a mapping"));
            }
            let failover = RawFailoverValue::deserialize(raw).map_err(malformed)?;
            Ok(DnsValue::Failover(FailoverValue {
                mode: failover.mode,
                enabled: failover.enabled,
                values: resolve_failover_items(failover.values, resolver)?,
            }))
        }
        ("A" | "AAAA", RecordMode::RoundRobinFailover) => {
            let items = sequence(record_type, mode, raw)?;
            resolve_failover_items(items, resolver).map(DnsValue::RoundRobinFailover)
        }
        ("A" | "AAAA" | "ANAME" | "CNAME", RecordMode::Pools) => {
            sequence(record_type, mode, raw).map(DnsValue::Pools)
        }
        ("MX", RecordMode::Standard) => sequence(record_type, mode, raw).map(DnsValue::Mx),
        ("TXT", RecordMode::Standard) => sequence(record_type, mode, raw).map(DnsValue::Txt),
        _ => Err(unsupported()),
    }
}

fn sequence<T: DeserializeOwned>(
    record_type: &str,
    mode: &str,
    raw: &Value,
) -> Result<Vec<T>, DecodeError> {
    if !raw.is_array() {
        return Err(shape_error(record_type, mode, "a sequence"));
    }
    Vec::<T>::deserialize(raw).map_err(malformed)
}

fn resolve_failover_items(
    items: Vec<RawFailoverItem>,
    resolver: &mut ReferenceResolver<'_>,
) -> Result<Vec<FailoverItem>, DecodeError> {
    let mut resolved = Vec::with_capacity(items.len());
    for item in items {
        let health_check = match item.sonar_check_id {
            None => 0,
            Some(CheckRef::Id(id)) => id,
            Some(CheckRef::Symbolic(reference)) => {
                resolver.resolve(&reference, ReferenceTarget::HealthCheck)?
            }
        };
        resolved.push(FailoverItem {
            address: item.value,
            enabled: item.enabled,
            order: item.order,
            health_check,
        });
    }
    Ok(resolved)
}

fn shape_error(record_type: &str, mode: &str, expected: &'static str) -> DecodeError {
    DecodeError::UnexpectedShape {
        record_type: record_type.to_string(),
        mode: mode.to_string(),
        expected,
    }
}

fn malformed(source: serde_json::Error) -> DecodeError {
    DecodeError::Malformed {
        kind: ResourceKind::DnsRecord,
        source,
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod value_tests;
