// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Constellix DNS domains and records.
//!
//! Records are scoped by domain and identified by type, name, routing region and
//! the geoproximity they are bound to:
//!
//! ```text
//! A "www" (default, 0)
//! A "www" (europe, 1234)
//! ```
//!
//! The API returns `geoproximity` and `ipfilter` as `{id, name}` objects but
//! expects plain identifiers on create and update, so both are held as ids.

pub mod value;

use crate::constants::{DEFAULT_RECORD_MODE, DEFAULT_RECORD_REGION};
use crate::errors::{DecodeError, ReferenceError};
use crate::references::{ReferenceResolver, ReferenceTarget};
use crate::resource::{decode_plain, field, strip_nulls, FieldSpec, Resource, ResourceKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use value::{
    decode_value, DnsValue, FailoverItem, FailoverValue, MxItem, RecordMode, StandardItem, TxtItem,
};

/// DNS record of a domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DnsRecord {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub ttl: i64,
    pub mode: String,
    pub region: String,
    pub ipfilter: Option<i64>,
    pub ipfilter_drop: bool,
    pub geo_failover: bool,
    pub geoproximity: Option<i64>,
    pub enabled: bool,
    pub value: DnsValue,
    pub notes: String,
}

static DNS_RECORD_FIELDS: &[FieldSpec<DnsRecord>] = &[
    field!(DnsRecord, "name" => name),
    field!(DnsRecord, "type" => record_type, Immutable),
    field!(DnsRecord, "ttl" => ttl),
    field!(DnsRecord, "mode" => mode),
    field!(DnsRecord, "region" => region),
    field!(DnsRecord, "ipfilter" => ipfilter),
    field!(DnsRecord, "ipfilterDrop" => ipfilter_drop),
    field!(DnsRecord, "geoFailover" => geo_failover),
    field!(DnsRecord, "geoproximity" => geoproximity),
    field!(DnsRecord, "enabled" => enabled),
    field!(DnsRecord, "value" => value),
    field!(DnsRecord, "notes" => notes),
];

/// `geoproximity` and `ipfilter` as found in configuration or API responses.
#[derive(Deserialize)]
#[serde(untagged)]
enum LinkRef {
    Id(i64),
    Object { id: i64 },
    Symbolic(String),
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDnsRecord {
    #[serde(default)]
    id: i64,
    #[serde(default)]
    name: String,
    #[serde(rename = "type", default)]
    record_type: String,
    #[serde(default)]
    ttl: i64,
    #[serde(default = "default_mode")]
    mode: String,
    #[serde(default = "default_region")]
    region: String,
    #[serde(default)]
    ipfilter: Option<LinkRef>,
    #[serde(default)]
    ipfilter_drop: bool,
    #[serde(default)]
    geo_failover: bool,
    #[serde(default)]
    geoproximity: Option<LinkRef>,
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    notes: String,
}

fn default_mode() -> String {
    DEFAULT_RECORD_MODE.to_string()
}

fn default_region() -> String {
    DEFAULT_RECORD_REGION.to_string()
}

impl Resource for DnsRecord {
    const KIND: ResourceKind = ResourceKind::DnsRecord;
    const MANDATORY_FIELDS: &'static [&'static str] = &["type", "value"];

    fn fields() -> &'static [FieldSpec<Self>] {
        DNS_RECORD_FIELDS
    }

    fn identity(&self) -> String {
        format!(
            "{} {:?} ({}, {})",
            self.record_type,
            self.name,
            self.region,
            self.geoproximity.unwrap_or(0)
        )
    }

    fn remote_id(&self) -> i64 {
        self.id
    }

    fn has_linkage(&self) -> bool {
        self.geoproximity.is_some_and(|id| id != 0)
    }

    fn decode(raw: &Value, resolver: &mut ReferenceResolver<'_>) -> Result<Self, DecodeError> {
        let record: RawDnsRecord = decode_plain(Self::KIND, raw)?;
        let record_type = record.record_type.to_ascii_uppercase();
        let value = decode_value(&record_type, &record.mode, &record.value, resolver)?;

        let geoproximity = match record.geoproximity {
            None => None,
            Some(LinkRef::Id(id) | LinkRef::Object { id }) => Some(id),
            Some(LinkRef::Symbolic(reference)) => {
                Some(resolver.resolve(&reference, ReferenceTarget::GeoProximity)?)
            }
        };

        let ipfilter = match record.ipfilter {
            None => None,
            Some(LinkRef::Id(id) | LinkRef::Object { id }) => Some(id),
            Some(LinkRef::Symbolic(raw)) => Some(raw.trim().parse::<i64>().map_err(|_| {
                ReferenceError::Invalid {
                    raw: raw.clone(),
                    expected: "an integer or an {id, name} mapping",
                }
            })?),
        };

        Ok(Self {
            id: record.id,
            name: record.name,
            record_type,
            ttl: record.ttl,
            mode: record.mode,
            region: record.region,
            ipfilter,
            ipfilter_drop: record.ipfilter_drop,
            geo_failover: record.geo_failover,
            geoproximity,
            enabled: record.enabled,
            value,
            notes: record.notes,
        })
    }
}

/// DNS domain as listed by `GET domains`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DnsDomain {
    pub id: i64,
    pub name: String,
    pub note: String,
    pub status: String,
    pub geoip: bool,
    pub gtd: bool,
    pub nameservers: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl DnsDomain {
    /// Decode one item of the domain listing.
    ///
    /// # Errors
    ///
    /// Returns the serde error when the item does not describe a domain.
    pub fn decode(raw: &Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(strip_nulls(raw))
    }
}

/// Find a domain by name, ignoring case and a trailing dot.
#[must_use]
pub fn find_domain<'a>(domains: &'a [DnsDomain], name: &str) -> Option<&'a DnsDomain> {
    let wanted = name.trim_end_matches('.');
    domains
        .iter()
        .find(|domain| domain.name.trim_end_matches('.').eq_ignore_ascii_case(wanted))
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod mod_tests;
