// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Resource kinds and the capability trait shared by every reconcilable kind.
//!
//! The reconciler never inspects a resource through reflection. Instead each kind
//! declares a static field table: one [`FieldSpec`] per configuration key, carrying
//! the internal field identifier, an accessor returning the field as JSON, and
//! whether the remote service accepts changes to it. The diff engine and the
//! payload builder iterate that table.
//!
//! ## Kinds
//!
//! | Kind | Identity | Immutable | Depends on |
//! |------|----------|-----------|------------|
//! | [`ResourceKind::HttpCheck`] | name | host, ipVersion | - |
//! | [`ResourceKind::TcpCheck`] | name | host, ipVersion | - |
//! | [`ResourceKind::GeoProximity`] | name | - | - |
//! | [`ResourceKind::DnsRecord`] | type, name, region, geoproximity | type | checks, geoproximities |

use crate::errors::{DecodeError, UnknownKindError};
use crate::references::ReferenceResolver;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// The closed set of resource kinds mech reconciles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    /// Sonar HTTP health check
    HttpCheck,
    /// Sonar TCP health check
    TcpCheck,
    /// DNS geoproximity (geo-routing target)
    GeoProximity,
    /// DNS record inside a domain
    DnsRecord,
}

impl ResourceKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::HttpCheck,
        Self::TcpCheck,
        Self::GeoProximity,
        Self::DnsRecord,
    ];

    /// Stable machine-readable name, also accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HttpCheck => "http-check",
            Self::TcpCheck => "tcp-check",
            Self::GeoProximity => "geoproximity",
            Self::DnsRecord => "dns-record",
        }
    }

    /// Kinds whose records can be referenced by records of this kind.
    ///
    /// The remote service refuses to delete a referenced resource, so dependents
    /// are deleted first and created last.
    #[must_use]
    pub const fn dependencies(self) -> &'static [ResourceKind] {
        match self {
            Self::DnsRecord => &[Self::GeoProximity, Self::HttpCheck, Self::TcpCheck],
            Self::HttpCheck | Self::TcpCheck | Self::GeoProximity => &[],
        }
    }

    /// Length of the longest dependency chain starting at this kind.
    ///
    /// Kinds without dependencies have rank 0.
    #[must_use]
    pub fn dependency_rank(self) -> usize {
        self.dependencies()
            .iter()
            .map(|dependency| dependency.dependency_rank() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Whether records of this kind live inside a DNS domain.
    #[must_use]
    pub const fn is_domain_scoped(self) -> bool {
        matches!(self, Self::DnsRecord)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = UnknownKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http-check" | "http" => Ok(Self::HttpCheck),
            "tcp-check" | "tcp" => Ok(Self::TcpCheck),
            "geoproximity" | "geoproximities" => Ok(Self::GeoProximity),
            "dns-record" | "record" | "records" => Ok(Self::DnsRecord),
            _ => Err(UnknownKindError(s.to_string())),
        }
    }
}

/// Where a collection of resources lives on the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Scope {
    /// Account-wide collections (checks, geoproximities)
    Account,
    /// Records of one DNS domain
    Domain {
        /// Remote identifier of the domain
        id: i64,
        /// Domain name as written in the configuration
        name: String,
    },
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Account => f.write_str("account"),
            Self::Domain { name, .. } => f.write_str(name),
        }
    }
}

/// Whether the remote service accepts updates to a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutability {
    Mutable,
    /// Changing the field requires deleting and recreating the resource
    Immutable,
}

/// One entry of a kind's field table.
pub struct FieldSpec<R> {
    /// Configuration and JSON payload key (e.g. `ipVersion`)
    pub key: &'static str,
    /// Internal field identifier used in diffs (e.g. `ip_version`)
    pub id: &'static str,
    pub mutability: Mutability,
    /// Reads the field from a typed record
    pub read: fn(&R) -> Value,
}

impl<R> FieldSpec<R> {
    #[must_use]
    pub fn is_immutable(&self) -> bool {
        self.mutability == Mutability::Immutable
    }

    /// Read this field from `record`.
    #[must_use]
    pub fn value(&self, record: &R) -> Value {
        (self.read)(record)
    }
}

/// Builds a [`FieldSpec`] for a struct member.
///
/// ```text
/// field!(HttpCheck, "ipVersion" => ip_version, Immutable)
/// ```
macro_rules! field {
    ($ty:ty, $key:literal => $member:ident) => {
        $crate::resource::field!($ty, $key => $member, Mutable)
    };
    ($ty:ty, $key:literal => $member:ident, $mutability:ident) => {
        $crate::resource::FieldSpec {
            key: $key,
            id: stringify!($member),
            mutability: $crate::resource::Mutability::$mutability,
            read: |record: &$ty| {
                ::serde_json::to_value(&record.$member).unwrap_or(::serde_json::Value::Null)
            },
        }
    };
}

pub(crate) use field;

/// Capability set every reconcilable kind implements.
///
/// The reconciler is generic over this trait, so adding a kind means adding a
/// type, its field table and its decoder; the matching, diffing and ordering
/// logic stays untouched.
pub trait Resource: Serialize + Clone + fmt::Debug + Send + Sync + Sized + 'static {
    const KIND: ResourceKind;

    /// Configuration keys that must be present in every desired record.
    const MANDATORY_FIELDS: &'static [&'static str];

    /// The kind's field table, in diff order.
    fn fields() -> &'static [FieldSpec<Self>];

    /// Identity key used to match desired and observed records.
    fn identity(&self) -> String;

    /// Identifier assigned by the remote service (0 when not yet created).
    fn remote_id(&self) -> i64;

    /// Whether this record is bound to another resource through a non-default link.
    fn has_linkage(&self) -> bool {
        false
    }

    /// Decode a raw record (configuration entry or API response item).
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the record is malformed or holds a reference
    /// that cannot be resolved.
    fn decode(raw: &Value, resolver: &mut ReferenceResolver<'_>) -> Result<Self, DecodeError>;

    /// Look up a field table entry by configuration key.
    fn field(key: &str) -> Option<&'static FieldSpec<Self>> {
        Self::fields().iter().find(|spec| spec.key == key)
    }

    /// Configuration keys of immutable fields.
    fn immutable_keys() -> Vec<&'static str> {
        Self::fields()
            .iter()
            .filter(|spec| spec.is_immutable())
            .map(|spec| spec.key)
            .collect()
    }
}

/// Decode a raw record straight through serde.
///
/// # Errors
///
/// Returns [`DecodeError::Malformed`] when the JSON does not fit `T`.
pub(crate) fn decode_plain<T: DeserializeOwned>(
    kind: ResourceKind,
    raw: &Value,
) -> Result<T, DecodeError> {
    serde_json::from_value(strip_nulls(raw)).map_err(|source| DecodeError::Malformed { kind, source })
}

/// Drop top-level `null` members of an object.
///
/// The Constellix APIs send `null` for unset strings and lists, and every typed
/// field has a default.
#[must_use]
pub(crate) fn strip_nulls(raw: &Value) -> Value {
    match raw {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, value)| !value.is_null())
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Render a field value as text for diffs and reports.
///
/// Strings are shown without quotes, sequences as `[a, b]` and mappings as
/// `{key: value}`.
#[must_use]
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.clone(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(render_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(key, value)| format!("{key}: {}", render_value(value)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}
