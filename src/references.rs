// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Symbolic reference resolution.
//!
//! DNS records point at other resources by remote identifier. Writing those
//! identifiers by hand is error prone, so configuration may use symbolic
//! references instead:
//!
//! - `@sonar,http:<name>` / `@sonar,tcp:<name>` for the health check of a failover value
//! - `@geoproximity:<name>` for the geoproximity a record is bound to
//!
//! A [`ReferenceResolver`] turns them into identifiers by name lookup in a
//! [`ReferenceCatalog`] (normally the observed collections of the referenced kinds)
//! and remembers every answer in a [`ReferenceCache`] that lives for one run.

use crate::constants::{GEOPROXIMITY_REFERENCE_PREFIX, SONAR_REFERENCE_PREFIX};
use crate::errors::ReferenceError;
use crate::resource::{Resource, ResourceKind};
use crate::tracker::ObservedRecord;
use std::collections::HashMap;
use tracing::{debug, trace};

/// A parsed `@...` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolicReference {
    /// Kind of the referenced resource
    pub kind: ResourceKind,
    /// Name of the referenced resource
    pub name: String,
}

impl SymbolicReference {
    /// Parse a reference string, returning `None` when it is not one.
    ///
    /// Check names are taken verbatim; geoproximity names lose surrounding
    /// whitespace.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        if let Some(rest) = raw.strip_prefix(SONAR_REFERENCE_PREFIX) {
            let (check_type, name) = rest.split_once(':')?;
            let kind = match check_type {
                "http" => ResourceKind::HttpCheck,
                "tcp" => ResourceKind::TcpCheck,
                _ => return None,
            };
            if name.contains(':') {
                return None;
            }
            return Self::named(kind, name);
        }

        raw.trim_start()
            .strip_prefix(GEOPROXIMITY_REFERENCE_PREFIX)
            .and_then(|name| Self::named(ResourceKind::GeoProximity, name.trim()))
    }

    fn named(kind: ResourceKind, name: &str) -> Option<Self> {
        if name.is_empty() {
            return None;
        }
        Some(Self {
            kind,
            name: name.to_string(),
        })
    }
}

/// Which kinds a reference position accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceTarget {
    /// `sonarCheckId` of a failover value item
    HealthCheck,
    /// Record-level `geoproximity`
    GeoProximity,
}

impl ReferenceTarget {
    #[must_use]
    pub fn accepts(self, kind: ResourceKind) -> bool {
        match self {
            Self::HealthCheck => matches!(kind, ResourceKind::HttpCheck | ResourceKind::TcpCheck),
            Self::GeoProximity => kind == ResourceKind::GeoProximity,
        }
    }

    /// Accepted forms, used in error messages.
    #[must_use]
    pub fn expected(self) -> &'static str {
        match self {
            Self::HealthCheck => "@sonar,<http|tcp>:<check name> or an integer",
            Self::GeoProximity => "@geoproximity:<name> or an integer",
        }
    }
}

/// Resolved references of one run, keyed by the raw reference string.
///
/// Entries are only ever added. Create a new cache per run.
#[derive(Debug, Default, Clone)]
pub struct ReferenceCache {
    resolved: HashMap<String, i64>,
}

impl ReferenceCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, raw: &str) -> Option<i64> {
        self.resolved.get(raw).copied()
    }

    pub fn insert(&mut self, raw: impl Into<String>, id: i64) {
        self.resolved.entry(raw.into()).or_insert(id);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resolved.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resolved.is_empty()
    }
}

/// Source of name to identifier lookups.
pub trait ReferenceCatalog {
    /// Remote identifier of the `kind` resource called `name`.
    fn lookup(&self, kind: ResourceKind, name: &str) -> Option<i64>;
}

/// Catalog built from observed collections.
#[derive(Debug, Default, Clone)]
pub struct ObservedCatalog {
    ids: HashMap<(ResourceKind, String), i64>,
}

impl ObservedCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one entry. The first identifier registered for a name wins.
    pub fn insert(&mut self, kind: ResourceKind, name: impl Into<String>, id: i64) {
        self.ids.entry((kind, name.into())).or_insert(id);
    }

    /// Register every record of an observed collection under its identity key.
    pub fn register<R: Resource>(&mut self, observed: &[ObservedRecord<R>]) {
        for record in observed {
            self.insert(R::KIND, record.identity(), record.remote_id());
        }
        debug!(kind = %R::KIND, count = observed.len(), "Registered reference targets");
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl ReferenceCatalog for ObservedCatalog {
    fn lookup(&self, kind: ResourceKind, name: &str) -> Option<i64> {
        self.ids.get(&(kind, name.to_string())).copied()
    }
}

/// Resolves reference values while decoding one run's records.
pub struct ReferenceResolver<'a> {
    cache: &'a mut ReferenceCache,
    catalog: &'a dyn ReferenceCatalog,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(cache: &'a mut ReferenceCache, catalog: &'a dyn ReferenceCatalog) -> Self {
        Self { cache, catalog }
    }

    /// Resolve a string value found at a `target` position.
    ///
    /// Plain integers written as strings pass through unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`ReferenceError::Invalid`] when `raw` is not a reference accepted
    /// at this position, and [`ReferenceError::NotFound`] when the catalog has no
    /// resource with that name.
    pub fn resolve(&mut self, raw: &str, target: ReferenceTarget) -> Result<i64, ReferenceError> {
        if let Ok(id) = raw.trim().parse::<i64>() {
            return Ok(id);
        }

        let reference = SymbolicReference::parse(raw)
            .filter(|reference| target.accepts(reference.kind))
            .ok_or_else(|| ReferenceError::Invalid {
                raw: raw.to_string(),
                expected: target.expected(),
            })?;

        if let Some(id) = self.cache.get(raw) {
            trace!(reference = raw, id, "Reference cache hit");
            return Ok(id);
        }

        let id = self
            .catalog
            .lookup(reference.kind, &reference.name)
            .ok_or_else(|| ReferenceError::NotFound {
                kind: reference.kind,
                name: reference.name.clone(),
                raw: raw.to_string(),
            })?;

        debug!(reference = raw, kind = %reference.kind, id, "Resolved symbolic reference");
        self.cache.insert(raw, id);
        Ok(id)
    }
}

#[cfg(test)]
#[path = "references_tests.rs"]
mod references_tests;
