// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Desired and observed records.
//!
//! A [`DesiredRecord`] remembers which configuration keys were written for it.
//! That set is taken from the raw mapping, never from the typed value: a key
//! written with its zero value (`port: 0`, `enabled: false`) is still managed by
//! the operator, while a key left out is controlled elsewhere and never diffed
//! or sent.

use crate::errors::DecodeError;
use crate::references::ReferenceResolver;
use crate::resource::{FieldSpec, Resource};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Anything that can be matched by identity key.
pub trait Identified {
    fn identity(&self) -> String;
}

/// Resource as declared in configuration.
#[derive(Debug, Clone)]
pub struct DesiredRecord<R> {
    resource: R,
    /// config key -> internal field identifier
    defined: BTreeMap<String, &'static str>,
}

impl<R: Resource> DesiredRecord<R> {
    /// Decode a configuration entry.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the entry is not a mapping, does not fit the
    /// kind's schema or holds an unresolvable reference.
    pub fn decode(raw: &Value, resolver: &mut ReferenceResolver<'_>) -> Result<Self, DecodeError> {
        let mapping = raw.as_object().ok_or_else(|| DecodeError::NotAMapping {
            kind: R::KIND,
            found: json_type_name(raw),
        })?;
        let resource = R::decode(raw, resolver).map_err(|err| match err {
            DecodeError::UnsupportedCombination { .. } | DecodeError::UnexpectedShape { .. } => {
                missing_mandatory::<R>(mapping).unwrap_or(err)
            }
            other => other,
        })?;
        Ok(Self::from_keys(resource, mapping.keys().map(String::as_str)))
    }

    /// Decode a configuration entry straight from YAML.
    ///
    /// # Errors
    ///
    /// See [`DesiredRecord::decode`].
    pub fn from_yaml(
        raw: &serde_yaml::Value,
        resolver: &mut ReferenceResolver<'_>,
    ) -> Result<Self, DecodeError> {
        let json = serde_json::to_value(raw).map_err(|source| DecodeError::Malformed {
            kind: R::KIND,
            source,
        })?;
        Self::decode(&json, resolver)
    }

    /// Wrap a typed resource, treating `keys` as the keys written in configuration.
    ///
    /// Keys absent from the kind's field table are ignored.
    pub fn from_keys<'k>(resource: R, keys: impl IntoIterator<Item = &'k str>) -> Self {
        let defined = keys
            .into_iter()
            .filter_map(|key| R::field(key).map(|spec| (key.to_string(), spec.id)))
            .collect();
        Self { resource, defined }
    }

    #[must_use]
    pub fn resource(&self) -> &R {
        &self.resource
    }

    #[must_use]
    pub fn identity(&self) -> String {
        self.resource.identity()
    }

    #[must_use]
    pub fn is_defined(&self, key: &str) -> bool {
        self.defined.contains_key(key)
    }

    /// Defined configuration keys, sorted.
    pub fn defined_keys(&self) -> impl Iterator<Item = &str> {
        self.defined.keys().map(String::as_str)
    }

    /// Field table entries of the defined fields, in table order.
    pub fn defined_fields(&self) -> impl Iterator<Item = &'static FieldSpec<R>> + '_ {
        R::fields()
            .iter()
            .filter(move |spec| self.defined.contains_key(spec.key))
    }

    /// Defined keys the remote service does not allow to change.
    #[must_use]
    pub fn immutable_fields(&self) -> Vec<&'static str> {
        self.defined_fields()
            .filter(|spec| spec.is_immutable())
            .map(|spec| spec.key)
            .collect()
    }

    /// Check every mandatory field of the kind is defined.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MissingMandatoryField`] for the first missing field.
    pub fn validate(&self) -> Result<(), DecodeError> {
        match R::MANDATORY_FIELDS
            .iter()
            .copied()
            .find(|field| !self.is_defined(field))
        {
            Some(field) => Err(DecodeError::MissingMandatoryField {
                kind: R::KIND,
                identity: self.identity(),
                field,
            }),
            None => Ok(()),
        }
    }
}

/// First mandatory key absent from a raw entry whose value shape could not be
/// decoded. A DNS value cannot be read without its record type.
fn missing_mandatory<R: Resource>(mapping: &Map<String, Value>) -> Option<DecodeError> {
    let field = R::MANDATORY_FIELDS
        .iter()
        .copied()
        .find(|field| !mapping.contains_key(*field))?;
    let identity = mapping
        .get("name")
        .and_then(Value::as_str)
        .map_or_else(|| "<unnamed>".to_string(), |name| format!("{name:?}"));
    Some(DecodeError::MissingMandatoryField {
        kind: R::KIND,
        identity,
        field,
    })
}

impl<R: Resource> Identified for DesiredRecord<R> {
    fn identity(&self) -> String {
        self.resource.identity()
    }
}

/// Resource as currently held by the remote service.
#[derive(Debug, Clone)]
pub struct ObservedRecord<R> {
    resource: R,
}

impl<R: Resource> ObservedRecord<R> {
    #[must_use]
    pub fn new(resource: R) -> Self {
        Self { resource }
    }

    /// Decode one item of an API response.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] when the item does not fit the kind's schema.
    pub fn decode(raw: &Value, resolver: &mut ReferenceResolver<'_>) -> Result<Self, DecodeError> {
        R::decode(raw, resolver).map(Self::new)
    }

    #[must_use]
    pub fn resource(&self) -> &R {
        &self.resource
    }

    #[must_use]
    pub fn into_resource(self) -> R {
        self.resource
    }

    #[must_use]
    pub fn identity(&self) -> String {
        self.resource.identity()
    }

    #[must_use]
    pub fn remote_id(&self) -> i64 {
        self.resource.remote_id()
    }
}

impl<R: Resource> Identified for ObservedRecord<R> {
    fn identity(&self) -> String {
        self.resource.identity()
    }
}

/// Decode every item of an API response.
///
/// # Errors
///
/// Returns the first [`DecodeError`] encountered.
pub fn decode_observed<R: Resource>(
    raw: &[Value],
    resolver: &mut ReferenceResolver<'_>,
) -> Result<Vec<ObservedRecord<R>>, DecodeError> {
    raw.iter()
        .map(|item| ObservedRecord::decode(item, resolver))
        .collect()
}

/// Pair each record of `left` with a record of `right` sharing its identity key.
///
/// Records are paired in order and each record of `right` is paired at most
/// once, so duplicated identities pair up one to one. The result holds, for
/// every record of `left`, the index of its partner in `right`.
pub fn pair_by_identity<A, B>(left: &[A], right: &[B]) -> Vec<Option<usize>>
where
    A: Identified,
    B: Identified,
{
    let identities: Vec<String> = right.iter().map(Identified::identity).collect();
    let mut taken = vec![false; right.len()];

    left.iter()
        .map(|record| {
            let identity = record.identity();
            let index = (0..identities.len()).find(|&i| !taken[i] && identities[i] == identity)?;
            taken[index] = true;
            Some(index)
        })
        .collect()
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tracker_tests;
