// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Request payloads for create and update calls.
//!
//! A payload holds the fields written in configuration and nothing else, so
//! fields managed outside mech are left untouched by the remote service. Updates
//! additionally drop immutable fields: the APIs reject them even when unchanged.

use crate::errors::PayloadError;
use crate::resource::Resource;
use crate::tracker::DesiredRecord;
use serde_json::{Map, Value};

/// Serialize the defined fields of `desired`, minus `excluded` keys.
///
/// # Errors
///
/// Returns [`PayloadError`] when the resource does not serialize to a JSON object.
pub fn build_payload<R: Resource>(
    desired: &DesiredRecord<R>,
    excluded: &[&str],
) -> Result<Vec<u8>, PayloadError> {
    let value = serde_json::to_value(desired.resource()).map_err(|source| {
        PayloadError::Serialize {
            kind: R::KIND,
            identity: desired.identity(),
            source,
        }
    })?;

    let Value::Object(members) = value else {
        return Err(PayloadError::NotAnObject {
            kind: R::KIND,
            identity: desired.identity(),
        });
    };

    let payload: Map<String, Value> = members
        .into_iter()
        .filter(|(key, _)| desired.is_defined(key) && !excluded.contains(&key.as_str()))
        .collect();

    serde_json::to_vec(&payload).map_err(|source| PayloadError::Serialize {
        kind: R::KIND,
        identity: desired.identity(),
        source,
    })
}

/// Payload of a create call: every defined field.
///
/// # Errors
///
/// See [`build_payload`].
pub fn create_payload<R: Resource>(desired: &DesiredRecord<R>) -> Result<Vec<u8>, PayloadError> {
    build_payload(desired, &[])
}

/// Payload of an update call: every defined field except immutable ones.
///
/// # Errors
///
/// See [`build_payload`].
pub fn update_payload<R: Resource>(desired: &DesiredRecord<R>) -> Result<Vec<u8>, PayloadError> {
    build_payload(desired, &R::immutable_keys())
}
