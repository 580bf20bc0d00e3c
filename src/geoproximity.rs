// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS geoproximity definitions.
//!
//! A geoproximity is a named point DNS records can be bound to. `country`,
//! `region` and `city` are optional and only help Constellix fill in the
//! coordinates.

use crate::errors::DecodeError;
use crate::references::ReferenceResolver;
use crate::resource::{decode_plain, field, FieldSpec, Resource, ResourceKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoProximity {
    pub id: i64,
    pub name: String,
    pub country: String,
    pub region: String,
    pub city: i64,
    pub longitude: f64,
    pub latitude: f64,
}

static GEOPROXIMITY_FIELDS: &[FieldSpec<GeoProximity>] = &[
    field!(GeoProximity, "name" => name),
    field!(GeoProximity, "country" => country),
    field!(GeoProximity, "region" => region),
    field!(GeoProximity, "city" => city),
    field!(GeoProximity, "longitude" => longitude),
    field!(GeoProximity, "latitude" => latitude),
];

impl Resource for GeoProximity {
    const KIND: ResourceKind = ResourceKind::GeoProximity;
    const MANDATORY_FIELDS: &'static [&'static str] = &["name", "longitude", "latitude"];

    fn fields() -> &'static [FieldSpec<Self>] {
        GEOPROXIMITY_FIELDS
    }

    fn identity(&self) -> String {
        self.name.clone()
    }

    fn remote_id(&self) -> i64 {
        self.id
    }

    fn decode(raw: &Value, _resolver: &mut ReferenceResolver<'_>) -> Result<Self, DecodeError> {
        decode_plain(Self::KIND, raw)
    }
}
