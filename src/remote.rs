// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Contract between the reconciler and the remote service.
//!
//! [`crate::client::ConstellixClient`] implements it over HTTP. Tests use
//! in-memory implementations.

use crate::dns::DnsDomain;
use crate::errors::{ApiError, MechError};
use crate::references::ReferenceResolver;
use crate::resource::{Resource, ResourceKind, Scope};
use crate::sonar::RuntimeStatus;
use crate::tracker::{decode_observed, ObservedRecord};
use async_trait::async_trait;
use serde_json::Value;

/// Operations the reconciler needs from the remote service.
///
/// Collections are returned fully assembled, all pages included. Payloads are
/// already filtered JSON documents. Any non-2xx response is an error carrying
/// the response body.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// Every raw record of a collection.
    async fn fetch_collection(&self, kind: ResourceKind, scope: &Scope)
        -> Result<Vec<Value>, ApiError>;

    async fn create(&self, kind: ResourceKind, scope: &Scope, payload: &[u8])
        -> Result<(), ApiError>;

    async fn update(
        &self,
        kind: ResourceKind,
        scope: &Scope,
        id: i64,
        payload: &[u8],
    ) -> Result<(), ApiError>;

    async fn delete(&self, kind: ResourceKind, scope: &Scope, id: i64) -> Result<(), ApiError>;

    /// Runtime status of a health check.
    async fn fetch_status(&self, kind: ResourceKind, id: i64) -> Result<RuntimeStatus, ApiError>;

    /// Every DNS domain of the account.
    async fn fetch_domains(&self) -> Result<Vec<DnsDomain>, ApiError>;
}

/// Fetch a collection and decode it into observed records.
///
/// # Errors
///
/// Returns [`MechError::Api`] when the fetch fails and [`MechError::Decode`] when
/// an item does not fit the kind's schema.
pub async fn fetch_observed<R: Resource>(
    api: &dyn RemoteApi,
    scope: &Scope,
    resolver: &mut ReferenceResolver<'_>,
) -> Result<Vec<ObservedRecord<R>>, MechError> {
    let raw = api.fetch_collection(R::KIND, scope).await?;
    Ok(decode_observed(&raw, resolver)?)
}
