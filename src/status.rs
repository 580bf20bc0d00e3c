// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Runtime status of Sonar health checks.

use crate::constants::STATUS_POLL_CONCURRENCY;
use crate::errors::{ApiError, MechError};
use crate::references::{ObservedCatalog, ReferenceCache, ReferenceResolver};
use crate::remote::{fetch_observed, RemoteApi};
use crate::resource::{Resource, ResourceKind, Scope};
use crate::sonar::{HttpCheck, RuntimeStatus, TcpCheck};
use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

/// Status of one check. A failed status call is kept as its error message so
/// one unreachable check does not hide the others.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckStatus {
    pub kind: ResourceKind,
    pub id: i64,
    pub name: String,
    pub status: Result<RuntimeStatus, String>,
}

/// Poll the status of every check of `kinds`, a few calls at a time.
///
/// Results follow collection order.
///
/// # Errors
///
/// Returns [`MechError`] when a check collection cannot be fetched, or when a
/// kind other than a health check is requested.
pub async fn poll_statuses(
    api: &dyn RemoteApi,
    kinds: &[ResourceKind],
) -> Result<Vec<CheckStatus>, MechError> {
    let mut checks: Vec<(ResourceKind, i64, String)> = Vec::new();
    for kind in kinds {
        match kind {
            ResourceKind::HttpCheck => checks.extend(list_checks::<HttpCheck>(api).await?),
            ResourceKind::TcpCheck => checks.extend(list_checks::<TcpCheck>(api).await?),
            ResourceKind::GeoProximity | ResourceKind::DnsRecord => {
                return Err(ApiError::Unsupported {
                    kind: *kind,
                    operation: "status",
                }
                .into())
            }
        }
    }
    debug!(checks = checks.len(), "Polling check statuses");

    let statuses: Vec<CheckStatus> = stream::iter(checks)
        .map(|(kind, id, name)| async move {
            let status = api.fetch_status(kind, id).await.map_err(|e| {
                warn!(%kind, id, name = %name, error = %e, "Unable to fetch check status");
                e.to_string()
            });
            CheckStatus {
                kind,
                id,
                name,
                status,
            }
        })
        .buffered(STATUS_POLL_CONCURRENCY)
        .collect()
        .await;

    Ok(statuses)
}

async fn list_checks<R: Resource>(
    api: &dyn RemoteApi,
) -> Result<Vec<(ResourceKind, i64, String)>, MechError> {
    let catalog = ObservedCatalog::new();
    let mut cache = ReferenceCache::new();
    let mut resolver = ReferenceResolver::new(&mut cache, &catalog);

    let observed = fetch_observed::<R>(api, &Scope::Account, &mut resolver).await?;
    Ok(observed
        .iter()
        .map(|record| (R::KIND, record.remote_id(), record.identity()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::DnsDomain;
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct SonarStub;

    #[async_trait]
    impl RemoteApi for SonarStub {
        async fn fetch_collection(
            &self,
            kind: ResourceKind,
            _scope: &Scope,
        ) -> Result<Vec<Value>, ApiError> {
            Ok(match kind {
                ResourceKind::HttpCheck => vec![
                    json!({"id": 1, "name": "web"}),
                    json!({"id": 2, "name": "api"}),
                ],
                ResourceKind::TcpCheck => vec![json!({"id": 3, "name": "smtp"})],
                _ => Vec::new(),
            })
        }

        async fn create(&self, _: ResourceKind, _: &Scope, _: &[u8]) -> Result<(), ApiError> {
            unreachable!()
        }

        async fn update(
            &self,
            _: ResourceKind,
            _: &Scope,
            _: i64,
            _: &[u8],
        ) -> Result<(), ApiError> {
            unreachable!()
        }

        async fn delete(&self, _: ResourceKind, _: &Scope, _: i64) -> Result<(), ApiError> {
            unreachable!()
        }

        async fn fetch_status(&self, kind: ResourceKind, id: i64) -> Result<RuntimeStatus, ApiError> {
            match id {
                1 => Ok(RuntimeStatus::Up),
                2 => Err(ApiError::UnexpectedStatus {
                    method: "GET".to_string(),
                    url: format!("https://api.test/{kind}/2/status"),
                    status: 404,
                    body: "not found".to_string(),
                }),
                _ => Ok(RuntimeStatus::Down),
            }
        }

        async fn fetch_domains(&self) -> Result<Vec<DnsDomain>, ApiError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_poll_statuses_keeps_order_and_errors() {
        let statuses = poll_statuses(&SonarStub, &[ResourceKind::HttpCheck, ResourceKind::TcpCheck])
            .await
            .unwrap();

        let names: Vec<&str> = statuses.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["web", "api", "smtp"]);
        assert_eq!(statuses[0].status, Ok(RuntimeStatus::Up));
        assert!(statuses[1].status.as_ref().unwrap_err().contains("404"));
        assert_eq!(statuses[2].kind, ResourceKind::TcpCheck);
        assert_eq!(statuses[2].status, Ok(RuntimeStatus::Down));
    }

    #[tokio::test]
    async fn test_status_of_non_check_kind_is_rejected() {
        let err = poll_statuses(&SonarStub, &[ResourceKind::GeoProximity])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MechError::Api(ApiError::Unsupported {
                kind: ResourceKind::GeoProximity,
                ..
            })
        ));
    }
}
