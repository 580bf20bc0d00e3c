// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! HTTP client for the Constellix DNS v4 and Sonar APIs.
//!
//! # Endpoints
//!
//! | Kind | Collection | Item |
//! |------|------------|------|
//! | `http-check` | `{sonar}/http` | `{sonar}/http/{id}` |
//! | `tcp-check` | `{sonar}/tcp` | `{sonar}/tcp/{id}` |
//! | `geoproximity` | `{dns}/geoproximities` | `{dns}/geoproximities/{id}` |
//! | `dns-record` | `{dns}/domains/{domain}/records` | `{dns}/domains/{domain}/records/{id}` |
//!
//! Sonar collections are plain JSON arrays. DNS v4 collections are paged, see
//! [`pagination`]. Every request is signed with a fresh security token
//! ([`auth`]) and transient failures are retried ([`retry`]).

pub mod auth;
pub mod pagination;
pub mod retry;

use crate::constants::{
    DNS_API_BASE_URL, DNS_DOMAINS_PATH, DNS_GEOPROXIMITIES_PATH, DNS_RECORDS_PATH,
    HTTP_REQUEST_TIMEOUT_SECS, SECURITY_TOKEN_HEADER, SONAR_API_BASE_URL, SONAR_HTTP_PATH,
    SONAR_STATUS_PATH, SONAR_TCP_PATH, USER_AGENT,
};
use crate::dns::DnsDomain;
use crate::errors::ApiError;
use crate::remote::RemoteApi;
use crate::resource::{ResourceKind, Scope};
use crate::sonar::{RuntimeStatus, StatusResponse};
use async_trait::async_trait;
use auth::Credentials;
use pagination::Page;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client as HttpClient, Method};
use retry::{http_backoff, retry_http_call_when, ExponentialBackoff};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Settings of a [`ConstellixClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub dns_base_url: String,
    pub sonar_base_url: String,
    pub credentials: Credentials,
    /// Timeout of a single request
    pub timeout: Duration,
    /// Retry schedule for transient failures
    pub backoff: ExponentialBackoff,
}

impl ClientConfig {
    /// Production endpoints with the default timeout and retry schedule.
    #[must_use]
    pub fn new(credentials: Credentials) -> Self {
        Self {
            dns_base_url: DNS_API_BASE_URL.to_string(),
            sonar_base_url: SONAR_API_BASE_URL.to_string(),
            credentials,
            timeout: Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS),
            backoff: http_backoff(),
        }
    }

    #[must_use]
    pub fn with_dns_base_url(mut self, url: impl Into<String>) -> Self {
        self.dns_base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_sonar_base_url(mut self, url: impl Into<String>) -> Self {
        self.sonar_base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: ExponentialBackoff) -> Self {
        self.backoff = backoff;
        self
    }
}

/// [`RemoteApi`] over HTTP.
#[derive(Debug, Clone)]
pub struct ConstellixClient {
    http: HttpClient,
    dns_base: Url,
    sonar_base: Url,
    credentials: Credentials,
    backoff: ExponentialBackoff,
}

impl ConstellixClient {
    /// Build a client from its settings.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] when a base URL does not parse and
    /// [`ApiError::Client`] when the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = HttpClient::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::Client {
                reason: e.to_string(),
            })?;

        Ok(Self {
            http,
            dns_base: parse_base(&config.dns_base_url)?,
            sonar_base: parse_base(&config.sonar_base_url)?,
            credentials: config.credentials,
            backoff: config.backoff,
        })
    }

    /// Collection URL of a kind, or item URL when `id` is given.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::MissingDomainScope`] when a DNS record is addressed
    /// without a domain.
    pub fn endpoint(
        &self,
        kind: ResourceKind,
        scope: &Scope,
        id: Option<i64>,
        operation: &'static str,
    ) -> Result<Url, ApiError> {
        let mut segments: Vec<String> = match kind {
            ResourceKind::HttpCheck => vec![SONAR_HTTP_PATH.to_string()],
            ResourceKind::TcpCheck => vec![SONAR_TCP_PATH.to_string()],
            ResourceKind::GeoProximity => vec![DNS_GEOPROXIMITIES_PATH.to_string()],
            ResourceKind::DnsRecord => {
                let Scope::Domain { id: domain, .. } = scope else {
                    return Err(ApiError::MissingDomainScope { kind, operation });
                };
                vec![
                    DNS_DOMAINS_PATH.to_string(),
                    domain.to_string(),
                    DNS_RECORDS_PATH.to_string(),
                ]
            }
        };
        if let Some(id) = id {
            segments.push(id.to_string());
        }

        let base = match kind {
            ResourceKind::HttpCheck | ResourceKind::TcpCheck => &self.sonar_base,
            ResourceKind::GeoProximity | ResourceKind::DnsRecord => &self.dns_base,
        };
        join_segments(base, &segments)
    }

    /// Send a request, retrying transient failures, and return the response body.
    ///
    /// A POST that failed in flight or with a server error may already have
    /// created the resource, so creations are only re-sent after rate limiting.
    async fn send(&self, method: Method, url: &Url, body: Option<&[u8]>) -> Result<String, ApiError> {
        let operation = format!("{method} {url}");
        let retryable: fn(&ApiError) -> bool = if method == Method::POST {
            ApiError::is_rate_limited
        } else {
            ApiError::is_transient
        };
        retry_http_call_when(
            self.backoff.clone(),
            move || self.send_once(method.clone(), url, body),
            &operation,
            retryable,
        )
        .await
    }

    async fn send_once(
        &self,
        method: Method,
        url: &Url,
        body: Option<&[u8]>,
    ) -> Result<String, ApiError> {
        debug!(method = %method, url = %url, body_bytes = body.map_or(0, <[u8]>::len), "HTTP API request to Constellix");

        let token = self.credentials.token()?;
        let mut request = self
            .http
            .request(method.clone(), url.clone())
            .header(SECURITY_TOKEN_HEADER, token)
            .header(ACCEPT, "application/json");
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_vec());
        }

        let response = request.send().await.map_err(|e| ApiError::Connection {
            method: method.to_string(),
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| ApiError::Connection {
            method: method.to_string(),
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(ApiError::UnexpectedStatus {
                method: method.to_string(),
                url: url.to_string(),
                status: status.as_u16(),
                body: text,
            });
        }

        debug!(method = %method, url = %url, status = status.as_u16(), "HTTP API response from Constellix");
        Ok(text)
    }

    async fn get_json(&self, url: &Url) -> Result<Value, ApiError> {
        let body = self.send(Method::GET, url, None).await?;
        parse_json(&body, url)
    }

    /// Follow `next` links from `first` and concatenate every page.
    async fn get_paged(&self, first: Url) -> Result<Vec<Value>, ApiError> {
        let mut items = Vec::new();
        let mut next = Some(first);
        let mut page_count = 0;

        while let Some(url) = next {
            page_count += 1;
            let body = self.send(Method::GET, &url, None).await?;
            let page = Page::parse(&body, &url)?;
            next = page.next_url(&url)?;

            let item_count = page.data.len();
            items.extend(page.data);

            debug!(
                page = page_count,
                items_in_page = item_count,
                total_items = items.len(),
                "Fetched page from Constellix API"
            );
        }

        Ok(items)
    }
}

#[async_trait]
impl RemoteApi for ConstellixClient {
    async fn fetch_collection(
        &self,
        kind: ResourceKind,
        scope: &Scope,
    ) -> Result<Vec<Value>, ApiError> {
        let url = self.endpoint(kind, scope, None, "list")?;
        let items = match kind {
            ResourceKind::HttpCheck | ResourceKind::TcpCheck => match self.get_json(&url).await? {
                Value::Array(items) => items,
                other => {
                    return Err(ApiError::InvalidResponse {
                        url: url.to_string(),
                        reason: format!("expected a JSON array, got {other}"),
                    })
                }
            },
            ResourceKind::GeoProximity | ResourceKind::DnsRecord => self.get_paged(url).await?,
        };
        debug!(%kind, %scope, count = items.len(), "Fetched collection");
        Ok(items)
    }

    async fn create(
        &self,
        kind: ResourceKind,
        scope: &Scope,
        payload: &[u8],
    ) -> Result<(), ApiError> {
        let url = self.endpoint(kind, scope, None, "create")?;
        info!(%kind, %scope, "Creating resource");
        self.send(Method::POST, &url, Some(payload)).await?;
        Ok(())
    }

    async fn update(
        &self,
        kind: ResourceKind,
        scope: &Scope,
        id: i64,
        payload: &[u8],
    ) -> Result<(), ApiError> {
        let url = self.endpoint(kind, scope, Some(id), "update")?;
        info!(%kind, %scope, id, "Updating resource");
        self.send(Method::PUT, &url, Some(payload)).await?;
        Ok(())
    }

    async fn delete(&self, kind: ResourceKind, scope: &Scope, id: i64) -> Result<(), ApiError> {
        let url = self.endpoint(kind, scope, Some(id), "delete")?;
        info!(%kind, %scope, id, "Deleting resource");
        self.send(Method::DELETE, &url, None).await?;
        Ok(())
    }

    async fn fetch_status(&self, kind: ResourceKind, id: i64) -> Result<RuntimeStatus, ApiError> {
        if !matches!(kind, ResourceKind::HttpCheck | ResourceKind::TcpCheck) {
            return Err(ApiError::Unsupported {
                kind,
                operation: "status",
            });
        }
        let item = self.endpoint(kind, &Scope::Account, Some(id), "status")?;
        let url = join_segments(&item, &[SONAR_STATUS_PATH.to_string()])?;

        let body = self.send(Method::GET, &url, None).await?;
        let response: StatusResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::InvalidResponse {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        Ok(response.status)
    }

    async fn fetch_domains(&self) -> Result<Vec<DnsDomain>, ApiError> {
        let url = join_segments(&self.dns_base, &[DNS_DOMAINS_PATH.to_string()])?;
        self.get_paged(url.clone())
            .await?
            .iter()
            .map(|raw| {
                DnsDomain::decode(raw).map_err(|e| ApiError::InvalidResponse {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            })
            .collect()
    }
}

fn parse_base(raw: &str) -> Result<Url, ApiError> {
    let url = Url::parse(raw).map_err(|e| ApiError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ApiError::InvalidUrl {
            url: raw.to_string(),
            reason: "not a base URL".to_string(),
        });
    }
    Ok(url)
}

/// Append path segments to `base`, keeping its existing path.
fn join_segments(base: &Url, segments: &[String]) -> Result<Url, ApiError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| ApiError::InvalidUrl {
            url: base.to_string(),
            reason: "not a base URL".to_string(),
        })?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn parse_json(body: &str, url: &Url) -> Result<Value, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::InvalidResponse {
        url: url.to_string(),
        reason: e.to_string(),
    })
}
