// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Pagination helpers for DNS v4 list operations.
//!
//! DNS v4 collections are wrapped in an envelope:
//!
//! ```json
//! {"data": [...], "meta": {"links": {"next": "https://.../records?page=2"}}}
//! ```
//!
//! The last page has no `next` link (absent or `null`). Sonar collections are
//! plain arrays and are not paged.

use crate::errors::ApiError;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

/// One page of a DNS v4 collection.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub data: Vec<Value>,
    #[serde(default)]
    pub meta: PageMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub links: PageLinks,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PageLinks {
    #[serde(default)]
    pub next: Option<String>,
}

impl Page {
    /// Parse a response body fetched from `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidResponse`] when the body is not a page envelope.
    pub fn parse(body: &str, url: &Url) -> Result<Self, ApiError> {
        serde_json::from_str(body).map_err(|e| ApiError::InvalidResponse {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// URL of the following page, resolved against the current one.
    ///
    /// Returns `None` on the last page, including when the service links a page
    /// to itself.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] when the link cannot be parsed.
    pub fn next_url(&self, current: &Url) -> Result<Option<Url>, ApiError> {
        let Some(next) = self.meta.links.next.as_deref().filter(|link| !link.is_empty()) else {
            return Ok(None);
        };

        let next = current.join(next).map_err(|e| ApiError::InvalidUrl {
            url: next.to_string(),
            reason: e.to_string(),
        })?;

        Ok((next != *current).then_some(next))
    }
}
