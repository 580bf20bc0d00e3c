// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Constellix security token.
//!
//! Every request carries `x-cns-security-token: <apiKey>:<hmac>:<millis>`, where
//! `hmac` is the base64 HMAC-SHA1 of the current epoch milliseconds keyed with
//! the secret key. Tokens are short-lived, so one is computed per request.

use crate::errors::ApiError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;
use std::fmt;

type HmacSha1 = Hmac<Sha1>;

/// API credentials of a Constellix account.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    secret_key: String,
}

impl Credentials {
    #[must_use]
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
        }
    }

    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Token for a request sent now.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Authentication`] when the HMAC cannot be keyed.
    pub fn token(&self) -> Result<String, ApiError> {
        self.token_at(chrono::Utc::now().timestamp_millis())
    }

    /// Token for a request sent at `millis` since the Unix epoch.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Authentication`] when the HMAC cannot be keyed.
    pub fn token_at(&self, millis: i64) -> Result<String, ApiError> {
        let timestamp = millis.to_string();
        let mut mac = HmacSha1::new_from_slice(self.secret_key.as_bytes()).map_err(|e| {
            ApiError::Authentication {
                reason: e.to_string(),
            }
        })?;
        mac.update(timestamp.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        Ok(format!("{}:{signature}:{timestamp}", self.api_key))
    }
}

// Keep the secret out of debug logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}
