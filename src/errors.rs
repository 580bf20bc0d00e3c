// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for mech.
//!
//! This module provides specialized error types for:
//! - Loading the configuration file and the resource files it names
//! - Decoding configuration entries and API responses into typed resources
//! - Resolving symbolic references (`@sonar,http:<name>`, `@geoproximity:<name>`)
//! - Building request payloads
//! - Calls against the Constellix DNS and Sonar APIs
//! - Reconciliation runs (immutable conflicts, deletion gating, failed remote calls)
//!
//! Every error carries the record identity, field name or phase it relates to so
//! the operator can act on it without re-running with debug logging.

use crate::client::retry::is_retryable_http_status;
use crate::reconciler::{Phase, Report};
use crate::resource::ResourceKind;
use reqwest::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// A resource kind name that does not match any known kind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "unknown resource kind {0:?}, expected one of http-check, tcp-check, geoproximity, dns-record"
)]
pub struct UnknownKindError(pub String);

/// Errors resolving a symbolic reference to a remote identifier.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    /// The value is neither a number nor a well-formed reference of the accepted kinds
    #[error("invalid reference {raw:?}, expected {expected}")]
    Invalid {
        /// The raw value as written
        raw: String,
        /// Human readable description of the accepted forms
        expected: &'static str,
    },

    /// No observed resource of the referenced kind carries that name
    #[error("unable to find {kind} {name:?} referenced by {raw:?}")]
    NotFound {
        /// Kind the reference points to
        kind: ResourceKind,
        /// Name looked up in the observed collection
        name: String,
        /// The raw reference string
        raw: String,
    },
}

/// Errors loading the main configuration file and the resource files it names.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unable to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid file pattern {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    #[error("unable to expand file pattern {pattern:?}: {source}")]
    Expand {
        pattern: String,
        #[source]
        source: glob::GlobError,
    },

    /// Every pattern must match at least one file
    #[error("file pattern {pattern:?} does not match any file")]
    NoMatch { pattern: String },

    /// A resource file must hold a sequence of records
    #[error("{} must hold a sequence of records, got {found}", path.display())]
    NotASequence { path: PathBuf, found: &'static str },
}

/// Errors turning a raw record into a typed resource.
///
/// Fatal to the record being decoded. Callers decide whether to keep going
/// with the remaining records.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// A configuration entry is not a key/value mapping
    #[error("{kind} entry must be a mapping, got {found}")]
    NotAMapping {
        kind: ResourceKind,
        /// Type of the value found instead
        found: &'static str,
    },

    /// The DNS record type and mode do not form a supported value shape
    #[error("unsupported mode {mode:?} for {record_type} record")]
    UnsupportedCombination {
        /// Record type (A, AAAA, CNAME, ...)
        record_type: String,
        /// Record mode (standard, failover, ...)
        mode: String,
    },

    /// The value of a DNS record does not have the shape its mode requires
    #[error("value of {record_type} record in {mode} mode must be {expected}")]
    UnexpectedShape {
        record_type: String,
        mode: String,
        /// Description of the expected shape
        expected: &'static str,
    },

    /// The entry does not fit the kind's schema
    #[error("malformed {kind} entry: {source}")]
    Malformed {
        kind: ResourceKind,
        #[source]
        source: serde_json::Error,
    },

    /// A mandatory field is missing from a desired record
    #[error("{identity}: mandatory field {field:?} is not defined")]
    MissingMandatoryField {
        kind: ResourceKind,
        /// Identity key of the offending record
        identity: String,
        /// Configuration key of the missing field
        field: &'static str,
    },

    /// A symbolic reference could not be resolved
    #[error(transparent)]
    Reference(#[from] ReferenceError),
}

/// Errors building the JSON payload sent to the remote service.
#[derive(Error, Debug)]
pub enum PayloadError {
    #[error("unable to serialize {kind} {identity}: {source}")]
    Serialize {
        kind: ResourceKind,
        identity: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{kind} {identity} does not serialize to a JSON object")]
    NotAnObject { kind: ResourceKind, identity: String },
}

/// Errors talking to the Constellix APIs.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The API answered with a non-2xx status
    ///
    /// The response body is attached as returned by the service.
    #[error("{method} {url} returned HTTP {status}: {body}")]
    UnexpectedStatus {
        method: String,
        url: String,
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The request never produced a response (DNS, TLS, timeout, reset)
    #[error("{method} {url} failed: {reason}")]
    Connection {
        method: String,
        url: String,
        reason: String,
    },

    /// The response body is not the JSON the endpoint documents
    #[error("unable to parse response of {url}: {reason}")]
    InvalidResponse { url: String, reason: String },

    /// A base URL or pagination link could not be parsed
    #[error("invalid API endpoint {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// A domain-scoped kind was addressed without a domain
    #[error("{operation} of {kind} requires a domain scope")]
    MissingDomainScope {
        kind: ResourceKind,
        operation: &'static str,
    },

    /// The endpoint does not exist for this kind
    #[error("{operation} is not supported for {kind}")]
    Unsupported {
        kind: ResourceKind,
        operation: &'static str,
    },

    /// The security token could not be computed
    #[error("unable to compute security token: {reason}")]
    Authentication { reason: String },

    /// The HTTP client could not be built
    #[error("unable to build HTTP client: {reason}")]
    Client { reason: String },
}

impl ApiError {
    /// Returns true if the request may succeed when sent again.
    ///
    /// Rate limiting (429), gateway and server errors and connection failures are
    /// transient. Client errors and malformed responses are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::UnexpectedStatus { status, .. } => {
                StatusCode::from_u16(*status).is_ok_and(is_retryable_http_status)
            }
            Self::Connection { .. } => true,
            Self::InvalidResponse { .. }
            | Self::InvalidUrl { .. }
            | Self::MissingDomainScope { .. }
            | Self::Unsupported { .. }
            | Self::Authentication { .. }
            | Self::Client { .. } => false,
        }
    }

    /// Returns true when the service rejected the request for rate limiting (429).
    ///
    /// The request was not processed, so even a non-idempotent call can be sent again.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(StatusCode::TOO_MANY_REQUESTS.as_u16())
    }

    /// HTTP status of the response, when one was received.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A desired record changes a field the remote service does not allow to change.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("found change in immutable field {field}: {observed} -> {desired}")]
pub struct ImmutableFieldConflict {
    /// Internal field identifier
    pub field: &'static str,
    /// Value held by the remote service, as text
    pub observed: String,
    /// Value declared in configuration, as text
    pub desired: String,
}

/// Errors aborting a reconciliation run.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Fatal to the whole run; nothing is applied
    ///
    /// The report holds the rows classified before the conflict plus the
    /// conflict row itself.
    #[error("{kind} {identity}: {conflict}")]
    ImmutableFieldConflict {
        kind: ResourceKind,
        identity: String,
        conflict: ImmutableFieldConflict,
        report: Box<Report>,
    },

    /// Deletions are planned but were not allowed; raised before any remote call
    #[error("deletion requires explicit confirmation: {count} resource(s) would be deleted")]
    DeletionNotAllowed {
        /// Number of planned deletions
        count: usize,
    },

    /// A remote call failed; the run stopped at this step
    #[error(
        "{phase} of {kind} {identity} failed after {completed} successful {phase} call(s): {source}"
    )]
    RemoteCall {
        phase: Phase,
        kind: ResourceKind,
        identity: String,
        /// Calls of the same phase that succeeded before this one
        completed: usize,
        #[source]
        source: ApiError,
    },

    #[error(transparent)]
    Payload(#[from] PayloadError),
}

/// Composite error type returned by helpers that fetch and decode in one step.
#[derive(Error, Debug)]
pub enum MechError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

impl MechError {
    /// Returns true if retrying the whole operation may succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Api(err) => err.is_transient(),
            Self::Reconcile(ReconcileError::RemoteCall { source, .. }) => source.is_transient(),
            Self::Decode(_) | Self::Reconcile(_) => false,
        }
    }
}
