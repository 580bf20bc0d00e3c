// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Constellix Sonar health checks.
//!
//! Both check kinds are identified by name. `host` and `ipVersion` cannot be
//! changed once a check exists; they are compared but never sent on update.

use crate::errors::DecodeError;
use crate::references::ReferenceResolver;
use crate::resource::{decode_plain, field, FieldSpec, Resource, ResourceKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Sonar HTTP check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HttpCheck {
    pub id: i64,
    pub name: String,
    pub host: String,
    pub ip_version: String,
    pub port: i64,
    pub protocol_type: String,
    pub interval: String,
    pub check_sites: Vec<i64>,
    pub run_traceroute: String,
    pub fqdn: String,
    pub path: String,
    pub search_string: String,
    pub connection_timeout: i64,
    pub expected_status_code: i64,
    pub user_agent: String,
    pub note: String,
    pub schedule_interval: String,
    pub ssl_policy: String,
    pub user_id: i64,
    pub monitor_interval_policy: String,
    pub notification_groups: Vec<i64>,
    pub schedule_id: i64,
    pub notification_report_timeout: i64,
    pub verification_policy: String,
}

static HTTP_CHECK_FIELDS: &[FieldSpec<HttpCheck>] = &[
    field!(HttpCheck, "name" => name),
    field!(HttpCheck, "host" => host, Immutable),
    field!(HttpCheck, "ipVersion" => ip_version, Immutable),
    field!(HttpCheck, "port" => port),
    field!(HttpCheck, "protocolType" => protocol_type),
    field!(HttpCheck, "interval" => interval),
    field!(HttpCheck, "checkSites" => check_sites),
    field!(HttpCheck, "runTraceroute" => run_traceroute),
    field!(HttpCheck, "fqdn" => fqdn),
    field!(HttpCheck, "path" => path),
    field!(HttpCheck, "searchString" => search_string),
    field!(HttpCheck, "connectionTimeout" => connection_timeout),
    field!(HttpCheck, "expectedStatusCode" => expected_status_code),
    field!(HttpCheck, "userAgent" => user_agent),
    field!(HttpCheck, "note" => note),
    field!(HttpCheck, "scheduleInterval" => schedule_interval),
    field!(HttpCheck, "sslPolicy" => ssl_policy),
    field!(HttpCheck, "userId" => user_id),
    field!(HttpCheck, "monitorIntervalPolicy" => monitor_interval_policy),
    field!(HttpCheck, "notificationGroups" => notification_groups),
    field!(HttpCheck, "scheduleId" => schedule_id),
    field!(HttpCheck, "notificationReportTimeout" => notification_report_timeout),
    field!(HttpCheck, "verificationPolicy" => verification_policy),
];

impl Resource for HttpCheck {
    const KIND: ResourceKind = ResourceKind::HttpCheck;
    const MANDATORY_FIELDS: &'static [&'static str] = &["name", "host", "port", "protocolType"];

    fn fields() -> &'static [FieldSpec<Self>] {
        HTTP_CHECK_FIELDS
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

/// Sonar TCP check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TcpCheck {
    pub id: i64,
    pub name: String,
    pub host: String,
    pub ip_version: String,
    pub port: i64,
    pub interval: String,
    pub check_sites: Vec<i64>,
    pub run_traceroute: String,
    pub string_to_send: String,
    pub string_to_receive: String,
    pub note: String,
    pub user_id: i64,
    pub monitor_interval_policy: String,
    pub notification_groups: Vec<i64>,
    pub schedule_id: i64,
    pub notification_report_timeout: i64,
    pub verification_policy: String,
}

static TCP_CHECK_FIELDS: &[FieldSpec<TcpCheck>] = &[
    field!(TcpCheck, "name" => name),
    field!(TcpCheck, "host" => host, Immutable),
    field!(TcpCheck, "ipVersion" => ip_version, Immutable),
    field!(TcpCheck, "port" => port),
    field!(TcpCheck, "interval" => interval),
    field!(TcpCheck, "checkSites" => check_sites),
    field!(TcpCheck, "runTraceroute" => run_traceroute),
    field!(TcpCheck, "stringToSend" => string_to_send),
    field!(TcpCheck, "stringToReceive" => string_to_receive),
    field!(TcpCheck, "note" => note),
    field!(TcpCheck, "userId" => user_id),
    field!(TcpCheck, "monitorIntervalPolicy" => monitor_interval_policy),
    field!(TcpCheck, "notificationGroups" => notification_groups),
    field!(TcpCheck, "scheduleId" => schedule_id),
    field!(TcpCheck, "notificationReportTimeout" => notification_report_timeout),
    field!(TcpCheck, "verificationPolicy" => verification_policy),
];

impl Resource for TcpCheck {
    const KIND: ResourceKind = ResourceKind::TcpCheck;
    const MANDATORY_FIELDS: &'static [&'static str] = &["name", "host", "port"];

    fn fields() -> &'static [FieldSpec<Self>] {
        TCP_CHECK_FIELDS
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

/// Runtime state reported by Sonar for a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuntimeStatus {
    Up,
    Down,
    /// Any state Sonar reports besides UP and DOWN (e.g. `N/A` for paused checks)
    #[serde(other)]
    Unknown,
}

impl fmt::Display for RuntimeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Up => "UP",
            Self::Down => "DOWN",
            Self::Unknown => "UNKNOWN",
        })
    }
}

/// Body of `GET {http|tcp}/{id}/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub status: RuntimeStatus,
}

#[cfg(test)]
#[path = "sonar_tests.rs"]
mod sonar_tests;
