// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

// Common test utilities for integration tests

#![allow(dead_code)]

use mech::client::auth::Credentials;
use mech::client::retry::ExponentialBackoff;
use mech::client::{ClientConfig, ConstellixClient};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Client pointed at the mock server, retrying almost immediately.
pub fn client(server: &MockServer) -> ConstellixClient {
    let config = ClientConfig::new(Credentials::new("test-key", "test-secret"))
        .with_dns_base_url(format!("{}/v4", server.uri()))
        .with_sonar_base_url(format!("{}/rest/api", server.uri()))
        .with_backoff(ExponentialBackoff::new(
            Duration::from_millis(1),
            Duration::from_millis(5),
            Some(Duration::from_secs(2)),
            2.0,
            0.0,
        ));
    ConstellixClient::new(config).expect("client configuration is valid")
}

/// Single page of a DNS v4 collection.
pub fn page(items: Value) -> Value {
    json!({"data": items, "meta": {"links": {"next": null}}})
}

/// Serve a Sonar collection as a plain array.
pub async fn mount_sonar(server: &MockServer, collection: &str, items: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/rest/api/{collection}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(items))
        .mount(server)
        .await;
}

/// Serve a DNS v4 collection as one page.
pub async fn mount_dns(server: &MockServer, collection: &str, items: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/v4/{collection}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(page(items)))
        .mount(server)
        .await;
}

/// Write `contents` under `dir`, creating parent directories.
pub fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directory");
    }
    fs::write(path, contents).expect("write test file");
}

/// Methods and paths of every request the server received that is not a GET.
pub async fn mutations(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.method.as_str() != "GET")
        .map(|request| format!("{} {}", request.method, request.url.path()))
        .collect()
}
