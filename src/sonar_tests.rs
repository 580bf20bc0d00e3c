// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `sonar.rs`

#[cfg(test)]
mod tests {
    use crate::references::{ObservedCatalog, ReferenceCache, ReferenceResolver};
    use crate::resource::{Mutability, Resource, ResourceKind};
    use crate::sonar::{HttpCheck, RuntimeStatus, StatusResponse, TcpCheck};
    use serde_json::json;

    #[test]
    fn test_decode_http_check_from_api() {
        let raw = json!({
            "id": 84874,
            "name": "web",
            "host": "example.com",
            "ipVersion": "IPV4",
            "port": 443,
            "protocolType": "HTTPS",
            "interval": "ONEMINUTE",
            "checkSites": [1, 2],
            "fqdn": "example.com",
            "path": "/health",
            "searchString": null,
            "expectedStatusCode": 200,
            "note": null,
            "notificationGroups": [],
            "status": "UP"
        });
        let catalog = ObservedCatalog::new();
        let mut cache = ReferenceCache::new();
        let mut resolver = ReferenceResolver::new(&mut cache, &catalog);

        let check = HttpCheck::decode(&raw, &mut resolver).unwrap();

        assert_eq!(check.remote_id(), 84874);
        assert_eq!(check.identity(), "web");
        assert_eq!(check.check_sites, vec![1, 2]);
        assert_eq!(check.search_string, "");
        assert_eq!(check.expected_status_code, 200);
    }

    #[test]
    fn test_http_check_field_table() {
        let immutable = HttpCheck::immutable_keys();
        assert_eq!(immutable, vec!["host", "ipVersion"]);

        let spec = HttpCheck::field("ipVersion").unwrap();
        assert_eq!(spec.id, "ip_version");
        assert_eq!(spec.mutability, Mutability::Immutable);

        let check = HttpCheck {
            port: 8080,
            ..HttpCheck::default()
        };
        assert_eq!(HttpCheck::field("port").unwrap().value(&check), json!(8080));
        assert!(HttpCheck::field("id").is_none(), "id is never managed");
        assert!(HttpCheck::field("status").is_none());
    }

    #[test]
    fn test_tcp_check_field_table() {
        assert_eq!(TcpCheck::KIND, ResourceKind::TcpCheck);
        assert_eq!(TcpCheck::immutable_keys(), vec!["host", "ipVersion"]);
        assert_eq!(TcpCheck::MANDATORY_FIELDS, &["name", "host", "port"]);
        assert!(TcpCheck::field("protocolType").is_none());
        assert!(TcpCheck::field("stringToSend").is_some());
    }

    #[test]
    fn test_serialized_keys_match_field_table() {
        let value = serde_json::to_value(HttpCheck::default()).unwrap();
        let object = value.as_object().unwrap();

        for spec in HttpCheck::fields() {
            assert!(
                object.contains_key(spec.key),
                "{} must serialize under its configuration key",
                spec.key
            );
        }
    }

    #[test]
    fn test_runtime_status() {
        let up: StatusResponse = serde_json::from_value(json!({"status": "UP"})).unwrap();
        assert_eq!(up.status, RuntimeStatus::Up);

        let down: StatusResponse = serde_json::from_value(json!({"status": "DOWN"})).unwrap();
        assert_eq!(down.status.to_string(), "DOWN");

        let paused: StatusResponse = serde_json::from_value(json!({"status": "N/A"})).unwrap();
        assert_eq!(paused.status, RuntimeStatus::Unknown);
    }
}
