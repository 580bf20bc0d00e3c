// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for DNS records and domains.

#[cfg(test)]
mod tests {
    use crate::dns::{find_domain, DnsDomain, DnsRecord, DnsValue, StandardItem};
    use crate::errors::{DecodeError, ReferenceError};
    use crate::references::{ObservedCatalog, ReferenceCache, ReferenceResolver};
    use crate::resource::{Resource, ResourceKind};
    use crate::tracker::DesiredRecord;
    use serde_json::json;

    fn catalog() -> ObservedCatalog {
        let mut catalog = ObservedCatalog::new();
        catalog.insert(ResourceKind::GeoProximity, "test", 1);
        catalog
    }

    #[test]
    fn test_decode_api_record() {
        let raw = json!({
            "id": 31847357, "name": "abc", "type": "A", "ttl": 600, "mode": "standard",
            "region": "default", "ipfilter": null, "ipfilterDrop": false, "geoFailover": false,
            "geoproximity": null, "enabled": true,
            "value": [{"value": "1.1.1.1", "enabled": true}],
            "lastValues": {"standard": [{"value": "8.8.8.8", "enabled": true}]},
            "notes": "", "skipLookup": null,
            "domain": {"id": 1004580, "name": "example.com"}
        });
        let catalog = catalog();
        let mut cache = ReferenceCache::new();
        let mut resolver = ReferenceResolver::new(&mut cache, &catalog);

        let record = DnsRecord::decode(&raw, &mut resolver).unwrap();

        assert_eq!(record.id, 31847357);
        assert_eq!(record.remote_id(), 31847357);
        assert_eq!(record.ttl, 600);
        assert_eq!(record.geoproximity, None);
        assert_eq!(
            record.value,
            DnsValue::Standard(vec![StandardItem {
                address: "1.1.1.1".to_string(),
                enabled: true
            }])
        );
        assert_eq!(record.identity(), "A \"abc\" (default, 0)");
        assert!(!record.has_linkage());
    }

    #[test]
    fn test_linked_objects_decode_to_ids() {
        let raw = json!({
            "id": 1, "name": "www", "type": "A", "mode": "standard", "region": "europe",
            "ipfilter": {"id": 1, "name": "World (Default)"},
            "geoproximity": {"id": 1234, "name": "amsterdam"},
            "value": []
        });
        let catalog = catalog();
        let mut cache = ReferenceCache::new();
        let mut resolver = ReferenceResolver::new(&mut cache, &catalog);

        let record = DnsRecord::decode(&raw, &mut resolver).unwrap();

        assert_eq!(record.ipfilter, Some(1));
        assert_eq!(record.geoproximity, Some(1234));
        assert_eq!(record.identity(), "A \"www\" (europe, 1234)");
        assert!(record.has_linkage());

        let payload = serde_json::to_value(&record).unwrap();
        assert_eq!(payload["ipfilter"], json!(1));
        assert_eq!(payload["geoproximity"], json!(1234));
    }

    #[test]
    fn test_desired_record_resolves_geoproximity_reference() {
        let yaml: serde_yaml::Value = serde_yaml::from_str(
            r#"
name: www
type: a
geoproximity: "@geoproximity: test "
value:
  - value: 10.0.0.1
    enabled: true
"#,
        )
        .unwrap();
        let catalog = catalog();
        let mut cache = ReferenceCache::new();
        let mut resolver = ReferenceResolver::new(&mut cache, &catalog);

        let desired = DesiredRecord::<DnsRecord>::from_yaml(&yaml, &mut resolver).unwrap();

        let record = desired.resource();
        assert_eq!(record.record_type, "A", "types are normalized to upper case");
        assert_eq!(record.mode, "standard");
        assert_eq!(record.region, "default");
        assert_eq!(record.geoproximity, Some(1));
        assert_eq!(desired.identity(), "A \"www\" (default, 1)");
        assert!(desired.is_defined("geoproximity"));
        assert!(!desired.is_defined("region"));
        assert_eq!(desired.immutable_fields(), vec!["type"]);
        assert!(desired.validate().is_ok());
    }

    #[test]
    fn test_unknown_geoproximity_fails() {
        let raw = json!({"name": "www", "type": "A", "geoproximity": "@geoproximity:mars", "value": []});
        let catalog = catalog();
        let mut cache = ReferenceCache::new();
        let mut resolver = ReferenceResolver::new(&mut cache, &catalog);

        let err = DnsRecord::decode(&raw, &mut resolver).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Reference(ReferenceError::NotFound {
                kind: ResourceKind::GeoProximity,
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_geoproximity_value() {
        let raw = json!({"name": "www", "type": "A", "geoproximity": "amsterdam", "value": []});
        let catalog = catalog();
        let mut cache = ReferenceCache::new();
        let mut resolver = ReferenceResolver::new(&mut cache, &catalog);

        let err = DnsRecord::decode(&raw, &mut resolver).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid reference \"amsterdam\", expected @geoproximity:<name> or an integer"
        );
    }

    #[test]
    fn test_missing_value_fails_validation() {
        let record = DnsRecord {
            name: "www".to_string(),
            record_type: "A".to_string(),
            region: "default".to_string(),
            ..DnsRecord::default()
        };
        let desired = DesiredRecord::from_keys(record, ["name", "type"]);

        let err = desired.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "A \"www\" (default, 0): mandatory field \"value\" is not defined"
        );
    }

    #[test]
    fn test_missing_type_is_reported_as_mandatory() {
        let raw = json!({"name": "www", "value": [{"value": "1.1.1.1", "enabled": true}]});
        let catalog = catalog();
        let mut cache = ReferenceCache::new();
        let mut resolver = ReferenceResolver::new(&mut cache, &catalog);

        let err = DesiredRecord::<DnsRecord>::decode(&raw, &mut resolver).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MissingMandatoryField {
                kind: ResourceKind::DnsRecord,
                field: "type",
                ..
            }
        ));
        assert_eq!(err.to_string(), "\"www\": mandatory field \"type\" is not defined");
    }

    #[test]
    fn test_find_domain() {
        let domains = vec![
            DnsDomain {
                id: 1,
                name: "example.com".to_string(),
                ..DnsDomain::default()
            },
            DnsDomain {
                id: 2,
                name: "example.org".to_string(),
                ..DnsDomain::default()
            },
        ];

        assert_eq!(find_domain(&domains, "Example.ORG.").map(|d| d.id), Some(2));
        assert!(find_domain(&domains, "example.net").is_none());
    }

    #[test]
    fn test_decode_domain_with_nulls() {
        let domain = DnsDomain::decode(&json!({
            "id": 1004580, "name": "example.com", "note": null, "status": "ACTIVE",
            "geoip": false, "gtd": false, "nameservers": ["ns11.constellix.com"],
            "tags": [], "createdAt": "2022-12-28T15:13:57+00:00"
        }))
        .unwrap();

        assert_eq!(domain.id, 1004580);
        assert_eq!(domain.note, "");
        assert_eq!(domain.nameservers, vec!["ns11.constellix.com".to_string()]);
    }
}
