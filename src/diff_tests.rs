// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `diff.rs`

#[cfg(test)]
mod tests {
    use crate::diff::{compare, Action, FieldDiff};
    use crate::sonar::HttpCheck;
    use crate::tracker::{DesiredRecord, ObservedRecord};

    fn check(name: &str, host: &str, port: i64) -> HttpCheck {
        HttpCheck {
            name: name.to_string(),
            host: host.to_string(),
            port,
            ..HttpCheck::default()
        }
    }

    #[test]
    fn test_create_lists_defined_fields() {
        let desired = DesiredRecord::from_keys(check("prod", "", 80), ["name", "port"]);

        let comparison = compare(&desired, None).unwrap();

        assert_eq!(comparison.action, Action::Create);
        assert_eq!(
            comparison.diffs,
            vec![
                FieldDiff {
                    field: "name",
                    old_value: String::new(),
                    new_value: "prod".to_string()
                },
                FieldDiff {
                    field: "port",
                    old_value: String::new(),
                    new_value: "80".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_equal_records_are_unchanged() {
        let desired = DesiredRecord::from_keys(check("prod", "1.2.3.4", 80), ["name", "host", "port"]);
        let observed = ObservedRecord::new(HttpCheck {
            id: 7,
            ..check("prod", "1.2.3.4", 80)
        });

        let comparison = compare(&desired, Some(&observed)).unwrap();

        assert_eq!(comparison.action, Action::NoChange);
        assert!(comparison.diffs.is_empty());
    }

    #[test]
    fn test_changed_field_is_an_update() {
        let desired = DesiredRecord::from_keys(check("prod", "", 80), ["name", "port"]);
        let observed = ObservedRecord::new(check("prod", "", 443));

        let comparison = compare(&desired, Some(&observed)).unwrap();

        assert_eq!(comparison.action, Action::Update);
        assert_eq!(comparison.diffs.len(), 1);
        assert_eq!(comparison.diffs[0].to_string(), "port: 443 -> 80");
    }

    #[test]
    fn test_undefined_fields_never_diff() {
        let desired = DesiredRecord::from_keys(check("prod", "10.0.0.1", 1), ["name"]);
        let observed = ObservedRecord::new(HttpCheck {
            note: "managed elsewhere".to_string(),
            ..check("prod", "192.168.0.1", 443)
        });

        let comparison = compare(&desired, Some(&observed)).unwrap();

        assert_eq!(comparison.action, Action::NoChange);
        assert!(comparison.diffs.is_empty());
    }

    #[test]
    fn test_sequences_are_order_sensitive() {
        let mut wanted = check("prod", "", 80);
        wanted.check_sites = vec![1, 2];
        let mut current = check("prod", "", 80);
        current.check_sites = vec![2, 1];

        let desired = DesiredRecord::from_keys(wanted, ["name", "checkSites"]);
        let observed = ObservedRecord::new(current);

        let comparison = compare(&desired, Some(&observed)).unwrap();

        assert_eq!(comparison.action, Action::Update);
        assert_eq!(comparison.diffs[0].field, "check_sites");
        assert_eq!(comparison.diffs[0].old_value, "[2, 1]");
        assert_eq!(comparison.diffs[0].new_value, "[1, 2]");
    }

    #[test]
    fn test_immutable_change_is_a_conflict() {
        let desired = DesiredRecord::from_keys(check("prod", "1.2.3.5", 80), ["name", "host", "port"]);
        let observed = ObservedRecord::new(check("prod", "1.2.3.4", 443));

        let conflict = compare(&desired, Some(&observed)).unwrap_err();

        assert_eq!(conflict.field, "host");
        assert_eq!(conflict.observed, "1.2.3.4");
        assert_eq!(conflict.desired, "1.2.3.5");
        assert_eq!(
            conflict.to_string(),
            "found change in immutable field host: 1.2.3.4 -> 1.2.3.5"
        );
    }

    #[test]
    fn test_conflict_wins_over_earlier_updates() {
        let mut wanted = check("prod", "", 80);
        wanted.ip_version = "IPV6".to_string();
        let mut current = check("prod", "", 443);
        current.ip_version = "IPV4".to_string();

        // port differs as well, but ipVersion comes first in the field table
        let desired = DesiredRecord::from_keys(wanted, ["port", "ipVersion"]);
        let observed = ObservedRecord::new(current);

        let conflict = compare(&desired, Some(&observed)).unwrap_err();
        assert_eq!(conflict.field, "ip_version");
    }

    #[test]
    fn test_undefined_immutable_field_is_ignored() {
        let desired = DesiredRecord::from_keys(check("prod", "1.2.3.5", 80), ["name", "port"]);
        let observed = ObservedRecord::new(check("prod", "1.2.3.4", 80));

        let comparison = compare(&desired, Some(&observed)).unwrap();
        assert_eq!(comparison.action, Action::NoChange);
    }
}
