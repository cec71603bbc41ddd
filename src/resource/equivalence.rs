//! Equivalence between a desired payload and the payload Vault returns
//!
//! Comparison is structural. Redacted keys are removed from both sides
//! first, because Vault never echoes them. A key that is absent and a key
//! that is present with an empty value are not the same.

use crate::vault::Payload;

/// Which keys take part in a comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Every key on both sides must match
    Exact,
    /// Every desired key must match; extra observed keys are ignored
    DesiredKeys,
    /// Only the listed keys are compared, and only those the desired payload sets
    Keys(&'static [&'static str]),
}

/// Remove redacted keys
#[must_use]
pub fn redact(payload: &Payload, redacted: &[&str]) -> Payload {
    payload
        .iter()
        .filter(|(key, _)| !redacted.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[must_use]
pub fn is_equivalent(
    desired: &Payload,
    observed: &Payload,
    redacted: &[&str],
    comparison: Comparison,
) -> bool {
    let desired = redact(desired, redacted);
    let observed = redact(observed, redacted);
    match comparison {
        Comparison::Exact => desired == observed,
        Comparison::DesiredKeys => desired
            .iter()
            .all(|(key, value)| observed.get(key) == Some(value)),
        Comparison::Keys(keys) => keys
            .iter()
            .filter_map(|key| desired.get(*key).map(|value| (*key, value)))
            .all(|(key, value)| observed.get(key) == Some(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn payload(value: Value) -> Payload {
        match value {
            Value::Object(map) => map,
            _ => Payload::new(),
        }
    }

    #[test]
    fn test_exact_requires_identical_keys() {
        let desired = payload(json!({"policy": "path \"*\" {}"}));
        let observed = payload(json!({"policy": "path \"*\" {}", "name": "admin"}));
        assert!(!is_equivalent(&desired, &observed, &[], Comparison::Exact));
        assert!(is_equivalent(&desired, &desired, &[], Comparison::Exact));
    }

    #[test]
    fn test_redacted_keys_ignored_on_both_sides() {
        let desired = payload(json!({"username": "admin", "password": "s3cret"}));
        let observed = payload(json!({"username": "admin"}));
        assert!(is_equivalent(&desired, &observed, &["password"], Comparison::Exact));
        assert!(!is_equivalent(&desired, &observed, &[], Comparison::Exact));
    }

    #[test]
    fn test_desired_keys_ignores_extra_observed() {
        let desired = payload(json!({"url": "ldaps://ldap", "starttls": false}));
        let observed = payload(json!({"url": "ldaps://ldap", "starttls": false, "token_ttl": 0}));
        assert!(is_equivalent(&desired, &observed, &[], Comparison::DesiredKeys));

        let drifted = payload(json!({"url": "ldaps://other", "starttls": false}));
        assert!(!is_equivalent(&desired, &drifted, &[], Comparison::DesiredKeys));
    }

    #[test]
    fn test_absent_and_empty_are_distinct() {
        let desired = payload(json!({"description": ""}));
        let observed = payload(json!({}));
        assert!(!is_equivalent(&desired, &observed, &[], Comparison::DesiredKeys));
        assert!(!is_equivalent(
            &desired,
            &observed,
            &[],
            Comparison::Keys(&["description"])
        ));
    }

    #[test]
    fn test_keys_compares_only_listed_subset() {
        const TUNABLE: &[&str] = &["default_lease_ttl", "max_lease_ttl"];
        let desired = payload(json!({"default_lease_ttl": 3600, "type": "kv"}));
        let observed = payload(json!({"default_lease_ttl": 3600, "max_lease_ttl": 0}));
        assert!(is_equivalent(&desired, &observed, &[], Comparison::Keys(TUNABLE)));

        let drifted = payload(json!({"default_lease_ttl": 60}));
        assert!(!is_equivalent(&desired, &drifted, &[], Comparison::Keys(TUNABLE)));
    }

    #[test]
    fn test_nested_values_compared_structurally() {
        let desired = payload(json!({"options": {"version": "2"}}));
        let same = payload(json!({"options": {"version": "2"}}));
        let other = payload(json!({"options": {"version": "1"}}));
        assert!(is_equivalent(&desired, &same, &[], Comparison::Exact));
        assert!(!is_equivalent(&desired, &other, &[], Comparison::Exact));
    }
}
