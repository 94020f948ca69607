use sha2::{Digest, Sha256};

/// Compute a stable SHA-256 fingerprint for a verdict.
///
/// Identity fields:
/// - rule_id
/// - resource_id (lower-cased; Azure ids are case-insensitive)
///
/// Each field is length-prefixed so no two (rule, resource) pairs share an encoding.
pub fn fingerprint_for_verdict(rule_id: &str, resource_id: &str) -> String {
    let resource_id = resource_id.to_ascii_lowercase();

    let mut hasher = Sha256::new();
    for field in [rule_id, resource_id.as_str()] {
        hasher.update((field.len() as u64).to_be_bytes());
        hasher.update(field.as_bytes());
    }
    let digest = hasher.finalize();
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_ignores_resource_id_case() {
        assert_eq!(
            fingerprint_for_verdict("no-public-storage", "/subscriptions/A/sa1"),
            fingerprint_for_verdict("no-public-storage", "/SUBSCRIPTIONS/a/SA1"),
        );
    }

    #[test]
    fn fingerprint_distinguishes_rules() {
        assert_ne!(
            fingerprint_for_verdict("rule-a", "sa1"),
            fingerprint_for_verdict("rule-b", "sa1"),
        );
        assert_eq!(fingerprint_for_verdict("rule-a", "sa1").len(), 64);
    }

    #[test]
    fn fingerprint_fields_cannot_bleed_into_each_other() {
        assert_ne!(
            fingerprint_for_verdict("a|b", "c"),
            fingerprint_for_verdict("a", "b|c"),
        );
        assert_ne!(
            fingerprint_for_verdict("ab", "c"),
            fingerprint_for_verdict("a", "bc"),
        );
    }
}
