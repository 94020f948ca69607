//! The `list-rules` use case.

use guardrails_domain::catalog::{Rule, RuleCatalog};
use guardrails_domain::model::ResourceKind;
use guardrails_types::Severity;
use serde::Serialize;

#[derive(Clone, Debug, Default)]
pub struct ListRulesFilter {
    /// Resource kind slug or ARM type.
    pub kind: Option<String>,
    /// Service category, case-insensitive.
    pub service: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RuleSummary {
    pub id: String,
    pub title: String,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
    pub applies_to: Vec<String>,
    pub fail_closed: bool,
}

impl From<&Rule> for RuleSummary {
    fn from(rule: &Rule) -> Self {
        RuleSummary {
            id: rule.id.clone(),
            title: rule.title.clone(),
            severity: rule.severity,
            service: rule.service.clone(),
            applies_to: rule.applies_to.iter().map(|k| k.to_string()).collect(),
            fail_closed: rule.fail_closed,
        }
    }
}

/// Catalog rules matching the filter, in declaration order.
pub fn run_list_rules(catalog: &RuleCatalog, filter: &ListRulesFilter) -> Vec<RuleSummary> {
    let kind = filter.kind.as_deref().map(ResourceKind::parse);
    let service = filter.service.as_deref().map(str::trim);

    catalog
        .rules()
        .iter()
        .filter(|r| kind.as_ref().is_none_or(|k| r.applies_to_kind(k)))
        .filter(|r| {
            service.is_none_or(|s| {
                r.service
                    .as_deref()
                    .is_some_and(|rs| rs.eq_ignore_ascii_case(s))
            })
        })
        .map(RuleSummary::from)
        .collect()
}

/// One line per rule: `id  severity  kinds  title`.
pub fn format_rules_text(rules: &[RuleSummary]) -> String {
    let width = rules.iter().map(|r| r.id.len()).max().unwrap_or(0);
    let mut out = String::new();
    for r in rules {
        out.push_str(&format!(
            "{:<width$}  {:<8}  {}  {}\n",
            r.id,
            r.severity.as_str(),
            r.applies_to.join(","),
            r.title,
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> RuleCatalog {
        guardrails_sources::builtin_catalog().expect("builtin catalog")
    }

    #[test]
    fn unfiltered_lists_every_rule_in_order() {
        let catalog = baseline();
        let all = run_list_rules(&catalog, &ListRulesFilter::default());
        assert_eq!(all.len(), catalog.len());
        assert_eq!(all[0].id, catalog.rules()[0].id);
    }

    #[test]
    fn filters_by_kind_using_either_spelling() {
        let catalog = baseline();
        let by_slug = run_list_rules(
            &catalog,
            &ListRulesFilter {
                kind: Some("key-vault".to_string()),
                ..ListRulesFilter::default()
            },
        );
        let by_arm = run_list_rules(
            &catalog,
            &ListRulesFilter {
                kind: Some("Microsoft.KeyVault/vaults".to_string()),
                ..ListRulesFilter::default()
            },
        );
        assert!(!by_slug.is_empty());
        assert_eq!(by_slug, by_arm);
        assert!(by_slug.iter().all(|r| r.applies_to.contains(&"key-vault".to_string())));
    }

    #[test]
    fn filters_by_service_case_insensitively() {
        let catalog = baseline();
        let rules = run_list_rules(
            &catalog,
            &ListRulesFilter {
                service: Some("storage".to_string()),
                ..ListRulesFilter::default()
            },
        );
        assert!(!rules.is_empty());
        assert!(rules.iter().all(|r| r.service.as_deref() == Some("Storage")));
    }

    #[test]
    fn text_output_aligns_ids() {
        let rules = vec![
            RuleSummary {
                id: "a".to_string(),
                title: "First".to_string(),
                severity: Severity::Low,
                service: None,
                applies_to: vec!["key-vault".to_string()],
                fail_closed: false,
            },
            RuleSummary {
                id: "longer".to_string(),
                title: "Second".to_string(),
                severity: Severity::Critical,
                service: None,
                applies_to: vec!["storage-account".to_string(), "key-vault".to_string()],
                fail_closed: true,
            },
        ];
        let text = format_rules_text(&rules);
        assert_eq!(
            text,
            "a       low       key-vault  First\nlonger  critical  storage-account,key-vault  Second\n"
        );
    }
}
