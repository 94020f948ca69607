//! The `explain` use case: look up rule guidance or detail-code documentation.

use guardrails_domain::catalog::{Rule, RuleCatalog};
use guardrails_types::ids;

/// Documentation for a verdict detail code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CodeExplanation {
    pub code: &'static str,
    pub summary: &'static str,
}

const CODES: &[CodeExplanation] = &[
    CodeExplanation {
        code: ids::CODE_CONDITION_FAILED,
        summary: "The resource has the property, but its value does not satisfy the rule condition.",
    },
    CodeExplanation {
        code: ids::CODE_PROPERTY_MISSING,
        summary: "A property the rule reads is absent. Fail-closed rules report this as a failure; other rules report an evaluation error.",
    },
    CodeExplanation {
        code: ids::CODE_TYPE_MISMATCH,
        summary: "A property exists but has the wrong JSON type for the comparison (for example a string where a number is expected). Always an evaluation error.",
    },
    CodeExplanation {
        code: ids::CODE_NOT_APPLICABLE,
        summary: "The rule does not target this resource type. Only reported with not_applicable = \"explicit\".",
    },
    CodeExplanation {
        code: ids::REASON_RUNTIME_ERROR,
        summary: "The scan could not run (unreadable input, invalid catalog or configuration). Fix the error and re-run.",
    },
];

/// Output from the explain use case.
#[derive(Clone, Debug)]
pub enum ExplainOutput {
    Rule(Box<Rule>),
    Code(CodeExplanation),
    /// Unknown identifier; includes the known rule ids and codes.
    NotFound {
        identifier: String,
        available_rules: Vec<String>,
        available_codes: Vec<&'static str>,
    },
}

/// Look up a rule id (case-sensitive) in `catalog`, then a detail code.
pub fn run_explain(catalog: &RuleCatalog, identifier: &str) -> ExplainOutput {
    if let Some(rule) = catalog.get(identifier) {
        return ExplainOutput::Rule(Box::new(rule.clone()));
    }
    if let Some(code) = CODES.iter().find(|c| c.code == identifier) {
        return ExplainOutput::Code(*code);
    }
    ExplainOutput::NotFound {
        identifier: identifier.to_string(),
        available_rules: catalog.rules().iter().map(|r| r.id.clone()).collect(),
        available_codes: CODES.iter().map(|c| c.code).collect(),
    }
}

/// Format a rule explanation for terminal display.
pub fn format_rule_explanation(rule: &Rule) -> String {
    let mut out = String::new();

    out.push_str(&rule.title);
    out.push('\n');
    out.push_str(&"=".repeat(rule.title.chars().count()));
    out.push_str("\n\n");
    out.push_str(&format!("id:         {}\n", rule.id));
    out.push_str(&format!("severity:   {}\n", rule.severity));
    if let Some(service) = &rule.service {
        out.push_str(&format!("service:    {service}\n"));
    }
    let kinds: Vec<String> = rule.applies_to.iter().map(|k| k.to_string()).collect();
    out.push_str(&format!("applies to: {}\n", kinds.join(", ")));
    if rule.fail_closed {
        out.push_str("fail-closed: a missing property counts as a failure\n");
    }
    out.push('\n');

    if !rule.description.is_empty() {
        out.push_str(&rule.description);
        out.push_str("\n\n");
    }
    out.push_str("Remediation\n");
    out.push_str("-----------\n");
    if rule.remediation.is_empty() {
        out.push_str("(none given)\n");
    } else {
        out.push_str(&rule.remediation);
        out.push('\n');
    }

    out
}

pub fn format_code_explanation(code: &CodeExplanation) -> String {
    format!("{}\n{}\n\n{}\n", code.code, "=".repeat(code.code.len()), code.summary)
}

/// Format the "not found" error message for terminal display.
pub fn format_not_found(identifier: &str, rules: &[String], codes: &[&str]) -> String {
    let mut out = String::new();

    out.push_str(&format!("Unknown rule id or code: {identifier}\n\n"));
    out.push_str("Available rules:\n");
    for id in rules {
        out.push_str(&format!("  - {id}\n"));
    }
    out.push_str("\nAvailable codes:\n");
    for code in codes {
        out.push_str(&format!("  - {code}\n"));
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
    fn explain_known_rule() {
        let output = run_explain(&baseline(), "storage-https-only");
        let ExplainOutput::Rule(rule) = output else {
            panic!("expected Rule");
        };
        let text = format_rule_explanation(&rule);
        assert!(text.contains("id:         storage-https-only"));
        assert!(text.contains("Remediation"));
    }

    #[test]
    fn explain_known_code() {
        let output = run_explain(&baseline(), "property_missing");
        let ExplainOutput::Code(code) = output else {
            panic!("expected Code");
        };
        assert!(format_code_explanation(&code).starts_with("property_missing\n================\n"));
    }

    #[test]
    fn explain_unknown_lists_alternatives() {
        let catalog = baseline();
        let output = run_explain(&catalog, "not-a-rule");
        let ExplainOutput::NotFound {
            identifier,
            available_rules,
            available_codes,
        } = output
        else {
            panic!("expected NotFound");
        };
        assert_eq!(identifier, "not-a-rule");
        assert_eq!(available_rules.len(), catalog.len());
        assert!(available_codes.contains(&ids::CODE_TYPE_MISMATCH));

        let text = format_not_found(&identifier, &available_rules, &available_codes);
        assert!(text.contains("Unknown rule id or code: not-a-rule"));
        assert!(text.contains("  - storage-https-only"));
    }
}
