//! Rule catalog: validated, immutable, indexed by resource kind.

use crate::condition::Condition;
use crate::error::GuardrailError;
use crate::model::ResourceKind;
use crate::policy::CatalogPolicy;
use guardrails_types::{ids, Severity};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// A rule as written in a catalog source, before validation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub remediation: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default, alias = "resource_types")]
    pub applies_to: Vec<String>,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub fail_closed: bool,
    /// Kept untyped so a malformed condition is reported against its rule id.
    #[serde(default)]
    pub condition: Value,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Rule {
    pub id: String,
    pub title: String,
    pub description: String,
    pub remediation: String,
    pub service: Option<String>,
    pub applies_to: Vec<ResourceKind>,
    pub severity: Severity,
    pub fail_closed: bool,
    pub condition: Condition,
}

impl Rule {
    pub fn applies_to_kind(&self, kind: &ResourceKind) -> bool {
        self.applies_to.contains(kind)
    }

    fn from_spec(spec: RuleSpec) -> Result<Rule, GuardrailError> {
        let id = spec.id.trim().to_string();
        if id.is_empty() {
            return Err(GuardrailError::invalid_rule("<empty>", "rule id is empty"));
        }
        if id.eq_ignore_ascii_case(ids::ALL_RULES) {
            return Err(GuardrailError::invalid_rule(
                &id,
                format!("'{}' is reserved for exemptions", ids::ALL_RULES),
            ));
        }

        let severity: Severity = spec
            .severity
            .parse()
            .map_err(|e: String| GuardrailError::invalid_rule(&id, e))?;

        if spec.applies_to.is_empty() {
            return Err(GuardrailError::invalid_rule(&id, "no resource types listed"));
        }
        let mut applies_to = Vec::with_capacity(spec.applies_to.len());
        for raw in &spec.applies_to {
            let kind = ResourceKind::parse(raw);
            if !kind.is_known() {
                return Err(GuardrailError::invalid_rule(
                    &id,
                    format!("unknown resource type '{raw}'"),
                ));
            }
            if !applies_to.contains(&kind) {
                applies_to.push(kind);
            }
        }

        if spec.condition.is_null() {
            return Err(GuardrailError::invalid_rule(&id, "missing condition"));
        }
        let condition: Condition = serde_json::from_value(spec.condition)
            .map_err(|e| GuardrailError::invalid_rule(&id, format!("malformed condition: {e}")))?;
        condition
            .validate()
            .map_err(|e| GuardrailError::invalid_rule(&id, format!("malformed condition: {e}")))?;

        let title = if spec.title.trim().is_empty() {
            id.clone()
        } else {
            spec.title
        };

        Ok(Rule {
            id,
            title,
            description: spec.description,
            remediation: spec.remediation,
            service: spec.service.filter(|s| !s.trim().is_empty()),
            applies_to,
            severity,
            fail_closed: spec.fail_closed,
            condition,
        })
    }
}

/// Validated rules in declaration order.
///
/// Constructed explicitly and passed into the engine; narrowing produces a new catalog.
#[derive(Clone, Debug)]
pub struct RuleCatalog {
    name: String,
    rules: Vec<Rule>,
    by_kind: BTreeMap<ResourceKind, Vec<usize>>,
}

impl RuleCatalog {
    pub fn from_specs(
        name: impl Into<String>,
        specs: Vec<RuleSpec>,
    ) -> Result<RuleCatalog, GuardrailError> {
        let rules = specs
            .into_iter()
            .map(Rule::from_spec)
            .collect::<Result<Vec<_>, _>>()?;
        RuleCatalog::new(name, rules)
    }

    pub fn new(name: impl Into<String>, rules: Vec<Rule>) -> Result<RuleCatalog, GuardrailError> {
        let mut seen = BTreeSet::new();
        for r in &rules {
            if !seen.insert(r.id.as_str()) {
                return Err(GuardrailError::DuplicateRule { id: r.id.clone() });
            }
        }

        let mut by_kind: BTreeMap<ResourceKind, Vec<usize>> = BTreeMap::new();
        for (idx, r) in rules.iter().enumerate() {
            for kind in &r.applies_to {
                by_kind.entry(kind.clone()).or_default().push(idx);
            }
        }

        Ok(RuleCatalog {
            name: name.into(),
            rules,
            by_kind,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Catalog indices of the rules targeting `kind`, in declaration order.
    pub fn applicable(&self, kind: &ResourceKind) -> &[usize] {
        self.by_kind.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Distinct service names in first-declared order.
    pub fn services(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for s in self.rules.iter().filter_map(|r| r.service.as_deref()) {
            if !out.iter().any(|o| o.eq_ignore_ascii_case(s)) {
                out.push(s);
            }
        }
        out
    }

    /// A new catalog narrowed and adjusted by configuration.
    ///
    /// Overrides and rule selections must name rules in this catalog.
    pub fn filtered(&self, policy: &CatalogPolicy) -> Result<RuleCatalog, GuardrailError> {
        if policy.is_noop() {
            return Ok(self.clone());
        }

        for id in policy.rules.keys().chain(policy.only_rules.iter()) {
            if !self.contains(id) {
                return Err(GuardrailError::invalid_rule(
                    id,
                    "configuration names a rule that is not in the catalog",
                ));
            }
        }

        let mut kept = Vec::new();
        for rule in &self.rules {
            if !policy.only_rules.is_empty() && !policy.only_rules.contains(&rule.id) {
                continue;
            }
            if !service_selected(rule.service.as_deref(), policy) {
                continue;
            }
            let mut rule = rule.clone();
            if let Some(over) = policy.rules.get(&rule.id) {
                if over.enabled == Some(false) {
                    continue;
                }
                if let Some(sev) = over.severity {
                    rule.severity = sev;
                }
            }
            kept.push(rule);
        }

        RuleCatalog::new(self.name.clone(), kept)
    }
}

fn service_selected(service: Option<&str>, policy: &CatalogPolicy) -> bool {
    let matches = |list: &[String]| {
        service.is_some_and(|s| list.iter().any(|l| l.trim().eq_ignore_ascii_case(s)))
    };
    if !policy.include_services.is_empty() && !matches(&policy.include_services) {
        return false;
    }
    !matches(&policy.exclude_services)
}
