use crate::catalog::{RuleCatalog, RuleSpec};
use crate::exemption::{ExemptionSet, ExemptionSpec};
use crate::model::{Container, Resource, ResourceId, ResourceKind, ResourceSet};
use crate::policy::EvaluationOptions;
use serde_json::{json, Value};
use time::macros::date;

pub fn resource(id: &str, kind: &str, props: Value) -> Resource {
    Resource {
        id: ResourceId::new(id),
        kind: ResourceKind::parse(kind),
        name: Some(id.rsplit('/').next().unwrap_or(id).to_string()),
        container: Container::from_arm_id(id),
        parent: None,
        properties: props.as_object().cloned().unwrap_or_default(),
    }
}

pub fn resources(list: Vec<Resource>) -> ResourceSet {
    ResourceSet::new(list).expect("unique resource ids")
}

pub fn public_storage_rule(fail_closed: bool) -> RuleSpec {
    RuleSpec {
        id: "no-public-storage".to_string(),
        title: "Storage accounts must not allow public access".to_string(),
        description: "Public blob access exposes data to anonymous readers.".to_string(),
        remediation: "Set properties.public_access to false.".to_string(),
        service: Some("Storage".to_string()),
        applies_to: vec!["storage-account".to_string()],
        severity: "high".to_string(),
        fail_closed,
        condition: json!({ "equals": { "path": "properties.public_access", "value": false } }),
    }
}

pub fn rule(id: &str, kind: &str, severity: &str, condition: Value) -> RuleSpec {
    RuleSpec {
        id: id.to_string(),
        title: id.to_string(),
        description: String::new(),
        remediation: String::new(),
        service: None,
        applies_to: vec![kind.to_string()],
        severity: severity.to_string(),
        fail_closed: false,
        condition,
    }
}

pub fn catalog(specs: Vec<RuleSpec>) -> RuleCatalog {
    RuleCatalog::from_specs("test", specs).expect("valid catalog")
}

pub fn exemption(resource: &str, rule: &str, expires: Option<&str>) -> ExemptionSet {
    ExemptionSet::from_specs(vec![ExemptionSpec {
        resource: resource.to_string(),
        rule: rule.to_string(),
        justification: "accepted risk".to_string(),
        expires: expires.map(str::to_string),
    }])
    .expect("valid exemption")
}

pub fn no_exemptions() -> ExemptionSet {
    ExemptionSet::default()
}

pub fn opts() -> EvaluationOptions {
    EvaluationOptions::new(date!(2026 - 01 - 15))
}
