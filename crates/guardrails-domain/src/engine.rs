use crate::catalog::{Rule, RuleCatalog};
use crate::condition::{ConditionError, Evidence};
use crate::error::GuardrailError;
use crate::exemption::{format_date, ExemptionSet};
use crate::fingerprint::fingerprint_for_verdict;
use crate::model::{Resource, ResourceSet};
use crate::policy::{ErrorPolicy, EvaluationOptions, Execution, NotApplicableMode};
use guardrails_types::{ids, Disposition, Outcome, VerdictDetail, VerdictRecord};
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation, checked between resources.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A verdict plus its position keys.
#[derive(Clone, Debug, PartialEq)]
pub struct Verdict {
    /// Index of the resource in load order.
    pub resource_index: usize,
    /// Index of the rule in catalog declaration order.
    pub rule_index: usize,
    pub record: VerdictRecord,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    /// Ordered by (resource load index, rule catalog index).
    pub verdicts: Vec<Verdict>,
    pub resources_evaluated: usize,
    /// `false` when cancellation stopped the scan early.
    pub complete: bool,
}

/// Evaluate every (resource, applicable rule) pair.
///
/// Returns `Err` only under `ErrorPolicy::Abort`, with the first evaluation error in
/// verdict order.
pub fn evaluate(
    resources: &ResourceSet,
    catalog: &RuleCatalog,
    exemptions: &ExemptionSet,
    opts: &EvaluationOptions,
    cancel: &CancelToken,
) -> Result<Evaluation, GuardrailError> {
    for lapsed in exemptions.lapsed(opts.as_of) {
        tracing::warn!(
            index = lapsed.index,
            resource = lapsed.resource.as_str(),
            rule = lapsed.rule.as_str(),
            expires = %lapsed.expires.map(format_date).unwrap_or_default(),
            "exemption has expired and is ignored"
        );
    }

    let per_resource: Vec<Option<Result<Vec<Verdict>, GuardrailError>>> = match opts.execution {
        Execution::Sequential => {
            let mut out = Vec::with_capacity(resources.len());
            for (idx, resource) in resources.resources().iter().enumerate() {
                if cancel.is_cancelled() {
                    break;
                }
                let result = evaluate_resource(idx, resource, catalog, exemptions, opts);
                let abort = result.is_err();
                out.push(Some(result));
                if abort {
                    break;
                }
            }
            out
        }
        Execution::Parallel => resources
            .resources()
            .par_iter()
            .enumerate()
            .map(|(idx, resource)| {
                if cancel.is_cancelled() {
                    return None;
                }
                Some(evaluate_resource(idx, resource, catalog, exemptions, opts))
            })
            .collect(),
    };

    let mut verdicts = Vec::new();
    let mut resources_evaluated = 0usize;
    for result in per_resource.into_iter().flatten() {
        verdicts.extend(result?);
        resources_evaluated += 1;
    }

    verdicts.sort_by_key(|v| (v.resource_index, v.rule_index));

    let complete = resources_evaluated == resources.len();
    if !complete {
        tracing::warn!(
            evaluated = resources_evaluated,
            total = resources.len(),
            "scan cancelled before every resource was evaluated"
        );
    }

    Ok(Evaluation {
        verdicts,
        resources_evaluated,
        complete,
    })
}

fn evaluate_resource(
    resource_index: usize,
    resource: &Resource,
    catalog: &RuleCatalog,
    exemptions: &ExemptionSet,
    opts: &EvaluationOptions,
) -> Result<Vec<Verdict>, GuardrailError> {
    let mut out = Vec::new();
    match opts.not_applicable {
        NotApplicableMode::Omit => {
            for &rule_index in catalog.applicable(&resource.kind) {
                let rule = &catalog.rules()[rule_index];
                out.push(assess(resource_index, resource, rule_index, rule, exemptions, opts)?);
            }
        }
        NotApplicableMode::Explicit => {
            for (rule_index, rule) in catalog.rules().iter().enumerate() {
                let verdict = if rule.applies_to_kind(&resource.kind) {
                    assess(resource_index, resource, rule_index, rule, exemptions, opts)?
                } else {
                    not_applicable(resource_index, resource, rule_index, rule)
                };
                out.push(verdict);
            }
        }
    }
    Ok(out)
}

fn assess(
    resource_index: usize,
    resource: &Resource,
    rule_index: usize,
    rule: &Rule,
    exemptions: &ExemptionSet,
    opts: &EvaluationOptions,
) -> Result<Verdict, GuardrailError> {
    let (outcome, detail) = match rule.condition.evaluate(&resource.properties) {
        Ok(check) if check.passed => (Outcome::Pass, None),
        Ok(check) => (Outcome::Fail, Some(failure_detail(rule, check.evidence))),
        Err(ConditionError::Missing { path }) if rule.fail_closed => (
            Outcome::Fail,
            Some(VerdictDetail {
                code: ids::CODE_PROPERTY_MISSING.to_string(),
                message: format!("property '{path}' is absent and the rule fails closed"),
                path: Some(path.to_string()),
                actual: None,
                expected: None,
            }),
        ),
        Err(err) => {
            if opts.on_error == ErrorPolicy::Abort {
                return Err(GuardrailError::RuleEvaluation {
                    rule_id: rule.id.clone(),
                    resource_id: resource.id.to_string(),
                    reason: err.describe(),
                });
            }
            tracing::debug!(
                rule = %rule.id,
                resource = %resource.id,
                reason = %err.describe(),
                "rule evaluation error recorded"
            );
            (Outcome::Error, Some(error_detail(&err)))
        }
    };

    let mut disposition = Disposition::from(outcome);
    let mut exemption = None;
    if matches!(outcome, Outcome::Pass | Outcome::Fail)
        && let Some((e, tier)) = exemptions.resolve(&resource.id, &rule.id, opts.as_of)
    {
        disposition = Disposition::Exempted;
        exemption = Some(e.to_match(tier));
    }

    Ok(Verdict {
        resource_index,
        rule_index,
        record: VerdictRecord {
            resource_id: resource.id.to_string(),
            resource_kind: resource.kind.to_string(),
            rule_id: rule.id.clone(),
            severity: rule.severity,
            outcome,
            disposition,
            detail,
            exemption,
            fingerprint: fingerprint_for_verdict(&rule.id, resource.id.as_str()),
        },
    })
}

fn not_applicable(
    resource_index: usize,
    resource: &Resource,
    rule_index: usize,
    rule: &Rule,
) -> Verdict {
    Verdict {
        resource_index,
        rule_index,
        record: VerdictRecord {
            resource_id: resource.id.to_string(),
            resource_kind: resource.kind.to_string(),
            rule_id: rule.id.clone(),
            severity: rule.severity,
            outcome: Outcome::NotApplicable,
            disposition: Disposition::NotApplicable,
            detail: Some(VerdictDetail {
                code: ids::CODE_NOT_APPLICABLE.to_string(),
                message: format!(
                    "rule targets {}; resource is {}",
                    rule.applies_to
                        .iter()
                        .map(|k| k.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                    resource.kind
                ),
                path: None,
                actual: None,
                expected: None,
            }),
            exemption: None,
            fingerprint: fingerprint_for_verdict(&rule.id, resource.id.as_str()),
        },
    }
}

fn failure_detail(rule: &Rule, evidence: Option<Evidence>) -> VerdictDetail {
    match evidence {
        Some(ev) => VerdictDetail {
            code: ids::CODE_CONDITION_FAILED.to_string(),
            message: format!("{}: property '{}' does not satisfy the rule", rule.title, ev.path),
            path: Some(ev.path.to_string()),
            actual: ev.actual,
            expected: Some(ev.expected),
        },
        None => VerdictDetail {
            code: ids::CODE_CONDITION_FAILED.to_string(),
            message: format!("{}: condition not satisfied", rule.title),
            path: None,
            actual: None,
            expected: None,
        },
    }
}

fn error_detail(err: &ConditionError) -> VerdictDetail {
    let (code, actual) = match err {
        ConditionError::Missing { .. } => (ids::CODE_PROPERTY_MISSING, None),
        ConditionError::TypeMismatch { actual, .. } => (ids::CODE_TYPE_MISMATCH, Some(actual.clone())),
    };
    VerdictDetail {
        code: code.to_string(),
        message: err.describe(),
        path: Some(err.path().to_string()),
        actual,
        expected: None,
    }
}
