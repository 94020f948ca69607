use crate::catalog::RuleCatalog;
use crate::engine::Evaluation;
use crate::model::ResourceSet;
use guardrails_types::{
    ids, Disposition, DispositionCounts, Gate, GateStatus, KindStats, ResourceGroup, RuleGroup,
    Severity, SeverityBreakdown, Summary, VerdictRecord,
};
use std::collections::BTreeMap;

/// Aggregated result of one scan. Built once, never mutated.
#[derive(Clone, Debug, PartialEq)]
pub struct ComplianceReport {
    verdicts: Vec<VerdictRecord>,
    summary: Summary,
    by_severity: Vec<SeverityBreakdown>,
    by_kind: Vec<KindStats>,
    by_resource: Vec<ResourceGroup>,
    by_rule: Vec<RuleGroup>,
    resources_evaluated: usize,
    complete: bool,
}

impl ComplianceReport {
    pub fn build(evaluation: Evaluation, resources: &ResourceSet, catalog: &RuleCatalog) -> Self {
        let Evaluation {
            verdicts,
            resources_evaluated,
            complete,
        } = evaluation;

        let mut totals = DispositionCounts::default();
        let mut severity_counts: BTreeMap<Severity, DispositionCounts> = BTreeMap::new();
        let mut rule_groups: Vec<RuleGroup> = catalog
            .rules()
            .iter()
            .map(|r| RuleGroup {
                rule_id: r.id.clone(),
                severity: r.severity,
                verdicts: Vec::new(),
                counts: DispositionCounts::default(),
            })
            .collect();
        let mut resource_groups: Vec<ResourceGroup> = Vec::new();
        let mut group_of_resource: BTreeMap<usize, usize> = BTreeMap::new();

        for (pos, v) in verdicts.iter().enumerate() {
            let d = v.record.disposition;
            let pos = pos as u32;
            totals.record(d);
            severity_counts.entry(v.record.severity).or_default().record(d);

            if let Some(group) = rule_groups.get_mut(v.rule_index) {
                group.verdicts.push(pos);
                group.counts.record(d);
            }

            let gi = *group_of_resource.entry(v.resource_index).or_insert_with(|| {
                resource_groups.push(ResourceGroup {
                    resource_id: v.record.resource_id.clone(),
                    kind: v.record.resource_kind.clone(),
                    verdicts: Vec::new(),
                    counts: DispositionCounts::default(),
                });
                resource_groups.len() - 1
            });
            resource_groups[gi].verdicts.push(pos);
            resource_groups[gi].counts.record(d);
        }

        let by_severity = Severity::DESCENDING
            .iter()
            .map(|s| SeverityBreakdown {
                severity: *s,
                counts: severity_counts.remove(s).unwrap_or_default(),
            })
            .collect();

        let by_kind = kind_stats(&verdicts, resources);

        ComplianceReport {
            verdicts: verdicts.into_iter().map(|v| v.record).collect(),
            summary: Summary::from(totals),
            by_severity,
            by_kind,
            by_resource: resource_groups,
            by_rule: rule_groups,
            resources_evaluated,
            complete,
        }
    }

    pub fn verdicts(&self) -> &[VerdictRecord] {
        &self.verdicts
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn by_severity(&self) -> &[SeverityBreakdown] {
        &self.by_severity
    }

    pub fn by_kind(&self) -> &[KindStats] {
        &self.by_kind
    }

    pub fn by_resource(&self) -> &[ResourceGroup] {
        &self.by_resource
    }

    pub fn by_rule(&self) -> &[RuleGroup] {
        &self.by_rule
    }

    pub fn resources_evaluated(&self) -> usize {
        self.resources_evaluated
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Gate decision: fail when any `fail` or `error` disposition sits at or above
    /// `fail_on`, or when the scan did not complete. `None` never fails on verdicts.
    pub fn gate(&self, fail_on: Option<Severity>) -> Gate {
        let mut reasons = Vec::new();
        if let Some(threshold) = fail_on {
            let at_threshold = |d: Disposition| {
                self.verdicts
                    .iter()
                    .any(|v| v.disposition == d && v.severity >= threshold)
            };
            if at_threshold(Disposition::Fail) {
                reasons.push(ids::REASON_FAILED_AT_THRESHOLD.to_string());
            }
            if at_threshold(Disposition::Error) {
                reasons.push(ids::REASON_ERRORS_AT_THRESHOLD.to_string());
            }
        }
        if !self.complete {
            reasons.push(ids::REASON_SCAN_INCOMPLETE.to_string());
        }

        Gate {
            status: if reasons.is_empty() {
                GateStatus::Pass
            } else {
                GateStatus::Fail
            },
            fail_on,
            reasons,
        }
    }
}

/// Per-kind statistics in first-seen resource order.
fn kind_stats(verdicts: &[crate::engine::Verdict], resources: &ResourceSet) -> Vec<KindStats> {
    let mut order: Vec<String> = Vec::new();
    let mut stats: BTreeMap<String, (u32, DispositionCounts)> = BTreeMap::new();

    for r in resources.resources() {
        let kind = r.kind.to_string();
        let entry = stats.entry(kind.clone()).or_insert_with(|| {
            order.push(kind);
            (0, DispositionCounts::default())
        });
        entry.0 += 1;
    }
    for v in verdicts {
        if let Some(entry) = stats.get_mut(&v.record.resource_kind) {
            entry.1.record(v.record.disposition);
        }
    }

    order
        .into_iter()
        .filter_map(|kind| {
            let (resources, counts) = stats.remove(&kind)?;
            Some(KindStats {
                pass_rate: counts.pass_rate(),
                kind,
                resources,
                counts,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{evaluate, CancelToken};
    use crate::test_support::{catalog, exemption, no_exemptions, opts, resource, resources, rule};
    use serde_json::json;

    fn scenario() -> (ResourceSet, RuleCatalog) {
        let set = resources(vec![
            resource("sa1", "storage-account", json!({ "properties": { "https": true, "tls": 1.0 } })),
            resource("kv1", "key-vault", json!({ "properties": { "purge": false } })),
            resource("sa2", "storage-account", json!({ "properties": { "https": false } })),
        ]);
        let cat = catalog(vec![
            rule(
                "https-only",
                "storage-account",
                "high",
                json!({ "equals": { "path": "properties.https", "value": true } }),
            ),
            rule(
                "min-tls",
                "storage-account",
                "medium",
                json!({ "compare": { "path": "properties.tls", "op": "gte", "value": 1.2 } }),
            ),
            rule(
                "purge-protection",
                "key-vault",
                "critical",
                json!({ "equals": { "path": "properties.purge", "value": true } }),
            ),
        ]);
        (set, cat)
    }

    #[test]
    fn aggregates_and_groupings() {
        let (set, cat) = scenario();
        let eval = evaluate(&set, &cat, &no_exemptions(), &opts(), &CancelToken::new()).unwrap();
        let report = ComplianceReport::build(eval, &set, &cat);

        // sa1: pass, fail; kv1: fail; sa2: fail, error
        let s = report.summary();
        assert_eq!(s.counts.total, 5);
        assert_eq!(s.counts.pass, 1);
        assert_eq!(s.counts.fail, 3);
        assert_eq!(s.counts.error, 1);
        assert_eq!(s.pass_rate, Some(0.2));

        let ids: Vec<&str> = report.by_resource().iter().map(|g| g.resource_id.as_str()).collect();
        assert_eq!(ids, vec!["sa1", "kv1", "sa2"]);
        assert_eq!(report.by_resource()[2].verdicts, vec![3, 4]);

        assert_eq!(report.by_rule()[0].verdicts, vec![0, 3]);
        assert_eq!(report.by_rule()[2].counts.fail, 1);

        let kinds: Vec<&str> = report.by_kind().iter().map(|k| k.kind.as_str()).collect();
        assert_eq!(kinds, vec!["storage-account", "key-vault"]);
        assert_eq!(report.by_kind()[0].resources, 2);
        assert_eq!(report.by_kind()[0].pass_rate, Some(0.25));

        assert_eq!(report.by_severity()[0].severity, Severity::Critical);
        assert_eq!(report.by_severity()[0].counts.fail, 1);
        let sum: u32 = report.by_severity().iter().map(|b| b.counts.total).sum();
        assert_eq!(sum, s.counts.total);
    }

    #[test]
    fn gate_respects_threshold_and_audit() {
        let (set, cat) = scenario();
        let eval = evaluate(&set, &cat, &no_exemptions(), &opts(), &CancelToken::new()).unwrap();
        let report = ComplianceReport::build(eval, &set, &cat);

        let gate = report.gate(Some(Severity::Critical));
        assert_eq!(gate.status, GateStatus::Fail);
        assert_eq!(gate.reasons, vec![ids::REASON_FAILED_AT_THRESHOLD.to_string()]);

        let gate = report.gate(Some(Severity::Medium));
        assert_eq!(
            gate.reasons,
            vec![
                ids::REASON_FAILED_AT_THRESHOLD.to_string(),
                ids::REASON_ERRORS_AT_THRESHOLD.to_string()
            ]
        );

        assert_eq!(report.gate(None).status, GateStatus::Pass);
    }

    #[test]
    fn exempted_failures_do_not_trip_the_gate() {
        let set = resources(vec![resource("kv1", "key-vault", json!({ "properties": { "purge": false } }))]);
        let cat = catalog(vec![rule(
            "purge-protection",
            "key-vault",
            "critical",
            json!({ "equals": { "path": "properties.purge", "value": true } }),
        )]);
        let ex = exemption("kv1", "all", None);
        let eval = evaluate(&set, &cat, &ex, &opts(), &CancelToken::new()).unwrap();
        let report = ComplianceReport::build(eval, &set, &cat);
        assert_eq!(report.summary().counts.exempted, 1);
        assert_eq!(report.gate(Some(Severity::Low)).status, GateStatus::Pass);
    }

    #[test]
    fn incomplete_scan_fails_even_in_audit() {
        let (set, cat) = scenario();
        let token = CancelToken::new();
        token.cancel();
        let eval = evaluate(&set, &cat, &no_exemptions(), &opts(), &token).unwrap();
        let report = ComplianceReport::build(eval, &set, &cat);
        assert!(!report.is_complete());
        let gate = report.gate(None);
        assert_eq!(gate.status, GateStatus::Fail);
        assert_eq!(gate.reasons, vec![ids::REASON_SCAN_INCOMPLETE.to_string()]);
    }
}
