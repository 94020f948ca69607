use guardrails_types::{
    Disposition, DispositionCounts, ExemptionMatch, Gate, GateStatus, GuardrailsReport, KindStats,
    MatchTier, Outcome, ResourceGroup, RuleGroup, RunMeta, ScanData, Severity, SeverityBreakdown,
    Summary, ToolMeta, VerdictDetail, VerdictRecord, SCHEMA_REPORT_V1,
};
use serde_json::json;
use time::macros::datetime;

fn verdict(
    resource: &str,
    kind: &str,
    rule: &str,
    severity: Severity,
    outcome: Outcome,
    disposition: Disposition,
) -> VerdictRecord {
    VerdictRecord {
        resource_id: resource.to_string(),
        resource_kind: kind.to_string(),
        rule_id: rule.to_string(),
        severity,
        outcome,
        disposition,
        detail: None,
        exemption: None,
        fingerprint: format!("fp-{rule}-{resource}"),
    }
}

/// sa1: fail (high), pass (medium); kv1: exempted fail (critical), error (low).
pub fn sample_report() -> GuardrailsReport {
    let mut fail = verdict(
        "sa1",
        "storage-account",
        "no-public-storage",
        Severity::High,
        Outcome::Fail,
        Disposition::Fail,
    );
    fail.detail = Some(VerdictDetail {
        code: "condition_failed".to_string(),
        message: "Storage must be private: property 'properties.allowBlobPublicAccess' does not satisfy the rule".to_string(),
        path: Some("properties.allowBlobPublicAccess".to_string()),
        actual: Some(json!(true)),
        expected: Some(json!(false)),
    });

    let pass = verdict(
        "sa1",
        "storage-account",
        "https-only",
        Severity::Medium,
        Outcome::Pass,
        Disposition::Pass,
    );

    let mut exempted = verdict(
        "kv1",
        "key-vault",
        "kv-purge-protection",
        Severity::Critical,
        Outcome::Fail,
        Disposition::Exempted,
    );
    exempted.exemption = Some(ExemptionMatch {
        tier: MatchTier::ExactRule,
        resource: "kv1".to_string(),
        rule: "kv-purge-protection".to_string(),
        justification: "migration in progress".to_string(),
        expires: Some("2026-12-31".to_string()),
    });

    let mut error = verdict(
        "kv1",
        "key-vault",
        "kv-retention",
        Severity::Low,
        Outcome::Error,
        Disposition::Error,
    );
    error.detail = Some(VerdictDetail {
        code: "property_missing".to_string(),
        message: "property 'properties.softDeleteRetentionInDays' is absent".to_string(),
        path: Some("properties.softDeleteRetentionInDays".to_string()),
        actual: None,
        expected: None,
    });

    let verdicts = vec![fail, pass, exempted, error];

    let mut totals = DispositionCounts::default();
    for v in &verdicts {
        totals.record(v.disposition);
    }

    let counts_of = |idx: &[u32]| {
        let mut c = DispositionCounts::default();
        for i in idx {
            c.record(verdicts[*i as usize].disposition);
        }
        c
    };

    let by_rule = verdicts
        .iter()
        .enumerate()
        .map(|(i, v)| RuleGroup {
            rule_id: v.rule_id.clone(),
            severity: v.severity,
            verdicts: vec![i as u32],
            counts: counts_of(&[i as u32]),
        })
        .collect();

    let by_resource = vec![
        ResourceGroup {
            resource_id: "sa1".to_string(),
            kind: "storage-account".to_string(),
            verdicts: vec![0, 1],
            counts: counts_of(&[0, 1]),
        },
        ResourceGroup {
            resource_id: "kv1".to_string(),
            kind: "key-vault".to_string(),
            verdicts: vec![2, 3],
            counts: counts_of(&[2, 3]),
        },
    ];

    let by_kind = vec![
        KindStats {
            kind: "storage-account".to_string(),
            resources: 1,
            counts: counts_of(&[0, 1]),
            pass_rate: Some(0.5),
        },
        KindStats {
            kind: "key-vault".to_string(),
            resources: 1,
            counts: counts_of(&[2, 3]),
            pass_rate: Some(0.0),
        },
    ];

    let by_severity = Severity::DESCENDING
        .iter()
        .map(|s| {
            let idx: Vec<u32> = verdicts
                .iter()
                .enumerate()
                .filter(|(_, v)| v.severity == *s)
                .map(|(i, _)| i as u32)
                .collect();
            SeverityBreakdown {
                severity: *s,
                counts: counts_of(&idx),
            }
        })
        .collect();

    GuardrailsReport {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: ToolMeta {
            name: "azure-guardrails".to_string(),
            version: "0.1.0".to_string(),
        },
        run: RunMeta {
            started_at: datetime!(2026-01-15 10:00:00 UTC),
            ended_at: datetime!(2026-01-15 10:00:01 UTC),
            duration_ms: 1000,
            as_of: "2026-01-15".to_string(),
        },
        gate: Gate {
            status: GateStatus::Fail,
            fail_on: Some(Severity::High),
            reasons: vec!["failed_at_threshold".to_string()],
        },
        summary: Summary::from(totals),
        by_severity,
        by_kind,
        by_resource,
        by_rule,
        verdicts,
        data: ScanData {
            profile: "standard".to_string(),
            catalog: "azure-baseline".to_string(),
            not_applicable: "omit".to_string(),
            resources_loaded: 2,
            resources_evaluated: 2,
            rules_loaded: 4,
            exemptions_loaded: 1,
            complete: true,
        },
    }
}
