use anyhow::Context;
use guardrails_domain::fingerprint_for_verdict;
use guardrails_types::{
    ids, Disposition, DispositionCounts, Gate, GateStatus, GuardrailsReport, Outcome, RunMeta,
    ScanData, Severity, SeverityBreakdown, Summary, VerdictDetail, VerdictRecord,
    SCHEMA_REPORT_V1,
};
use time::OffsetDateTime;

use crate::scan::tool_meta;

pub fn parse_report_json(text: &str) -> anyhow::Result<GuardrailsReport> {
    let value: serde_json::Value = serde_json::from_str(text).context("parse report json")?;

    let schema = value
        .get("schema")
        .and_then(|v| v.as_str())
        .unwrap_or_default();
    if schema != SCHEMA_REPORT_V1 {
        anyhow::bail!("unknown report schema: {schema:?} (expected {SCHEMA_REPORT_V1})");
    }

    serde_json::from_value(value).context("parse azure-guardrails report")
}

pub fn serialize_report(report: &GuardrailsReport) -> anyhow::Result<Vec<u8>> {
    serde_json::to_vec_pretty(report).context("serialize report")
}

/// A failing report carrying a single tool-level error verdict.
///
/// Written when the scan could not run at all so CI still finds a report artifact.
pub fn runtime_error_report(message: &str) -> GuardrailsReport {
    let now = OffsetDateTime::now_utc();

    let record = VerdictRecord {
        resource_id: ids::TOOL_NAME.to_string(),
        resource_kind: "tool".to_string(),
        rule_id: ids::RULE_TOOL_RUNTIME.to_string(),
        severity: Severity::Critical,
        outcome: Outcome::Error,
        disposition: Disposition::Error,
        detail: Some(VerdictDetail {
            code: ids::REASON_RUNTIME_ERROR.to_string(),
            message: message.to_string(),
            path: None,
            actual: None,
            expected: None,
        }),
        exemption: None,
        fingerprint: fingerprint_for_verdict(ids::RULE_TOOL_RUNTIME, ids::TOOL_NAME),
    };

    let mut counts = DispositionCounts::default();
    counts.record(Disposition::Error);

    GuardrailsReport {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: tool_meta(),
        run: RunMeta {
            started_at: now,
            ended_at: now,
            duration_ms: 0,
            as_of: guardrails_domain::exemption::format_date(now.date()),
        },
        gate: Gate {
            status: GateStatus::Fail,
            fail_on: None,
            reasons: vec![ids::REASON_RUNTIME_ERROR.to_string()],
        },
        summary: Summary::from(counts.clone()),
        by_severity: Severity::DESCENDING
            .iter()
            .map(|s| SeverityBreakdown {
                severity: *s,
                counts: if *s == Severity::Critical {
                    counts.clone()
                } else {
                    DispositionCounts::default()
                },
            })
            .collect(),
        by_kind: Vec::new(),
        by_resource: Vec::new(),
        by_rule: Vec::new(),
        verdicts: vec![record],
        data: ScanData {
            profile: "unknown".to_string(),
            catalog: "unknown".to_string(),
            not_applicable: "omit".to_string(),
            complete: false,
            ..ScanData::default()
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_error_report_round_trips() {
        let report = runtime_error_report("boom");
        let bytes = serialize_report(&report).expect("serialize");
        let text = String::from_utf8(bytes).expect("utf8");
        let parsed = parse_report_json(&text).expect("parse");

        assert_eq!(parsed.gate.status, GateStatus::Fail);
        assert_eq!(parsed.gate.reasons, vec![ids::REASON_RUNTIME_ERROR]);
        assert_eq!(parsed.summary.counts.error, 1);
        assert_eq!(parsed.verdicts[0].rule_id, ids::RULE_TOOL_RUNTIME);
        assert_eq!(
            parsed.verdicts[0].detail.as_ref().map(|d| d.message.as_str()),
            Some("boom")
        );
    }

    #[test]
    fn rejects_foreign_schemas() {
        let err = parse_report_json(r#"{"schema":"depcheck.report.v1"}"#).unwrap_err();
        assert!(err.to_string().contains("unknown report schema"));
    }

    #[test]
    fn rejects_invalid_json() {
        assert!(parse_report_json("{").is_err());
    }
}
