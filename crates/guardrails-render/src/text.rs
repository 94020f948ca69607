use crate::{format_rate, severity_label};
use guardrails_types::{Disposition, GateStatus, GuardrailsReport};

/// Short human summary for the terminal.
///
/// One headline, one line of totals, then one line per failing or errored verdict.
pub fn render_text_summary(report: &GuardrailsReport) -> String {
    let mut out = String::new();
    let status = match report.gate.status {
        GateStatus::Pass => "PASS",
        GateStatus::Fail => "FAIL",
    };
    out.push_str(&format!(
        "azure-guardrails: {status} ({} resources, {} rules, profile {})\n",
        report.data.resources_evaluated, report.data.rules_loaded, report.data.profile
    ));

    let c = &report.summary.counts;
    out.push_str(&format!(
        "  pass {}  fail {}  exempted {}  error {}  not_applicable {}  pass_rate {}\n",
        c.pass,
        c.fail,
        c.exempted,
        c.error,
        c.not_applicable,
        format_rate(report.summary.pass_rate)
    ));

    for v in &report.verdicts {
        let tag = match v.disposition {
            Disposition::Fail => "FAIL",
            Disposition::Error => "ERROR",
            _ => continue,
        };
        out.push_str(&format!(
            "  {tag:<5} {:<8} {} {}",
            severity_label(v.severity),
            v.rule_id,
            v.resource_id
        ));
        if let Some(d) = &v.detail {
            out.push_str(&format!(": {}", d.message));
        }
        out.push('\n');
    }

    if !report.gate.reasons.is_empty() {
        out.push_str(&format!("  gate: {}\n", report.gate.reasons.join(", ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_report;

    #[test]
    fn lists_headline_totals_and_failures() {
        let text = render_text_summary(&sample_report());
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "azure-guardrails: FAIL (2 resources, 4 rules, profile standard)"
        );
        assert_eq!(
            lines[1],
            "  pass 1  fail 1  exempted 1  error 1  not_applicable 0  pass_rate 25.0%"
        );
        assert!(lines[2].starts_with("  FAIL  HIGH     no-public-storage sa1: "));
        assert!(lines[3].starts_with("  ERROR LOW      kv-retention kv1: "));
        assert_eq!(lines[4], "  gate: failed_at_threshold");
    }

    #[test]
    fn passing_report_has_no_verdict_lines() {
        let mut report = sample_report();
        report.verdicts.retain(|v| v.disposition == Disposition::Pass);
        report.gate.status = GateStatus::Pass;
        report.gate.reasons.clear();
        let text = render_text_summary(&report);
        assert_eq!(text.lines().count(), 2);
        assert!(text.starts_with("azure-guardrails: PASS"));
    }
}
