use crate::{format_rate, severity_label};
use guardrails_types::{Disposition, GateStatus, GuardrailsReport, VerdictRecord};

pub fn render_markdown(report: &GuardrailsReport) -> String {
    let mut out = String::new();

    out.push_str("# Azure guardrails report\n\n");
    let gate = match report.gate.status {
        GateStatus::Pass => "PASS",
        GateStatus::Fail => "FAIL",
    };
    let threshold = report
        .gate
        .fail_on
        .map(|s| s.as_str())
        .unwrap_or("never (audit)");
    out.push_str(&format!(
        "- Gate: **{}** (fail on: {})\n- Profile: `{}`, catalog: `{}`\n- Evaluated as of: {}\n- Resources: {} evaluated / {} loaded, rules: {}, exemptions: {}\n\n",
        gate,
        threshold,
        report.data.profile,
        report.data.catalog,
        report.run.as_of,
        report.data.resources_evaluated,
        report.data.resources_loaded,
        report.data.rules_loaded,
        report.data.exemptions_loaded,
    ));
    if !report.gate.reasons.is_empty() {
        out.push_str(&format!("Gate reasons: {}\n\n", report.gate.reasons.join(", ")));
    }
    if !report.data.complete {
        out.push_str("> Note: scan was cancelled before every resource was evaluated.\n\n");
    }

    if report.verdicts.is_empty() {
        out.push_str("No verdicts.\n");
        return out;
    }

    let s = &report.summary;
    out.push_str("## Summary\n\n");
    out.push_str("| pass | fail | exempted | error | not applicable | pass rate |\n");
    out.push_str("|---:|---:|---:|---:|---:|---:|\n");
    out.push_str(&format!(
        "| {} | {} | {} | {} | {} | {} |\n\n",
        s.counts.pass,
        s.counts.fail,
        s.counts.exempted,
        s.counts.error,
        s.counts.not_applicable,
        format_rate(s.pass_rate),
    ));

    out.push_str("## By severity\n\n");
    out.push_str("| severity | pass | fail | exempted | error |\n");
    out.push_str("|---|---:|---:|---:|---:|\n");
    for b in &report.by_severity {
        out.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            severity_label(b.severity),
            b.counts.pass,
            b.counts.fail,
            b.counts.exempted,
            b.counts.error,
        ));
    }
    out.push('\n');

    out.push_str("## By resource type\n\n");
    out.push_str("| type | resources | pass | fail | pass rate |\n");
    out.push_str("|---|---:|---:|---:|---:|\n");
    for k in &report.by_kind {
        out.push_str(&format!(
            "| `{}` | {} | {} | {} | {} |\n",
            k.kind,
            k.resources,
            k.counts.pass,
            k.counts.fail,
            format_rate(k.pass_rate),
        ));
    }
    out.push('\n');

    section(&mut out, report, "Failures", Disposition::Fail);
    section(&mut out, report, "Errors", Disposition::Error);

    let exempted: Vec<&VerdictRecord> = report
        .verdicts
        .iter()
        .filter(|v| v.disposition == Disposition::Exempted)
        .collect();
    if !exempted.is_empty() {
        out.push_str("## Exemptions\n\n");
        for v in exempted {
            let Some(e) = &v.exemption else { continue };
            out.push_str(&format!(
                "- `{}` / `{}`: {}",
                v.rule_id, v.resource_id, e.justification
            ));
            if let Some(expires) = &e.expires {
                out.push_str(&format!(" (expires {expires})"));
            }
            out.push('\n');
        }
        out.push('\n');
    }

    out
}

fn section(out: &mut String, report: &GuardrailsReport, title: &str, which: Disposition) {
    let mut rows = report
        .verdicts
        .iter()
        .filter(|v| v.disposition == which)
        .peekable();
    if rows.peek().is_none() {
        return;
    }

    out.push_str(&format!("## {title}\n\n"));
    for v in rows {
        out.push_str(&format!(
            "- [{}] `{}` on `{}`",
            severity_label(v.severity),
            v.rule_id,
            v.resource_id
        ));
        if let Some(d) = &v.detail {
            out.push_str(&format!(": {}", d.message));
            if let Some(path) = &d.path {
                out.push_str(&format!(" (`{path}`)"));
            }
        }
        out.push('\n');
    }
    out.push('\n');
}
