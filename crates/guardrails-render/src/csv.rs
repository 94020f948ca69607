use guardrails_types::GuardrailsReport;

/// Compliance summary, one row per catalog rule in catalog order.
pub fn render_csv(report: &GuardrailsReport) -> String {
    let mut out =
        String::from("rule_id,severity,pass,fail,exempted,not_applicable,error,total,pass_rate\n");
    for g in &report.by_rule {
        let c = &g.counts;
        let rate = c
            .pass_rate()
            .map(|r| format!("{r:.4}"))
            .unwrap_or_default();
        push_row(
            &mut out,
            &[
                g.rule_id.as_str(),
                g.severity.as_str(),
                &c.pass.to_string(),
                &c.fail.to_string(),
                &c.exempted.to_string(),
                &c.not_applicable.to_string(),
                &c.error.to_string(),
                &c.total.to_string(),
                &rate,
            ],
        );
    }
    out
}

/// Every verdict as a row, in report order.
pub fn render_verdicts_csv(report: &GuardrailsReport) -> String {
    let mut out = String::from(
        "resource_id,resource_kind,rule_id,severity,outcome,disposition,code,path,justification\n",
    );
    for v in &report.verdicts {
        let outcome = serde_json::to_value(v.outcome)
            .ok()
            .and_then(|o| o.as_str().map(str::to_string))
            .unwrap_or_default();
        let detail = v.detail.as_ref();
        push_row(
            &mut out,
            &[
                v.resource_id.as_str(),
                v.resource_kind.as_str(),
                v.rule_id.as_str(),
                v.severity.as_str(),
                &outcome,
                v.disposition.as_str(),
                detail.map(|d| d.code.as_str()).unwrap_or(""),
                detail.and_then(|d| d.path.as_deref()).unwrap_or(""),
                v.exemption
                    .as_ref()
                    .map(|e| e.justification.as_str())
                    .unwrap_or(""),
            ],
        );
    }
    out
}

fn push_row(out: &mut String, fields: &[&str]) {
    for (i, f) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape(f));
    }
    out.push('\n');
}

/// RFC 4180 quoting.
fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::sample_report;

    #[test]
    fn summary_rows_follow_rule_order() {
        let csv = render_csv(&sample_report());
        insta::assert_snapshot!(csv.trim_end(), @r"
        rule_id,severity,pass,fail,exempted,not_applicable,error,total,pass_rate
        no-public-storage,high,0,1,0,0,0,1,0.0000
        https-only,medium,1,0,0,0,0,1,1.0000
        kv-purge-protection,critical,0,0,1,0,0,1,0.0000
        kv-retention,low,0,0,0,0,1,1,0.0000
        ");
    }

    #[test]
    fn verdict_rows_carry_detail_and_exemption() {
        let csv = render_verdicts_csv(&sample_report());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(
            lines[1],
            "sa1,storage-account,no-public-storage,high,fail,fail,condition_failed,properties.allowBlobPublicAccess,"
        );
        assert_eq!(
            lines[3],
            "kv1,key-vault,kv-purge-protection,critical,fail,exempted,,,migration in progress"
        );
    }

    #[test]
    fn fields_are_quoted_when_needed() {
        assert_eq!(escape("plain"), "plain");
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
