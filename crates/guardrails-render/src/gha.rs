use guardrails_types::{Disposition, GuardrailsReport, Severity};

/// Render failing and errored verdicts as GitHub Actions workflow command annotations.
///
/// Format:
/// `::{level} title={rule_id}::{resource_id}: {message}`
///
/// Critical and high failures are `error`, medium is `warning`, low is `notice`.
/// Evaluation errors are always `error`. Exempted verdicts are not annotated.
pub fn render_github_annotations(report: &GuardrailsReport) -> Vec<String> {
    let mut out = Vec::new();

    for v in &report.verdicts {
        let level = match v.disposition {
            Disposition::Error => "error",
            Disposition::Fail => match v.severity {
                Severity::Critical | Severity::High => "error",
                Severity::Medium => "warning",
                Severity::Low => "notice",
            },
            Disposition::Pass | Disposition::Exempted | Disposition::NotApplicable => continue,
        };

        let message = v
            .detail
            .as_ref()
            .map(|d| d.message.as_str())
            .unwrap_or("rule not satisfied");
        let body = escape_data(&format!(
            "{}: [{}] {}",
            v.resource_id,
            v.severity.as_str(),
            message
        ));
        let title = escape_property(&v.rule_id);

        out.push(format!("::{level} title={title}::{body}"));
    }

    out
}

fn escape_data(s: &str) -> String {
    s.replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

fn escape_property(s: &str) -> String {
    escape_data(s).replace(':', "%3A").replace(',', "%2C")
}
