//! Render use cases: human surfaces from in-memory reports.

use guardrails_types::GuardrailsReport;

pub fn render_markdown(report: &GuardrailsReport) -> String {
    guardrails_render::render_markdown(report)
}

/// `verdicts` selects the per-verdict table instead of the per-rule summary.
pub fn render_csv(report: &GuardrailsReport, verdicts: bool) -> String {
    if verdicts {
        guardrails_render::render_verdicts_csv(report)
    } else {
        guardrails_render::render_csv(report)
    }
}

pub fn render_annotations(report: &GuardrailsReport, max: usize) -> Vec<String> {
    guardrails_render::render_github_annotations(report)
        .into_iter()
        .take(max)
        .collect()
}

pub fn render_text(report: &GuardrailsReport) -> String {
    guardrails_render::render_text_summary(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::runtime_error_report;

    #[test]
    fn render_annotations_respects_max() {
        let report = runtime_error_report("boom");
        assert_eq!(render_annotations(&report, 5).len(), 1);
        assert!(render_annotations(&report, 0).is_empty());
    }

    #[test]
    fn render_csv_switches_tables() {
        let report = runtime_error_report("boom");
        assert!(render_csv(&report, false).starts_with("rule_id,"));
        assert!(render_csv(&report, true).starts_with("resource_id,"));
    }

    #[test]
    fn render_markdown_and_text_smoke() {
        let report = runtime_error_report("boom");
        assert!(render_markdown(&report).contains("Gate: **FAIL**"));
        assert!(render_text(&report).contains("boom"));
    }
}
