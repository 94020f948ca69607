//! Rendering utilities for CI surfaces (Markdown, CSV, GitHub annotations, terminal text).
//!
//! Every renderer is a pure function of a `GuardrailsReport`; output order follows the
//! report's own ordering.

#![forbid(unsafe_code)]

mod csv;
mod gha;
mod markdown;
mod text;

#[cfg(test)]
mod fixtures;

pub use csv::{render_csv, render_verdicts_csv};
pub use gha::render_github_annotations;
pub use markdown::render_markdown;
pub use text::render_text_summary;

use guardrails_types::Severity;

/// Upper-case severity label used across human renderers.
fn severity_label(sev: Severity) -> &'static str {
    match sev {
        Severity::Critical => "CRITICAL",
        Severity::High => "HIGH",
        Severity::Medium => "MEDIUM",
        Severity::Low => "LOW",
    }
}

fn format_rate(rate: Option<f64>) -> String {
    match rate {
        Some(r) => format!("{:.1}%", r * 100.0),
        None => "n/a".to_string(),
    }
}
