//! Use case orchestration for azure-guardrails.
//!
//! This crate provides the application layer: use cases that coordinate the settings,
//! sources, domain and render layers. It stays thin and delegates the real work.
//!
//! The CLI crate depends on this; it only handles argument parsing and I/O.

#![forbid(unsafe_code)]

mod explain;
mod render;
mod report;
mod rules;
mod scan;
mod validate;

pub use explain::{
    format_code_explanation, format_not_found, format_rule_explanation, run_explain,
    CodeExplanation, ExplainOutput,
};
pub use render::{render_annotations, render_csv, render_markdown, render_text};
pub use report::{parse_report_json, runtime_error_report, serialize_report};
pub use rules::{format_rules_text, run_list_rules, ListRulesFilter, RuleSummary};
pub use scan::{gate_exit_code, run_scan, ScanInput, ScanOutput};
pub use validate::{run_validate, ValidateInput, ValidateOutput};
