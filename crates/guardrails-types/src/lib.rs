//! Stable DTOs and IDs used across the azure-guardrails workspace.
//!
//! This crate is intentionally boring:
//! - data types for the emitted compliance report
//! - the ordered severity scale and verdict dispositions
//! - stable string IDs and detail codes
//! - canonical property path handling

#![forbid(unsafe_code)]

pub mod ids;
pub mod path;
pub mod report;

pub use path::{PathError, PathSegment, PropertyPath};
pub use report::{
    Disposition, DispositionCounts, ExemptionMatch, Gate, GateStatus, GuardrailsReport, KindStats,
    MatchTier, Outcome, ResourceGroup, RuleGroup, RunMeta, ScanData, Severity, SeverityBreakdown,
    Summary, ToolMeta, VerdictDetail, VerdictRecord, SCHEMA_REPORT_V1,
};
