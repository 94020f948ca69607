use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

/// Stable schema identifier for azure-guardrails reports.
pub const SCHEMA_REPORT_V1: &str = "azure-guardrails.report.v1";

/// Rule severity. Declaration order is the severity order: `low < medium < high < critical`.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All severities from most to least severe (report display order).
    pub const DESCENDING: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" | "med" | "moderate" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(format!(
                "unknown severity: {other} (expected low|medium|high|critical)"
            )),
        }
    }
}

/// The underlying compliance fact for one (resource, rule) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Pass,
    Fail,
    NotApplicable,
    Error,
}

/// What the report does with the fact. Exemptions change the disposition, never the outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Pass,
    Fail,
    NotApplicable,
    Exempted,
    Error,
}

impl Disposition {
    pub fn as_str(self) -> &'static str {
        match self {
            Disposition::Pass => "pass",
            Disposition::Fail => "fail",
            Disposition::NotApplicable => "not_applicable",
            Disposition::Exempted => "exempted",
            Disposition::Error => "error",
        }
    }
}

impl From<Outcome> for Disposition {
    fn from(value: Outcome) -> Self {
        match value {
            Outcome::Pass => Disposition::Pass,
            Outcome::Fail => Disposition::Fail,
            Outcome::NotApplicable => Disposition::NotApplicable,
            Outcome::Error => Disposition::Error,
        }
    }
}

/// Which precedence tier an exemption matched on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    ExactRule,
    ExactAllRules,
    PatternRule,
    PatternAllRules,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ExemptionMatch {
    pub tier: MatchTier,
    /// Resource selector as written in the exemption list (id or pattern).
    pub resource: String,
    /// Rule selector as written (`all` for every rule).
    pub rule: String,
    pub justification: String,
    /// Inclusive expiry date, `YYYY-MM-DD`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
}

/// Evaluation evidence: which property produced the result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VerdictDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<JsonValue>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct VerdictRecord {
    pub resource_id: String,
    pub resource_kind: String,
    pub rule_id: String,
    pub severity: Severity,
    pub outcome: Outcome,
    pub disposition: Disposition,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<VerdictDetail>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub exemption: Option<ExemptionMatch>,

    /// Stable identifier intended for dedup and drift tracking:
    /// SHA-256 over the length-prefixed `rule_id` and lower-cased `resource_id`.
    pub fingerprint: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct DispositionCounts {
    pub pass: u32,
    pub fail: u32,
    pub exempted: u32,
    pub not_applicable: u32,
    pub error: u32,
    pub total: u32,
}

impl DispositionCounts {
    pub fn record(&mut self, disposition: Disposition) {
        match disposition {
            Disposition::Pass => self.pass += 1,
            Disposition::Fail => self.fail += 1,
            Disposition::Exempted => self.exempted += 1,
            Disposition::NotApplicable => self.not_applicable += 1,
            Disposition::Error => self.error += 1,
        }
        self.total += 1;
    }

    /// Verdicts that were actually assessed against a rule.
    pub fn assessed(&self) -> u32 {
        self.total - self.not_applicable
    }

    /// `pass / assessed`, rounded to four decimals. `None` when nothing was assessed.
    pub fn pass_rate(&self) -> Option<f64> {
        let assessed = self.assessed();
        if assessed == 0 {
            return None;
        }
        let raw = f64::from(self.pass) / f64::from(assessed);
        Some((raw * 10_000.0).round() / 10_000.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Summary {
    #[serde(flatten)]
    pub counts: DispositionCounts,
    pub assessed: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass_rate: Option<f64>,
}

impl From<DispositionCounts> for Summary {
    fn from(counts: DispositionCounts) -> Self {
        Summary {
            assessed: counts.assessed(),
            pass_rate: counts.pass_rate(),
            counts,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SeverityBreakdown {
    pub severity: Severity,
    pub counts: DispositionCounts,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct KindStats {
    pub kind: String,
    pub resources: u32,
    pub counts: DispositionCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pass_rate: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResourceGroup {
    pub resource_id: String,
    pub kind: String,
    /// Indices into `GuardrailsReport::verdicts`.
    pub verdicts: Vec<u32>,
    pub counts: DispositionCounts,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RuleGroup {
    pub rule_id: String,
    pub severity: Severity,
    /// Indices into `GuardrailsReport::verdicts`.
    pub verdicts: Vec<u32>,
    pub counts: DispositionCounts,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum GateStatus {
    Pass,
    Fail,
}

/// CI gate decision derived from the verdicts and the configured threshold.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Gate {
    pub status: GateStatus,
    /// `None` means the gate never fails on verdicts (audit mode).
    #[serde(default)]
    pub fail_on: Option<Severity>,
    #[serde(default)]
    pub reasons: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ToolMeta {
    pub name: String,
    pub version: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RunMeta {
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[schemars(with = "String")]
    #[serde(with = "time::serde::rfc3339")]
    pub ended_at: OffsetDateTime,
    pub duration_ms: u64,
    /// Evaluation date used for exemption expiry, `YYYY-MM-DD`.
    pub as_of: String,
}

/// Scan-level summary payload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
pub struct ScanData {
    pub profile: String,
    pub catalog: String,
    pub not_applicable: String,

    pub resources_loaded: u32,
    pub resources_evaluated: u32,
    pub rules_loaded: u32,
    pub exemptions_loaded: u32,

    /// `false` when the scan was cancelled before every resource was evaluated.
    pub complete: bool,
}

/// The terminal output artifact of a scan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct GuardrailsReport {
    /// Versioned schema identifier for the report shape.
    pub schema: String,
    pub tool: ToolMeta,
    pub run: RunMeta,
    pub gate: Gate,
    pub summary: Summary,
    pub by_severity: Vec<SeverityBreakdown>,
    pub by_kind: Vec<KindStats>,
    pub by_resource: Vec<ResourceGroup>,
    pub by_rule: Vec<RuleGroup>,
    pub verdicts: Vec<VerdictRecord>,
    pub data: ScanData,
}
