use guardrails_types::Severity;
use std::collections::BTreeMap;
use time::Date;

/// How pairs whose rule does not target the resource kind appear in the verdict list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NotApplicableMode {
    /// Skipped entirely.
    #[default]
    Omit,
    /// Emitted as exactly `not_applicable`.
    Explicit,
}

impl NotApplicableMode {
    pub fn as_str(self) -> &'static str {
        match self {
            NotApplicableMode::Omit => "omit",
            NotApplicableMode::Explicit => "explicit",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Execution {
    #[default]
    Sequential,
    Parallel,
}

/// What the engine does with a per-pair `RuleEvaluation` error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    #[default]
    Record,
    Abort,
}

#[derive(Clone, Debug)]
pub struct EvaluationOptions {
    /// Exemptions expiring before this date are lapsed.
    pub as_of: Date,
    pub not_applicable: NotApplicableMode,
    pub execution: Execution,
    pub on_error: ErrorPolicy,
}

impl EvaluationOptions {
    pub fn new(as_of: Date) -> Self {
        Self {
            as_of,
            not_applicable: NotApplicableMode::default(),
            execution: Execution::default(),
            on_error: ErrorPolicy::default(),
        }
    }
}

/// Per-rule override from configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RulePolicy {
    pub enabled: Option<bool>,
    pub severity: Option<Severity>,
}

/// Catalog narrowing derived from configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CatalogPolicy {
    /// When non-empty, only rules of these services are kept (case-insensitive).
    pub include_services: Vec<String>,
    pub exclude_services: Vec<String>,
    /// When non-empty, only these rule ids are kept.
    pub only_rules: Vec<String>,
    pub rules: BTreeMap<String, RulePolicy>,
}

impl CatalogPolicy {
    pub fn is_noop(&self) -> bool {
        self.include_services.is_empty()
            && self.exclude_services.is_empty()
            && self.only_rules.is_empty()
            && self.rules.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct EffectiveConfig {
    pub profile: String,
    /// `None` means the gate never fails on verdicts.
    pub fail_on: Option<Severity>,
    pub not_applicable: NotApplicableMode,
    pub execution: Execution,
    pub on_error: ErrorPolicy,
    pub catalog: CatalogPolicy,
}

impl EffectiveConfig {
    pub fn evaluation_options(&self, as_of: Date) -> EvaluationOptions {
        EvaluationOptions {
            as_of,
            not_applicable: self.not_applicable,
            execution: self.execution,
            on_error: self.on_error,
        }
    }
}
