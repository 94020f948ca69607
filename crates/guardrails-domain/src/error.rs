use thiserror::Error;

/// Error taxonomy for loading and evaluating guardrails.
///
/// Loader and catalog errors are fatal to a scan. `RuleEvaluation` is recorded as an
/// `error` verdict unless the scan runs with `ErrorPolicy::Abort`.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GuardrailError {
    #[error("malformed resource at {location}: {reason}")]
    MalformedResource { location: String, reason: String },

    #[error("duplicate rule id '{id}'")]
    DuplicateRule { id: String },

    #[error("invalid rule '{id}': {reason}")]
    InvalidRule { id: String, reason: String },

    #[error("rule '{rule_id}' could not be evaluated against '{resource_id}': {reason}")]
    RuleEvaluation {
        rule_id: String,
        resource_id: String,
        reason: String,
    },

    #[error("invalid exemption #{index}: {reason}")]
    ExemptionParse { index: usize, reason: String },
}

impl GuardrailError {
    pub fn malformed(location: impl Into<String>, reason: impl Into<String>) -> Self {
        GuardrailError::MalformedResource {
            location: location.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_rule(id: impl Into<String>, reason: impl Into<String>) -> Self {
        GuardrailError::InvalidRule {
            id: id.into(),
            reason: reason.into(),
        }
    }
}
