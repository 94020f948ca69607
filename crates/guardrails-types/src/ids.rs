//! Stable identifiers for schemas, reserved keywords and verdict detail codes.
//!
//! Detail codes are short snake_case discriminators carried in `VerdictDetail::code`.

pub const TOOL_NAME: &str = "azure-guardrails";

// Schemas
pub const SCHEMA_CONFIG_V1: &str = "azure-guardrails.config.v1";
pub const SCHEMA_RULES_V1: &str = "azure-guardrails.rules.v1";
pub const SCHEMA_EXEMPTIONS_V1: &str = "azure-guardrails.exemptions.v1";

/// Exemption rule selector matching every rule.
pub const ALL_RULES: &str = "all";

// Detail codes
pub const CODE_CONDITION_FAILED: &str = "condition_failed";
pub const CODE_PROPERTY_MISSING: &str = "property_missing";
pub const CODE_TYPE_MISMATCH: &str = "type_mismatch";
pub const CODE_NOT_APPLICABLE: &str = "not_applicable";

// Gate reasons
pub const REASON_FAILED_AT_THRESHOLD: &str = "failed_at_threshold";
pub const REASON_ERRORS_AT_THRESHOLD: &str = "errors_at_threshold";
pub const REASON_SCAN_INCOMPLETE: &str = "scan_incomplete";
pub const REASON_RUNTIME_ERROR: &str = "runtime_error";

// Tool-level
pub const RULE_TOOL_RUNTIME: &str = "tool.runtime";
