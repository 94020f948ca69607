use guardrails_domain::policy::{
    CatalogPolicy, EffectiveConfig, ErrorPolicy, Execution, NotApplicableMode,
};
use guardrails_types::Severity;

pub const PROFILES: [&str; 3] = ["strict", "standard", "audit"];

/// Preset profiles. `None` for an unknown name.
///
/// Keep these small and readable. Anything complex belongs in `guardrails.toml`.
pub fn preset(profile: &str) -> Option<EffectiveConfig> {
    let fail_on = match profile {
        "strict" => Some(Severity::Low),
        "standard" => Some(Severity::High),
        "audit" => None,
        _ => return None,
    };
    Some(EffectiveConfig {
        profile: profile.to_string(),
        fail_on,
        not_applicable: NotApplicableMode::Omit,
        execution: Execution::Sequential,
        on_error: ErrorPolicy::Record,
        catalog: CatalogPolicy::default(),
    })
}
