//! Config parsing and profile/preset resolution.
//!
//! This crate is IO-free: it parses and resolves configuration provided as strings.

#![forbid(unsafe_code)]

mod model;
mod presets;
mod resolve;

pub use model::{GuardrailsConfigV1, RuleConfig, ServicesConfig};
pub use presets::PROFILES;
pub use resolve::{Overrides, ResolvedConfig};

/// Parse `guardrails.toml` into a typed model.
pub fn parse_config_toml(input: &str) -> anyhow::Result<GuardrailsConfigV1> {
    let cfg: GuardrailsConfigV1 = toml::from_str(input)?;
    Ok(cfg)
}

/// Resolve the effective config used by the engine (profile + config file + overrides).
pub fn resolve_config(
    cfg: GuardrailsConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    resolve::resolve_config(cfg, overrides)
}
