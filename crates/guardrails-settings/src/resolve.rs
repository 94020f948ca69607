use crate::{model::GuardrailsConfigV1, presets};
use anyhow::Context;
use guardrails_domain::policy::{
    CatalogPolicy, EffectiveConfig, ErrorPolicy, Execution, NotApplicableMode, RulePolicy,
};
use guardrails_types::{ids, Severity};

/// Command-line overrides; they win over the config file.
#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub profile: Option<String>,
    pub fail_on: Option<String>,
    pub not_applicable: Option<String>,
    pub parallel: Option<bool>,
    pub on_error: Option<String>,
    /// Replace the config's service lists when non-empty.
    pub include_services: Vec<String>,
    pub exclude_services: Vec<String>,
    pub only_rules: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct ResolvedConfig {
    pub effective: EffectiveConfig,
    /// Paths as written in the config file (relative to it).
    pub catalog: Option<String>,
    pub exemptions: Option<String>,
}

pub fn resolve_config(
    cfg: GuardrailsConfigV1,
    overrides: Overrides,
) -> anyhow::Result<ResolvedConfig> {
    if let Some(schema) = cfg.schema.as_deref()
        && schema != ids::SCHEMA_CONFIG_V1
    {
        anyhow::bail!(
            "unsupported config schema: {schema} (expected {})",
            ids::SCHEMA_CONFIG_V1
        );
    }

    let profile = overrides
        .profile
        .clone()
        .or(cfg.profile.clone())
        .unwrap_or_else(|| "standard".to_string());

    let mut effective = presets::preset(&profile).with_context(|| {
        format!(
            "unknown profile: {profile} (expected {})",
            presets::PROFILES.join("|")
        )
    })?;

    if let Some(v) = overrides.fail_on.as_deref().or(cfg.fail_on.as_deref()) {
        effective.fail_on = parse_fail_on(v)?;
    }

    if let Some(v) = overrides
        .not_applicable
        .as_deref()
        .or(cfg.not_applicable.as_deref())
    {
        effective.not_applicable = parse_not_applicable(v)?;
    }

    if let Some(parallel) = overrides.parallel.or(cfg.parallel) {
        effective.execution = if parallel {
            Execution::Parallel
        } else {
            Execution::Sequential
        };
    }

    if let Some(v) = overrides.on_error.as_deref().or(cfg.on_error.as_deref()) {
        effective.on_error = parse_on_error(v)?;
    }

    effective.catalog = CatalogPolicy {
        include_services: pick(&overrides.include_services, &cfg.services.include),
        exclude_services: pick(&overrides.exclude_services, &cfg.services.exclude),
        only_rules: overrides.only_rules.clone(),
        ..CatalogPolicy::default()
    };

    // per-rule overrides
    for (rule_id, rc) in cfg.rules.iter() {
        let severity = rc
            .severity
            .as_deref()
            .map(|s| s.parse::<Severity>().map_err(anyhow::Error::msg))
            .transpose()
            .with_context(|| format!("invalid severity for {rule_id}"))?;
        effective.catalog.rules.insert(
            rule_id.clone(),
            RulePolicy {
                enabled: rc.enabled,
                severity,
            },
        );
    }

    Ok(ResolvedConfig {
        effective,
        catalog: cfg.catalog,
        exemptions: cfg.exemptions,
    })
}

fn pick(cli: &[String], file: &[String]) -> Vec<String> {
    let src = if cli.is_empty() { file } else { cli };
    src.iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_fail_on(v: &str) -> anyhow::Result<Option<Severity>> {
    match v.trim().to_ascii_lowercase().as_str() {
        "never" | "none" => Ok(None),
        other => other
            .parse::<Severity>()
            .map(Some)
            .map_err(|_| anyhow::anyhow!("unknown fail_on: {v} (expected low|medium|high|critical|never)")),
    }
}

fn parse_not_applicable(v: &str) -> anyhow::Result<NotApplicableMode> {
    match v.trim().to_ascii_lowercase().as_str() {
        "omit" => Ok(NotApplicableMode::Omit),
        "explicit" => Ok(NotApplicableMode::Explicit),
        _ => anyhow::bail!("unknown not_applicable mode: {v} (expected 'omit' or 'explicit')"),
    }
}

fn parse_on_error(v: &str) -> anyhow::Result<ErrorPolicy> {
    match v.trim().to_ascii_lowercase().as_str() {
        "record" => Ok(ErrorPolicy::Record),
        "abort" => Ok(ErrorPolicy::Abort),
        _ => anyhow::bail!("unknown on_error: {v} (expected 'record' or 'abort')"),
    }
}
