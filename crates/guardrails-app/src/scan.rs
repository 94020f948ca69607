//! The `scan` use case: load inputs, evaluate the catalog and produce a report.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use guardrails_domain::report::ComplianceReport;
use guardrails_domain::CancelToken;
use guardrails_settings::{Overrides, ResolvedConfig};
use guardrails_types::{
    ids, Gate, GateStatus, GuardrailsReport, RunMeta, ScanData, ToolMeta, SCHEMA_REPORT_V1,
};
use time::{Date, OffsetDateTime};

/// Input for the scan use case.
#[derive(Clone, Debug)]
pub struct ScanInput<'a> {
    /// Resource export files or directories of them.
    pub inputs: &'a [Utf8PathBuf],
    /// Config file contents (empty string if not found).
    pub config_text: &'a str,
    /// Directory the config file lives in; config-relative paths resolve against it.
    pub config_dir: Option<&'a Utf8Path>,
    /// Rule catalog path; wins over the config file. Built-in baseline when neither is set.
    pub catalog: Option<&'a Utf8Path>,
    /// Exemption list path; wins over the config file.
    pub exemptions: Option<&'a Utf8Path>,
    /// CLI overrides.
    pub overrides: Overrides,
    /// Evaluation date for exemption expiry; today (UTC) when absent.
    pub as_of: Option<Date>,
    pub cancel: CancelToken,
}

/// Output from the scan use case.
#[derive(Clone, Debug)]
pub struct ScanOutput {
    pub report: GuardrailsReport,
    /// The resolved configuration used.
    pub resolved_config: ResolvedConfig,
}

/// Run the scan use case: parse config, load sources, evaluate, build the report.
pub fn run_scan(input: ScanInput<'_>) -> anyhow::Result<ScanOutput> {
    let started_at = OffsetDateTime::now_utc();

    // Parse config (empty is allowed, defaults apply).
    let cfg = if input.config_text.trim().is_empty() {
        guardrails_settings::GuardrailsConfigV1::default()
    } else {
        guardrails_settings::parse_config_toml(input.config_text).context("parse config")?
    };

    let resolved = guardrails_settings::resolve_config(cfg, input.overrides.clone())
        .context("resolve config")?;
    let effective = &resolved.effective;

    let catalog_path = pick_path(input.catalog, resolved.catalog.as_deref(), input.config_dir);
    let exemptions_path =
        pick_path(input.exemptions, resolved.exemptions.as_deref(), input.config_dir);

    let catalog = guardrails_sources::load_catalog(catalog_path.as_deref())
        .context("load rule catalog")?;
    let catalog = catalog
        .filtered(&effective.catalog)
        .context("apply catalog selection")?;
    let exemptions = guardrails_sources::load_exemptions(exemptions_path.as_deref())
        .context("load exemptions")?;
    let resources =
        guardrails_sources::load_resources(input.inputs).context("load resources")?;

    let as_of = input.as_of.unwrap_or_else(|| started_at.date());
    let opts = effective.evaluation_options(as_of);

    tracing::info!(
        profile = %effective.profile,
        execution = ?effective.execution,
        catalog = catalog.name(),
        rules = catalog.len(),
        exemptions = exemptions.len(),
        resources = resources.len(),
        "starting scan"
    );

    let evaluation =
        guardrails_domain::evaluate(&resources, &catalog, &exemptions, &opts, &input.cancel)
            .context("evaluate rules")?;
    let compliance = ComplianceReport::build(evaluation, &resources, &catalog);
    let gate = compliance.gate(effective.fail_on);

    let ended_at = OffsetDateTime::now_utc();
    let duration_ms = (ended_at - started_at).whole_milliseconds().max(0) as u64;

    let report = GuardrailsReport {
        schema: SCHEMA_REPORT_V1.to_string(),
        tool: tool_meta(),
        run: RunMeta {
            started_at,
            ended_at,
            duration_ms,
            as_of: guardrails_domain::exemption::format_date(as_of),
        },
        gate,
        summary: compliance.summary().clone(),
        by_severity: compliance.by_severity().to_vec(),
        by_kind: compliance.by_kind().to_vec(),
        by_resource: compliance.by_resource().to_vec(),
        by_rule: compliance.by_rule().to_vec(),
        verdicts: compliance.verdicts().to_vec(),
        data: ScanData {
            profile: effective.profile.clone(),
            catalog: catalog.name().to_string(),
            not_applicable: effective.not_applicable.as_str().to_string(),
            resources_loaded: resources.len() as u32,
            resources_evaluated: compliance.resources_evaluated() as u32,
            rules_loaded: catalog.len() as u32,
            exemptions_loaded: exemptions.len() as u32,
            complete: compliance.is_complete(),
        },
    };

    Ok(ScanOutput {
        report,
        resolved_config: resolved,
    })
}

/// Map the gate to an exit code: 0 = pass, 2 = fail.
pub fn gate_exit_code(gate: &Gate) -> i32 {
    match gate.status {
        GateStatus::Pass => 0,
        GateStatus::Fail => 2,
    }
}

pub(crate) fn tool_meta() -> ToolMeta {
    ToolMeta {
        name: ids::TOOL_NAME.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

fn pick_path(
    cli: Option<&Utf8Path>,
    from_config: Option<&str>,
    config_dir: Option<&Utf8Path>,
) -> Option<Utf8PathBuf> {
    if let Some(p) = cli {
        return Some(p.to_path_buf());
    }
    let raw = Utf8Path::new(from_config?);
    match config_dir {
        Some(dir) if raw.is_relative() => Some(dir.join(raw)),
        _ => Some(raw.to_path_buf()),
    }
}
