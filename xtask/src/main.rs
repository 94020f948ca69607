//! Developer tasks (schema generation, catalog checks, report conformance).
//!
//! Keeping this separate avoids bloating the end-user CLI.

use anyhow::{Context, bail};
use guardrails_domain::model::ResourceKind;
use guardrails_test_util::normalize_nondeterministic;
use schemars::schema_for;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the project root (parent of xtask directory).
fn project_root() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .or_else(|_| std::env::current_dir())
        .unwrap_or_else(|_| PathBuf::from("."));

    if manifest_dir.ends_with("xtask") {
        manifest_dir
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or(manifest_dir)
    } else {
        manifest_dir
    }
}

fn schemas_dir() -> PathBuf {
    project_root().join("schemas")
}

/// Schema definition with its target filename.
struct SchemaSpec {
    filename: &'static str,
    generate: fn() -> schemars::Schema,
}

fn generate_report_schema() -> schemars::Schema {
    schema_for!(guardrails_types::GuardrailsReport)
}

fn generate_config_schema() -> schemars::Schema {
    schema_for!(guardrails_settings::GuardrailsConfigV1)
}

fn schema_specs() -> Vec<SchemaSpec> {
    vec![
        SchemaSpec {
            filename: "azure-guardrails.report.v1.json",
            generate: generate_report_schema,
        },
        SchemaSpec {
            filename: "azure-guardrails.config.v1.json",
            generate: generate_config_schema,
        },
    ]
}

/// Serialize a schema to pretty-printed JSON with trailing newline.
fn serialize_schema(schema: &schemars::Schema) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(schema).context("Failed to serialize schema")?;
    json.push('\n');
    Ok(json)
}

/// Emit schemas to the schemas/ directory.
fn emit_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir();
    fs::create_dir_all(&dir).context("Failed to create schemas directory")?;

    for spec in schema_specs() {
        let json = serialize_schema(&(spec.generate)())?;
        let path = dir.join(spec.filename);
        fs::write(&path, &json)
            .with_context(|| format!("Failed to write schema to {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    println!("\nSchemas emitted successfully.");
    Ok(())
}

/// Check that schemas in the repo match what would be generated.
fn validate_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir();
    let mut missing = Vec::new();
    let mut mismatched = Vec::new();

    for spec in schema_specs() {
        let path = dir.join(spec.filename);
        if !path.exists() {
            missing.push(spec.filename);
            continue;
        }

        let expected = serialize_schema(&(spec.generate)())?;
        let actual = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if expected != actual {
            mismatched.push(spec.filename);
        }
    }

    if missing.is_empty() && mismatched.is_empty() {
        println!("All schemas are up to date.");
        return Ok(());
    }

    if !missing.is_empty() {
        eprintln!("Missing schemas:");
        for name in &missing {
            eprintln!("  - {}", name);
        }
    }
    if !mismatched.is_empty() {
        eprintln!("Schemas out of date:");
        for name in &mismatched {
            eprintln!("  - {}", name);
        }
    }
    eprintln!("\nRun `cargo xtask emit-schemas` to regenerate.");
    bail!("Schema validation failed")
}

fn print_help() {
    eprintln!("xtask commands:");
    eprintln!("  help              Show this message");
    eprintln!("  emit-schemas      Generate JSON schemas from Rust types to schemas/");
    eprintln!("  validate-schemas  Check if schemas/ matches generated output (for CI)");
    eprintln!("  print-schema-ids  Print known schema IDs");
    eprintln!("  catalog-coverage  Check the built-in rule catalog for guidance and kind coverage");
    eprintln!("  conform           Scan tests/fixtures/ and validate every report against the schema");
}

/// Token pattern for gate reasons and detail codes.
fn is_valid_token(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Check the built-in catalog: every rule documented, every known kind targeted.
fn catalog_coverage() -> anyhow::Result<()> {
    let catalog = guardrails_sources::builtin_catalog().context("load built-in catalog")?;
    let mut errors = Vec::new();
    let mut targeted = BTreeSet::new();

    for rule in catalog.rules() {
        if rule.title.is_empty() {
            errors.push(format!("Rule '{}' has empty title", rule.id));
        }
        if rule.description.is_empty() {
            errors.push(format!("Rule '{}' has empty description", rule.id));
        }
        if rule.remediation.is_empty() {
            errors.push(format!("Rule '{}' has empty remediation", rule.id));
        }
        if rule.service.is_none() {
            errors.push(format!("Rule '{}' has no service category", rule.id));
        }
        for kind in &rule.applies_to {
            if !kind.is_known() {
                errors.push(format!("Rule '{}' targets unknown kind '{}'", rule.id, kind));
            }
            targeted.insert(kind.clone());
        }
    }

    let untargeted: Vec<&ResourceKind> = ResourceKind::KNOWN
        .iter()
        .filter(|k| !targeted.contains(*k))
        .collect();

    if !errors.is_empty() {
        for error in &errors {
            eprintln!("  - {}", error);
        }
        bail!("Catalog coverage failed with {} errors", errors.len());
    }

    println!(
        "✓ {} rules in '{}' carry title, description and remediation",
        catalog.len(),
        catalog.name()
    );
    println!(
        "✓ {} of {} known resource kinds are targeted",
        ResourceKind::KNOWN.len() - untargeted.len(),
        ResourceKind::KNOWN.len()
    );
    for kind in untargeted {
        println!("  (no rules) {}", kind);
    }
    Ok(())
}

fn guardrails_binary() -> anyhow::Result<PathBuf> {
    let bin = project_root()
        .join("target")
        .join("debug")
        .join("azure-guardrails");

    #[cfg(target_os = "windows")]
    let bin = bin.with_extension("exe");

    if !bin.exists() {
        bail!(
            "azure-guardrails binary not found at {}.\n\
            Run `cargo build -p guardrails-cli` first.",
            bin.display()
        );
    }
    Ok(bin)
}

/// Check one emitted report against the compiled schema plus token hygiene.
fn check_report(
    name: &str,
    report: &serde_json::Value,
    validator: &jsonschema::Validator,
    errors: &mut Vec<String>,
) {
    for err in validator.iter_errors(report) {
        errors.push(format!("fixture '{}': schema validation: {}", name, err));
    }

    if let Some(reasons) = report
        .get("gate")
        .and_then(|g| g.get("reasons"))
        .and_then(|r| r.as_array())
    {
        for (i, reason) in reasons.iter().enumerate() {
            if let Some(s) = reason.as_str()
                && !is_valid_token(s)
            {
                errors.push(format!(
                    "fixture '{}': gate.reasons[{}] '{}' is not a valid token",
                    name, i, s
                ));
            }
        }
    }

    if let Some(verdicts) = report.get("verdicts").and_then(|v| v.as_array()) {
        for (i, verdict) in verdicts.iter().enumerate() {
            if let Some(code) = verdict
                .get("detail")
                .and_then(|d| d.get("code"))
                .and_then(|c| c.as_str())
                && !is_valid_token(code)
            {
                errors.push(format!(
                    "fixture '{}': verdicts[{}].detail.code '{}' is not a valid token",
                    name, i, code
                ));
            }
        }
    }
}

/// Run the built binary on every fixture under tests/fixtures/ and validate its report.
///
/// A fixture directory needs `resources.json`; `rules.toml` and `guardrails.toml` are
/// passed along when present. An `expected.report.json` golden file is compared after
/// normalizing timestamps and the tool version.
fn conform() -> anyhow::Result<()> {
    let schema = serde_json::to_value(generate_report_schema())
        .context("Failed to serialize report schema")?;
    let validator = jsonschema::validator_for(&schema)
        .map_err(|e| anyhow::anyhow!("Failed to compile schema: {}", e))?;
    println!("✓ azure-guardrails.report.v1 schema compiles");

    let bin = guardrails_binary()?;
    let fixtures_dir = project_root().join("tests").join("fixtures");
    let mut errors = Vec::new();
    let mut count = 0;

    let mut entries: Vec<PathBuf> = fs::read_dir(&fixtures_dir)
        .context("Failed to read tests/fixtures/")?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.join("resources.json").exists())
        .collect();
    entries.sort();

    for fixture_dir in entries {
        let name = fixture_dir
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        let temp_dir = tempfile::tempdir().context("Failed to create temp dir")?;
        let report_out = temp_dir.path().join("report.json");

        let mut cmd = std::process::Command::new(&bin);
        cmd.current_dir(temp_dir.path())
            .arg("scan")
            .arg(fixture_dir.join("resources.json"))
            .args(["--as-of", "2026-01-15", "--quiet", "--out"])
            .arg(&report_out);
        if fixture_dir.join("rules.toml").exists() {
            cmd.arg("--catalog").arg(fixture_dir.join("rules.toml"));
        }
        if fixture_dir.join("guardrails.toml").exists() {
            cmd.arg("--config").arg(fixture_dir.join("guardrails.toml"));
        }

        let output = cmd
            .output()
            .with_context(|| format!("Failed to run azure-guardrails on fixture '{}'", name))?;

        if !report_out.exists() {
            errors.push(format!(
                "fixture '{}': no report written (exit {:?}): {}",
                name,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            ));
            continue;
        }

        let content = fs::read_to_string(&report_out)?;
        let report: serde_json::Value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse report for fixture '{}'", name))?;
        check_report(&name, &report, &validator, &mut errors);

        let golden_path = fixture_dir.join("expected.report.json");
        if golden_path.exists() {
            let golden: serde_json::Value = serde_json::from_str(&fs::read_to_string(&golden_path)?)
                .with_context(|| format!("Failed to parse golden file for '{}'", name))?;
            if normalize_nondeterministic(report) != normalize_nondeterministic(golden) {
                errors.push(format!(
                    "fixture '{}': output differs from expected.report.json",
                    name
                ));
                continue;
            }
            println!("  ✓ fixture '{}' matches golden report", name);
        } else {
            println!(
                "  ✓ fixture '{}' produces a valid report (exit {:?})",
                name,
                output.status.code()
            );
        }
        count += 1;
    }

    if !errors.is_empty() {
        eprintln!("\nConformance errors:");
        for err in &errors {
            eprintln!("  - {}", err);
        }
        bail!("Conformance validation failed with {} errors", errors.len());
    }
    if count == 0 {
        bail!("No fixtures with resources.json found in {}", fixtures_dir.display());
    }

    println!("\n✓ All {} fixtures pass conformance checks!", count);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match cmd {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "emit-schemas" => emit_schemas(),
        "validate-schemas" => validate_schemas(),
        "catalog-coverage" => catalog_coverage(),
        "conform" => conform(),
        "print-schema-ids" => {
            println!("{}", guardrails_types::ids::SCHEMA_RULES_V1);
            println!("{}", guardrails_types::ids::SCHEMA_EXEMPTIONS_V1);
            for spec in schema_specs() {
                println!("{}", spec.filename.trim_end_matches(".json"));
            }
            Ok(())
        }
        other => bail!("unknown xtask command: {other}\n\nRun `cargo xtask help` for usage."),
    }
    .context("xtask failed")
}
