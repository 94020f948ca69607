//! CLI entry point for azure-guardrails.
//!
//! This module is intentionally thin: it handles argument parsing, I/O, logging setup and
//! exit codes. All business logic lives in the `guardrails-app` crate.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use guardrails_app::{
    format_code_explanation, format_not_found, format_rule_explanation, format_rules_text,
    gate_exit_code, parse_report_json, render_annotations, render_csv, render_markdown,
    render_text, run_explain, run_list_rules, run_scan, run_validate, runtime_error_report,
    serialize_report, ExplainOutput, ListRulesFilter, ScanInput, ValidateInput,
};
use guardrails_domain::CancelToken;
use guardrails_settings::Overrides;
use guardrails_types::GuardrailsReport;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "guardrails.toml";
const DEFAULT_REPORT: &str = "artifacts/azure-guardrails/report.json";

#[derive(Parser, Debug)]
#[command(
    name = "azure-guardrails",
    version,
    about = "Guardrail compliance checks for exported Azure resource configurations"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` wins when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate resource exports against the rule catalog and write the report.
    Scan(ScanArgs),

    /// List catalog rules.
    ListRules {
        /// Rule catalog (TOML or JSON). Defaults to the built-in baseline.
        #[arg(long)]
        catalog: Option<Utf8PathBuf>,

        /// Only rules targeting this resource kind (slug or ARM type).
        #[arg(long)]
        kind: Option<String>,

        /// Only rules in this service category.
        #[arg(long)]
        service: Option<String>,

        #[arg(long, value_enum, default_value_t = ListFormat::Text)]
        format: ListFormat,
    },

    /// Validate a rule catalog and/or an exemption list without scanning.
    Validate {
        /// Rule catalog (TOML or JSON). Defaults to the built-in baseline.
        #[arg(long)]
        catalog: Option<Utf8PathBuf>,

        /// Exemption list (TOML or JSON).
        #[arg(long)]
        exemptions: Option<Utf8PathBuf>,

        /// Date used to flag lapsed exemptions (YYYY-MM-DD, default today).
        #[arg(long)]
        as_of: Option<String>,
    },

    /// Show the title, description and remediation of a rule, or document a detail code.
    Explain {
        /// Rule id (e.g. "storage-https-only") or detail code (e.g. "property_missing").
        identifier: String,

        /// Rule catalog to look the rule up in. Defaults to the built-in baseline.
        #[arg(long)]
        catalog: Option<Utf8PathBuf>,
    },

    /// Render Markdown from an existing JSON report.
    Md {
        /// Path to the JSON report file.
        #[arg(long, default_value = DEFAULT_REPORT)]
        report: Utf8PathBuf,

        /// Where to write the Markdown output (if not specified, prints to stdout).
        #[arg(long, short)]
        output: Option<Utf8PathBuf>,
    },

    /// Render the CSV compliance summary from an existing JSON report.
    Csv {
        /// Path to the JSON report file.
        #[arg(long, default_value = DEFAULT_REPORT)]
        report: Utf8PathBuf,

        /// Where to write the CSV output (if not specified, prints to stdout).
        #[arg(long, short)]
        output: Option<Utf8PathBuf>,

        /// Emit one row per verdict instead of one row per rule.
        #[arg(long)]
        verdicts: bool,
    },

    /// Render GitHub Actions annotations from an existing JSON report.
    Annotations {
        /// Path to the JSON report file.
        #[arg(long, default_value = DEFAULT_REPORT)]
        report: Utf8PathBuf,

        /// Maximum number of annotations to emit.
        #[arg(long, default_value = "10")]
        max: usize,
    },
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// Resource export files, or directories searched for `*.json` exports.
    #[arg(required = true)]
    inputs: Vec<Utf8PathBuf>,

    /// Path to the config TOML. A missing `guardrails.toml` is allowed (defaults apply).
    #[arg(long)]
    config: Option<Utf8PathBuf>,

    /// Rule catalog (TOML or JSON). Defaults to the config's catalog, then the built-in baseline.
    #[arg(long)]
    catalog: Option<Utf8PathBuf>,

    /// Exemption list (TOML or JSON).
    #[arg(long)]
    exemptions: Option<Utf8PathBuf>,

    /// Override profile (strict|standard|audit).
    #[arg(long)]
    profile: Option<String>,

    /// Gate threshold (low|medium|high|critical|never).
    #[arg(long)]
    fail_on: Option<String>,

    /// Only evaluate rules in these service categories (comma separated).
    #[arg(long = "service", value_delimiter = ',')]
    services: Vec<String>,

    /// Skip rules in these service categories (comma separated).
    #[arg(long = "exclude-service", value_delimiter = ',')]
    exclude_services: Vec<String>,

    /// Only evaluate these rule ids (comma separated).
    #[arg(long = "rule", value_delimiter = ',')]
    rules: Vec<String>,

    /// Evaluate resources in parallel.
    #[arg(long, conflicts_with = "sequential")]
    parallel: bool,

    /// Evaluate resources one at a time, even if the config enables parallel.
    #[arg(long)]
    sequential: bool,

    /// Not-applicable reporting (omit|explicit).
    #[arg(long)]
    not_applicable: Option<String>,

    /// Evaluation error policy (record|abort).
    #[arg(long)]
    on_error: Option<String>,

    /// Evaluation date for exemption expiry (YYYY-MM-DD, default today).
    #[arg(long)]
    as_of: Option<String>,

    /// Stop evaluating after this many seconds; the report is marked incomplete.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Where to write the JSON report.
    #[arg(long, default_value = DEFAULT_REPORT)]
    out: Utf8PathBuf,

    /// Also write a Markdown report here.
    #[arg(long)]
    md: Option<Utf8PathBuf>,

    /// Also write the CSV compliance summary here.
    #[arg(long)]
    csv: Option<Utf8PathBuf>,

    /// Do not print the text summary.
    #[arg(long, short)]
    quiet: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ListFormat {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.cmd {
        Commands::Scan(args) => cmd_scan(args),
        Commands::ListRules {
            catalog,
            kind,
            service,
            format,
        } => cmd_list_rules(catalog.as_deref(), ListRulesFilter { kind, service }, format),
        Commands::Validate {
            catalog,
            exemptions,
            as_of,
        } => cmd_validate(catalog.as_deref(), exemptions.as_deref(), as_of.as_deref()),
        Commands::Explain {
            identifier,
            catalog,
        } => cmd_explain(&identifier, catalog.as_deref()),
        Commands::Md { report, output } => cmd_md(&report, output.as_deref()),
        Commands::Csv {
            report,
            output,
            verdicts,
        } => cmd_csv(&report, output.as_deref(), verdicts),
        Commands::Annotations { report, max } => cmd_annotations(&report, max),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}

fn cmd_scan(args: ScanArgs) -> anyhow::Result<()> {
    let result = (|| -> anyhow::Result<i32> {
        let (config_text, config_dir) = read_config(args.config.as_deref())?;
        let as_of = args.as_of.as_deref().map(parse_as_of).transpose()?;

        let overrides = Overrides {
            profile: args.profile.clone(),
            fail_on: args.fail_on.clone(),
            not_applicable: args.not_applicable.clone(),
            parallel: if args.sequential {
                Some(false)
            } else {
                args.parallel.then_some(true)
            },
            on_error: args.on_error.clone(),
            include_services: args.services.clone(),
            exclude_services: args.exclude_services.clone(),
            only_rules: args.rules.clone(),
        };

        let cancel = CancelToken::new();
        if let Some(secs) = args.timeout_secs {
            let token = cancel.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_secs(secs));
                tracing::warn!(timeout_secs = secs, "scan deadline reached, cancelling");
                token.cancel();
            });
        }

        let output = run_scan(ScanInput {
            inputs: &args.inputs,
            config_text: &config_text,
            config_dir: config_dir.as_deref(),
            catalog: args.catalog.as_deref(),
            exemptions: args.exemptions.as_deref(),
            overrides,
            as_of,
            cancel,
        })?;
        let report = &output.report;

        write_report_file(&args.out, report).context("write report json")?;
        if let Some(path) = &args.md {
            write_text_file(path, &render_markdown(report)).context("write markdown")?;
        }
        if let Some(path) = &args.csv {
            write_text_file(path, &render_csv(report, false)).context("write csv")?;
        }
        if !args.quiet {
            print!("{}", render_text(report));
        }

        Ok(gate_exit_code(&report.gate))
    })();

    match result {
        Ok(code) => {
            if code != 0 {
                std::process::exit(code);
            }
            Ok(())
        }
        Err(err) => {
            let report = runtime_error_report(&format!("{err:#}"));
            let _ = write_report_file(&args.out, &report);
            eprintln!("azure-guardrails error: {err:#}");
            std::process::exit(1);
        }
    }
}

/// Returns the config text (empty when the default file is absent) and its directory.
fn read_config(explicit: Option<&Utf8Path>) -> anyhow::Result<(String, Option<Utf8PathBuf>)> {
    let path = explicit.unwrap_or(Utf8Path::new(DEFAULT_CONFIG));
    if explicit.is_none() && !path.exists() {
        return Ok((String::new(), None));
    }
    let text = std::fs::read_to_string(path).with_context(|| format!("read config: {path}"))?;
    let dir = path
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .map(Utf8Path::to_path_buf)
        .unwrap_or_else(|| Utf8PathBuf::from("."));
    Ok((text, Some(dir)))
}

fn parse_as_of(raw: &str) -> anyhow::Result<time::Date> {
    guardrails_domain::exemption::parse_date(raw)
        .map_err(|e| anyhow::anyhow!("invalid --as-of {raw:?}: {e}"))
}

fn today() -> time::Date {
    time::OffsetDateTime::now_utc().date()
}

fn cmd_list_rules(
    catalog: Option<&Utf8Path>,
    filter: ListRulesFilter,
    format: ListFormat,
) -> anyhow::Result<()> {
    let catalog = guardrails_sources::load_catalog(catalog)?;
    let rules = run_list_rules(&catalog, &filter);
    match format {
        ListFormat::Text => print!("{}", format_rules_text(&rules)),
        ListFormat::Json => {
            let json = serde_json::to_string_pretty(&rules).context("serialize rules")?;
            println!("{json}");
        }
    }
    Ok(())
}

fn cmd_validate(
    catalog: Option<&Utf8Path>,
    exemptions: Option<&Utf8Path>,
    as_of: Option<&str>,
) -> anyhow::Result<()> {
    let as_of = match as_of {
        Some(raw) => parse_as_of(raw)?,
        None => today(),
    };
    match run_validate(ValidateInput {
        catalog,
        exemptions,
        as_of,
    }) {
        Ok(out) => {
            println!("catalog '{}': {} rules ok", out.catalog, out.rules);
            if let Some(n) = out.exemptions {
                println!("exemptions: {n} entries ok");
            }
            for w in &out.warnings {
                println!("warning: {w}");
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("azure-guardrails error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn cmd_explain(identifier: &str, catalog: Option<&Utf8Path>) -> anyhow::Result<()> {
    let catalog = guardrails_sources::load_catalog(catalog)?;
    match run_explain(&catalog, identifier) {
        ExplainOutput::Rule(rule) => {
            print!("{}", format_rule_explanation(&rule));
            Ok(())
        }
        ExplainOutput::Code(code) => {
            print!("{}", format_code_explanation(&code));
            Ok(())
        }
        ExplainOutput::NotFound {
            identifier,
            available_rules,
            available_codes,
        } => {
            eprint!(
                "{}",
                format_not_found(&identifier, &available_rules, &available_codes)
            );
            std::process::exit(1);
        }
    }
}

fn write_report_file(
    path: &Utf8Path,
    report: &GuardrailsReport,
) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {parent}"))?;
    }
    let data = serialize_report(report).context("serialize report")?;
    std::fs::write(path, data).with_context(|| format!("write report: {path}"))?;
    Ok(())
}

fn write_text_file(path: &Utf8Path, text: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("create directory: {parent}"))?;
    }
    std::fs::write(path, text).with_context(|| format!("write text: {path}"))?;
    Ok(())
}

fn read_report(path: &Utf8Path) -> anyhow::Result<GuardrailsReport> {
    let text = std::fs::read_to_string(path).with_context(|| format!("read report: {path}"))?;
    parse_report_json(&text)
}

fn emit(output: Option<&Utf8Path>, text: &str) -> anyhow::Result<()> {
    match output {
        Some(path) => write_text_file(path, text),
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

fn cmd_md(report: &Utf8Path, output: Option<&Utf8Path>) -> anyhow::Result<()> {
    let report = read_report(report)?;
    emit(output, &render_markdown(&report)).context("write markdown output")
}

fn cmd_csv(report: &Utf8Path, output: Option<&Utf8Path>, verdicts: bool) -> anyhow::Result<()> {
    let report = read_report(report)?;
    emit(output, &render_csv(&report, verdicts)).context("write csv output")
}

fn cmd_annotations(report: &Utf8Path, max: usize) -> anyhow::Result<()> {
    let report = read_report(report)?;
    for annotation in render_annotations(&report, max) {
        println!("{annotation}");
    }
    Ok(())
}
