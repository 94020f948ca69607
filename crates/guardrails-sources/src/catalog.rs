use crate::format::{parse_document, SourceFormat};
use anyhow::Context;
use guardrails_domain::catalog::{RuleCatalog, RuleSpec};
use guardrails_domain::exemption::{ExemptionSet, ExemptionSpec};
use guardrails_domain::GuardrailError;
use guardrails_types::ids;
use serde_json::Value;

/// Name of the catalog compiled into the binary.
pub const BUILTIN_CATALOG_NAME: &str = "azure-baseline";

const BUILTIN_CATALOG: &str = include_str!("../rules/azure-baseline.toml");

/// The built-in baseline catalog, parsed fresh on every call.
pub fn builtin_catalog() -> anyhow::Result<RuleCatalog> {
    parse_catalog(BUILTIN_CATALOG, SourceFormat::Toml, BUILTIN_CATALOG_NAME)
        .context("parse built-in catalog")
}

/// The raw text of the built-in catalog.
pub fn builtin_catalog_source() -> &'static str {
    BUILTIN_CATALOG
}

/// Parse a rule catalog document (`[[rules]]` tables, `{"rules": [...]}` or a bare JSON array).
pub fn parse_catalog(text: &str, format: SourceFormat, name: &str) -> anyhow::Result<RuleCatalog> {
    let doc = parse_document(text, format)?;
    let entries = document_list(doc, "rules", ids::SCHEMA_RULES_V1)?;

    let mut specs = Vec::with_capacity(entries.len());
    for (i, entry) in entries.into_iter().enumerate() {
        let id = entry
            .get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{i}"));
        let spec: RuleSpec = serde_json::from_value(entry)
            .map_err(|e| GuardrailError::invalid_rule(id, e.to_string()))?;
        specs.push(spec);
    }

    let catalog = RuleCatalog::from_specs(name, specs)?;
    tracing::debug!(catalog = name, rules = catalog.len(), "rule catalog loaded");
    Ok(catalog)
}

/// Parse an exemption list document (`[[exemptions]]` tables or JSON).
pub fn parse_exemptions(text: &str, format: SourceFormat) -> anyhow::Result<ExemptionSet> {
    let doc = parse_document(text, format)?;
    let entries = document_list(doc, "exemptions", ids::SCHEMA_EXEMPTIONS_V1)?;

    let mut specs = Vec::with_capacity(entries.len());
    for (index, entry) in entries.into_iter().enumerate() {
        let spec: ExemptionSpec = serde_json::from_value(entry)
            .map_err(|e| GuardrailError::ExemptionParse {
                index,
                reason: e.to_string(),
            })?;
        specs.push(spec);
    }

    let set = ExemptionSet::from_specs(specs)?;
    tracing::debug!(exemptions = set.len(), "exemption list loaded");
    Ok(set)
}

/// Extract the entry list from `{ schema?, <key>: [...] }` or a bare array.
fn document_list(doc: Value, key: &str, schema: &str) -> anyhow::Result<Vec<Value>> {
    match doc {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => {
            if let Some(found) = map.get("schema").and_then(Value::as_str)
                && found != schema
            {
                anyhow::bail!("unsupported schema: {found} (expected {schema})");
            }
            match map.remove(key) {
                None => Ok(Vec::new()),
                Some(Value::Array(items)) => Ok(items),
                Some(_) => anyhow::bail!("`{key}` must be an array"),
            }
        }
        _ => anyhow::bail!("expected a table with a `{key}` array"),
    }
}
