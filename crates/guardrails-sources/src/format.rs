use anyhow::Context;
use camino::Utf8Path;
use serde_json::Value as JsonValue;

/// Document syntax, picked from the file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceFormat {
    Toml,
    Json,
}

impl SourceFormat {
    /// `.json` is JSON; everything else is TOML.
    pub fn from_path(path: &Utf8Path) -> SourceFormat {
        match path.extension() {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SourceFormat::Json,
            _ => SourceFormat::Toml,
        }
    }
}

/// Parse a TOML or JSON document into a JSON value tree.
///
/// TOML datetimes become their RFC 3339 text (`expires = 2026-01-01` reads as `"2026-01-01"`).
pub fn parse_document(text: &str, format: SourceFormat) -> anyhow::Result<JsonValue> {
    match format {
        SourceFormat::Json => serde_json::from_str(text).context("parse JSON"),
        SourceFormat::Toml => {
            let table: toml::Table = toml::from_str(text).context("parse TOML")?;
            Ok(toml_to_json(toml::Value::Table(table)))
        }
    }
}

fn toml_to_json(v: toml::Value) -> JsonValue {
    match v {
        toml::Value::String(s) => JsonValue::String(s),
        toml::Value::Integer(i) => JsonValue::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f)
            .map(JsonValue::Number)
            .unwrap_or(JsonValue::Null),
        toml::Value::Boolean(b) => JsonValue::Bool(b),
        toml::Value::Datetime(dt) => JsonValue::String(dt.to_string()),
        toml::Value::Array(items) => JsonValue::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(t) => {
            JsonValue::Object(t.into_iter().map(|(k, v)| (k, toml_to_json(v))).collect())
        }
    }
}
