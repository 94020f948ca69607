//! Shared test utilities for the azure-guardrails workspace.
//!
//! This crate exists because `xtask` needs `normalize_nondeterministic` at
//! runtime (not behind `#[cfg(test)]`), so a `#[cfg(test)]` module inside
//! `guardrails-types` would not suffice.

use serde_json::Value;

const ENVELOPE_KEYS: [&str; 5] = ["schema", "tool", "run", "gate", "verdicts"];

/// Normalize non-deterministic report fields for golden-file comparison.
///
/// Only the root envelope is touched: `tool.version` becomes `"__VERSION__"`,
/// `run.started_at` / `run.ended_at` become `"__TIMESTAMP__"` and `run.duration_ms`
/// becomes `0`. Verdict evidence echoes arbitrary resource properties, so keys
/// deeper in the document are never rewritten even when they look like timestamps.
///
/// Values that are not a report envelope are returned unchanged.
pub fn normalize_nondeterministic(mut value: Value) -> Value {
    let Some(obj) = value.as_object_mut() else {
        return value;
    };
    if !ENVELOPE_KEYS.iter().all(|k| obj.contains_key(*k)) {
        return value;
    }

    if let Some(tool) = obj.get_mut("tool").and_then(Value::as_object_mut)
        && tool.contains_key("version")
    {
        tool.insert(
            "version".to_string(),
            Value::String("__VERSION__".to_string()),
        );
    }

    if let Some(run) = obj.get_mut("run").and_then(Value::as_object_mut) {
        for key in ["started_at", "ended_at"] {
            if run.contains_key(key) {
                run.insert(key.to_string(), Value::String("__TIMESTAMP__".to_string()));
            }
        }
        if run.contains_key("duration_ms") {
            run.insert("duration_ms".to_string(), Value::Number(0.into()));
        }
    }

    value
}
