//! Typed rule predicates over resource properties.
//!
//! Conditions are data, never executable expressions: evaluation is a pure function of
//! the condition and the property tree. String comparisons are case-insensitive, matching
//! how ARM treats property values.

use crate::model::{lookup_in, Lookup};
use guardrails_types::PropertyPath;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::cmp::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CompareOp {
    fn holds(self, ord: Ordering) -> bool {
        match self {
            CompareOp::Lt => ord == Ordering::Less,
            CompareOp::Lte => ord != Ordering::Greater,
            CompareOp::Gt => ord == Ordering::Greater,
            CompareOp::Gte => ord != Ordering::Less,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
        }
    }
}

/// A rule condition.
///
/// Declarative form (TOML):
///
/// ```toml
/// condition = { all = [
///   { equals = { path = "properties.allowBlobPublicAccess", value = false } },
///   { compare = { path = "properties.minimumTlsVersionNumber", op = "gte", value = 1.2 } },
/// ] }
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", deny_unknown_fields)]
pub enum Condition {
    Equals { path: PropertyPath, value: Value },
    NotEquals { path: PropertyPath, value: Value },
    In { path: PropertyPath, values: Vec<Value> },
    NotIn { path: PropertyPath, values: Vec<Value> },
    Compare { path: PropertyPath, op: CompareOp, value: f64 },
    /// The only predicate that observes absence without error.
    Exists { path: PropertyPath },
    /// Substring of a string value, or element of an array value.
    Contains { path: PropertyPath, value: Value },
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
}

/// Evidence for a leaf result: the property that decided it.
#[derive(Clone, Debug, PartialEq)]
pub struct Evidence {
    pub path: PropertyPath,
    pub actual: Option<Value>,
    pub expected: Value,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Check {
    pub passed: bool,
    /// Present on failure: the first leaf that made the condition fail.
    pub evidence: Option<Evidence>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ConditionError {
    /// A referenced property path is structurally absent.
    Missing { path: PropertyPath },
    TypeMismatch {
        path: PropertyPath,
        expected: &'static str,
        actual: Value,
    },
}

impl ConditionError {
    pub fn path(&self) -> &PropertyPath {
        match self {
            ConditionError::Missing { path } | ConditionError::TypeMismatch { path, .. } => path,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            ConditionError::Missing { path } => format!("property '{path}' is absent"),
            ConditionError::TypeMismatch {
                path,
                expected,
                actual,
            } => format!(
                "property '{path}' is {}, expected {expected}",
                json_type_name(actual)
            ),
        }
    }
}

impl Condition {
    /// Structural validation beyond what deserialization enforces.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Condition::In { path, values } | Condition::NotIn { path, values } => {
                if values.is_empty() {
                    return Err(format!("membership test on '{path}' has no values"));
                }
                Ok(())
            }
            Condition::Compare { path, value, .. } => {
                if !value.is_finite() {
                    return Err(format!("comparison on '{path}' needs a finite number"));
                }
                Ok(())
            }
            Condition::All(children) | Condition::Any(children) => {
                if children.is_empty() {
                    return Err("logical group has no conditions".to_string());
                }
                children.iter().try_for_each(Condition::validate)
            }
            Condition::Not(inner) => inner.validate(),
            Condition::Equals { .. }
            | Condition::NotEquals { .. }
            | Condition::Exists { .. }
            | Condition::Contains { .. } => Ok(()),
        }
    }

    /// Every property path the condition reads, in declaration order.
    pub fn paths(&self) -> Vec<&PropertyPath> {
        let mut out = Vec::new();
        self.collect_paths(&mut out);
        out
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a PropertyPath>) {
        match self {
            Condition::Equals { path, .. }
            | Condition::NotEquals { path, .. }
            | Condition::In { path, .. }
            | Condition::NotIn { path, .. }
            | Condition::Compare { path, .. }
            | Condition::Exists { path }
            | Condition::Contains { path, .. } => out.push(path),
            Condition::All(children) | Condition::Any(children) => {
                for c in children {
                    c.collect_paths(out);
                }
            }
            Condition::Not(inner) => inner.collect_paths(out),
        }
    }

    /// Evaluate against a property tree.
    ///
    /// Absence propagates as `ConditionError::Missing` through every combinator,
    /// including `not`, so a missing property can never turn into a pass on its own.
    /// `all` fails if any child fails and `any` passes if any child passes, whatever
    /// the child order; otherwise the first child error decides.
    pub fn evaluate(&self, props: &Map<String, Value>) -> Result<Check, ConditionError> {
        match self {
            Condition::Equals { path, value } => {
                let actual = require(props, path)?;
                Ok(leaf(values_equal(actual, value), path, actual, value.clone()))
            }
            Condition::NotEquals { path, value } => {
                let actual = require(props, path)?;
                Ok(leaf(
                    !values_equal(actual, value),
                    path,
                    actual,
                    json!({ "not": value }),
                ))
            }
            Condition::In { path, values } => {
                let actual = require(props, path)?;
                let hit = values.iter().any(|v| values_equal(actual, v));
                Ok(leaf(hit, path, actual, json!({ "in": values })))
            }
            Condition::NotIn { path, values } => {
                let actual = require(props, path)?;
                let hit = values.iter().any(|v| values_equal(actual, v));
                Ok(leaf(!hit, path, actual, json!({ "not_in": values })))
            }
            Condition::Compare { path, op, value } => {
                let actual = require(props, path)?;
                let Some(n) = as_number(actual) else {
                    return Err(ConditionError::TypeMismatch {
                        path: path.clone(),
                        expected: "a number",
                        actual: actual.clone(),
                    });
                };
                let ord = n.partial_cmp(value).unwrap_or(Ordering::Equal);
                Ok(leaf(
                    op.holds(ord),
                    path,
                    actual,
                    json!(format!("{} {}", op.symbol(), value)),
                ))
            }
            Condition::Exists { path } => match lookup_in(props, path) {
                Lookup::Found(_) => Ok(Check {
                    passed: true,
                    evidence: None,
                }),
                Lookup::Missing => Ok(Check {
                    passed: false,
                    evidence: Some(Evidence {
                        path: path.clone(),
                        actual: None,
                        expected: json!("present"),
                    }),
                }),
            },
            Condition::Contains { path, value } => {
                let actual = require(props, path)?;
                let hit = match (actual, value) {
                    (Value::Array(items), _) => items.iter().any(|i| values_equal(i, value)),
                    (Value::String(hay), Value::String(needle)) => hay
                        .to_ascii_lowercase()
                        .contains(&needle.to_ascii_lowercase()),
                    _ => {
                        return Err(ConditionError::TypeMismatch {
                            path: path.clone(),
                            expected: "a string or an array",
                            actual: actual.clone(),
                        });
                    }
                };
                Ok(leaf(hit, path, actual, json!({ "contains": value })))
            }
            Condition::All(children) => {
                let mut first_error = None;
                for c in children {
                    match c.evaluate(props) {
                        Ok(check) if !check.passed => return Ok(check),
                        Ok(_) => {}
                        Err(err) => {
                            first_error.get_or_insert(err);
                        }
                    }
                }
                match first_error {
                    Some(err) => Err(err),
                    None => Ok(Check {
                        passed: true,
                        evidence: None,
                    }),
                }
            }
            Condition::Any(children) => {
                let mut first_error = None;
                let mut first_failure: Option<Check> = None;
                for c in children {
                    match c.evaluate(props) {
                        Ok(check) if check.passed => return Ok(check),
                        Ok(check) => {
                            first_failure.get_or_insert(check);
                        }
                        Err(err) => {
                            first_error.get_or_insert(err);
                        }
                    }
                }
                if let Some(err) = first_error {
                    return Err(err);
                }
                Ok(first_failure.unwrap_or(Check {
                    passed: false,
                    evidence: None,
                }))
            }
            Condition::Not(inner) => {
                let check = inner.evaluate(props)?;
                if check.passed {
                    let evidence = inner.paths().first().map(|p| Evidence {
                        path: (*p).clone(),
                        actual: match lookup_in(props, p) {
                            Lookup::Found(v) => Some(v.clone()),
                            Lookup::Missing => None,
                        },
                        expected: json!("negated condition to hold"),
                    });
                    Ok(Check {
                        passed: false,
                        evidence,
                    })
                } else {
                    Ok(Check {
                        passed: true,
                        evidence: None,
                    })
                }
            }
        }
    }
}

fn require<'a>(props: &'a Map<String, Value>, path: &PropertyPath) -> Result<&'a Value, ConditionError> {
    match lookup_in(props, path) {
        Lookup::Found(v) => Ok(v),
        Lookup::Missing => Err(ConditionError::Missing { path: path.clone() }),
    }
}

fn leaf(passed: bool, path: &PropertyPath, actual: &Value, expected: Value) -> Check {
    Check {
        passed,
        evidence: (!passed).then(|| Evidence {
            path: path.clone(),
            actual: Some(actual.clone()),
            expected,
        }),
    }
}

/// Loose equality: numbers compare numerically, strings case-insensitively,
/// containers element-wise with the same rules.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => x == y,
        },
        (Value::String(x), Value::String(y)) => x.eq_ignore_ascii_case(y),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xm), Value::Object(ym)) => {
            xm.len() == ym.len()
                && xm
                    .iter()
                    .all(|(k, xv)| ym.get(k).is_some_and(|yv| values_equal(xv, yv)))
        }
        _ => a == b,
    }
}

/// Numbers, and strings that hold a number (exports often carry `"1.2"` for TLS versions).
fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

pub fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
