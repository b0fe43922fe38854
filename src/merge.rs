//! Merge/apply engine.
//!
//! Parses a self-describing JSON payload against a schema node and merges
//! it into the matching subtree of a configuration snapshot. Only fields
//! present in the payload are written; absent fields keep their prior
//! values. Every written leaf is checked against the top-level
//! [`AccessPolicy`] using its full dotted path, so targeting a narrow
//! sub-path cannot sidestep a global write restriction.
//!
//! A failed apply may leave the in-memory snapshot partially updated (the
//! caller must not persist it); it is never silently swallowed.

use core::fmt;

use log::debug;
use serde_json::Value as Json;

use crate::schema::{Access, AccessPolicy, NodeKind, ScalarKind, SchemaNode};
use crate::value::ConfigValue;

/// Why an apply was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyError {
    /// Payload shape or type does not match the schema.
    Parse { path: String, detail: String },
    /// The access policy or a read-only tag forbids the write.
    AccessDenied { path: String },
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse { path, detail } => write!(f, "bad value for [{path}]: {detail}"),
            Self::AccessDenied { path } => write!(f, "not allowed to set [{path}]"),
        }
    }
}

/// Recursively merge `payload` into `target`, which must be the snapshot
/// subtree matching `node`. `policy` is always the top-level policy.
pub fn apply(
    target: &mut ConfigValue,
    node: &SchemaNode,
    payload: &Json,
    policy: &AccessPolicy,
) -> Result<(), ApplyError> {
    if node.access() == Access::ReadOnly {
        return Err(ApplyError::AccessDenied {
            path: display_path(node),
        });
    }
    match node.kind() {
        NodeKind::Object => {
            let Json::Object(fields) = payload else {
                return Err(type_error(node, "object", payload));
            };
            for (name, value) in fields {
                let Some(child) = node.child(name) else {
                    debug!(
                        "apply: ignoring unknown field '{}' under [{}]",
                        name,
                        display_path(node)
                    );
                    continue;
                };
                let Some(slot) = target.entry_mut(name) else {
                    debug!("apply: snapshot missing field '{name}', skipping");
                    continue;
                };
                apply(slot, child, value, policy)?;
            }
            Ok(())
        }
        NodeKind::Scalar(kind) => {
            check_policy(node, policy)?;
            *target =
                coerce_scalar(kind, payload).map_err(|expected| type_error(node, expected, payload))?;
            Ok(())
        }
        NodeKind::Array(elem) => {
            check_policy(node, policy)?;
            let Json::Array(items) = payload else {
                return Err(type_error(node, "array", payload));
            };
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                out.push(coerce_scalar(elem, item).map_err(|expected| ApplyError::Parse {
                    path: format!("{}[{i}]", display_path(node)),
                    detail: format!("expected {expected}, got {}", json_kind(item)),
                })?);
            }
            *target = ConfigValue::Array(out);
            Ok(())
        }
    }
}

fn check_policy(node: &SchemaNode, policy: &AccessPolicy) -> Result<(), ApplyError> {
    if policy.allows_write(node.path()) {
        Ok(())
    } else {
        Err(ApplyError::AccessDenied {
            path: display_path(node),
        })
    }
}

fn coerce_scalar(kind: ScalarKind, json: &Json) -> Result<ConfigValue, &'static str> {
    match kind {
        ScalarKind::Bool => json.as_bool().map(ConfigValue::Bool).ok_or("boolean"),
        ScalarKind::Int => json.as_i64().map(ConfigValue::Int).ok_or("integer"),
        ScalarKind::Float => json.as_f64().map(ConfigValue::Float).ok_or("number"),
        ScalarKind::Str => json
            .as_str()
            .map(|s| ConfigValue::Str(s.to_string()))
            .ok_or("string"),
    }
}

fn type_error(node: &SchemaNode, expected: &str, got: &Json) -> ApplyError {
    ApplyError::Parse {
        path: display_path(node),
        detail: format!("expected {expected}, got {}", json_kind(got)),
    }
}

fn display_path(node: &SchemaNode) -> String {
    if node.path().is_empty() {
        "(root)".to_string()
    } else {
        node.path().to_string()
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
