//! In-memory configuration values.
//!
//! [`ConfigValue`] is one concrete instance of (part of) the configuration
//! tree: the live snapshot, a transient level-scoped snapshot, or a sparse
//! delta destined for storage. Fields are addressed by name, never by
//! memory offset, so the merge engine stays independent of any struct
//! layout. serde derives let snapshots and deltas round-trip through
//! `postcard` blobs.

use core::mem::discriminant;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use crate::schema::{NodeKind, ScalarKind, SchemaNode};

/// A tagged configuration value tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConfigValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// Homogeneous scalar list.
    Array(Vec<ConfigValue>),
    /// Named fields in schema order. Deltas carry a subset.
    Object(Vec<(String, ConfigValue)>),
}

impl ConfigValue {
    // ── Construction ──────────────────────────────────────────

    /// Build the full default snapshot described by a schema tree.
    pub fn defaults(schema: &SchemaNode) -> ConfigValue {
        match schema.kind() {
            NodeKind::Object => ConfigValue::Object(
                schema
                    .children()
                    .iter()
                    .map(|c| (c.name().to_string(), Self::defaults(c)))
                    .collect(),
            ),
            NodeKind::Scalar(kind) => schema
                .default_value()
                .cloned()
                .unwrap_or_else(|| Self::zero_of(kind)),
            NodeKind::Array(_) => schema
                .default_value()
                .cloned()
                .unwrap_or_else(|| ConfigValue::Array(Vec::new())),
        }
    }

    fn zero_of(kind: ScalarKind) -> ConfigValue {
        match kind {
            ScalarKind::Bool => ConfigValue::Bool(false),
            ScalarKind::Int => ConfigValue::Int(0),
            ScalarKind::Float => ConfigValue::Float(0.0),
            ScalarKind::Str => ConfigValue::Str(String::new()),
        }
    }

    // ── Addressing ────────────────────────────────────────────

    /// Descend a dotted path. The empty path is the value itself.
    pub fn get(&self, path: &str) -> Option<&ConfigValue> {
        if path.is_empty() {
            return Some(self);
        }
        let mut cur = self;
        for seg in path.split('.') {
            cur = cur.entry(seg)?;
        }
        Some(cur)
    }

    /// Mutable variant of [`get`](Self::get).
    pub fn get_mut(&mut self, path: &str) -> Option<&mut ConfigValue> {
        if path.is_empty() {
            return Some(self);
        }
        let mut cur = self;
        for seg in path.split('.') {
            cur = cur.entry_mut(seg)?;
        }
        Some(cur)
    }

    /// Direct object field by name.
    pub fn entry(&self, name: &str) -> Option<&ConfigValue> {
        match self {
            ConfigValue::Object(fields) => {
                fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    /// Mutable variant of [`entry`](Self::entry).
    pub fn entry_mut(&mut self, name: &str) -> Option<&mut ConfigValue> {
        match self {
            ConfigValue::Object(fields) => {
                fields.iter_mut().find(|(n, _)| n == name).map(|(_, v)| v)
            }
            _ => None,
        }
    }

    // ── Emit ──────────────────────────────────────────────────

    /// Serialize to a JSON value for the RPC response payload.
    pub fn to_json(&self) -> Json {
        match self {
            ConfigValue::Bool(b) => Json::Bool(*b),
            ConfigValue::Int(i) => Json::from(*i),
            ConfigValue::Float(x) => serde_json::Number::from_f64(*x)
                .map_or(Json::Null, Json::Number),
            ConfigValue::Str(s) => Json::String(s.clone()),
            ConfigValue::Array(items) => {
                Json::Array(items.iter().map(ConfigValue::to_json).collect())
            }
            ConfigValue::Object(fields) => Json::Object(
                fields
                    .iter()
                    .map(|(n, v)| (n.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    // ── Delta arithmetic ──────────────────────────────────────

    /// Sparse delta of `self` against `base`: only fields that differ are
    /// emitted. `None` means the two are identical. `self` and `base` are
    /// expected to share a schema shape; a field missing from `base` is
    /// carried whole.
    pub fn diff(&self, base: &ConfigValue) -> Option<ConfigValue> {
        match (self, base) {
            (ConfigValue::Object(ours), ConfigValue::Object(theirs)) => {
                let mut out = Vec::new();
                for (name, ov) in ours {
                    match theirs.iter().find(|(n, _)| n == name).map(|(_, v)| v) {
                        Some(bv) => {
                            if let Some(d) = ov.diff(bv) {
                                out.push((name.clone(), d));
                            }
                        }
                        None => out.push((name.clone(), ov.clone())),
                    }
                }
                (!out.is_empty()).then(|| ConfigValue::Object(out))
            }
            (ours, theirs) => (ours != theirs).then(|| ours.clone()),
        }
    }

    /// Merge a sparse delta into this value. Object fields merge by name;
    /// scalars and arrays are replaced whole. A delta field with no
    /// counterpart here, or a mismatched kind (stale blob from an older
    /// schema), is dropped with a debug log instead of corrupting the tree.
    pub fn overlay(&mut self, delta: &ConfigValue) {
        match (self, delta) {
            (ConfigValue::Object(dst), ConfigValue::Object(src)) => {
                for (name, dv) in src {
                    match dst.iter_mut().find(|(n, _)| n == name) {
                        Some((_, slot)) => slot.overlay(dv),
                        None => debug!("overlay: dropping unknown field '{name}'"),
                    }
                }
            }
            (dst, src) => {
                if discriminant(dst) == discriminant(src) {
                    *dst = src.clone();
                } else {
                    debug!("overlay: kind mismatch, keeping existing value");
                }
            }
        }
    }
}
