//! Inbound commands to the configuration service.
//!
//! These are the decoded forms of the `Config.*` RPC requests; the RPC
//! engine builds them after wire-level validation, and embedders may also
//! construct them directly (e.g. a provisioning flow applying a staged
//! profile).

use serde_json::Value as Json;

use crate::level::LevelSelect;

/// Read a subtree of the configuration.
#[derive(Debug, Clone, Default)]
pub struct GetRequest {
    /// Dotted key; `None` reads the whole tree.
    pub key: Option<String>,
    pub level: LevelSelect,
}

/// Merge a partial value into the configuration, optionally persisting.
#[derive(Debug, Clone, Default)]
pub struct SetRequest {
    /// Dotted key; `None` merges at the root.
    pub key: Option<String>,
    /// Self-describing payload matching the schema shape at `key`.
    pub value: Json,
    pub level: LevelSelect,
    pub save: bool,
    pub try_once: bool,
    pub reboot: bool,
}

/// Persist the live snapshot at the user level.
#[derive(Debug, Clone, Copy, Default)]
pub struct SaveRequest {
    pub try_once: bool,
    pub reboot: bool,
}
