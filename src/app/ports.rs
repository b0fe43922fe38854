//! Port traits — the hexagonal boundary between the configuration core
//! and the platform.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ConfigService (domain)
//! ```
//!
//! Driven adapters (blob storage, system control, event sinks) implement
//! these traits. The [`ConfigService`](super::service::ConfigService)
//! consumes them via generics, so the domain core never touches flash or
//! the watchdog directly.

use core::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::level::ConfigLevel;
use crate::schema::SchemaNode;
use crate::value::ConfigValue;

// ───────────────────────────────────────────────────────────────
// Blob storage port (driven adapter: domain ↔ flash / NVS)
// ───────────────────────────────────────────────────────────────

/// Persistent namespaced key-value blob storage.
///
/// Write operations MUST be atomic — no partial blobs on power loss.
/// The on-device NVS backend guarantees this natively; the in-memory
/// simulation achieves it trivially.
pub trait StoragePort {
    /// Read a blob. Missing keys are [`StorageError::NotFound`].
    fn read(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Write a blob atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key. Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Level store port (domain ↔ layered persistence)
// ───────────────────────────────────────────────────────────────

/// Loads and persists level-scoped configuration snapshots.
///
/// A snapshot returned by `load_level` is owned by the caller; dropping
/// it is the release. The live snapshot is not this port's concern — it
/// lives in the service for the process lifetime.
pub trait LevelStorePort {
    /// Compose a fresh snapshot for `level`: schema defaults overlaid
    /// with every stored layer from vendor up to and including `level`.
    /// A failure means the result must not be used at all.
    fn load_level(&self, schema: &SchemaNode, level: ConfigLevel)
    -> Result<ConfigValue, LoadError>;

    /// Persist `snapshot` at `level`. With `try_once` the change is
    /// honored for exactly one subsequent boot before reverting.
    fn save_level(
        &mut self,
        schema: &SchemaNode,
        snapshot: &ConfigValue,
        level: ConfigLevel,
        try_once: bool,
    ) -> Result<(), SaveError>;
}

/// Errors from [`LevelStorePort::load_level`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadError {
    /// The storage backend failed to read.
    Unreadable,
    /// A stored blob failed to decode.
    Corrupted,
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable => write!(f, "storage unreadable"),
            Self::Corrupted => write!(f, "stored config corrupted"),
        }
    }
}

/// Persistence failure with a human-readable diagnostic, surfaced
/// verbatim to the remote client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveError(pub String);

impl fmt::Display for SaveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ───────────────────────────────────────────────────────────────
// System port (domain → boot state / restart machinery)
// ───────────────────────────────────────────────────────────────

/// Platform control surface: first-boot detection and deferred restart.
pub trait SystemPort {
    /// True while the device sits in the first-boot-after-flash state
    /// where a reset would strap it into the bootloader. Rebooting now
    /// would look like a bricked unit, so the operator resets by hand.
    fn strapped_to_bootloader(&self) -> bool;

    /// Schedule a restart after `delay_ms`. Fire-and-forget: the caller
    /// never waits for it, but keeps the handle so a later decision can
    /// still call it off.
    fn schedule_restart(&mut self, delay_ms: u32) -> RestartHandle;
}

/// Cancellation token for a scheduled restart. Cloneable; the timer side
/// checks the flag right before pulling the trigger.
#[derive(Debug, Clone, Default)]
pub struct RestartHandle {
    cancelled: Arc<AtomicBool>,
}

impl RestartHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`ConfigEvent`](super::events::ConfigEvent)s
/// through this port. Adapters decide where they go (serial log, audit
/// history, MQTT, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::ConfigEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restart_handle_cancel_is_sticky() {
        let handle = RestartHandle::new();
        assert!(!handle.is_cancelled());
        let clone = handle.clone();
        clone.cancel();
        assert!(handle.is_cancelled());
        assert!(clone.is_cancelled());
    }
}
