//! Outbound configuration events.
//!
//! The [`ConfigService`](super::service::ConfigService) emits these through
//! the [`EventSink`](super::ports::EventSink) port. Adapters on the other
//! side decide what to do with them — log to serial, keep an audit
//! history, notify a companion app.

use crate::level::ConfigLevel;

/// Structured events emitted by the configuration core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigEvent {
    /// A mutation was merged into a snapshot (live or transient).
    Applied {
        /// Dotted key the client targeted; `None` for the whole tree.
        key: Option<String>,
        level: ConfigLevel,
    },

    /// A snapshot was persisted.
    Saved { level: ConfigLevel, try_once: bool },

    /// Persistence failed; `detail` is the diagnostic sent to the client.
    SaveFailed { detail: String },

    /// A deferred restart was scheduled.
    RestartScheduled { delay_ms: u32 },

    /// A requested restart was suppressed because the device is still
    /// strapped to the bootloader after first flash.
    RestartSuppressed,
}
