//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured configuration events to
//! the logger (UART / USB-CDC in production). A future MQTT or companion
//! app adapter would implement the same trait.

use log::{info, warn};

use crate::app::events::ConfigEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`ConfigEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogSink;

impl LogSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &ConfigEvent) {
        match event {
            ConfigEvent::Applied { key, level } => {
                info!(
                    "CONFIG | applied key={} level={level}",
                    key.as_deref().unwrap_or("(root)")
                );
            }
            ConfigEvent::Saved { level, try_once } => {
                info!("CONFIG | saved level={level} try_once={try_once}");
            }
            ConfigEvent::SaveFailed { detail } => {
                warn!("CONFIG | save failed: {detail}");
            }
            ConfigEvent::RestartScheduled { delay_ms } => {
                info!("CONFIG | restart scheduled in {delay_ms} ms");
            }
            ConfigEvent::RestartSuppressed => {
                warn!("CONFIG | restart suppressed, manual reset required");
            }
        }
    }
}
