//! Configuration service — the hexagonal core.
//!
//! [`ConfigService`] owns the sealed schema, the top-level write policy,
//! and the single process-wide live snapshot, and implements the Get /
//! Set / Save commands by composing the key resolver, level store, and
//! merge engine. All I/O flows through port traits injected at call
//! sites, making the entire service testable with mock adapters.
//!
//! ```text
//!  LevelStorePort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                     │     ConfigService       │
//!     SystemPort ◀────│  schema · policy · live │
//!                     └────────────────────────┘
//! ```
//!
//! The service takes `&mut self` for every mutating command, so the
//! compiler enforces the single-writer discipline on the live snapshot;
//! the request dispatcher must not run two commands concurrently.

use log::{debug, info, warn};
use serde_json::Value as Json;

use crate::error::ServiceError;
use crate::level::{ConfigLevel, LevelSelect, RESTART_DELAY_MS};
use crate::merge;
use crate::schema::{self, AccessPolicy, SchemaNode};
use crate::value::ConfigValue;

use super::commands::{GetRequest, SaveRequest, SetRequest};
use super::events::ConfigEvent;
use super::ports::{EventSink, LevelStorePort, LoadError, RestartHandle, SystemPort};

// ───────────────────────────────────────────────────────────────
// Outcomes
// ───────────────────────────────────────────────────────────────

/// Result of a successful save phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Persisted; a requested restart (if any) has been scheduled.
    Saved,
    /// Persisted, but the requested restart was suppressed: the device
    /// is strapped to the bootloader after first flash and must be reset
    /// by hand.
    ManualResetRequired,
}

/// Result of a successful Set command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// Mutation applied in memory only.
    NotSaved,
    /// Mutation applied and persisted.
    Saved,
    /// Persisted, restart suppressed (see [`SaveOutcome`]).
    ManualResetRequired,
}

impl From<SaveOutcome> for SetOutcome {
    fn from(o: SaveOutcome) -> Self {
        match o {
            SaveOutcome::Saved => Self::Saved,
            SaveOutcome::ManualResetRequired => Self::ManualResetRequired,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// ConfigService
// ───────────────────────────────────────────────────────────────

/// The command orchestrator for the configuration tree.
pub struct ConfigService {
    schema: SchemaNode,
    policy: AccessPolicy,
    /// Process-wide live snapshot; single owner, process lifetime.
    live: ConfigValue,
    /// Token for the most recently scheduled restart, if any.
    pending_restart: Option<RestartHandle>,
}

impl ConfigService {
    /// Boot the service: compose the live snapshot from storage at the
    /// user level.
    pub fn new(
        schema: SchemaNode,
        policy: AccessPolicy,
        store: &impl LevelStorePort,
    ) -> Result<Self, LoadError> {
        let live = store.load_level(&schema, ConfigLevel::USER)?;
        info!("config service ready (live snapshot composed through user level)");
        Ok(Self {
            schema,
            policy,
            live,
            pending_restart: None,
        })
    }

    /// Boot with pure schema defaults, ignoring storage. Fallback for a
    /// blank or unrecoverable partition.
    pub fn with_defaults(schema: SchemaNode, policy: AccessPolicy) -> Self {
        let live = ConfigValue::defaults(&schema);
        warn!("config service starting from schema defaults");
        Self {
            schema,
            policy,
            live,
            pending_restart: None,
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn schema(&self) -> &SchemaNode {
        &self.schema
    }

    /// The live snapshot. Callers never release this; it lives as long
    /// as the service.
    pub fn live(&self) -> &ConfigValue {
        &self.live
    }

    pub fn pending_restart(&self) -> Option<&RestartHandle> {
        self.pending_restart.as_ref()
    }

    /// Call off a restart scheduled by an earlier command, if the timer
    /// has not fired yet.
    pub fn cancel_pending_restart(&mut self) {
        if let Some(handle) = self.pending_restart.take() {
            info!("cancelling pending restart");
            handle.cancel();
        }
    }

    // ── Commands ──────────────────────────────────────────────

    /// `Config.Get`: serialize the subtree at `key` from the selected
    /// snapshot. Stored levels are composed transiently and dropped
    /// before returning.
    pub fn get(
        &self,
        req: &GetRequest,
        store: &impl LevelStorePort,
    ) -> Result<Json, ServiceError> {
        debug!("Config.Get key={:?} level={:?}", req.key, req.level);
        let node =
            schema::resolve(&self.schema, req.key.as_deref()).ok_or(ServiceError::UnknownKey)?;
        let json = match req.level {
            LevelSelect::Stored(level) => {
                let snapshot = store.load_level(&self.schema, level)?;
                snapshot
                    .get(node.path())
                    .ok_or(ServiceError::UnknownKey)?
                    .to_json()
            }
            LevelSelect::Live => self
                .live
                .get(node.path())
                .ok_or(ServiceError::UnknownKey)?
                .to_json(),
        };
        Ok(json)
    }

    /// `Config.Set`: merge the payload into the selected snapshot and
    /// optionally persist. Level 0 is the protected vendor layer and is
    /// never remotely writable.
    pub fn set(
        &mut self,
        req: &SetRequest,
        store: &mut impl LevelStorePort,
        sys: &mut impl SystemPort,
        sink: &mut impl EventSink,
    ) -> Result<SetOutcome, ServiceError> {
        if req.value.is_null() {
            return Err(ServiceError::ValueRequired);
        }
        debug!(
            "Config.Set key={:?} level={:?} save={} try_once={} reboot={}",
            req.key, req.level, req.save, req.try_once, req.reboot
        );
        match req.level {
            LevelSelect::Stored(level) if level == ConfigLevel::VENDOR => {
                Err(ServiceError::NotAllowed)
            }
            LevelSelect::Stored(level) => {
                // Transient snapshot: composed for this command, dropped
                // on every exit path when it goes out of scope.
                let mut snapshot = store.load_level(&self.schema, level)?;
                let node = schema::resolve(&self.schema, req.key.as_deref())
                    .ok_or(ServiceError::UnknownKey)?;
                let slot = snapshot
                    .get_mut(node.path())
                    .ok_or(ServiceError::UnknownKey)?;
                merge::apply(slot, node, &req.value, &self.policy)?;
                sink.emit(&ConfigEvent::Applied {
                    key: req.key.clone(),
                    level,
                });
                if !req.save {
                    return Ok(SetOutcome::NotSaved);
                }
                let (outcome, handle) = Self::save_snapshot(
                    &self.schema,
                    &snapshot,
                    level,
                    req.try_once,
                    req.reboot,
                    store,
                    sys,
                    sink,
                )?;
                if let Some(handle) = handle {
                    self.pending_restart = Some(handle);
                }
                Ok(outcome.into())
            }
            LevelSelect::Live => {
                let node = schema::resolve(&self.schema, req.key.as_deref())
                    .ok_or(ServiceError::UnknownKey)?;
                let slot = self
                    .live
                    .get_mut(node.path())
                    .ok_or(ServiceError::UnknownKey)?;
                merge::apply(slot, node, &req.value, &self.policy)?;
                sink.emit(&ConfigEvent::Applied {
                    key: req.key.clone(),
                    level: ConfigLevel::USER,
                });
                if !req.save {
                    return Ok(SetOutcome::NotSaved);
                }
                let (outcome, handle) = Self::save_snapshot(
                    &self.schema,
                    &self.live,
                    ConfigLevel::USER,
                    req.try_once,
                    req.reboot,
                    store,
                    sys,
                    sink,
                )?;
                if let Some(handle) = handle {
                    self.pending_restart = Some(handle);
                }
                Ok(outcome.into())
            }
        }
    }

    /// `Config.Save`: persist the live snapshot at the user level.
    pub fn save(
        &mut self,
        req: &SaveRequest,
        store: &mut impl LevelStorePort,
        sys: &mut impl SystemPort,
        sink: &mut impl EventSink,
    ) -> Result<SaveOutcome, ServiceError> {
        debug!(
            "Config.Save try_once={} reboot={}",
            req.try_once, req.reboot
        );
        let (outcome, handle) = Self::save_snapshot(
            &self.schema,
            &self.live,
            ConfigLevel::USER,
            req.try_once,
            req.reboot,
            store,
            sys,
            sink,
        )?;
        if let Some(handle) = handle {
            self.pending_restart = Some(handle);
        }
        Ok(outcome)
    }

    // ── Shared save tail ──────────────────────────────────────

    /// Persist a snapshot and handle the reboot directive. A failed save
    /// never schedules a restart; a restart request on a freshly flashed
    /// device is answered with the manual-reset advisory instead.
    #[allow(clippy::too_many_arguments)]
    fn save_snapshot(
        schema: &SchemaNode,
        snapshot: &ConfigValue,
        level: ConfigLevel,
        try_once: bool,
        reboot: bool,
        store: &mut impl LevelStorePort,
        sys: &mut impl SystemPort,
        sink: &mut impl EventSink,
    ) -> Result<(SaveOutcome, Option<RestartHandle>), ServiceError> {
        if let Err(e) = store.save_level(schema, snapshot, level, try_once) {
            warn!("config save failed at level {level}: {e}");
            sink.emit(&ConfigEvent::SaveFailed {
                detail: e.to_string(),
            });
            return Err(ServiceError::Save(e));
        }
        sink.emit(&ConfigEvent::Saved { level, try_once });

        if !reboot {
            return Ok((SaveOutcome::Saved, None));
        }
        if sys.strapped_to_bootloader() {
            // Rebooting now would drop into the bootloader and look like
            // a dead unit; the operator has to cycle power by hand.
            warn!("restart suppressed: device strapped to bootloader after first flash");
            sink.emit(&ConfigEvent::RestartSuppressed);
            return Ok((SaveOutcome::ManualResetRequired, None));
        }
        info!("scheduling restart in {RESTART_DELAY_MS} ms");
        sink.emit(&ConfigEvent::RestartScheduled {
            delay_ms: RESTART_DELAY_MS,
        });
        let handle = sys.schedule_restart(RESTART_DELAY_MS);
        Ok((SaveOutcome::Saved, Some(handle)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Access;

    struct NullStore;
    impl LevelStorePort for NullStore {
        fn load_level(
            &self,
            schema: &SchemaNode,
            _level: ConfigLevel,
        ) -> Result<ConfigValue, LoadError> {
            Ok(ConfigValue::defaults(schema))
        }
        fn save_level(
            &mut self,
            _schema: &SchemaNode,
            _snapshot: &ConfigValue,
            _level: ConfigLevel,
            _try_once: bool,
        ) -> Result<(), crate::app::ports::SaveError> {
            Ok(())
        }
    }

    fn tiny_schema() -> SchemaNode {
        SchemaNode::root(vec![SchemaNode::int("n", Access::ReadWrite, 1)]).unwrap()
    }

    #[test]
    fn boot_composes_live_from_store() {
        let svc = ConfigService::new(tiny_schema(), AccessPolicy::allow_all(), &NullStore).unwrap();
        assert_eq!(svc.live().get("n"), Some(&ConfigValue::Int(1)));
        assert!(svc.pending_restart().is_none());
    }

    #[test]
    fn defaults_fallback_matches_schema() {
        let svc = ConfigService::with_defaults(tiny_schema(), AccessPolicy::allow_all());
        assert_eq!(svc.live(), &ConfigValue::defaults(svc.schema()));
    }

    #[test]
    fn cancel_pending_restart_is_idempotent() {
        let mut svc = ConfigService::with_defaults(tiny_schema(), AccessPolicy::allow_all());
        svc.cancel_pending_restart();
        svc.cancel_pending_restart();
        assert!(svc.pending_restart().is_none());
    }
}
