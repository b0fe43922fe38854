//! Layered blob store.
//!
//! [`BlobLevelStore`] implements [`LevelStorePort`] over any namespaced
//! [`StoragePort`] backend. Each persistence level is stored as a sparse
//! postcard-encoded delta against the layers beneath it, so the user file
//! stays small and vendor-layer updates shine through untouched fields.
//!
//! Loading level N composes: schema defaults, then the stored delta of
//! every level 0..=N in order, with a level's try-once shadow slot (if
//! present) overlaying its regular slot. Saving level N diffs the
//! snapshot against the composed view of levels 0..N-1 and writes only
//! the difference; a save that changes nothing clears the slot.

use log::{debug, info, warn};

use crate::app::ports::{LevelStorePort, LoadError, SaveError, StorageError, StoragePort};
use crate::level::ConfigLevel;
use crate::schema::SchemaNode;
use crate::value::ConfigValue;

const CONF_NAMESPACE: &str = "conf";

fn level_key(level: ConfigLevel) -> String {
    format!("level{}", level.index())
}

fn once_key(level: ConfigLevel) -> String {
    format!("level{}.once", level.index())
}

/// Level store over a blob KV backend.
#[derive(Debug)]
pub struct BlobLevelStore<S: StoragePort> {
    storage: S,
}

impl<S: StoragePort> BlobLevelStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn into_inner(self) -> S {
        self.storage
    }

    /// Drop every try-once shadow slot. The platform calls this from its
    /// boot-ok hook, so an experimental change is honored for exactly one
    /// boot before reverting.
    pub fn revert_try_once(&mut self) -> Result<(), StorageError> {
        for level in ConfigLevel::USER.up_to() {
            let key = once_key(level);
            if self.storage.exists(CONF_NAMESPACE, &key) {
                info!("reverting try-once config at level {level}");
                self.storage.delete(CONF_NAMESPACE, &key)?;
            }
        }
        Ok(())
    }

    fn read_delta(&self, key: &str) -> Result<Option<ConfigValue>, LoadError> {
        match self.storage.read(CONF_NAMESPACE, key) {
            Ok(bytes) => match postcard::from_bytes(&bytes) {
                Ok(delta) => Ok(Some(delta)),
                Err(e) => {
                    warn!("config blob '{key}' failed to decode: {e}");
                    Err(LoadError::Corrupted)
                }
            },
            Err(StorageError::NotFound) => Ok(None),
            Err(e) => {
                warn!("config blob '{key}' unreadable: {e}");
                Err(LoadError::Unreadable)
            }
        }
    }

    /// Compose defaults plus stored overlays up to `top` (inclusive).
    /// `top == None` yields pure schema defaults.
    fn composed(
        &self,
        schema: &SchemaNode,
        top: Option<ConfigLevel>,
    ) -> Result<ConfigValue, LoadError> {
        let mut snapshot = ConfigValue::defaults(schema);
        if let Some(top) = top {
            for level in top.up_to() {
                if let Some(delta) = self.read_delta(&level_key(level))? {
                    snapshot.overlay(&delta);
                }
                if let Some(delta) = self.read_delta(&once_key(level))? {
                    debug!("applying try-once overlay at level {level}");
                    snapshot.overlay(&delta);
                }
            }
        }
        Ok(snapshot)
    }
}

impl<S: StoragePort> LevelStorePort for BlobLevelStore<S> {
    fn load_level(
        &self,
        schema: &SchemaNode,
        level: ConfigLevel,
    ) -> Result<ConfigValue, LoadError> {
        self.composed(schema, Some(level))
    }

    fn save_level(
        &mut self,
        schema: &SchemaNode,
        snapshot: &ConfigValue,
        level: ConfigLevel,
        try_once: bool,
    ) -> Result<(), SaveError> {
        let base = self
            .composed(schema, level.below())
            .map_err(|e| SaveError(format!("cannot compose level {level} base: {e}")))?;

        let key = if try_once { once_key(level) } else { level_key(level) };

        match snapshot.diff(&base) {
            Some(delta) => {
                let bytes = postcard::to_allocvec(&delta)
                    .map_err(|e| SaveError(format!("encode level {level}: {e}")))?;
                self.storage
                    .write(CONF_NAMESPACE, &key, &bytes)
                    .map_err(|e| SaveError(format!("write '{key}': {e}")))?;
                info!(
                    "saved config level {level} ({} bytes{})",
                    bytes.len(),
                    if try_once { ", try-once" } else { "" }
                );
            }
            None => {
                // Nothing differs from the layers beneath: an empty slot
                // and a missing slot compose identically.
                self.storage
                    .delete(CONF_NAMESPACE, &key)
                    .map_err(|e| SaveError(format!("clear '{key}': {e}")))?;
                info!("config level {level} matches base, slot cleared");
            }
        }

        // A regular save supersedes any pending experiment at this level.
        if !try_once {
            self.storage
                .delete(CONF_NAMESPACE, &once_key(level))
                .map_err(|e| SaveError(format!("clear try-once slot: {e}")))?;
        }
        Ok(())
    }
}
