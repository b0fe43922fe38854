//! Unified error type for the configuration service.
//!
//! Every fallible command funnels into [`ServiceError`]; the RPC layer
//! maps each variant onto the wire error code and message. No variant is
//! retried internally — failures are reported synchronously to the
//! originating command.

use core::fmt;

use crate::app::ports::{LoadError, SaveError};
use crate::level::InvalidLevel;
use crate::merge::ApplyError;

/// Why a Get / Set / Save command failed.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// The client supplied a key that matches no schema path.
    UnknownKey,
    /// The wire level is outside the representable range.
    InvalidLevel(InvalidLevel),
    /// Set arrived without a value payload.
    ValueRequired,
    /// The vendor layer (level 0) is not remotely writable.
    NotAllowed,
    /// A level-scoped snapshot could not be composed from storage.
    Load(LoadError),
    /// The payload failed schema-directed parsing or access control.
    Apply(ApplyError),
    /// Persistence failed; carries the diagnostic for the client.
    Save(SaveError),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownKey => write!(f, "invalid config key"),
            Self::InvalidLevel(e) => write!(f, "invalid config level: {e}"),
            Self::ValueRequired => write!(f, "value is required"),
            Self::NotAllowed => write!(f, "not allowed"),
            Self::Load(e) => write!(f, "failed to load config: {e}"),
            Self::Apply(e) => write!(f, "invalid config value: {e}"),
            Self::Save(e) => write!(f, "error saving config: {e}"),
        }
    }
}

impl From<LoadError> for ServiceError {
    fn from(e: LoadError) -> Self {
        Self::Load(e)
    }
}

impl From<ApplyError> for ServiceError {
    fn from(e: ApplyError) -> Self {
        Self::Apply(e)
    }
}

impl From<SaveError> for ServiceError {
    fn from(e: SaveError) -> Self {
        Self::Save(e)
    }
}

impl From<InvalidLevel> for ServiceError {
    fn from(e: InvalidLevel) -> Self {
        Self::InvalidLevel(e)
    }
}
