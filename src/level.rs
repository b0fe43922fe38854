//! Persistence levels.
//!
//! Configuration is stacked in ordered overlay levels: 0 is the
//! vendor/factory layer, 8 is the user layer. On the wire, a negative
//! level or the reserved sentinel 9 means "operate on the live snapshot";
//! levels above 9 are rejected outright.

use core::fmt;

/// Number of stored persistence levels (0..=8).
pub const NUM_LEVELS: u8 = 9;

/// Delay between a successful save-with-reboot and the actual restart,
/// long enough for the response to flush out of the transport.
pub const RESTART_DELAY_MS: u32 = 500;

/// One stored configuration overlay layer. Always in `0..=8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConfigLevel(u8);

impl ConfigLevel {
    /// Factory/vendor layer. Never writable via remote Set.
    pub const VENDOR: Self = Self(0);
    /// User layer, the default save target.
    pub const USER: Self = Self(NUM_LEVELS - 1);

    pub fn new(raw: u8) -> Option<Self> {
        (raw < NUM_LEVELS).then_some(Self(raw))
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// The level directly beneath this one, if any.
    pub fn below(self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }

    /// All levels from vendor up to and including this one, in overlay order.
    pub fn up_to(self) -> impl Iterator<Item = ConfigLevel> {
        (0..=self.0).map(ConfigLevel)
    }
}

impl fmt::Display for ConfigLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which snapshot a command targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LevelSelect {
    /// The single process-wide live snapshot.
    #[default]
    Live,
    /// A transient snapshot loaded from storage for one stored level.
    Stored(ConfigLevel),
}

impl LevelSelect {
    /// Decode the wire-level field. Absent, negative, or the reserved
    /// sentinel 9 select the live snapshot; 0..=8 select a stored level.
    pub fn from_wire(raw: Option<i32>) -> Result<Self, InvalidLevel> {
        match raw {
            None => Ok(Self::Live),
            Some(n) if n < 0 || n == i32::from(NUM_LEVELS) => Ok(Self::Live),
            Some(n) if n < i32::from(NUM_LEVELS) => Ok(Self::Stored(ConfigLevel(n as u8))),
            Some(n) => Err(InvalidLevel(n)),
        }
    }
}

/// A wire level outside the representable range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidLevel(pub i32);

impl fmt::Display for InvalidLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "level {} out of range", self.0)
    }
}
