//! Host-side system adapter.
//!
//! Implements [`SystemPort`] with a detached thread timer so the full
//! save-and-reboot flow runs on the host. The timer only logs when it
//! fires — actually terminating the process is the on-device adapter's
//! job. Cancellation goes through the shared [`RestartHandle`] flag,
//! checked right before the trigger point.

use std::thread;
use std::time::Duration;

use log::{info, warn};

use crate::app::ports::{RestartHandle, SystemPort};

/// Simulation [`SystemPort`] backend.
#[derive(Debug, Default)]
pub struct HostSystem {
    strapped: bool,
}

impl HostSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the first-boot-after-flash bootloader strap state.
    pub fn set_strapped(&mut self, strapped: bool) {
        self.strapped = strapped;
    }
}

impl SystemPort for HostSystem {
    fn strapped_to_bootloader(&self) -> bool {
        self.strapped
    }

    fn schedule_restart(&mut self, delay_ms: u32) -> RestartHandle {
        let handle = RestartHandle::new();
        let token = handle.clone();
        info!("host restart timer armed ({delay_ms} ms)");
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(u64::from(delay_ms)));
            if token.is_cancelled() {
                info!("host restart timer cancelled before firing");
            } else {
                warn!("host restart timer fired (device adapter would reset here)");
            }
        });
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strap_state_round_trip() {
        let mut sys = HostSystem::new();
        assert!(!sys.strapped_to_bootloader());
        sys.set_strapped(true);
        assert!(sys.strapped_to_bootloader());
    }

    #[test]
    fn scheduled_restart_can_be_cancelled() {
        let mut sys = HostSystem::new();
        let handle = sys.schedule_restart(10);
        handle.cancel();
        assert!(handle.is_cancelled());
    }
}
