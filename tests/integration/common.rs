//! Test doubles for host collaborators

use macropad_bridge::host::{AppNameSource, AudioInput, HostError};
use parking_lot::Mutex;
use std::sync::Arc;

/// Always reports the same application
pub struct FixedApp(pub &'static str);

impl AppNameSource for FixedApp {
    fn frontmost_app_name(&self) -> String {
        self.0.to_string()
    }
}

/// Audio input backed by a shared volume value
#[derive(Clone)]
pub struct SharedVolume(pub Arc<Mutex<u32>>);

impl SharedVolume {
    pub fn new(volume: u32) -> Self {
        Self(Arc::new(Mutex::new(volume)))
    }

    pub fn get(&self) -> u32 {
        *self.0.lock()
    }
}

impl AudioInput for SharedVolume {
    fn input_volume(&self) -> Result<u32, HostError> {
        Ok(*self.0.lock())
    }

    fn set_input_volume(&self, volume: u32) -> Result<(), HostError> {
        *self.0.lock() = volume;
        Ok(())
    }

    fn restore_input_volume(&self, volume: u32) {
        *self.0.lock() = volume;
    }
}
