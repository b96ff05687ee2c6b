//! Macropad Bridge
//!
//! Host companion for a USB serial macropad.
//!
//! # Features
//! - Sends the frontmost application's name to the device once per second, on change
//! - Relays line commands from the device to host actions (`MIC_TOGGLE`)
//! - Finds the device automatically and reconnects after unplug/replug
//! - Stops cleanly on Ctrl-C, closing the serial port

pub mod core;
pub mod host;
pub mod serial;
pub mod session;

pub use core::config::Config;
pub use core::shutdown::Shutdown;
pub use host::{MicMuteAction, MicState};
pub use serial::{DevicePath, SerialChannel};
pub use session::{CommandRouter, Supervisor, SupervisorState};
