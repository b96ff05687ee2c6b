//! Serial module - device discovery and the raw serial channel

mod channel;
mod locator;

pub use channel::{Channel, OpenError, ReadOutcome, SerialChannel};
pub use locator::{DevicePath, LocateError, PortLocator};
