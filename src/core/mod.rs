//! Core module - Configuration and shutdown signalling

pub mod config;
pub mod shutdown;
