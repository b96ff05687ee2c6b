//! Configuration management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Serial port configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerialConfig {
    /// Line speed in baud
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Idle window for draining boot-time output, in milliseconds
    #[serde(default = "default_drain_window")]
    pub drain_window_ms: u64,
    /// Directory scanned during auto-detection
    #[serde(default = "default_device_dir")]
    pub device_dir: PathBuf,
    /// Device node file name prefix matched during auto-detection
    #[serde(default = "default_device_prefix")]
    pub device_prefix: String,
}

fn default_baud_rate() -> u32 {
    115_200
}
fn default_drain_window() -> u64 {
    500
}
fn default_device_dir() -> PathBuf {
    PathBuf::from("/dev")
}
#[cfg(target_os = "macos")]
fn default_device_prefix() -> String {
    "cu.usbmodem".to_string()
}
#[cfg(not(target_os = "macos"))]
fn default_device_prefix() -> String {
    "ttyACM".to_string()
}

impl SerialConfig {
    pub fn drain_window(&self) -> Duration {
        Duration::from_millis(self.drain_window_ms)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: default_baud_rate(),
            drain_window_ms: default_drain_window(),
            device_dir: default_device_dir(),
            device_prefix: default_device_prefix(),
        }
    }
}

/// Session and reconnect timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Interval between session ticks in milliseconds
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Cooldown between connection attempts in milliseconds
    #[serde(default = "default_retry_interval")]
    pub retry_interval_ms: u64,
}

fn default_tick_interval() -> u64 {
    1000
}
fn default_retry_interval() -> u64 {
    5000
}

impl TimingConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval(),
            retry_interval_ms: default_retry_interval(),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Serial port configuration
    #[serde(default)]
    pub serial: SerialConfig,
    /// Tick and retry timing
    #[serde(default)]
    pub timing: TimingConfig,
}

impl Config {
    /// Load configuration from the platform config directory.
    ///
    /// A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read config file: {:?}", config_path))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", config_path))?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("org", "macropad", "MacropadBridge")
            .context("Failed to determine config directory")?;
        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Get the default configuration embedded in the binary
    pub fn default_config_str() -> &'static str {
        include_str!("../../config/default.toml")
    }
}
