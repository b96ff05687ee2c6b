//! Serial device discovery

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Path of a serial endpoint. May differ between attempts after a replug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevicePath(PathBuf);

impl DevicePath {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for DevicePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("no device matching {pattern}")]
    NotFound { pattern: String },
}

/// Finds the device node by scanning `device_dir` for `<prefix>*`
#[derive(Debug, Clone)]
pub struct PortLocator {
    device_dir: PathBuf,
    prefix: String,
}

impl PortLocator {
    pub fn new(device_dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            device_dir: device_dir.into(),
            prefix: prefix.into(),
        }
    }

    /// Glob-style description of what auto-detection matches
    pub fn pattern(&self) -> String {
        format!("{}*", self.device_dir.join(&self.prefix).display())
    }

    /// Return the explicit path unchanged, or the lexicographically first match.
    ///
    /// An explicit path is not validated; opening it reports any problem.
    pub fn locate(&self, explicit: Option<&Path>) -> Result<DevicePath, LocateError> {
        if let Some(path) = explicit {
            return Ok(DevicePath::new(path));
        }

        let mut matches: Vec<PathBuf> = match fs::read_dir(&self.device_dir) {
            Ok(entries) => entries
                .flatten()
                .filter(|entry| entry.file_name().to_string_lossy().starts_with(&self.prefix))
                .map(|entry| entry.path())
                .collect(),
            Err(e) => {
                tracing::debug!("Cannot list {:?}: {}", self.device_dir, e);
                Vec::new()
            }
        };
        matches.sort();

        matches
            .into_iter()
            .next()
            .map(DevicePath)
            .ok_or_else(|| LocateError::NotFound {
                pattern: self.pattern(),
            })
    }
}
