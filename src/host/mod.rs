//! Host module - thin wrappers over OS facilities
//!
//! The frontmost application name and the microphone input volume are read
//! and written through platform tools (`osascript` on macOS, `xdotool` and
//! `pactl` on Linux). Everything here is synchronous and short-lived.

pub mod app_name;
pub mod audio;
pub mod mic;

pub use app_name::{AppNameSource, SystemAppName};
pub use audio::{AudioInput, SystemAudioInput};
pub use mic::{MicMuteAction, MicState};

use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}")]
    Failed {
        program: &'static str,
        status: std::process::ExitStatus,
    },
    #[error("unexpected output from {program}: {output:?}")]
    Parse {
        program: &'static str,
        output: String,
    },
    #[error("not supported on this platform")]
    Unsupported,
}

/// Run a helper program to completion and return its trimmed stdout
pub(crate) fn run_command(program: &'static str, args: &[&str]) -> Result<String, HostError> {
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|source| HostError::Spawn { program, source })?;

    if !output.status.success() {
        return Err(HostError::Failed {
            program,
            status: output.status,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Start a helper program without waiting for it.
///
/// The child is reaped on a background thread so it does not linger as a zombie.
pub(crate) fn spawn_detached(program: &'static str, args: &[&str]) -> Result<(), HostError> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|source| HostError::Spawn { program, source })?;

    std::thread::spawn(move || {
        if let Err(e) = child.wait() {
            tracing::debug!("Waiting for {} failed: {}", program, e);
        }
    });
    Ok(())
}
