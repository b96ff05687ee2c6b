//! Microphone input volume control

use super::HostError;
#[cfg(any(target_os = "macos", target_os = "linux"))]
use super::{run_command, spawn_detached};
use tracing::warn;

/// Host audio input volume, as a percentage
pub trait AudioInput: Send {
    fn input_volume(&self) -> Result<u32, HostError>;

    fn set_input_volume(&self, volume: u32) -> Result<(), HostError>;

    /// Set the volume without waiting for the host to apply it
    fn restore_input_volume(&self, volume: u32);
}

/// Controls the default input device of the host
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAudioInput;

#[cfg(target_os = "macos")]
impl AudioInput for SystemAudioInput {
    fn input_volume(&self) -> Result<u32, HostError> {
        let out = run_command("osascript", &["-e", "input volume of (get volume settings)"])?;
        out.parse().map_err(|_| HostError::Parse {
            program: "osascript",
            output: out,
        })
    }

    fn set_input_volume(&self, volume: u32) -> Result<(), HostError> {
        run_command("osascript", &["-e", &format!("set volume input volume {}", volume)])?;
        Ok(())
    }

    fn restore_input_volume(&self, volume: u32) {
        let script = format!("set volume input volume {}", volume);
        if let Err(e) = spawn_detached("osascript", &["-e", &script]) {
            warn!("Failed to restore input volume: {}", e);
        }
    }
}

#[cfg(target_os = "linux")]
impl AudioInput for SystemAudioInput {
    fn input_volume(&self) -> Result<u32, HostError> {
        let out = run_command("pactl", &["get-source-volume", "@DEFAULT_SOURCE@"])?;
        parse_pactl_percent(&out).ok_or(HostError::Parse {
            program: "pactl",
            output: out,
        })
    }

    fn set_input_volume(&self, volume: u32) -> Result<(), HostError> {
        run_command(
            "pactl",
            &["set-source-volume", "@DEFAULT_SOURCE@", &format!("{}%", volume)],
        )?;
        Ok(())
    }

    fn restore_input_volume(&self, volume: u32) {
        let level = format!("{}%", volume);
        if let Err(e) = spawn_detached("pactl", &["set-source-volume", "@DEFAULT_SOURCE@", &level]) {
            warn!("Failed to restore input volume: {}", e);
        }
    }
}

#[cfg(not(any(target_os = "macos", target_os = "linux")))]
impl AudioInput for SystemAudioInput {
    fn input_volume(&self) -> Result<u32, HostError> {
        Err(HostError::Unsupported)
    }

    fn set_input_volume(&self, _volume: u32) -> Result<(), HostError> {
        Err(HostError::Unsupported)
    }

    fn restore_input_volume(&self, _volume: u32) {
        warn!("Input volume control not supported on this platform");
    }
}

/// First channel's percentage from `pactl get-source-volume` output, e.g.
/// `Volume: front-left: 26214 /  40% / -23.88 dB, ...`
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_pactl_percent(output: &str) -> Option<u32> {
    output
        .split_whitespace()
        .find_map(|token| token.strip_suffix('%'))
        .and_then(|n| n.parse().ok())
}
