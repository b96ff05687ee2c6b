//! Inbound command framing and dispatch
//!
//! The device sends one command token per line, e.g. `MIC_TOGGLE\n`.

use crate::host::MicMuteAction;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

/// Accumulates bytes between reads and yields complete lines
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `bytes` and return every line completed by them, without the
    /// terminating `\n`. Invalid UTF-8 is replaced rather than rejected.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.pending[start..].iter().position(|&b| b == b'\n') {
            let end = start + offset;
            lines.push(String::from_utf8_lossy(&self.pending[start..end]).into_owned());
            start = end + 1;
        }
        self.pending.drain(..start);
        lines
    }

    /// Bytes of the incomplete trailing line
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }
}

/// Commands understood from the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    MicToggle,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::MicToggle => "MIC_TOGGLE",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Command {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MIC_TOGGLE" => Ok(Command::MicToggle),
            _ => Err(()),
        }
    }
}

/// What happened to a dispatched line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// Whitespace only; ignored
    Empty,
    /// Matched a command and ran its action
    Handled(Command),
    /// Logged and dropped
    Unrecognized(String),
}

/// Routes command lines to host actions
pub struct CommandRouter {
    mic: MicMuteAction,
}

impl CommandRouter {
    pub fn new(mic: MicMuteAction) -> Self {
        Self { mic }
    }

    pub fn mic(&self) -> &MicMuteAction {
        &self.mic
    }

    /// Run the action bound to `line`. Never fails the session.
    pub fn dispatch(&mut self, line: &str) -> Dispatch {
        let cmd = line.trim();
        if cmd.is_empty() {
            return Dispatch::Empty;
        }

        match cmd.parse::<Command>() {
            Ok(command) => {
                debug!("Command: {}", command);
                match command {
                    Command::MicToggle => {
                        if let Err(e) = self.mic.toggle() {
                            warn!("Mic toggle failed: {}", e);
                        }
                    }
                }
                Dispatch::Handled(command)
            }
            Err(()) => {
                warn!("Unknown command: {:?}", cmd);
                Dispatch::Unrecognized(cmd.to_string())
            }
        }
    }
}
