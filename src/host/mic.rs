//! Microphone mute toggle

use super::{AudioInput, HostError};
use tracing::info;

/// Whether the host microphone has been muted by us
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MicState {
    #[default]
    Unmuted,
    /// Muted; `saved_volume` is restored on the next toggle
    Muted { saved_volume: u32 },
}

/// Mutes the microphone by zeroing the input volume and restores it on the
/// next toggle.
///
/// One instance lives for the whole process so the saved volume survives
/// device reconnects.
pub struct MicMuteAction {
    audio: Box<dyn AudioInput>,
    state: MicState,
}

impl MicMuteAction {
    pub fn new(audio: Box<dyn AudioInput>) -> Self {
        Self {
            audio,
            state: MicState::Unmuted,
        }
    }

    pub fn state(&self) -> MicState {
        self.state
    }

    /// Flip between muted and unmuted.
    ///
    /// Muting fails without changing state if the host volume cannot be read
    /// or set. Unmuting always succeeds: the restore is fired without waiting,
    /// so a restore the host rejects leaves the microphone silent while the
    /// state reads `Unmuted`.
    pub fn toggle(&mut self) -> Result<MicState, HostError> {
        self.state = match self.state {
            MicState::Unmuted => {
                let saved_volume = self.audio.input_volume()?;
                self.audio.set_input_volume(0)?;
                info!("Mic: MUTED (was {})", saved_volume);
                MicState::Muted { saved_volume }
            }
            MicState::Muted { saved_volume } => {
                self.audio.restore_input_volume(saved_volume);
                info!("Mic: UNMUTED (restored to {})", saved_volume);
                MicState::Unmuted
            }
        };
        Ok(self.state)
    }
}
