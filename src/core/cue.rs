/// Sound cues — semantic identifiers handed to an external audio player.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    Click,
    Success,
    Wrong,
    Celebrate,
}

impl SoundCue {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::Success => "success",
            Self::Wrong => "wrong",
            Self::Celebrate => "celebrate",
        }
    }
}

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio output unavailable: {0}")]
    Unavailable(String),
    #[error("playback blocked by the host")]
    Blocked,
}

/// Whatever turns cues into sound.
pub trait AudioSink {
    fn play(&mut self, cue: SoundCue) -> Result<(), AudioError>;
}

/// Plays nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl AudioSink for Silent {
    fn play(&mut self, _cue: SoundCue) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Play a cue; failures are dropped since sound is optional.
pub fn emit_cue(sink: &mut dyn AudioSink, cue: SoundCue) {
    if let Err(e) = sink.play(cue) {
        log::debug!("dropping sound cue '{}': {}", cue.name(), e);
    }
}
