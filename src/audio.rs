//! Audio collaborator interface
//!
//! The simulation only issues play/stop/loop requests. Requests are
//! fire-and-forget: the level loop never waits on them and a failing backend
//! is logged and otherwise ignored.

use thiserror::Error;

/// Sound cue identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// Level background loop
    Ambient,
    Jump,
    Dash,
    /// Feet touched ground after being airborne
    Land,
    Pickup,
    Death,
    Portal,
}

/// Why a backend could not honor a request
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AudioError {
    #[error("audio device unavailable")]
    Unavailable,
}

/// Audio backend driven by the level loop
pub trait AudioControl {
    /// Play a cue once
    fn play(&mut self, cue: SoundCue) -> Result<(), AudioError>;

    /// Stop a cue (one-shot or looping)
    fn stop(&mut self, cue: SoundCue) -> Result<(), AudioError>;

    /// Play a cue on repeat until stopped
    fn play_loop(&mut self, cue: SoundCue) -> Result<(), AudioError>;
}

/// Audio disabled: every request succeeds and does nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAudio;

impl AudioControl for SilentAudio {
    fn play(&mut self, _cue: SoundCue) -> Result<(), AudioError> {
        Ok(())
    }

    fn stop(&mut self, _cue: SoundCue) -> Result<(), AudioError> {
        Ok(())
    }

    fn play_loop(&mut self, _cue: SoundCue) -> Result<(), AudioError> {
        Ok(())
    }
}

/// Headless backend that logs each request and tracks the active loop
#[derive(Debug, Default)]
pub struct LogAudio {
    looping: Option<SoundCue>,
}

impl LogAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cue currently looping, if any
    pub fn looping(&self) -> Option<SoundCue> {
        self.looping
    }
}

impl AudioControl for LogAudio {
    fn play(&mut self, cue: SoundCue) -> Result<(), AudioError> {
        log::debug!("audio: play {:?}", cue);
        Ok(())
    }

    fn stop(&mut self, cue: SoundCue) -> Result<(), AudioError> {
        if self.looping == Some(cue) {
            self.looping = None;
        }
        log::debug!("audio: stop {:?}", cue);
        Ok(())
    }

    fn play_loop(&mut self, cue: SoundCue) -> Result<(), AudioError> {
        self.looping = Some(cue);
        log::debug!("audio: loop {:?}", cue);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_audio_tracks_loop() {
        let mut audio = LogAudio::new();
        audio.play_loop(SoundCue::Ambient).unwrap();
        assert_eq!(audio.looping(), Some(SoundCue::Ambient));
        // Stopping another cue leaves the loop alone
        audio.stop(SoundCue::Jump).unwrap();
        assert_eq!(audio.looping(), Some(SoundCue::Ambient));
        audio.stop(SoundCue::Ambient).unwrap();
        assert_eq!(audio.looping(), None);
    }

    #[test]
    fn test_error_message() {
        assert_eq!(AudioError::Unavailable.to_string(), "audio device unavailable");
    }
}
