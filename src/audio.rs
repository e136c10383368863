//! Audio seam
//!
//! The simulation only announces cues; decoding and playback belong to
//! whatever `AudioSink` the embedder plugs in.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Sound cue types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCue {
    /// Snake ate a food item
    Eat,
    /// A food or mine appeared
    Spawn,
    /// Run ended
    Die,
}

impl SoundCue {
    pub fn as_str(&self) -> &'static str {
        match self {
            SoundCue::Eat => "eat",
            SoundCue::Spawn => "spawn",
            SoundCue::Die => "die",
        }
    }
}

/// Fire-and-forget sound output shared by every loop
pub trait AudioSink: Send + Sync {
    fn play(&self, cue: SoundCue);

    /// Start or stop the background track
    fn set_music(&self, _playing: bool) {}
}

/// Discards every cue
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play(&self, _cue: SoundCue) {}
}

/// Logs cues instead of playing them (headless runs)
#[derive(Debug, Default, Clone, Copy)]
pub struct LogAudio;

impl AudioSink for LogAudio {
    fn play(&self, cue: SoundCue) {
        log::debug!("♪ {}", cue.as_str());
    }

    fn set_music(&self, playing: bool) {
        log::debug!("♪ music {}", if playing { "on" } else { "off" });
    }
}

/// Remembers every cue in order
#[derive(Debug, Default)]
pub struct RecordingAudio {
    cues: Mutex<Vec<SoundCue>>,
    music: AtomicBool,
}

impl RecordingAudio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cues played so far
    pub fn cues(&self) -> Vec<SoundCue> {
        self.cues.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn count(&self, cue: SoundCue) -> usize {
        self.cues().iter().filter(|c| **c == cue).count()
    }

    pub fn music_playing(&self) -> bool {
        self.music.load(Ordering::SeqCst)
    }
}

impl AudioSink for RecordingAudio {
    fn play(&self, cue: SoundCue) {
        self.cues.lock().unwrap_or_else(|e| e.into_inner()).push(cue);
    }

    fn set_music(&self, playing: bool) {
        self.music.store(playing, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_keeps_order() {
        let audio = RecordingAudio::new();
        audio.play(SoundCue::Spawn);
        audio.play(SoundCue::Eat);
        audio.play(SoundCue::Spawn);
        assert_eq!(audio.cues(), vec![SoundCue::Spawn, SoundCue::Eat, SoundCue::Spawn]);
        assert_eq!(audio.count(SoundCue::Spawn), 2);
        assert_eq!(audio.count(SoundCue::Die), 0);
    }
}
