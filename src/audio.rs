use std::fmt;
use std::sync::{Arc, Mutex};

/// The fixed set of sound cues the simulation can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioCue {
    /// A pellet was eaten.
    Bite,
    /// A fish transitioned into the Dead state.
    Death,
    /// A pellet or egg was dropped into the tank.
    PelletDrop,
}

impl AudioCue {
    pub fn name(self) -> &'static str {
        match self {
            AudioCue::Bite => "bite",
            AudioCue::Death => "death",
            AudioCue::PelletDrop => "pellet_drop",
        }
    }
}

impl fmt::Display for AudioCue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fire-and-forget playback capability supplied by the host.
pub trait AudioSink: Send + Sync {
    fn play(&mut self, cue: AudioCue);
}

/// Discards every cue.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play(&mut self, _cue: AudioCue) {}
}

/// Records cues in order. Clones share the same log, so a handle kept outside
/// the simulation can inspect what was played.
#[derive(Debug, Default, Clone)]
pub struct CueRecorder {
    log: Arc<Mutex<Vec<AudioCue>>>,
}

impl CueRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cues(&self) -> Vec<AudioCue> {
        self.log
            .lock()
            .map(|log| log.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    pub fn count(&self, cue: AudioCue) -> usize {
        self.cues().iter().filter(|c| **c == cue).count()
    }

    pub fn clear(&self) {
        match self.log.lock() {
            Ok(mut log) => log.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl AudioSink for CueRecorder {
    fn play(&mut self, cue: AudioCue) {
        match self.log.lock() {
            Ok(mut log) => log.push(cue),
            Err(poisoned) => poisoned.into_inner().push(cue),
        }
    }
}
