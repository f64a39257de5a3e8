//! Audio cue output

use tracing::debug;

use crate::game::AudioCue;

/// Fire-and-forget sound output. Failures are never surfaced.
pub trait AudioSink: Send {
    fn play(&mut self, cue: AudioCue);
}

/// Headless sink that records cues in the trace log
#[derive(Debug, Default)]
pub struct TracingAudio;

impl AudioSink for TracingAudio {
    fn play(&mut self, cue: AudioCue) {
        debug!(?cue, "Audio cue");
    }
}
