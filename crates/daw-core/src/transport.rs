//! Transport state: the playback state machine the control side drives
//! and the render worker observes once per block.

use serde::{Deserialize, Serialize};

/// Transport playback state.
///
/// Recording and count-in are not modelled: multitrack recording and input
/// monitoring are out of scope for this core (see crate docs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TransportState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Transport position and tempo.
///
/// `Transport` only tracks *where* playback is; it does not itself reset
/// DSP state. Callers (the render loop) use the `bool` returned by
/// `stop`/`seek` to decide whether to reset the mixer, matching the state
/// diagram: `Stopped --Seek--> Stopped` leaves DSP state untouched, but
/// every other seek or a stop resets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transport {
    pub state: TransportState,
    /// Current frame cursor. Always 0 while `Stopped`.
    pub cursor: u64,
    pub sample_rate: u32,
    pub bpm: f64,
}

impl Transport {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            state: TransportState::Stopped,
            cursor: 0,
            sample_rate,
            bpm: 120.0,
        }
    }

    pub fn play(&mut self) {
        self.state = TransportState::Playing;
    }

    pub fn pause(&mut self) {
        self.state = TransportState::Paused;
    }

    /// Stop and rewind to zero. Always signals a DSP reset.
    pub fn stop(&mut self) -> bool {
        self.state = TransportState::Stopped;
        self.cursor = 0;
        true
    }

    /// Seek to an absolute frame. Returns whether the caller should reset
    /// DSP state: true unless we were already `Stopped` (a seek while
    /// stopped just repositions the cursor for the next `Play`).
    pub fn seek(&mut self, frame: u64) -> bool {
        let should_reset = self.state != TransportState::Stopped;
        self.cursor = frame;
        should_reset
    }

    /// Advance the cursor by one block's worth of frames. No-op unless
    /// `Playing`.
    pub fn advance(&mut self, buffer_frames: u64) {
        if self.state == TransportState::Playing {
            self.cursor += buffer_frames;
        }
    }

    /// End-of-project transition: rewind and stop, without requiring the
    /// caller to reset DSP state (the mixer naturally idles on an empty
    /// render at cursor 0).
    pub fn end_of_project(&mut self) {
        self.state = TransportState::Stopped;
        self.cursor = 0;
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    pub fn position_secs(&self) -> f64 {
        self.cursor as f64 / self.sample_rate as f64
    }
}
