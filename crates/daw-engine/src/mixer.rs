//! Master mixer (§4.I): the single per-block render entry point. Mixes
//! every audio and MIDI track, runs the master effect chain, applies
//! master gain, clamps, and records peak/RMS meters.

use std::sync::Arc;

use daw_core::{ClipId, EngineError, SourceBuffer, TrackId};

use crate::buffer::AudioBuffer;
use crate::effects::EffectChain;
use crate::track::{AudioTrack, MidiTrack};

#[derive(Debug, Clone, Copy, Default)]
pub struct Meters {
    pub peak_left: f32,
    pub peak_right: f32,
    pub rms_left: f32,
    pub rms_right: f32,
}

#[derive(Debug)]
pub struct MasterMixer {
    pub audio_tracks: Vec<AudioTrack>,
    pub midi_tracks: Vec<MidiTrack>,
    pub master_effects: EffectChain,
    pub master_gain: f32,
    master_scratch: AudioBuffer,
    pub last_meters: Meters,
    channels: usize,
}

impl MasterMixer {
    pub fn new(channels: usize) -> Self {
        Self {
            audio_tracks: Vec::new(),
            midi_tracks: Vec::new(),
            master_effects: EffectChain::new(),
            master_gain: 1.0,
            master_scratch: AudioBuffer::new(0, channels),
            last_meters: Meters::default(),
            channels,
        }
    }

    pub fn audio_track_mut(&mut self, id: TrackId) -> Option<&mut AudioTrack> {
        self.audio_tracks.iter_mut().find(|t| t.id == id)
    }

    pub fn midi_track_mut(&mut self, id: TrackId) -> Option<&mut MidiTrack> {
        self.midi_tracks.iter_mut().find(|t| t.id == id)
    }

    fn has_solo(&self) -> bool {
        self.audio_tracks.iter().any(|t| t.solo) || self.midi_tracks.iter().any(|t| t.solo)
    }

    pub fn total_duration_frames(&self) -> u64 {
        let audio_end = self.audio_tracks.iter().flat_map(|t| t.clips.iter().map(|c| c.end_frame())).max();
        let midi_end = self
            .midi_tracks
            .iter()
            .flat_map(|t| t.clips.iter().map(|c| c.start_tick + c.effective_length_ticks()))
            .max();
        audio_end.unwrap_or(0).max(midi_end.unwrap_or(0))
    }

    /// Render one block starting at project frame `start_frame`. Returns
    /// the master scratch buffer as interleaved samples.
    pub fn render(&mut self, start_frame: u64, frame_count: usize, sample_rate: u32, bpm: f64) -> &[f32] {
        self.master_scratch.resize(frame_count, self.channels);
        self.master_scratch.clear();

        let has_solo = self.has_solo();

        for track in self.audio_tracks.iter_mut() {
            let rendered = track.render(start_frame, frame_count, self.channels, sample_rate, has_solo);
            self.master_scratch.mix_from(rendered, 1.0);
        }

        for track in self.midi_tracks.iter_mut() {
            let rendered = track.render(start_frame, frame_count, self.channels, sample_rate, bpm, has_solo);
            self.master_scratch.mix_from(rendered, 1.0);
        }

        self.master_effects.process(self.master_scratch.as_mut_slice(), self.channels, sample_rate, start_frame);
        self.master_scratch.apply_gain(self.master_gain);
        self.master_scratch.clamp();

        let (peak_left, peak_right) = self.master_scratch.peak();
        let (rms_left, rms_right) = self.master_scratch.rms();
        self.last_meters = Meters { peak_left, peak_right, rms_left, rms_right };

        self.master_scratch.as_slice()
    }

    /// Replace an audio clip's source buffer. The caller (`RenderLoop`)
    /// guards this with a transport-state check — it is only safe while
    /// stopped, since the render path reads `source` without locking.
    pub fn replace_audio_clip_source(&mut self, track_id: TrackId, clip_id: ClipId, source: Arc<SourceBuffer>) -> Result<(), EngineError> {
        self.audio_track_mut(track_id)
            .ok_or(EngineError::TrackNotFound(track_id.0))?
            .replace_clip_source(clip_id, source)
    }

    pub fn remove_audio_clip(&mut self, track_id: TrackId, clip_id: ClipId) -> Result<(), EngineError> {
        self.audio_track_mut(track_id)
            .ok_or(EngineError::TrackNotFound(track_id.0))?
            .remove_clip(clip_id)
    }

    pub fn reset(&mut self, sample_rate: u32) {
        for track in self.audio_tracks.iter_mut() {
            track.reset();
        }
        for track in self.midi_tracks.iter_mut() {
            track.reset(sample_rate);
        }
        self.master_effects.reset();
    }
}
