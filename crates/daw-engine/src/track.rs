//! Audio and MIDI tracks (§4.G/§4.H): clip playback, mute/solo gating,
//! per-track effect chain, and the constant-power pan law shared by both
//! track kinds.

use std::collections::HashSet;
use std::sync::Arc;

use daw_core::{AudioClip, ClipId, EngineError, MidiClip, NoteId, SourceBuffer, TrackId};

use crate::effects::EffectChain;
use crate::voice::VoiceBank;

fn pan_gains(pan: f32) -> (f32, f32) {
    let theta = (pan.clamp(-1.0, 1.0) + 1.0) * std::f32::consts::FRAC_PI_4;
    (theta.cos(), theta.sin())
}

/// An audio track: clips read directly from their source buffers, summed
/// additively where they overlap.
#[derive(Debug)]
pub struct AudioTrack {
    pub id: TrackId,
    pub name: String,
    pub volume: f32,
    pub pan: f32,
    pub mute: bool,
    pub solo: bool,
    pub clips: Vec<AudioClip>,
    pub effects: EffectChain,
    scratch: Vec<f32>,
}

impl AudioTrack {
    pub fn new(id: TrackId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            volume: 1.0,
            pan: 0.0,
            mute: false,
            solo: false,
            clips: Vec::new(),
            effects: EffectChain::new(),
            scratch: Vec::new(),
        }
    }

    pub fn add_clip(&mut self, clip: AudioClip) {
        self.clips.push(clip);
    }

    pub fn remove_clip(&mut self, clip_id: ClipId) -> Result<(), EngineError> {
        let pos = self.clips.iter().position(|c| c.id == clip_id).ok_or(EngineError::ClipNotFound(clip_id.0))?;
        self.clips.remove(pos);
        Ok(())
    }

    /// Swap a clip's underlying source buffer in place. Only safe to call
    /// while the transport is stopped — the caller (`MasterMixer`) is
    /// responsible for that guard, since `AudioTrack` has no transport
    /// visibility of its own.
    pub fn replace_clip_source(&mut self, clip_id: ClipId, source: Arc<SourceBuffer>) -> Result<(), EngineError> {
        let clip = self.clips.iter_mut().find(|c| c.id == clip_id).ok_or(EngineError::ClipNotFound(clip_id.0))?;
        clip.source = source;
        Ok(())
    }

    /// Zero every stateful effect on this track. Called on `Stop`/`Seek`
    /// so a ringing delay or reverb tail doesn't survive a transport reset.
    pub fn reset(&mut self) {
        self.effects.reset();
    }

    /// Render `frame_count` frames starting at project frame
    /// `start_frame` into the returned scratch buffer.
    pub fn render(&mut self, start_frame: u64, frame_count: usize, channels: usize, sample_rate: u32, has_solo: bool) -> &[f32] {
        let total = frame_count * channels;
        if self.scratch.len() < total {
            self.scratch.resize(total, 0.0);
        }
        self.scratch[..total].fill(0.0);

        if self.mute || (has_solo && !self.solo) {
            return &self.scratch[..total];
        }

        for clip in &self.clips {
            for f in 0..frame_count {
                let project_frame = start_frame + f as u64;
                let Some(source_frame) = clip.sample_at(project_frame) else { continue };
                let base = f * channels;
                for ch in 0..channels {
                    let s = source_frame.get(ch.min(source_frame.len().saturating_sub(1))).copied().unwrap_or(0.0);
                    self.scratch[base + ch] += s * clip.volume;
                }
            }
        }

        self.effects.process(&mut self.scratch[..total], channels, sample_rate, start_frame);

        let (left_gain, right_gain) = pan_gains(self.pan);
        apply_volume_and_pan(&mut self.scratch[..total], channels, self.volume, left_gain, right_gain);

        &self.scratch[..total]
    }
}

/// A MIDI track: a voice bank driven by clip note events, then the same
/// effect-chain / volume / pan path as an audio track.
#[derive(Debug)]
pub struct MidiTrack {
    pub id: TrackId,
    pub name: String,
    pub volume: f32,
    pub pan: f32,
    pub mute: bool,
    pub solo: bool,
    pub clips: Vec<MidiClip>,
    pub effects: EffectChain,
    pub voice_bank: VoiceBank,
    active_notes: HashSet<NoteId>,
    scratch: Vec<f32>,
}

impl MidiTrack {
    fn new_with(id: TrackId, name: impl Into<String>, voice_bank: VoiceBank) -> Self {
        Self {
            id,
            name: name.into(),
            volume: 1.0,
            pan: 0.0,
            mute: false,
            solo: false,
            clips: Vec::new(),
            effects: EffectChain::new(),
            voice_bank,
            active_notes: HashSet::new(),
            scratch: Vec::new(),
        }
    }

    /// A MIDI track driven by the built-in oscillator bank.
    pub fn new_synth(id: TrackId, name: impl Into<String>, max_voices: usize) -> Self {
        Self::new_with(id, name, VoiceBank::synth(max_voices))
    }

    /// A MIDI track driven by sample playback zones.
    pub fn new_sampler(id: TrackId, name: impl Into<String>, max_voices: usize) -> Self {
        Self::new_with(id, name, VoiceBank::sampler(max_voices))
    }

    pub fn add_clip(&mut self, clip: MidiClip) {
        self.clips.push(clip);
    }

    pub fn reset(&mut self, sample_rate: u32) {
        let _ = sample_rate;
        self.voice_bank.all_notes_off();
        self.active_notes.clear();
        self.effects.reset();
    }

    pub fn render(&mut self, start_frame: u64, frame_count: usize, channels: usize, sample_rate: u32, bpm: f64, has_solo: bool) -> &[f32] {
        let total = frame_count * channels;
        if self.scratch.len() < total {
            self.scratch.resize(total, 0.0);
        }
        self.scratch[..total].fill(0.0);

        if self.mute || (has_solo && !self.solo) {
            return &self.scratch[..total];
        }

        let start_tick = daw_core::time::seconds_to_ticks(start_frame as f64 / sample_rate as f64, bpm).max(0) as u64;
        let end_tick = daw_core::time::seconds_to_ticks((start_frame + frame_count as u64) as f64 / sample_rate as f64, bpm).max(0) as u64;

        for clip in &self.clips {
            let local_from = start_tick.saturating_sub(clip.start_tick);
            let local_to = end_tick.saturating_sub(clip.start_tick);

            for note in clip.note_on_events(local_from, local_to) {
                self.voice_bank.note_on(note.note_number, note.velocity, sample_rate);
                self.active_notes.insert(note.id);
            }
            for note in clip.note_off_events(local_from, local_to) {
                self.voice_bank.note_off(note.note_number, sample_rate);
                self.active_notes.remove(&note.id);
            }
        }

        self.voice_bank.render(&mut self.scratch[..total], frame_count, channels, sample_rate);
        self.effects.process(&mut self.scratch[..total], channels, sample_rate, start_frame);

        let (left_gain, right_gain) = pan_gains(self.pan);
        apply_volume_and_pan(&mut self.scratch[..total], channels, self.volume, left_gain, right_gain);

        &self.scratch[..total]
    }
}

/// Apply track volume, then constant-power pan across the first two
/// channels. A mono buffer has no left/right to pan between, so it gets
/// volume only — panning a single channel would otherwise silently
/// attenuate it by the centre-pan power split even at `pan = 0`.
fn apply_volume_and_pan(buffer: &mut [f32], channels: usize, volume: f32, left_gain: f32, right_gain: f32) {
    if channels == 0 {
        return;
    }
    if channels == 1 {
        for s in buffer.iter_mut() {
            *s *= volume;
        }
        return;
    }
    for frame in buffer.chunks_mut(channels) {
        frame[0] *= volume * left_gain;
        frame[1] *= volume * right_gain;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daw_core::{ClipId, MidiNote};
    use std::sync::Arc;
    use daw_core::SourceBuffer;

    #[test]
    fn pan_center_is_equal_power_split() {
        let (l, r) = pan_gains(0.0);
        assert!((l - r).abs() < 1e-6);
        assert!((l * l + r * r - 1.0).abs() < 1e-6);
    }

    #[test]
    fn pan_hard_left_silences_right() {
        let (_l, r) = pan_gains(-1.0);
        assert!(r.abs() < 1e-6);
    }

    #[test]
    fn muted_audio_track_renders_silence() {
        let mut track = AudioTrack::new(TrackId(1), "a");
        track.mute = true;
        let src = Arc::new(SourceBuffer::new(vec![1.0; 100], 44_100, 1));
        track.add_clip({
            let mut c = AudioClip::new(ClipId(1), src);
            c.duration_frames = 100;
            c
        });
        let out = track.render(0, 50, 1, 44_100, false);
        assert!(out.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn midi_track_note_on_activates_voice() {
        let mut track = MidiTrack::new_synth(TrackId(1), "m", 8);
        let mut clip = MidiClip::new(ClipId(1), 0);
        clip.add_note(MidiNote::new(daw_core::NoteId(1), 69, 100, 0, 480, 0));
        track.add_clip(clip);
        let out = track.render(0, 256, 2, 44_100, 120.0, false);
        assert!(out.iter().any(|&s| s != 0.0));
    }
}
