//! Voice banks (§4.E/§4.F): fixed-size, allocation-free polyphony for
//! synthesized and sample-based playback.

mod sampler;
mod synth;

pub use sampler::{LoopMode, SamplerVoiceBank, SamplerZone};
pub use synth::{AdsrParams, EnvStage, SynthVoiceBank, Waveform};

/// A MIDI track's note source. Tagged-variant, same shape as `Effect`
/// (§4.C), rather than a trait object — a track is either synth-backed
/// or sampler-backed, never both at once.
#[derive(Debug, Clone)]
pub enum VoiceBank {
    Synth(SynthVoiceBank),
    Sampler(SamplerVoiceBank),
}

impl VoiceBank {
    pub fn synth(max_voices: usize) -> Self {
        VoiceBank::Synth(SynthVoiceBank::new(max_voices))
    }

    pub fn sampler(max_voices: usize) -> Self {
        VoiceBank::Sampler(SamplerVoiceBank::new(max_voices))
    }

    pub fn as_synth(&self) -> Option<&SynthVoiceBank> {
        match self {
            VoiceBank::Synth(bank) => Some(bank),
            VoiceBank::Sampler(_) => None,
        }
    }

    pub fn as_synth_mut(&mut self) -> Option<&mut SynthVoiceBank> {
        match self {
            VoiceBank::Synth(bank) => Some(bank),
            VoiceBank::Sampler(_) => None,
        }
    }

    pub fn as_sampler(&self) -> Option<&SamplerVoiceBank> {
        match self {
            VoiceBank::Sampler(bank) => Some(bank),
            VoiceBank::Synth(_) => None,
        }
    }

    pub fn as_sampler_mut(&mut self) -> Option<&mut SamplerVoiceBank> {
        match self {
            VoiceBank::Sampler(bank) => Some(bank),
            VoiceBank::Synth(_) => None,
        }
    }

    pub fn note_on(&mut self, note_number: u8, velocity: u8, sample_rate: u32) {
        match self {
            VoiceBank::Synth(bank) => bank.note_on(note_number, velocity),
            VoiceBank::Sampler(bank) => bank.note_on(note_number, velocity, sample_rate),
        }
    }

    pub fn note_off(&mut self, note_number: u8, sample_rate: u32) {
        match self {
            VoiceBank::Synth(bank) => bank.note_off(note_number, sample_rate),
            VoiceBank::Sampler(bank) => bank.note_off(note_number, sample_rate),
        }
    }

    pub fn all_notes_off(&mut self) {
        match self {
            VoiceBank::Synth(bank) => bank.all_notes_off(),
            VoiceBank::Sampler(bank) => bank.all_notes_off(),
        }
    }

    /// Render `frame_count` frames additively into `out`. Master volume
    /// scaling for the synth path is fixed at unity here — `MidiTrack`
    /// applies track volume afterwards, the same way for both variants.
    pub fn render(&mut self, out: &mut [f32], frame_count: usize, channels: usize, sample_rate: u32) {
        match self {
            VoiceBank::Synth(bank) => bank.render(out, frame_count, channels, sample_rate, 1.0),
            VoiceBank::Sampler(bank) => bank.render(out, frame_count, channels, sample_rate),
        }
    }
}
