//! Fixed-size polyphonic oscillator bank (§4.E). Voice-stealing keeps
//! allocation O(`MaxVoices`) with no heap traffic on the render path.

use std::f32::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvStage {
    Off,
    Attack,
    Decay,
    Sustain,
    Release,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Saw,
    Square,
    Triangle,
}

impl Waveform {
    fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => phase.sin(),
            Waveform::Saw => 1.0 - 2.0 * (phase / TAU),
            Waveform::Square => if phase < std::f32::consts::PI { 1.0 } else { -1.0 },
            Waveform::Triangle => 2.0 * (2.0 * (phase / TAU) - 1.0).abs() - 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AdsrParams {
    pub attack_s: f32,
    pub decay_s: f32,
    pub sustain_level: f32,
    pub release_s: f32,
}

impl Default for AdsrParams {
    fn default() -> Self {
        Self { attack_s: 0.01, decay_s: 0.1, sustain_level: 0.7, release_s: 0.2 }
    }
}

#[derive(Debug, Clone, Copy)]
struct Voice {
    active: bool,
    note_number: u8,
    velocity: u8,
    phase: f32,
    phase_detune: f32,
    freq: f32,
    freq_detune: f32,
    env_stage: EnvStage,
    env_level: f32,
    release_start_level: f32,
    release_samples_remaining: u64,
}

impl Default for Voice {
    fn default() -> Self {
        Self {
            active: false,
            note_number: 0,
            velocity: 0,
            phase: 0.0,
            phase_detune: 0.0,
            freq: 0.0,
            freq_detune: 0.0,
            env_stage: EnvStage::Off,
            env_level: 0.0,
            release_start_level: 0.0,
            release_samples_remaining: 0,
        }
    }
}

fn note_freq(note_number: u8) -> f32 {
    440.0 * 2f32.powf((note_number as f32 - 69.0) / 12.0)
}

#[derive(Debug, Clone)]
pub struct SynthVoiceBank {
    voices: Vec<Voice>,
    pub waveform: Waveform,
    pub adsr: AdsrParams,
    pub detune_cents: f32,
}

impl SynthVoiceBank {
    pub fn new(max_voices: usize) -> Self {
        Self {
            voices: vec![Voice::default(); max_voices.max(1)],
            waveform: Waveform::Sine,
            adsr: AdsrParams::default(),
            detune_cents: 0.0,
        }
    }

    pub fn max_voices(&self) -> usize {
        self.voices.len()
    }

    pub fn note_on(&mut self, note_number: u8, velocity: u8) {
        let target = self
            .voices
            .iter()
            .position(|v| !v.active)
            .or_else(|| {
                self.voices
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| v.env_stage == EnvStage::Release)
                    .min_by(|(_, a), (_, b)| a.env_level.total_cmp(&b.env_level))
                    .map(|(i, _)| i)
            })
            .unwrap_or(0);

        let freq = note_freq(note_number);
        let voice = &mut self.voices[target];
        voice.active = true;
        voice.note_number = note_number;
        voice.velocity = velocity;
        voice.freq = freq;
        voice.freq_detune = freq * 2f32.powf(self.detune_cents / 1200.0);
        voice.env_stage = EnvStage::Attack;
        voice.env_level = 0.0;
    }

    pub fn note_off(&mut self, note_number: u8, sample_rate: u32) {
        for voice in self.voices.iter_mut() {
            if voice.active && voice.note_number == note_number && voice.env_stage != EnvStage::Release {
                voice.release_start_level = voice.env_level;
                voice.env_stage = EnvStage::Release;
                voice.release_samples_remaining = (self.adsr.release_s * sample_rate as f32) as u64;
            }
        }
    }

    pub fn all_notes_off(&mut self) {
        for voice in self.voices.iter_mut() {
            *voice = Voice::default();
        }
    }

    /// Render `frame_count` frames additively into `out`, which holds
    /// `frame_count * channels` interleaved samples.
    pub fn render(&mut self, out: &mut [f32], frame_count: usize, channels: usize, sample_rate: u32, master_volume: f32) {
        if channels == 0 {
            return;
        }
        let attack_inc = 1.0 / (self.adsr.attack_s * sample_rate as f32).max(1.0);
        let decay_dec = (1.0 - self.adsr.sustain_level) / (self.adsr.decay_s * sample_rate as f32).max(1.0);
        let phase_inc_scale = TAU / sample_rate as f32;

        for voice in self.voices.iter_mut() {
            if !voice.active {
                continue;
            }
            for f in 0..frame_count {
                let osc = (self.waveform.sample(voice.phase) + self.waveform.sample(voice.phase_detune)) / 2.0;

                match voice.env_stage {
                    EnvStage::Attack => {
                        voice.env_level += attack_inc;
                        if voice.env_level >= 1.0 {
                            voice.env_level = 1.0;
                            voice.env_stage = EnvStage::Decay;
                        }
                    }
                    EnvStage::Decay => {
                        voice.env_level -= decay_dec;
                        if voice.env_level <= self.adsr.sustain_level {
                            voice.env_level = self.adsr.sustain_level;
                            voice.env_stage = EnvStage::Sustain;
                        }
                    }
                    EnvStage::Sustain => {}
                    EnvStage::Release => {
                        let total = (self.adsr.release_s * sample_rate as f32).max(1.0) as u64;
                        voice.env_level = voice.release_start_level
                            * voice.release_samples_remaining as f32
                            / total as f32;
                        if voice.release_samples_remaining == 0 {
                            voice.env_stage = EnvStage::Off;
                        } else {
                            voice.release_samples_remaining -= 1;
                        }
                    }
                    EnvStage::Off => {}
                }

                let amp = osc * voice.env_level * (voice.velocity as f32 / 127.0) * master_volume;
                let base = f * channels;
                for ch in 0..channels {
                    out[base + ch] += amp;
                }

                voice.phase = (voice.phase + voice.freq * phase_inc_scale) % TAU;
                voice.phase_detune = (voice.phase_detune + voice.freq_detune * phase_inc_scale) % TAU;
            }

            if voice.env_stage == EnvStage::Off {
                voice.active = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_on_activates_first_free_voice() {
        let mut bank = SynthVoiceBank::new(4);
        bank.note_on(69, 100);
        assert!(bank.voices[0].active);
        assert!((bank.voices[0].freq - 440.0).abs() < 1e-3);
    }

    #[test]
    fn steals_release_voice_with_lowest_level_when_full() {
        let mut bank = SynthVoiceBank::new(2);
        bank.note_on(60, 100);
        bank.note_on(62, 100);
        bank.voices[0].env_stage = EnvStage::Release;
        bank.voices[0].env_level = 0.1;
        bank.voices[1].env_stage = EnvStage::Release;
        bank.voices[1].env_level = 0.9;

        bank.note_on(64, 100);
        assert_eq!(bank.voices[0].note_number, 64);
    }

    #[test]
    fn note_off_transitions_to_release() {
        let mut bank = SynthVoiceBank::new(4);
        bank.note_on(60, 100);
        bank.note_off(60, 44_100);
        assert_eq!(bank.voices[0].env_stage, EnvStage::Release);
    }

    #[test]
    fn render_produces_nonzero_output_during_attack() {
        let mut bank = SynthVoiceBank::new(4);
        bank.note_on(69, 127);
        let mut out = vec![0.0; 256 * 2];
        bank.render(&mut out, 256, 2, 44_100, 1.0);
        assert!(out.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn all_notes_off_deactivates_every_voice() {
        let mut bank = SynthVoiceBank::new(4);
        bank.note_on(60, 100);
        bank.note_on(62, 100);
        bank.all_notes_off();
        assert!(bank.voices.iter().all(|v| !v.active));
    }
}
