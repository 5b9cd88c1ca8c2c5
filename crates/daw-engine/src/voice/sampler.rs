//! Sample-playback voice bank (§4.F): pitch-shifted, optionally looping,
//! linear-interpolated, same voice-allocation policy as the synth bank.

use daw_core::SourceBuffer;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    None,
    Forward,
    PingPong,
}

#[derive(Debug, Clone)]
pub struct SamplerZone {
    pub source: Arc<SourceBuffer>,
    pub sample_start: u64,
    pub sample_end: u64,
    pub loop_start: u64,
    pub loop_end: u64,
    pub root_key: u8,
    pub tune_cents: f32,
    pub loop_mode: LoopMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EnvStage {
    Off,
    Attack,
    Hold,
    Release,
}

#[derive(Debug, Clone)]
struct SamplerVoice {
    active: bool,
    note_number: u8,
    zone_index: Option<usize>,
    pos: f64,
    rate: f64,
    velocity: u8,
    env_stage: EnvStage,
    env_level: f32,
    release_start_level: f32,
    release_samples_remaining: u64,
    direction: i8,
}

impl Default for SamplerVoice {
    fn default() -> Self {
        Self {
            active: false,
            note_number: 0,
            zone_index: None,
            pos: 0.0,
            rate: 1.0,
            velocity: 0,
            env_stage: EnvStage::Off,
            env_level: 0.0,
            release_start_level: 0.0,
            release_samples_remaining: 0,
            direction: 1,
        }
    }
}

const ATTACK_MS: f32 = 10.0;
const RELEASE_MS: f32 = 300.0;

#[derive(Debug, Clone, Default)]
pub struct SamplerVoiceBank {
    voices: Vec<SamplerVoice>,
    pub zones: Vec<SamplerZone>,
}

impl SamplerVoiceBank {
    pub fn new(max_voices: usize) -> Self {
        Self {
            voices: vec![SamplerVoice::default(); max_voices.max(1)],
            zones: Vec::new(),
        }
    }

    /// The zone whose `root_key` is closest to `note_number`, among zones
    /// with actual sample data. Ties favour the lower index.
    fn zone_for_note(&self, note_number: u8) -> Option<usize> {
        self.zones
            .iter()
            .enumerate()
            .filter(|(_, z)| z.source.frame_count() > 0)
            .min_by_key(|(_, z)| (z.root_key as i16 - note_number as i16).abs())
            .map(|(i, _)| i)
    }

    pub fn note_on(&mut self, note_number: u8, velocity: u8, sample_rate_out: u32) {
        let Some(zone_index) = self.zone_for_note(note_number) else { return };
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

        let zone = &self.zones[zone_index];
        let semitones = note_number as f64 - zone.root_key as f64 + zone.tune_cents as f64 / 100.0;
        let rate = 2f64.powf(semitones / 12.0) * zone.source.sample_rate as f64 / sample_rate_out as f64;

        let voice = &mut self.voices[target];
        voice.active = true;
        voice.note_number = note_number;
        voice.zone_index = Some(zone_index);
        voice.pos = zone.sample_start as f64;
        voice.rate = rate;
        voice.velocity = velocity;
        voice.env_stage = EnvStage::Attack;
        voice.env_level = 0.0;
        voice.direction = 1;
    }

    pub fn note_off(&mut self, note_number: u8, sample_rate: u32) {
        for voice in self.voices.iter_mut() {
            if voice.active && voice.note_number == note_number && voice.env_stage != EnvStage::Release {
                voice.release_start_level = voice.env_level;
                voice.env_stage = EnvStage::Release;
                voice.release_samples_remaining = (RELEASE_MS * 0.001 * sample_rate as f32) as u64;
            }
        }
    }

    pub fn all_notes_off(&mut self) {
        for voice in self.voices.iter_mut() {
            *voice = SamplerVoice::default();
        }
    }

    pub fn render(&mut self, out: &mut [f32], frame_count: usize, channels: usize, sample_rate: u32) {
        if channels == 0 {
            return;
        }
        let attack_inc = 1.0 / (ATTACK_MS * 0.001 * sample_rate as f32).max(1.0);

        for voice in self.voices.iter_mut() {
            let Some(zone_index) = voice.zone_index else { continue };
            if !voice.active {
                continue;
            }
            let zone = &self.zones[zone_index];
            let src_channels = zone.source.channels.max(1) as usize;

            for f in 0..frame_count {
                let idx = voice.pos.floor() as u64;
                let frac = (voice.pos - idx as f64) as f32;

                let sample = match (
                    zone.source.frame_at(idx),
                    zone.source.frame_at(idx + 1),
                ) {
                    (Some(a), Some(b)) => a[0] + (b[0] - a[0]) * frac,
                    (Some(a), None) => a[0],
                    _ => 0.0,
                };
                let _ = src_channels;

                match voice.env_stage {
                    EnvStage::Attack => {
                        voice.env_level += attack_inc;
                        if voice.env_level >= 1.0 {
                            voice.env_level = 1.0;
                            voice.env_stage = EnvStage::Hold;
                        }
                    }
                    EnvStage::Hold => {}
                    EnvStage::Release => {
                        let total = (RELEASE_MS * 0.001 * sample_rate as f32).max(1.0) as u64;
                        voice.env_level =
                            voice.release_start_level * voice.release_samples_remaining as f32 / total as f32;
                        if voice.release_samples_remaining == 0 {
                            voice.env_stage = EnvStage::Off;
                        } else {
                            voice.release_samples_remaining -= 1;
                        }
                    }
                    EnvStage::Off => {}
                }

                let amp = sample * voice.env_level * (voice.velocity as f32 / 127.0);
                let base = f * channels;
                for ch in 0..channels {
                    out[base + ch] += amp;
                }

                voice.pos += voice.rate * voice.direction as f64;

                match zone.loop_mode {
                    LoopMode::Forward if voice.pos as u64 >= zone.loop_end => {
                        voice.pos = zone.loop_start as f64 + (voice.pos - zone.loop_end as f64);
                    }
                    LoopMode::PingPong if voice.pos as u64 >= zone.loop_end => {
                        voice.pos = zone.loop_end as f64 - (voice.pos - zone.loop_end as f64);
                        voice.direction = -1;
                    }
                    LoopMode::PingPong if voice.pos as u64 <= zone.loop_start && voice.direction == -1 => {
                        voice.pos = zone.loop_start as f64 + (zone.loop_start as f64 - voice.pos);
                        voice.direction = 1;
                    }
                    LoopMode::None if voice.pos as u64 >= zone.sample_end => {
                        voice.env_stage = EnvStage::Off;
                    }
                    _ => {}
                }
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

    fn zone_with_samples(samples: Vec<f32>) -> SamplerZone {
        let len = samples.len() as u64;
        SamplerZone {
            source: Arc::new(SourceBuffer::new(samples, 44_100, 1)),
            sample_start: 0,
            sample_end: len,
            loop_start: 0,
            loop_end: len,
            root_key: 60,
            tune_cents: 0.0,
            loop_mode: LoopMode::None,
        }
    }

    #[test]
    fn note_on_picks_first_free_voice_with_matching_zone() {
        let mut bank = SamplerVoiceBank::new(2);
        bank.zones.push(zone_with_samples(vec![1.0; 1000]));
        bank.note_on(60, 100, 44_100);
        assert!(bank.voices[0].active);
    }

    #[test]
    fn render_advances_position_by_playback_rate() {
        let mut bank = SamplerVoiceBank::new(2);
        bank.zones.push(zone_with_samples(vec![1.0; 1000]));
        bank.note_on(72, 127, 44_100);
        let mut out = vec![0.0; 10 * 2];
        bank.render(&mut out, 10, 2, 44_100);
        assert!(bank.voices[0].pos > 10.0);
    }

    #[test]
    fn note_off_only_releases_the_matching_note() {
        let mut bank = SamplerVoiceBank::new(2);
        bank.zones.push(zone_with_samples(vec![1.0; 1000]));
        bank.note_on(60, 100, 44_100);
        bank.note_on(64, 100, 44_100);
        bank.note_off(60, 44_100);
        assert_eq!(bank.voices[0].env_stage, EnvStage::Release);
        assert_eq!(bank.voices[1].env_stage, EnvStage::Attack);
    }

    #[test]
    fn zone_for_note_picks_the_closest_root_key() {
        let mut bank = SamplerVoiceBank::new(2);
        let mut low = zone_with_samples(vec![1.0; 1000]);
        low.root_key = 48;
        let mut high = zone_with_samples(vec![1.0; 1000]);
        high.root_key = 72;
        bank.zones.push(low);
        bank.zones.push(high);

        bank.note_on(50, 100, 44_100);
        assert_eq!(bank.voices[0].zone_index, Some(0));
        bank.note_on(70, 100, 44_100);
        assert_eq!(bank.voices[1].zone_index, Some(1));
    }

    #[test]
    fn no_loop_voice_deactivates_at_sample_end() {
        let mut bank = SamplerVoiceBank::new(1);
        bank.zones.push(zone_with_samples(vec![1.0; 20]));
        bank.note_on(60, 100, 44_100);
        let mut out = vec![0.0; 100 * 2];
        bank.render(&mut out, 100, 2, 44_100);
        assert!(!bank.voices[0].active);
    }
}
