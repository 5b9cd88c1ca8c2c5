//! Feed-forward peak compressor (§4.C). Envelope state persists across
//! blocks; no lookahead.

use super::ParamDescriptor;

pub const PARAMS: &[ParamDescriptor] = &[
    ParamDescriptor { name: "threshold_db", min: -60.0, max: 0.0 },
    ParamDescriptor { name: "ratio", min: 1.0, max: 20.0 },
    ParamDescriptor { name: "attack_ms", min: 0.01, max: 500.0 },
    ParamDescriptor { name: "release_ms", min: 0.01, max: 2_000.0 },
    ParamDescriptor { name: "makeup_db", min: 0.0, max: 24.0 },
];

#[derive(Debug, Clone, Copy)]
pub struct Compressor {
    pub threshold_db: f32,
    pub ratio: f32,
    pub attack_ms: f32,
    pub release_ms: f32,
    pub makeup_db: f32,
    envelope: f32,
}

impl Compressor {
    pub fn new(threshold_db: f32, ratio: f32, attack_ms: f32, release_ms: f32, makeup_db: f32) -> Self {
        Self {
            threshold_db,
            ratio: ratio.max(1.0),
            attack_ms: attack_ms.max(0.01),
            release_ms: release_ms.max(0.01),
            makeup_db,
            envelope: 0.0,
        }
    }

    pub fn get_param(&self, index: usize) -> Option<f32> {
        match index {
            0 => Some(self.threshold_db),
            1 => Some(self.ratio),
            2 => Some(self.attack_ms),
            3 => Some(self.release_ms),
            4 => Some(self.makeup_db),
            _ => None,
        }
    }

    pub fn set_param(&mut self, index: usize, value: f32) -> bool {
        match index {
            0 => {
                self.threshold_db = value.clamp(PARAMS[0].min, PARAMS[0].max);
                true
            }
            1 => {
                self.ratio = value.clamp(PARAMS[1].min, PARAMS[1].max);
                true
            }
            2 => {
                self.attack_ms = value.clamp(PARAMS[2].min, PARAMS[2].max);
                true
            }
            3 => {
                self.release_ms = value.clamp(PARAMS[3].min, PARAMS[3].max);
                true
            }
            4 => {
                self.makeup_db = value.clamp(PARAMS[4].min, PARAMS[4].max);
                true
            }
            _ => false,
        }
    }

    pub fn process(&mut self, buffer: &mut [f32], channels: usize, sample_rate: u32) {
        if channels == 0 {
            return;
        }
        let threshold_linear = 10f32.powf(self.threshold_db / 20.0);
        let makeup_linear = 10f32.powf(self.makeup_db / 20.0);
        let attack_coeff = (-1.0 / (self.attack_ms * 0.001 * sample_rate as f32)).exp();
        let release_coeff = (-1.0 / (self.release_ms * 0.001 * sample_rate as f32)).exp();

        for frame in buffer.chunks_mut(channels) {
            let x = frame.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
            if x > self.envelope {
                self.envelope = attack_coeff * self.envelope + (1.0 - attack_coeff) * x;
            } else {
                self.envelope = release_coeff * self.envelope + (1.0 - release_coeff) * x;
            }

            let reduction = if self.envelope > threshold_linear {
                let db_above = 20.0 * (self.envelope / threshold_linear).log10();
                10f32.powf(-db_above * (1.0 - 1.0 / self.ratio) / 20.0)
            } else {
                1.0
            };

            let gain = reduction * makeup_linear;
            for s in frame {
                *s *= gain;
            }
        }
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_threshold_passes_unreduced() {
        let mut comp = Compressor::new(-6.0, 4.0, 5.0, 50.0, 0.0);
        let mut buf = vec![0.01; 100];
        let before = buf.clone();
        comp.process(&mut buf, 1, 44_100);
        for (a, b) in buf.iter().zip(&before) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn above_threshold_reduces_gain() {
        let mut comp = Compressor::new(-12.0, 4.0, 1.0, 50.0, 0.0);
        let mut buf = vec![0.9; 2000];
        comp.process(&mut buf, 1, 44_100);
        assert!(buf.last().unwrap().abs() < 0.9);
    }

    #[test]
    fn reset_returns_envelope_to_zero() {
        let mut comp = Compressor::new(-12.0, 4.0, 1.0, 50.0, 0.0);
        let mut buf = vec![0.9; 200];
        comp.process(&mut buf, 1, 44_100);
        comp.reset();
        assert_eq!(comp.envelope, 0.0);
    }
}
