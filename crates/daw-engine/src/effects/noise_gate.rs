//! Noise gate with hold (§4.C). Envelope follower identical in shape to
//! the compressor's, feeding a three-state gate.

use super::ParamDescriptor;

pub const PARAMS: &[ParamDescriptor] = &[
    ParamDescriptor { name: "threshold_db", min: -80.0, max: 0.0 },
    ParamDescriptor { name: "range_db", min: -80.0, max: 0.0 },
    ParamDescriptor { name: "attack_ms", min: 0.01, max: 500.0 },
    ParamDescriptor { name: "release_ms", min: 0.01, max: 2_000.0 },
    ParamDescriptor { name: "hold_ms", min: 0.0, max: 1_000.0 },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Open,
    Hold,
    Closed,
}

#[derive(Debug, Clone, Copy)]
pub struct NoiseGate {
    pub threshold_db: f32,
    pub range_db: f32,
    pub attack_ms: f32,
    pub release_ms: f32,
    pub hold_ms: f32,
    envelope: f32,
    actual_gain: f32,
    hold_remaining: u64,
    state: GateState,
}

impl NoiseGate {
    pub fn new(threshold_db: f32, range_db: f32, attack_ms: f32, release_ms: f32, hold_ms: f32) -> Self {
        Self {
            threshold_db,
            range_db,
            attack_ms: attack_ms.max(0.01),
            release_ms: release_ms.max(0.01),
            hold_ms,
            envelope: 0.0,
            actual_gain: 1.0,
            hold_remaining: 0,
            state: GateState::Closed,
        }
    }

    pub fn get_param(&self, index: usize) -> Option<f32> {
        match index {
            0 => Some(self.threshold_db),
            1 => Some(self.range_db),
            2 => Some(self.attack_ms),
            3 => Some(self.release_ms),
            4 => Some(self.hold_ms),
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
                self.range_db = value.clamp(PARAMS[1].min, PARAMS[1].max);
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
                self.hold_ms = value.clamp(PARAMS[4].min, PARAMS[4].max);
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
        let range_linear = 10f32.powf(self.range_db / 20.0);
        let attack_coeff = (-1.0 / (self.attack_ms * 0.001 * sample_rate as f32)).exp();
        let release_coeff = (-1.0 / (self.release_ms * 0.001 * sample_rate as f32)).exp();
        let hold_frames = (self.hold_ms * 0.001 * sample_rate as f32) as u64;

        for frame in buffer.chunks_mut(channels) {
            let x = frame.iter().fold(0.0f32, |acc, &s| acc.max(s.abs()));
            if x > self.envelope {
                self.envelope = attack_coeff * self.envelope + (1.0 - attack_coeff) * x;
            } else {
                self.envelope = release_coeff * self.envelope + (1.0 - release_coeff) * x;
            }

            let target = if self.envelope >= threshold_linear {
                self.state = GateState::Open;
                self.hold_remaining = hold_frames;
                1.0
            } else if self.hold_remaining > 0 {
                self.state = GateState::Hold;
                self.hold_remaining -= 1;
                1.0
            } else {
                self.state = GateState::Closed;
                range_linear
            };

            let smoothing = if target > self.actual_gain { 0.999 } else { 0.995 };
            self.actual_gain = smoothing * self.actual_gain + (1.0 - smoothing) * target;

            for s in frame {
                *s *= self.actual_gain;
            }
        }
    }

    pub fn reset(&mut self) {
        self.envelope = 0.0;
        self.actual_gain = 1.0;
        self.hold_remaining = 0;
        self.state = GateState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_settles_toward_range_floor() {
        let mut gate = NoiseGate::new(-30.0, -60.0, 1.0, 50.0, 10.0);
        let mut buf = vec![0.0; 20_000];
        gate.process(&mut buf, 1, 44_100);
        assert!(gate.actual_gain < 0.01);
    }

    #[test]
    fn loud_signal_stays_open() {
        let mut gate = NoiseGate::new(-30.0, -60.0, 1.0, 50.0, 10.0);
        let mut buf = vec![0.5; 2000];
        gate.process(&mut buf, 1, 44_100);
        assert!(gate.actual_gain > 0.9);
    }

    #[test]
    fn hold_keeps_gate_open_briefly_after_signal_drops() {
        let mut gate = NoiseGate::new(-30.0, -60.0, 1.0, 50.0, 20.0);
        let mut loud = vec![0.9; 500];
        gate.process(&mut loud, 1, 44_100);
        assert_eq!(gate.state, GateState::Open);

        let mut quiet = vec![0.0; 10];
        gate.process(&mut quiet, 1, 44_100);
        assert_ne!(gate.state, GateState::Closed);
    }
}
