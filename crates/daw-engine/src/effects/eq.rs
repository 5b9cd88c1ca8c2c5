//! Three-band peaking EQ (§4.C), biquads from the RBJ cookbook.

use super::ParamDescriptor;

pub const PARAMS: &[ParamDescriptor] = &[
    ParamDescriptor { name: "low_gain_db", min: -24.0, max: 24.0 },
    ParamDescriptor { name: "mid_gain_db", min: -24.0, max: 24.0 },
    ParamDescriptor { name: "high_gain_db", min: -24.0, max: 24.0 },
];

const MAX_CHANNELS: usize = 2;

#[derive(Debug, Clone, Copy, Default)]
struct BiquadState {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

#[derive(Debug, Clone, Copy)]
struct Coeffs {
    b0: f32,
    b1: f32,
    b2: f32,
    a1: f32,
    a2: f32,
}

impl Coeffs {
    fn peaking(freq: f32, gain_db: f32, q: f32, sample_rate: u32) -> Self {
        let a = 10f32.powf(gain_db / 40.0);
        let w0 = 2.0 * std::f32::consts::PI * freq / sample_rate as f32;
        let alpha = w0.sin() / (2.0 * q);
        let cos_w0 = w0.cos();

        let b0 = 1.0 + alpha * a;
        let b1 = -2.0 * cos_w0;
        let b2 = 1.0 - alpha * a;
        let a0 = 1.0 + alpha / a;
        let a1 = -2.0 * cos_w0;
        let a2 = 1.0 - alpha / a;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Band {
    freq: f32,
    gain_db: f32,
    q: f32,
    coeffs: Coeffs,
    state: [BiquadState; MAX_CHANNELS],
}

impl Band {
    fn new(freq: f32, gain_db: f32, q: f32, sample_rate: u32) -> Self {
        Self {
            freq,
            gain_db,
            q,
            coeffs: Coeffs::peaking(freq, gain_db, q, sample_rate),
            state: [BiquadState::default(); MAX_CHANNELS],
        }
    }

    fn rebuild(&mut self, sample_rate: u32) {
        self.coeffs = Coeffs::peaking(self.freq, self.gain_db, self.q, sample_rate);
    }

    fn process_sample(&mut self, channel: usize, x0: f32) -> f32 {
        if self.gain_db.abs() < 0.1 {
            return x0;
        }
        let st = &mut self.state[channel.min(MAX_CHANNELS - 1)];
        let c = &self.coeffs;
        let y0 = c.b0 * x0 + c.b1 * st.x1 + c.b2 * st.x2 - c.a1 * st.y1 - c.a2 * st.y2;
        st.x2 = st.x1;
        st.x1 = x0;
        st.y2 = st.y1;
        st.y1 = y0;
        y0
    }

    fn reset(&mut self) {
        self.state = [BiquadState::default(); MAX_CHANNELS];
    }
}

#[derive(Debug, Clone)]
pub struct PeakingEq3Band {
    low: Band,
    mid: Band,
    high: Band,
    channels: usize,
    sample_rate: u32,
}

impl PeakingEq3Band {
    pub fn new(sample_rate: u32, channels: usize) -> Self {
        Self {
            low: Band::new(100.0, 0.0, 0.707, sample_rate),
            mid: Band::new(1_000.0, 0.0, 1.0, sample_rate),
            high: Band::new(8_000.0, 0.0, 0.707, sample_rate),
            channels: channels.max(1),
            sample_rate,
        }
    }

    pub fn set_low_gain_db(&mut self, gain_db: f32) {
        self.low.gain_db = gain_db;
        self.low.rebuild(self.sample_rate);
    }

    pub fn set_mid_gain_db(&mut self, gain_db: f32) {
        self.mid.gain_db = gain_db;
        self.mid.rebuild(self.sample_rate);
    }

    pub fn set_high_gain_db(&mut self, gain_db: f32) {
        self.high.gain_db = gain_db;
        self.high.rebuild(self.sample_rate);
    }

    pub fn get_param(&self, index: usize) -> Option<f32> {
        match index {
            0 => Some(self.low.gain_db),
            1 => Some(self.mid.gain_db),
            2 => Some(self.high.gain_db),
            _ => None,
        }
    }

    pub fn set_param(&mut self, index: usize, value: f32) -> bool {
        match index {
            0 => {
                self.set_low_gain_db(value.clamp(PARAMS[0].min, PARAMS[0].max));
                true
            }
            1 => {
                self.set_mid_gain_db(value.clamp(PARAMS[1].min, PARAMS[1].max));
                true
            }
            2 => {
                self.set_high_gain_db(value.clamp(PARAMS[2].min, PARAMS[2].max));
                true
            }
            _ => false,
        }
    }

    pub fn process(&mut self, buffer: &mut [f32], sample_rate: u32) {
        if sample_rate != self.sample_rate {
            self.sample_rate = sample_rate;
            self.low.rebuild(sample_rate);
            self.mid.rebuild(sample_rate);
            self.high.rebuild(sample_rate);
        }
        for (i, sample) in buffer.iter_mut().enumerate() {
            let ch = i % self.channels;
            let s = self.low.process_sample(ch, *sample);
            let s = self.mid.process_sample(ch, s);
            let s = self.high.process_sample(ch, s);
            *sample = s;
        }
    }

    pub fn reset(&mut self) {
        self.low.reset();
        self.mid.reset();
        self.high.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_bands_flat_is_near_identity() {
        let mut eq = PeakingEq3Band::new(44_100, 1);
        let mut buf = vec![0.2, -0.3, 0.5, -0.1];
        let before = buf.clone();
        eq.process(&mut buf, 44_100);
        for (a, b) in buf.iter().zip(&before) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn boosted_band_changes_signal() {
        let mut eq = PeakingEq3Band::new(44_100, 1);
        eq.set_mid_gain_db(6.0);
        let mut buf = vec![0.0; 64];
        buf[0] = 1.0;
        eq.process(&mut buf, 44_100);
        assert!(buf.iter().any(|&s| s.abs() > 1e-6));
    }

    #[test]
    fn reset_clears_history() {
        let mut eq = PeakingEq3Band::new(44_100, 1);
        eq.set_low_gain_db(6.0);
        let mut buf = vec![1.0; 32];
        eq.process(&mut buf, 44_100);
        eq.reset();
        assert_eq!(eq.low.state[0].x1, 0.0);
        assert_eq!(eq.low.state[0].y1, 0.0);
    }
}
