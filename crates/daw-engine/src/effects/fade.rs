//! Linear fade-in/fade-out over a fixed frame span (§4.C).
//!
//! The fade is anchored to the clip's own timeline, not the current
//! block, so `frame_offset` is the project-relative frame of the first
//! sample in `buffer`.

use super::ParamDescriptor;

pub const PARAMS: &[ParamDescriptor] = &[
    ParamDescriptor { name: "fade_in_ms", min: 0.0, max: 10_000.0 },
    ParamDescriptor { name: "fade_out_ms", min: 0.0, max: 10_000.0 },
];

#[derive(Debug, Clone, Copy)]
pub struct Fade {
    pub fade_in_ms: f32,
    pub fade_out_ms: f32,
    pub total_frames: u64,
}

impl Fade {
    pub fn new(fade_in_ms: f32, fade_out_ms: f32, total_frames: u64) -> Self {
        Self {
            fade_in_ms: fade_in_ms.clamp(0.0, 10_000.0),
            fade_out_ms: fade_out_ms.clamp(0.0, 10_000.0),
            total_frames,
        }
    }

    pub fn get_param(&self, index: usize) -> Option<f32> {
        match index {
            0 => Some(self.fade_in_ms),
            1 => Some(self.fade_out_ms),
            _ => None,
        }
    }

    pub fn set_param(&mut self, index: usize, value: f32) -> bool {
        match index {
            0 => {
                self.fade_in_ms = value.clamp(PARAMS[0].min, PARAMS[0].max);
                true
            }
            1 => {
                self.fade_out_ms = value.clamp(PARAMS[1].min, PARAMS[1].max);
                true
            }
            _ => false,
        }
    }

    pub fn process(&mut self, buffer: &mut [f32], channels: usize, sample_rate: u32, frame_offset: u64) {
        if channels == 0 {
            return;
        }
        let fade_in_frames = (self.fade_in_ms * sample_rate as f32 / 1000.0).round() as u64;
        let fade_out_frames = (self.fade_out_ms * sample_rate as f32 / 1000.0).round() as u64;

        for (i, frame) in buffer.chunks_mut(channels).enumerate() {
            let f = frame_offset + i as u64;
            let in_gain = if fade_in_frames == 0 {
                1.0
            } else {
                (f as f32 / fade_in_frames as f32).min(1.0)
            };
            let remaining = self.total_frames.saturating_sub(f);
            let out_gain = if fade_out_frames == 0 {
                1.0
            } else {
                (remaining as f32 / fade_out_frames as f32).min(1.0)
            };
            let gain = in_gain * out_gain;
            for s in frame {
                *s *= gain;
            }
        }
    }

    pub fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fade_in_ramps_from_zero() {
        let mut fade = Fade::new(10.0, 0.0, 10_000);
        let mut buf = vec![1.0f32; 441];
        fade.process(&mut buf, 1, 44_100, 0);
        assert!(buf[0].abs() < 1e-3);
        assert!((buf[440] - 1.0).abs() < 5e-3);
    }

    #[test]
    fn zero_duration_fade_is_identity() {
        let mut fade = Fade::new(0.0, 0.0, 1000);
        let mut buf = vec![0.5f32; 10];
        fade.process(&mut buf, 1, 44_100, 0);
        assert!(buf.iter().all(|&s| (s - 0.5).abs() < 1e-9));
    }
}
