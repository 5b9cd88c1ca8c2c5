//! Feedback delay line (§4.C), modeled on the teacher's `DelayEffect`
//! but built on the shared [`RingBuffer`](crate::ring_buffer::RingBuffer)
//! and sized in samples (interleaved, multi-channel) rather than frames.

use crate::ring_buffer::RingBuffer;

use super::ParamDescriptor;

pub const PARAMS: &[ParamDescriptor] = &[
    ParamDescriptor { name: "delay_ms", min: 0.0, max: 2_000.0 },
    ParamDescriptor { name: "feedback", min: 0.0, max: 0.95 },
    ParamDescriptor { name: "mix", min: 0.0, max: 1.0 },
];

#[derive(Debug, Clone)]
pub struct Delay {
    pub delay_ms: f32,
    pub feedback: f32,
    pub mix: f32,
    line: RingBuffer,
    sample_rate: u32,
    channels: usize,
}

impl Delay {
    pub fn new(delay_ms: f32, feedback: f32, mix: f32, sample_rate: u32, channels: usize) -> Self {
        let size = ((2.1 * sample_rate as f32).ceil() as usize * channels.max(1)).max(2);
        Self {
            delay_ms,
            feedback: feedback.clamp(0.0, 0.95),
            mix: mix.clamp(0.0, 1.0),
            line: RingBuffer::new(size),
            sample_rate,
            channels: channels.max(1),
        }
    }

    pub fn get_param(&self, index: usize) -> Option<f32> {
        match index {
            0 => Some(self.delay_ms),
            1 => Some(self.feedback),
            2 => Some(self.mix),
            _ => None,
        }
    }

    pub fn set_param(&mut self, index: usize, value: f32) -> bool {
        match index {
            0 => {
                self.delay_ms = value.clamp(PARAMS[0].min, PARAMS[0].max);
                true
            }
            1 => {
                self.feedback = value.clamp(PARAMS[1].min, PARAMS[1].max);
                true
            }
            2 => {
                self.mix = value.clamp(PARAMS[2].min, PARAMS[2].max);
                true
            }
            _ => false,
        }
    }

    pub fn process(&mut self, buffer: &mut [f32], sample_rate: u32) {
        if sample_rate != self.sample_rate {
            let size = ((2.1 * sample_rate as f32).ceil() as usize * self.channels).max(2);
            self.line = RingBuffer::new(size);
            self.sample_rate = sample_rate;
        }
        let delay_samples = ((self.delay_ms * sample_rate as f32 / 1000.0).round() as usize * self.channels)
            .clamp(1, self.line.len() - 1);

        for sample in buffer.iter_mut() {
            let delayed = self.line.read_at(delay_samples - 1);
            self.line.write(*sample + delayed * self.feedback);
            *sample = *sample * (1.0 - self.mix) + delayed * self.mix;
        }
    }

    pub fn reset(&mut self) {
        self.line.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_feedback_zero_mix_is_identity() {
        let mut delay = Delay::new(50.0, 0.0, 0.0, 44_100, 1);
        let mut buf = vec![0.3, -0.2, 0.7];
        let before = buf.clone();
        delay.process(&mut buf, 44_100);
        assert_eq!(buf, before);
    }

    #[test]
    fn reset_clears_tail() {
        let mut delay = Delay::new(1.0, 0.5, 1.0, 44_100, 1);
        let mut buf = vec![1.0; 200];
        delay.process(&mut buf, 44_100);
        delay.reset();
        let mut silence = vec![0.0; 10];
        delay.process(&mut silence, 44_100);
        assert!(silence.iter().all(|&s| s == 0.0));
    }
}
