//! Schroeder reverb (§4.C): eight damped comb filters in parallel feeding
//! four series all-pass filters, operating on the mono-summed frame and
//! broadcast back to every channel. Each tank line is a
//! [`RingBuffer`](crate::ring_buffer::RingBuffer) read at its own length
//! minus one — the slot about to be overwritten — which is exactly the
//! classic comb/allpass "read-then-write-same-slot" line.

use crate::ring_buffer::RingBuffer;

use super::ParamDescriptor;

pub const PARAMS: &[ParamDescriptor] = &[
    ParamDescriptor { name: "room_size", min: 0.0, max: 1.0 },
    ParamDescriptor { name: "damping", min: 0.0, max: 1.0 },
    ParamDescriptor { name: "mix", min: 0.0, max: 1.0 },
];

const COMB_LENGTHS_44K: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];
const ALLPASS_LENGTHS_44K: [usize; 4] = [556, 441, 341, 225];

#[derive(Debug, Clone)]
struct Comb {
    line: RingBuffer,
    store: f32,
}

impl Comb {
    fn new(length: usize) -> Self {
        Self { line: RingBuffer::new(length.max(2)), store: 0.0 }
    }

    fn process(&mut self, input: f32, room_size: f32, damping: f32) -> f32 {
        let delayed = self.line.read_at(self.line.len() - 1);
        self.store = delayed * (1.0 - damping) + self.store * damping;
        self.line.write(input + self.store * room_size);
        delayed
    }

    fn reset(&mut self) {
        self.line.reset();
        self.store = 0.0;
    }
}

#[derive(Debug, Clone)]
struct Allpass {
    line: RingBuffer,
}

impl Allpass {
    fn new(length: usize) -> Self {
        Self { line: RingBuffer::new(length.max(2)) }
    }

    fn process(&mut self, x: f32) -> f32 {
        let buffered = self.line.read_at(self.line.len() - 1);
        let out = -x + buffered;
        self.line.write(x + buffered * 0.5);
        out
    }

    fn reset(&mut self) {
        self.line.reset();
    }
}

#[derive(Debug, Clone)]
pub struct SchroederReverb {
    pub room_size: f32,
    pub damping: f32,
    pub mix: f32,
    sample_rate: u32,
    channels: usize,
    combs: Vec<Comb>,
    allpasses: Vec<Allpass>,
}

impl SchroederReverb {
    pub fn new(room_size: f32, damping: f32, mix: f32, sample_rate: u32, channels: usize) -> Self {
        let mut reverb = Self {
            room_size: room_size.clamp(0.0, 1.0),
            damping: damping.clamp(0.0, 1.0),
            mix: mix.clamp(0.0, 1.0),
            sample_rate,
            channels: channels.max(1),
            combs: Vec::new(),
            allpasses: Vec::new(),
        };
        reverb.rebuild_tanks();
        reverb
    }

    fn rebuild_tanks(&mut self) {
        let ratio = self.sample_rate as f32 / 44_100.0;
        self.combs = COMB_LENGTHS_44K
            .iter()
            .map(|&len| Comb::new((len as f32 * ratio).round() as usize))
            .collect();
        self.allpasses = ALLPASS_LENGTHS_44K
            .iter()
            .map(|&len| Allpass::new((len as f32 * ratio).round() as usize))
            .collect();
    }

    pub fn get_param(&self, index: usize) -> Option<f32> {
        match index {
            0 => Some(self.room_size),
            1 => Some(self.damping),
            2 => Some(self.mix),
            _ => None,
        }
    }

    pub fn set_param(&mut self, index: usize, value: f32) -> bool {
        match index {
            0 => {
                self.room_size = value.clamp(PARAMS[0].min, PARAMS[0].max);
                true
            }
            1 => {
                self.damping = value.clamp(PARAMS[1].min, PARAMS[1].max);
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
        if self.combs.is_empty() || sample_rate != self.sample_rate {
            self.sample_rate = sample_rate;
            self.rebuild_tanks();
        }
        for frame in buffer.chunks_mut(self.channels) {
            let input = frame.iter().sum::<f32>() / frame.len().max(1) as f32;

            let mut wet = 0.0;
            for comb in &mut self.combs {
                wet += comb.process(input, self.room_size, self.damping);
            }

            for allpass in &mut self.allpasses {
                wet = allpass.process(wet);
            }

            for s in frame {
                *s = *s * (1.0 - self.mix) + wet * self.mix;
            }
        }
    }

    pub fn reset(&mut self) {
        for comb in &mut self.combs {
            comb.reset();
        }
        for allpass in &mut self.allpasses {
            allpass.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn silence_in_silence_out() {
        let mut reverb = SchroederReverb::new(0.7, 0.5, 1.0, 44_100, 1);
        let mut buf = vec![0.0; 512];
        reverb.process(&mut buf, 44_100);
        assert!(buf.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn impulse_tail_carries_across_block_boundary() {
        let mut reverb = SchroederReverb::new(0.7, 0.5, 1.0, 44_100, 1);
        let mut block1 = vec![0.0f32; 512];
        block1[0] = 1.0;
        reverb.process(&mut block1, 44_100);

        let mut block2 = vec![0.0f32; 512];
        reverb.process(&mut block2, 44_100);

        let tail_energy_1: f32 = block1.iter().map(|s| s * s).sum();
        let tail_energy_2: f32 = block2.iter().map(|s| s * s).sum();
        assert!(tail_energy_1 > 0.0);
        assert!(tail_energy_2 <= tail_energy_1);
    }

    #[test]
    fn reset_silences_the_tank() {
        let mut reverb = SchroederReverb::new(0.7, 0.5, 1.0, 44_100, 1);
        let mut block = vec![0.0f32; 512];
        block[0] = 1.0;
        reverb.process(&mut block, 44_100);
        reverb.reset();

        let mut silence = vec![0.0f32; 512];
        reverb.process(&mut silence, 44_100);
        assert!(silence.iter().all(|&s| s == 0.0));
    }
}
