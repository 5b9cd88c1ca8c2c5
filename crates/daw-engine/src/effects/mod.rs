//! Effects as a tagged variant (§4.C/§4.D) rather than boxed trait
//! objects: each kind carries its own persistent state record, and
//! dispatch in `Effect::process` is a single match. Adding an effect
//! means adding a variant and a process function, not an interface impl.

mod compressor;
mod delay;
mod eq;
mod fade;
mod gain;
mod noise_gate;
mod reverb;

pub use compressor::Compressor;
pub use delay::Delay;
pub use eq::PeakingEq3Band;
pub use fade::Fade;
pub use gain::Gain;
pub use noise_gate::NoiseGate;
pub use reverb::SchroederReverb;

use daw_core::EffectId;

#[derive(Debug, Clone, Copy)]
pub struct ParamDescriptor {
    pub name: &'static str,
    pub min: f32,
    pub max: f32,
}

#[derive(Debug, Clone)]
pub enum Effect {
    Gain(Gain),
    Fade(Fade),
    Delay(Delay),
    Eq3Band(PeakingEq3Band),
    Compressor(Compressor),
    NoiseGate(NoiseGate),
    Reverb(SchroederReverb),
}

impl Effect {
    pub fn process(&mut self, buffer: &mut [f32], channels: usize, sample_rate: u32, frame_offset: u64) {
        match self {
            Effect::Gain(g) => g.process(buffer, sample_rate),
            Effect::Fade(f) => f.process(buffer, channels, sample_rate, frame_offset),
            Effect::Delay(d) => d.process(buffer, sample_rate),
            Effect::Eq3Band(eq) => eq.process(buffer, sample_rate),
            Effect::Compressor(c) => c.process(buffer, channels, sample_rate),
            Effect::NoiseGate(n) => n.process(buffer, channels, sample_rate),
            Effect::Reverb(r) => r.process(buffer, sample_rate),
        }
    }

    pub fn reset(&mut self) {
        match self {
            Effect::Gain(g) => g.reset(),
            Effect::Fade(f) => f.reset(),
            Effect::Delay(d) => d.reset(),
            Effect::Eq3Band(eq) => eq.reset(),
            Effect::Compressor(c) => c.reset(),
            Effect::NoiseGate(n) => n.reset(),
            Effect::Reverb(r) => r.reset(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Effect::Gain(_) => "gain",
            Effect::Fade(_) => "fade",
            Effect::Delay(_) => "delay",
            Effect::Eq3Band(_) => "eq3",
            Effect::Compressor(_) => "compressor",
            Effect::NoiseGate(_) => "noise_gate",
            Effect::Reverb(_) => "reverb",
        }
    }

    /// Static bounds for every indexed parameter this effect exposes.
    /// `get_param`/`set_param` index into this same list.
    pub fn param_descriptors(&self) -> &'static [ParamDescriptor] {
        match self {
            Effect::Gain(_) => gain::PARAMS,
            Effect::Fade(_) => fade::PARAMS,
            Effect::Delay(_) => delay::PARAMS,
            Effect::Eq3Band(_) => eq::PARAMS,
            Effect::Compressor(_) => compressor::PARAMS,
            Effect::NoiseGate(_) => noise_gate::PARAMS,
            Effect::Reverb(_) => reverb::PARAMS,
        }
    }

    pub fn get_param(&self, index: usize) -> Option<f32> {
        match self {
            Effect::Gain(g) => g.get_param(index),
            Effect::Fade(f) => f.get_param(index),
            Effect::Delay(d) => d.get_param(index),
            Effect::Eq3Band(eq) => eq.get_param(index),
            Effect::Compressor(c) => c.get_param(index),
            Effect::NoiseGate(n) => n.get_param(index),
            Effect::Reverb(r) => r.get_param(index),
        }
    }

    /// Set the parameter at `index`, clamped to its descriptor's bounds.
    /// Returns `false` if `index` is out of range for this effect.
    pub fn set_param(&mut self, index: usize, value: f32) -> bool {
        match self {
            Effect::Gain(g) => g.set_param(index, value),
            Effect::Fade(f) => f.set_param(index, value),
            Effect::Delay(d) => d.set_param(index, value),
            Effect::Eq3Band(eq) => eq.set_param(index, value),
            Effect::Compressor(c) => c.set_param(index, value),
            Effect::NoiseGate(n) => n.set_param(index, value),
            Effect::Reverb(r) => r.set_param(index, value),
        }
    }
}

#[derive(Debug, Clone)]
struct Slot {
    id: EffectId,
    effect: Effect,
    enabled: bool,
}

/// Ordered effect sequence, addressed by `EffectId` rather than position.
///
/// Owned directly (no `Arc`/`Mutex`): the render worker is the only
/// thread that ever touches a live `EffectChain`. Control-side edits
/// (add/remove/reorder/param changes) go through the `Command` channel
/// and are applied by the render worker itself at the top of a block,
/// the same way `SetTrackVolume` and friends already work — so `process`
/// never allocates, never locks, and never races a concurrent edit.
#[derive(Debug, Clone, Default)]
pub struct EffectChain {
    slots: Vec<Slot>,
}

impl EffectChain {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn push(&mut self, id: EffectId, effect: Effect) {
        self.slots.push(Slot { id, effect, enabled: true });
    }

    pub fn insert(&mut self, index: usize, id: EffectId, effect: Effect) {
        let index = index.min(self.slots.len());
        self.slots.insert(index, Slot { id, effect, enabled: true });
    }

    pub fn remove(&mut self, id: EffectId) -> bool {
        let before = self.slots.len();
        self.slots.retain(|slot| slot.id != id);
        self.slots.len() != before
    }

    pub fn r#move(&mut self, id: EffectId, to_index: usize) -> bool {
        let Some(from) = self.slots.iter().position(|slot| slot.id == id) else { return false };
        let to_index = to_index.min(self.slots.len() - 1);
        let slot = self.slots.remove(from);
        self.slots.insert(to_index, slot);
        true
    }

    pub fn set_enabled(&mut self, id: EffectId, enabled: bool) -> bool {
        if let Some(slot) = self.slots.iter_mut().find(|slot| slot.id == id) {
            slot.enabled = enabled;
            true
        } else {
            false
        }
    }

    pub fn set_param(&mut self, id: EffectId, param_index: usize, value: f32) -> bool {
        if let Some(slot) = self.slots.iter_mut().find(|slot| slot.id == id) {
            slot.effect.set_param(param_index, value)
        } else {
            false
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    /// Process `buffer` through every enabled effect in order, in place.
    /// No allocation, no locking: `self.slots` is mutated directly.
    pub fn process(&mut self, buffer: &mut [f32], channels: usize, sample_rate: u32, frame_offset: u64) {
        for slot in self.slots.iter_mut() {
            if slot.enabled {
                slot.effect.process(buffer, channels, sample_rate, frame_offset);
            }
        }
    }

    pub fn reset(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.effect.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_chain_is_identity() {
        let mut chain = EffectChain::new();
        let mut buf = vec![0.3, -0.4, 0.5];
        let before = buf.clone();
        chain.process(&mut buf, 1, 44_100, 0);
        assert_eq!(buf, before);
    }

    #[test]
    fn unity_gain_chain_is_identity() {
        let mut chain = EffectChain::new();
        chain.push(EffectId(1), Effect::Gain(Gain::new(0.0)));
        let mut buf = vec![0.3, -0.4, 0.5];
        let before = buf.clone();
        chain.process(&mut buf, 1, 44_100, 0);
        assert_eq!(buf, before);
    }

    #[test]
    fn disabled_effects_are_skipped() {
        let mut chain = EffectChain::new();
        chain.push(EffectId(1), Effect::Gain(Gain::new(-60.0)));
        chain.set_enabled(EffectId(1), false);
        let mut buf = vec![0.3, -0.4, 0.5];
        let before = buf.clone();
        chain.process(&mut buf, 1, 44_100, 0);
        assert_eq!(buf, before);
    }

    #[test]
    fn remove_shrinks_chain() {
        let mut chain = EffectChain::new();
        chain.push(EffectId(1), Effect::Gain(Gain::new(0.0)));
        chain.push(EffectId(2), Effect::Gain(Gain::new(0.0)));
        assert_eq!(chain.len(), 2);
        assert!(chain.remove(EffectId(1)));
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn state_persists_across_process_calls() {
        let mut chain = EffectChain::new();
        chain.push(EffectId(1), Effect::Delay(Delay::new(1.0, 0.9, 1.0, 44_100, 1)));
        let mut loud = vec![1.0; 100];
        chain.process(&mut loud, 1, 44_100, 0);
        let mut silence = vec![0.0; 100];
        chain.process(&mut silence, 1, 44_100, 100);
        assert!(silence.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn set_param_clamps_to_descriptor_bounds() {
        let mut chain = EffectChain::new();
        chain.push(EffectId(1), Effect::Gain(Gain::new(0.0)));
        assert!(chain.set_param(EffectId(1), 0, 100.0));
        assert!(!chain.set_param(EffectId(1), 9, 0.0));
    }
}
