//! daw-engine: the stateful render core built on top of `daw-core`'s
//! pure data model — buffers, effects, voice banks, tracks, the master
//! mixer, the cross-thread channels, and the transport-driven render
//! loop.

pub mod buffer;
pub mod channel;
pub mod config;
pub mod effects;
pub mod engine;
pub mod mixer;
pub mod ring_buffer;
pub mod track;
pub mod voice;

pub use buffer::AudioBuffer;
pub use channel::{command_channel, Command, CommandReceiver, CommandSender, DiagnosticRecord, TelemetryChannel, TelemetryRecord};
pub use config::EngineConfig;
pub use effects::{Compressor, Delay, Effect, EffectChain, Fade, Gain, NoiseGate, PeakingEq3Band, SchroederReverb};
pub use engine::{Engine, RenderLoop};
pub use mixer::{MasterMixer, Meters};
pub use ring_buffer::RingBuffer;
pub use track::{AudioTrack, MidiTrack};
pub use voice::{AdsrParams, EnvStage, LoopMode, SamplerVoiceBank, SamplerZone, SynthVoiceBank, Waveform};
