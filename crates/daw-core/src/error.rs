//! Error types shared by the render core and its control-side callers.

use thiserror::Error;

/// Errors surfaced synchronously to a control-side caller.
///
/// The render worker itself never returns or propagates these: invalid
/// construction is rejected before a worker exists, and once running the
/// worker clamps or ignores malformed input locally rather than raising an
/// error up a call stack that, on the audio thread, has nowhere safe to
/// unwind to.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Invalid construction parameters. The engine is never created.
    #[error("invalid engine configuration: {0}")]
    Config(#[from] ConfigError),

    /// The command queue is full; the command was never enqueued.
    #[error("command queue full (capacity {capacity})")]
    Capacity { capacity: usize },

    /// A data-model mutation was rejected because it is unsafe in the
    /// current transport state.
    #[error("invalid mutation: {0}")]
    StateViolation(String),

    #[error("track not found: {0}")]
    TrackNotFound(u64),

    #[error("clip not found: {0}")]
    ClipNotFound(u64),
}

/// Construction-time configuration errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unsupported sample rate {0} (expected one of 44100, 48000, 96000, 192000)")]
    UnsupportedSampleRate(u32),

    #[error("unsupported channel count {0} (expected 1 or 2)")]
    UnsupportedChannels(u16),

    #[error("buffer_frames {0} is not a power of two in [64, 8192]")]
    InvalidBufferFrames(u32),

    #[error("max_voices_per_synth {0} must be at least 8")]
    TooFewVoices(usize),

    #[error("telemetry_capacity {0} must be at least 4")]
    TelemetryCapacityTooSmall(usize),

    #[error("command_capacity {0} must be at least 256")]
    CommandCapacityTooSmall(usize),
}

pub type Result<T> = std::result::Result<T, EngineError>;
