//! daw-core: sample-rate-agnostic data model for the render core.
//!
//! Pure value types only — clips, notes, ids, transport state, musical-time
//! conversion, and the error taxonomy. Nothing here allocates on a hot
//! path or owns a thread; the render engine that drives these types lives
//! in `daw-engine`.

mod clip;
mod error;
mod ids;
pub mod time;
mod transport;

pub use clip::{AudioClip, MidiClip, MidiNote, SourceBuffer};
pub use error::{ConfigError, EngineError, Result};
pub use ids::{ClipId, EffectId, NoteId, TrackId};
pub use transport::{Transport, TransportState};
