//! Cross-thread plumbing (§4 ambient stack): a bounded SPSC command
//! queue from the control side into the render worker, and a
//! latest-wins mailbox for telemetry flowing the other way. Neither
//! side ever blocks.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};

use daw_core::{EffectId, TrackId};

use crate::effects::Effect;

/// Which effect chain a structural effect command addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectTarget {
    Master,
    Track(TrackId),
}

/// A control-side mutation, applied by the render worker at the start
/// of the next block it renders.
#[derive(Debug, Clone)]
pub enum Command {
    Play,
    Pause,
    Stop,
    Seek { frame: u64 },
    SetMasterGain { gain: f32 },
    SetTrackVolume { track: TrackId, volume: f32 },
    SetTrackPan { track: TrackId, pan: f32 },
    SetMute { track: TrackId, mute: bool },
    SetSolo { track: TrackId, solo: bool },
    MidiNoteOn { track: TrackId, note_number: u8, velocity: u8 },
    MidiNoteOff { track: TrackId, note_number: u8 },
    EffectPush { target: EffectTarget, id: EffectId, effect: Effect },
    EffectRemove { target: EffectTarget, id: EffectId },
    EffectSetEnabled { target: EffectTarget, id: EffectId, enabled: bool },
    SetParam { target: EffectTarget, id: EffectId, param_index: usize, value: f32 },
}

/// Producer-side handle. Lives on the control thread.
pub struct CommandSender {
    producer: HeapProd<Command>,
}

impl CommandSender {
    /// Enqueue a command. Never blocks; returns the command back on
    /// `Err` if the queue is full (§7 `CapacityError`).
    pub fn send(&mut self, command: Command) -> Result<(), Command> {
        self.producer.try_push(command)
    }
}

/// Consumer-side handle. Lives on the render worker.
pub struct CommandReceiver {
    consumer: HeapCons<Command>,
}

impl CommandReceiver {
    pub fn try_recv(&mut self) -> Option<Command> {
        self.consumer.try_pop()
    }

    pub fn drain(&mut self) -> Vec<Command> {
        let mut commands = Vec::new();
        while let Some(c) = self.try_recv() {
            commands.push(c);
        }
        commands
    }
}

/// Construct a bounded SPSC command channel with `capacity` slots.
pub fn command_channel(capacity: usize) -> (CommandSender, CommandReceiver) {
    let (producer, consumer) = HeapRb::<Command>::new(capacity).split();
    (CommandSender { producer }, CommandReceiver { consumer })
}

/// A snapshot of render-side state, published once per block.
#[derive(Debug, Clone, Copy, Default)]
pub struct TelemetryRecord {
    pub cursor_frame: u64,
    pub peak_left: f32,
    pub peak_right: f32,
    pub rms_left: f32,
    pub rms_right: f32,
    pub is_playing: bool,
}

/// Diagnostic information about the most recent anomaly (a clamp event,
/// a full command queue) the render worker observed. Also latest-wins;
/// overwritten, never queued, since only the newest diagnosis matters.
#[derive(Debug, Clone)]
pub struct DiagnosticRecord {
    pub message: String,
    pub cursor_frame: u64,
}

/// Latest-wins mailbox: the render worker stores a fresh record every
/// block; any observer thread loads the most recent one it can see.
/// Never blocks either side, and never grows — this is a single slot.
#[derive(Debug, Default)]
pub struct TelemetryChannel {
    latest: ArcSwapOption<TelemetryRecord>,
    diagnostic: ArcSwapOption<DiagnosticRecord>,
}

impl TelemetryChannel {
    pub fn new() -> Self {
        Self { latest: ArcSwapOption::from(None), diagnostic: ArcSwapOption::from(None) }
    }

    pub fn publish(&self, record: TelemetryRecord) {
        self.latest.store(Some(Arc::new(record)));
    }

    pub fn latest(&self) -> Option<TelemetryRecord> {
        self.latest.load().as_deref().copied()
    }

    pub fn publish_diagnostic(&self, record: DiagnosticRecord) {
        self.diagnostic.store(Some(Arc::new(record)));
    }

    pub fn latest_diagnostic(&self) -> Option<Arc<DiagnosticRecord>> {
        self.diagnostic.load_full()
    }
}
