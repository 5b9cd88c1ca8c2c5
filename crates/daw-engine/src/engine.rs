//! Transport-driven render loop and the top-level `Engine` that owns a
//! background render worker (§4.J/§5).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use daw_core::{ClipId, EngineError, SourceBuffer, TrackId, Transport, TransportState};

use crate::buffer::AudioBuffer;
use crate::channel::{command_channel, Command, CommandReceiver, CommandSender, DiagnosticRecord, EffectTarget, TelemetryChannel, TelemetryRecord};
use crate::config::EngineConfig;
use crate::effects::EffectChain;
use crate::mixer::MasterMixer;

/// One render worker's private state: transport, mixer, and its ends of
/// the two cross-thread channels. `step` performs exactly one loop
/// iteration of §4.J and is safe to call synchronously from a single
/// thread — real-time pacing is layered on top by `Engine::start`.
pub struct RenderLoop {
    transport: Transport,
    mixer: MasterMixer,
    commands: CommandReceiver,
    telemetry: Arc<TelemetryChannel>,
    config: EngineConfig,
    output_block: AudioBuffer,
}

impl RenderLoop {
    pub fn new(config: EngineConfig, mixer: MasterMixer, commands: CommandReceiver, telemetry: Arc<TelemetryChannel>) -> Self {
        Self {
            transport: Transport::new(config.sample_rate),
            mixer,
            commands,
            telemetry,
            output_block: AudioBuffer::new(config.buffer_frames as usize, config.channels as usize),
            config,
        }
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn mixer(&self) -> &MasterMixer {
        &self.mixer
    }

    fn effect_chain_mut(&mut self, target: EffectTarget) -> Option<&mut EffectChain> {
        match target {
            EffectTarget::Master => Some(&mut self.mixer.master_effects),
            EffectTarget::Track(track) => {
                if let Some(t) = self.mixer.audio_track_mut(track) {
                    Some(&mut t.effects)
                } else {
                    self.mixer.midi_track_mut(track).map(|t| &mut t.effects)
                }
            }
        }
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Play => self.transport.play(),
            Command::Pause => self.transport.pause(),
            Command::Stop => {
                self.transport.stop();
                self.mixer.reset(self.config.sample_rate);
            }
            Command::Seek { frame } => {
                if self.transport.seek(frame) {
                    self.mixer.reset(self.config.sample_rate);
                }
            }
            Command::SetMasterGain { gain } => self.mixer.master_gain = gain,
            Command::SetTrackVolume { track, volume } => {
                if let Some(t) = self.mixer.audio_track_mut(track) {
                    t.volume = volume;
                } else if let Some(t) = self.mixer.midi_track_mut(track) {
                    t.volume = volume;
                }
            }
            Command::SetTrackPan { track, pan } => {
                if let Some(t) = self.mixer.audio_track_mut(track) {
                    t.pan = pan;
                } else if let Some(t) = self.mixer.midi_track_mut(track) {
                    t.pan = pan;
                }
            }
            Command::SetMute { track, mute } => {
                if let Some(t) = self.mixer.audio_track_mut(track) {
                    t.mute = mute;
                } else if let Some(t) = self.mixer.midi_track_mut(track) {
                    t.mute = mute;
                }
            }
            Command::SetSolo { track, solo } => {
                if let Some(t) = self.mixer.audio_track_mut(track) {
                    t.solo = solo;
                } else if let Some(t) = self.mixer.midi_track_mut(track) {
                    t.solo = solo;
                }
            }
            Command::MidiNoteOn { track, note_number, velocity } => {
                let sample_rate = self.config.sample_rate;
                if let Some(t) = self.mixer.midi_track_mut(track) {
                    t.voice_bank.note_on(note_number, velocity, sample_rate);
                }
            }
            Command::MidiNoteOff { track, note_number } => {
                let sample_rate = self.config.sample_rate;
                if let Some(t) = self.mixer.midi_track_mut(track) {
                    t.voice_bank.note_off(note_number, sample_rate);
                }
            }
            Command::EffectPush { target, id, effect } => {
                if let Some(chain) = self.effect_chain_mut(target) {
                    chain.push(id, effect);
                    tracing::debug!(?target, %id, "effect pushed");
                }
            }
            Command::EffectRemove { target, id } => {
                if let Some(chain) = self.effect_chain_mut(target) {
                    if chain.remove(id) {
                        tracing::debug!(?target, %id, "effect removed");
                    }
                }
            }
            Command::EffectSetEnabled { target, id, enabled } => {
                if let Some(chain) = self.effect_chain_mut(target) {
                    chain.set_enabled(id, enabled);
                }
            }
            Command::SetParam { target, id, param_index, value } => {
                if let Some(chain) = self.effect_chain_mut(target) {
                    if !chain.set_param(id, param_index, value) {
                        self.telemetry.publish_diagnostic(DiagnosticRecord {
                            message: format!("set_param rejected: effect {id} has no parameter {param_index}"),
                            cursor_frame: self.transport.cursor,
                        });
                    }
                }
            }
        }
    }

    /// Replace an audio clip's source buffer. Rejected with
    /// `StateViolation` unless the transport is `Stopped` — the render
    /// path reads `source` without locking, so this must never race a
    /// block in progress.
    pub fn edit_audio_clip_source(&mut self, track: TrackId, clip: ClipId, source: Arc<SourceBuffer>) -> Result<(), EngineError> {
        if self.transport.state != TransportState::Stopped {
            return Err(EngineError::StateViolation(
                "cannot replace a clip's source buffer while the transport is not stopped".into(),
            ));
        }
        self.mixer.replace_audio_clip_source(track, clip, source)
    }

    pub fn remove_audio_clip(&mut self, track: TrackId, clip: ClipId) -> Result<(), EngineError> {
        if self.transport.state != TransportState::Stopped {
            return Err(EngineError::StateViolation(
                "cannot remove a clip while the transport is not stopped".into(),
            ));
        }
        self.mixer.remove_audio_clip(track, clip)
    }

    /// Drain pending commands, then render one block if the transport is
    /// playing. Returns whether a block was actually rendered.
    pub fn step(&mut self) -> bool {
        while let Some(command) = self.commands.try_recv() {
            self.apply(command);
        }

        if !self.transport.is_playing() {
            return false;
        }

        let cursor = self.transport.cursor;
        let bpm = self.transport.bpm;
        {
            let rendered = self.mixer.render(cursor, self.config.buffer_frames as usize, self.config.sample_rate, bpm);
            self.output_block.resize(self.config.buffer_frames as usize, self.config.channels as usize);
            self.output_block.copy_from(rendered);
        }

        let meters = self.mixer.last_meters;
        if meters.peak_left >= 1.0 || meters.peak_right >= 1.0 {
            self.telemetry.publish_diagnostic(DiagnosticRecord {
                message: "master output clamped at full scale".into(),
                cursor_frame: cursor,
            });
        }
        self.telemetry.publish(TelemetryRecord {
            cursor_frame: cursor,
            peak_left: meters.peak_left,
            peak_right: meters.peak_right,
            rms_left: meters.rms_left,
            rms_right: meters.rms_right,
            is_playing: true,
        });

        self.transport.advance(self.config.buffer_frames as u64);

        let total = self.mixer.total_duration_frames();
        if total > 0 && self.transport.cursor >= total {
            self.transport.end_of_project();
        }

        true
    }

    pub fn last_block(&self) -> &[f32] {
        self.output_block.as_slice()
    }
}

/// The public face of the render core: a command sender, a telemetry
/// reader, and (once started) a background render worker.
pub struct Engine {
    render_loop: Option<RenderLoop>,
    sender: CommandSender,
    telemetry: Arc<TelemetryChannel>,
    stop_flag: Arc<AtomicBool>,
    worker: Option<thread::JoinHandle<()>>,
    config: EngineConfig,
}

impl Engine {
    pub fn new(config: EngineConfig, mixer: MasterMixer) -> Result<Self, EngineError> {
        config.validate()?;
        let (sender, receiver) = command_channel(config.command_capacity);
        let telemetry = Arc::new(TelemetryChannel::new());
        let render_loop = RenderLoop::new(config, mixer, receiver, telemetry.clone());
        tracing::info!(
            sample_rate = config.sample_rate,
            channels = config.channels,
            buffer_frames = config.buffer_frames,
            "engine constructed"
        );
        Ok(Self {
            render_loop: Some(render_loop),
            sender,
            telemetry,
            stop_flag: Arc::new(AtomicBool::new(false)),
            worker: None,
            config,
        })
    }

    /// Edit an audio clip's source buffer or remove it outright. Only
    /// valid before `start()` — once the render worker owns the mixer,
    /// structural edits go through the `Command` channel instead (see
    /// `Command::EffectPush` and friends for the effect-chain analogue).
    pub fn edit_audio_clip_source(&mut self, track: TrackId, clip: ClipId, source: Arc<SourceBuffer>) -> Result<(), EngineError> {
        self.render_loop
            .as_mut()
            .expect("edit_audio_clip_source is unavailable after start()")
            .edit_audio_clip_source(track, clip, source)
    }

    pub fn remove_audio_clip(&mut self, track: TrackId, clip: ClipId) -> Result<(), EngineError> {
        self.render_loop
            .as_mut()
            .expect("remove_audio_clip is unavailable after start()")
            .remove_audio_clip(track, clip)
    }

    /// Spawn the real-time render worker. `step_once`/`last_block` are no
    /// longer available after this call — all rendering moves to the
    /// worker thread.
    pub fn start(&mut self) {
        let Some(mut render_loop) = self.render_loop.take() else { return };
        tracing::info!("starting render worker");
        let worker_stop = self.stop_flag.clone();
        let pacing = Duration::from_secs_f64(0.8 * self.config.buffer_frames as f64 / self.config.sample_rate as f64);
        let idle = Duration::from_millis(100);

        let worker = thread::Builder::new()
            .name("daw-render".into())
            .spawn(move || {
                while !worker_stop.load(Ordering::Acquire) {
                    if render_loop.step() {
                        thread::sleep(pacing);
                    } else {
                        thread::sleep(idle);
                    }
                }
            })
            .expect("failed to spawn render worker");

        self.worker = Some(worker);
    }

    /// Run exactly one loop iteration synchronously. Only valid before
    /// `start` — intended for deterministic, block-by-block tests.
    pub fn step_once(&mut self) -> bool {
        self.render_loop
            .as_mut()
            .expect("step_once is unavailable after start() — the worker thread owns the render loop")
            .step()
    }

    /// The most recently rendered block. Only valid before `start`.
    pub fn last_block(&self) -> &[f32] {
        self.render_loop
            .as_ref()
            .expect("last_block is unavailable after start() — read telemetry instead")
            .last_block()
    }

    pub fn enqueue(&mut self, command: Command) -> Result<(), EngineError> {
        self.sender.send(command).map_err(|_| {
            tracing::warn!(capacity = self.config.command_capacity, "command queue full, dropping command");
            EngineError::Capacity { capacity: self.config.command_capacity }
        })
    }

    pub fn play(&mut self) -> Result<(), EngineError> {
        self.enqueue(Command::Play)
    }

    pub fn pause(&mut self) -> Result<(), EngineError> {
        self.enqueue(Command::Pause)
    }

    pub fn stop(&mut self) -> Result<(), EngineError> {
        self.enqueue(Command::Stop)
    }

    pub fn seek(&mut self, frame: u64) -> Result<(), EngineError> {
        self.enqueue(Command::Seek { frame })
    }

    pub fn telemetry(&self) -> Option<TelemetryRecord> {
        self.telemetry.latest()
    }

    pub fn diagnostic(&self) -> Option<Arc<DiagnosticRecord>> {
        self.telemetry.latest_diagnostic()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop_flag.store(true, Ordering::Release);
        let Some(worker) = self.worker.take() else { return };

        let (done_tx, done_rx) = std::sync::mpsc::channel();
        thread::spawn(move || {
            let _ = worker.join();
            let _ = done_tx.send(());
        });

        if done_rx.recv_timeout(Duration::from_secs(2)).is_err() {
            tracing::warn!("render worker did not exit within the 2s teardown timeout; leaking thread");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use daw_core::TrackId;

    fn config() -> EngineConfig {
        EngineConfig { buffer_frames: 64, ..EngineConfig::default() }
    }

    #[test]
    fn engine_does_not_render_while_stopped() {
        let mut engine = Engine::new(config(), MasterMixer::new(2)).unwrap();
        assert!(!engine.step_once());
    }

    #[test]
    fn play_command_starts_rendering() {
        let mut engine = Engine::new(config(), MasterMixer::new(2)).unwrap();
        engine.play().unwrap();
        assert!(engine.step_once());
        assert!(engine.telemetry().is_some());
    }

    #[test]
    fn seek_while_stopped_does_not_reset_mixer_unexpectedly() {
        let mut engine = Engine::new(config(), MasterMixer::new(2)).unwrap();
        engine.seek(1000).unwrap();
        engine.play().unwrap();
        assert!(engine.step_once());
        assert_eq!(engine.telemetry().unwrap().cursor_frame, 1000);
    }

    #[test]
    fn midi_note_on_command_reaches_the_target_track() {
        let mut mixer = MasterMixer::new(2);
        mixer.midi_tracks.push(crate::track::MidiTrack::new_synth(TrackId(1), "lead", 8));
        let mut engine = Engine::new(config(), mixer).unwrap();
        engine.enqueue(Command::MidiNoteOn { track: TrackId(1), note_number: 69, velocity: 100 }).unwrap();
        engine.play().unwrap();
        assert!(engine.step_once());
        let block = engine.last_block();
        assert!(block.iter().any(|&s| s != 0.0));
    }

    #[test]
    fn full_command_queue_reports_capacity_error() {
        let mut engine = Engine::new(EngineConfig { command_capacity: 256, ..config() }, MasterMixer::new(2)).unwrap();
        for _ in 0..256 {
            engine.play().unwrap();
        }
        assert!(matches!(engine.play(), Err(EngineError::Capacity { .. })));
    }

    #[test]
    fn effect_push_command_reaches_the_target_chain() {
        use crate::effects::{Effect, Gain};
        use daw_core::EffectId;

        let mut mixer = MasterMixer::new(2);
        mixer.audio_tracks.push(crate::track::AudioTrack::new(TrackId(1), "a"));
        let mut engine = Engine::new(config(), mixer).unwrap();
        engine
            .enqueue(Command::EffectPush {
                target: EffectTarget::Track(TrackId(1)),
                id: EffectId(1),
                effect: Effect::Gain(Gain::new(-6.0)),
            })
            .unwrap();
        engine.play().unwrap();
        assert!(engine.step_once());
    }

    #[test]
    fn edit_audio_clip_source_rejects_while_playing() {
        use daw_core::{ClipId, SourceBuffer};
        use std::sync::Arc;

        let mut mixer = MasterMixer::new(1);
        let mut track = crate::track::AudioTrack::new(TrackId(1), "a");
        track.add_clip(daw_core::AudioClip::new(ClipId(1), Arc::new(SourceBuffer::new(vec![0.0; 10], 44_100, 1))));
        mixer.audio_tracks.push(track);

        let mut engine = Engine::new(config(), mixer).unwrap();
        engine.play().unwrap();
        assert!(engine.step_once());

        let new_source = Arc::new(SourceBuffer::new(vec![1.0; 10], 44_100, 1));
        assert!(matches!(
            engine.edit_audio_clip_source(TrackId(1), ClipId(1), new_source),
            Err(EngineError::StateViolation(_))
        ));
    }
}
