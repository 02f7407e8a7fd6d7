use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use rtrb::{Producer, PushError};
use tracing::{debug, info, warn};

use crate::{
    engine::routing::{RoutingConfig, RoutingTable},
    error::{ConfigError, ControlError, SendError},
    params::{AtomicFlag, EngineStats, ParamHandle, ParamRegistry, StatsSnapshot},
    synth::message::{EngineEvent, TimedEvent},
};

/// State both domains can see without going through the queue.
#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub(crate) stop: AtomicFlag,
    pub(crate) stats: EngineStats,
    pub(crate) frames: AtomicU64,
}

/// The control-domain side of a [`Conductor`](crate::engine::Conductor).
///
/// Exactly one handle exists per conductor. It owns the producer end of the
/// event queue, so it can be moved to whichever thread delivers MIDI, but not
/// shared between threads.
pub struct ConductorHandle {
    tx: Producer<TimedEvent>,
    shared: Arc<Shared>,
    params: ParamRegistry,
    master: Option<ParamHandle>,
    instrument_ids: Vec<String>,
}

impl ConductorHandle {
    pub(crate) fn new(
        tx: Producer<TimedEvent>,
        shared: Arc<Shared>,
        params: ParamRegistry,
        master: Option<ParamHandle>,
        instrument_ids: Vec<String>,
    ) -> Self {
        Self {
            tx,
            shared,
            params,
            master,
            instrument_ids,
        }
    }

    pub fn note_on(&mut self, note: u8, velocity: u8) -> Result<(), SendError> {
        self.send(TimedEvent::now(EngineEvent::NoteOn { note, velocity }))
    }

    pub fn note_off(&mut self, note: u8) -> Result<(), SendError> {
        self.send(TimedEvent::now(EngineEvent::NoteOff { note }))
    }

    /// Note-on at an absolute frame of the conductor's output.
    pub fn note_on_at(&mut self, frame: u64, note: u8, velocity: u8) -> Result<(), SendError> {
        self.send(TimedEvent::at(frame, EngineEvent::NoteOn { note, velocity }))
    }

    pub fn note_off_at(&mut self, frame: u64, note: u8) -> Result<(), SendError> {
        self.send(TimedEvent::at(frame, EngineEvent::NoteOff { note }))
    }

    pub fn all_notes_off(&mut self) -> Result<(), SendError> {
        self.send(TimedEvent::now(EngineEvent::AllNotesOff))
    }

    /// Resolve `config` against the conductor's instruments and swap it in.
    /// Notes already sounding keep the targets they were voiced on.
    pub fn set_routing(&mut self, config: &RoutingConfig) -> Result<(), ControlError> {
        let table = RoutingTable::resolve(config, &self.instrument_ids)?;
        debug!(
            layers = table.layers().len(),
            rotation = table.rotation().len(),
            "routing table replaced"
        );
        self.send(TimedEvent::now(EngineEvent::SetRouting(table)))?;
        Ok(())
    }

    /// Set a stage parameter. Out-of-range values are clamped.
    pub fn set_param(&self, stage: &str, name: &str, value: f32) -> Result<(), ConfigError> {
        let handle = self
            .params
            .get(stage, name)
            .ok_or_else(|| ConfigError::UnknownParameter {
                stage: stage.to_owned(),
                param: name.to_owned(),
            })?;
        handle.set(value);
        debug!(stage, param = name, value = handle.get(), "parameter set");
        Ok(())
    }

    pub fn param(&self, stage: &str, name: &str) -> Option<ParamHandle> {
        self.params.get(stage, name)
    }

    pub fn params(&self) -> &ParamRegistry {
        &self.params
    }

    /// Gain of the master mixer. Returns `false` when the patch has none.
    pub fn set_master_volume(&self, gain: f32) -> bool {
        match &self.master {
            Some(master) => {
                master.set(gain);
                debug!(gain = master.get(), "master volume set");
                true
            }
            None => false,
        }
    }

    pub fn master_volume(&self) -> Option<f32> {
        self.master.as_ref().map(|m| m.get())
    }

    /// Ask the conductor to stop at its next block boundary.
    pub fn stop(&self) {
        if !self.shared.stop.get() {
            info!("conductor stop requested");
        }
        self.shared.stop.set(true);
    }

    /// Whether `stop` has been called. The conductor only stops at its next
    /// pull; see [`Conductor::is_stopped`](crate::Conductor::is_stopped).
    pub fn stop_requested(&self) -> bool {
        self.shared.stop.get()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Frames the conductor has produced so far.
    pub fn frames_rendered(&self) -> u64 {
        self.shared.frames.load(Ordering::Acquire)
    }

    pub fn instrument_ids(&self) -> &[String] {
        &self.instrument_ids
    }

    fn send(&mut self, event: TimedEvent) -> Result<(), SendError> {
        if self.shared.stop.get() {
            return Err(SendError::Stopped);
        }
        match self.tx.push(event) {
            Ok(()) => Ok(()),
            Err(PushError::Full(dropped)) => {
                warn!(event = ?dropped.event, "event queue full, event dropped");
                Err(SendError::QueueFull)
            }
        }
    }
}
