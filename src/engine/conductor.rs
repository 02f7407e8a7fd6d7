use std::{
    collections::HashSet,
    convert::Infallible,
    sync::{atomic::Ordering, Arc},
};

use rtrb::{Consumer, RingBuffer};
use tracing::{info, trace};

use crate::{
    engine::{
        config::EngineConfig,
        handle::{ConductorHandle, Shared},
        routing::{Route, RoutingTable, Targets},
        scheduler::Scheduler,
    },
    error::ConfigError,
    graph::signal::SignalGraph,
    io::router::NoteSink,
    params::StatsSnapshot,
    synth::{
        instrument::Instrument,
        message::{EngineEvent, MessageReceiver, TimedEvent},
        pool::AllocationOutcome,
    },
    MAX_BLOCK_SIZE,
};

const NOTE_COUNT: usize = 128;

/// Whether a note is currently voiced on any instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteState {
    Idle,
    Sounding,
}

/*
Note Tracking
=============

`tracked[note]` is the set of instruments a note-on was actually sent to.
Note-offs go to that set, not to whatever the routing table says now, so a
routing change while a key is held never strands a voice.

    NoteOn  Idle      → targets = routing.next_targets(), all voiced, recorded
    NoteOn  Sounding  → new targets retrigger; old-only targets get note-off;
                        record replaced
    NoteOff Sounding  → note-off to the record, record cleared
    NoteOff Idle      → ignored, counted

When an instrument steals a voice from another note, that instrument no
longer holds the old note and is dropped from its record.

Rendering
=========

Each pull drains the queue once, then walks the block in segments. A
segment ends at the next scheduled event, so an event stamped for frame F
changes the output starting exactly at F. Instruments render into their
own scratch buffers and the graph pulls from those.
*/

pub struct Conductor {
    instruments: Vec<Instrument>,
    graph: SignalGraph,
    routing: RoutingTable,
    tracked: Vec<Targets>,
    rx: Consumer<TimedEvent>,
    scheduler: Scheduler,
    scratch: Vec<Vec<f32>>,
    shared: Arc<Shared>,
    frame: u64,
    stopped: bool,
}

impl Conductor {
    /// Validate `config` and build the conductor plus its control handle.
    pub fn new(config: &EngineConfig) -> Result<(Self, ConductorHandle), ConfigError> {
        let sample_rate = config.sample_rate;
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(ConfigError::InvalidSampleRate(sample_rate));
        }
        if config.event_capacity == 0 {
            return Err(ConfigError::InvalidQueueCapacity);
        }

        let mut seen = HashSet::with_capacity(config.instruments.len());
        for instrument in &config.instruments {
            if !seen.insert(instrument.id.as_str()) {
                return Err(ConfigError::DuplicateInstrument(instrument.id.clone()));
            }
        }

        let instruments = config
            .instruments
            .iter()
            .map(|i| {
                Instrument::new(
                    i.id.clone(),
                    i.timbre,
                    i.voice_count,
                    config.velocity_curve,
                    sample_rate,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;
        let ids: Vec<String> = config.instruments.iter().map(|i| i.id.clone()).collect();

        let topology = config.graph.validate(&ids)?;
        let routing = RoutingTable::resolve(&config.routing, &ids)?;
        let graph = SignalGraph::build(&config.graph, topology, sample_rate)?;

        let master = match &config.master_stage {
            Some(stage) => Some(graph.param(stage, "gain").ok_or_else(|| {
                ConfigError::UnknownParameter {
                    stage: stage.clone(),
                    param: "gain".to_owned(),
                }
            })?),
            None => None,
        };

        let (tx, rx) = RingBuffer::new(config.event_capacity);
        let shared = Arc::new(Shared::default());
        let handle = ConductorHandle::new(
            tx,
            Arc::clone(&shared),
            graph.params().clone(),
            master,
            ids,
        );

        info!(
            instruments = instruments.len(),
            stages = graph.stage_count(),
            sample_rate,
            "conductor ready"
        );

        let conductor = Self {
            scratch: vec![vec![0.0; MAX_BLOCK_SIZE]; instruments.len()],
            instruments,
            graph,
            routing,
            tracked: vec![Targets::new(); NOTE_COUNT],
            rx,
            scheduler: Scheduler::new(),
            shared,
            frame: 0,
            stopped: false,
        };
        Ok((conductor, handle))
    }

    /// Voice `note` on the instruments the routing table picks.
    /// Velocity 0 is a note-off.
    pub fn route_note_on(&mut self, note: u8, velocity: u8) {
        let Some(index) = note_index(note) else {
            trace!(note, "note number out of range, ignored");
            return;
        };
        if velocity == 0 {
            self.route_note_off(note);
            return;
        }

        let targets = self.routing.next_targets();
        let previous = std::mem::take(&mut self.tracked[index]);

        if !previous.is_empty() {
            self.shared.stats.retrigger();
            trace!(note, "retrigger of sounding note");
            for route in previous.iter() {
                if !targets.iter().any(|t| t.instrument == route.instrument) {
                    self.instruments[route.instrument].note_off(note);
                }
            }
        }

        for route in targets.iter() {
            let Some(allocation) =
                self.instruments[route.instrument].note_on(note, velocity, route.gain)
            else {
                continue;
            };
            if let AllocationOutcome::Stolen { previous_note } = allocation.outcome {
                self.shared.stats.voice_stolen();
                trace!(
                    instrument = self.instruments[route.instrument].id(),
                    stolen = previous_note,
                    note,
                    "voice stolen"
                );
                if previous_note != note {
                    self.untrack(previous_note, route.instrument);
                }
            }
        }

        self.tracked[index] = targets;
    }

    /// Release `note` on every instrument it was voiced on.
    pub fn route_note_off(&mut self, note: u8) {
        let targets = note_index(note)
            .map(|index| std::mem::take(&mut self.tracked[index]))
            .unwrap_or_default();

        if targets.is_empty() {
            self.shared.stats.ignored_note_off();
            trace!(note, "note-off for a note that is not sounding");
            return;
        }

        for route in targets.iter() {
            self.instruments[route.instrument].note_off(note);
        }
    }

    pub fn all_notes_off(&mut self) {
        for instrument in &mut self.instruments {
            instrument.all_notes_off();
        }
        for targets in &mut self.tracked {
            targets.clear();
        }
    }

    /// Replace the routing table. Sounding notes keep their recorded targets.
    pub fn set_routing(&mut self, table: RoutingTable) {
        self.routing = table;
    }

    pub fn note_state(&self, note: u8) -> NoteState {
        match note_index(note) {
            Some(index) if !self.tracked[index].is_empty() => NoteState::Sounding,
            _ => NoteState::Idle,
        }
    }

    /// Instruments `note` is currently voiced on.
    pub fn note_targets(&self, note: u8) -> &[Route] {
        note_index(note).map_or(&[], |index| self.tracked[index].as_slice())
    }

    /// Fill `out` with the next block of mono output.
    ///
    /// Never blocks or allocates. Once a stop has been requested the next call
    /// shuts the engine down and every call after that produces silence.
    pub fn pull(&mut self, out: &mut [f32]) {
        if !self.stopped && self.shared.stop.get() {
            self.shutdown();
        }
        if self.stopped {
            out.fill(0.0);
            return;
        }

        self.drain_queue();
        for chunk in out.chunks_mut(MAX_BLOCK_SIZE) {
            self.render_chunk(chunk);
        }
        self.shared.frames.store(self.frame, Ordering::Release);
    }

    fn drain_queue(&mut self) {
        while let Some(TimedEvent { at, event }) = MessageReceiver::pop(&mut self.rx) {
            match at {
                Some(at) if at > self.frame => {
                    if let Err(event) = self.scheduler.enqueue(at, event) {
                        self.shared.stats.scheduler_overflow();
                        trace!(at, "scheduler full, event applied early");
                        self.apply(event);
                    }
                }
                Some(at) => {
                    if at < self.frame {
                        self.shared.stats.late_event();
                        trace!(at, frame = self.frame, "late event applied at block start");
                    }
                    self.apply(event);
                }
                None => self.apply(event),
            }
        }
    }

    fn render_chunk(&mut self, out: &mut [f32]) {
        let frames = out.len();
        let end = self.frame + frames as u64;
        let mut offset = 0;

        while offset < frames {
            let now = self.frame + offset as u64;
            while let Some(event) = self.scheduler.pop_due(now + 1) {
                self.apply(event);
            }

            let split = match self.scheduler.next_due() {
                Some(at) if at < end => (at - self.frame) as usize,
                _ => frames,
            };
            self.render_segment(&mut out[offset..split]);
            offset = split;
        }

        self.frame = end;
    }

    fn render_segment(&mut self, out: &mut [f32]) {
        let frames = out.len();
        for (instrument, scratch) in self.instruments.iter_mut().zip(self.scratch.iter_mut()) {
            instrument.render(&mut scratch[..frames]);
        }
        let faults = self.graph.pull(&self.scratch, out);
        self.shared.stats.stage_faults(faults);
    }

    fn apply(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::NoteOn { note, velocity } => self.route_note_on(note, velocity),
            EngineEvent::NoteOff { note } => self.route_note_off(note),
            EngineEvent::AllNotesOff => self.all_notes_off(),
            EngineEvent::SetRouting(table) => self.set_routing(table),
        }
    }

    fn shutdown(&mut self) {
        while MessageReceiver::pop(&mut self.rx).is_some() {}
        self.scheduler.clear();
        for instrument in &mut self.instruments {
            instrument.kill_all();
        }
        for targets in &mut self.tracked {
            targets.clear();
        }
        self.graph.reset();
        self.stopped = true;
        trace!(frame = self.frame, "conductor stopped");
    }

    fn untrack(&mut self, note: u8, instrument: usize) {
        if let Some(index) = note_index(note) {
            self.tracked[index].retain(|route| route.instrument != instrument);
        }
    }

    pub fn instrument(&self, id: &str) -> Option<&Instrument> {
        self.instruments.iter().find(|i| i.id() == id)
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn graph(&self) -> &SignalGraph {
        &self.graph
    }

    pub fn routing(&self) -> &RoutingTable {
        &self.routing
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Frames produced so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }
}

impl NoteSink for Conductor {
    type Error = Infallible;

    fn note_on(&mut self, note: u8, velocity: u8) -> Result<(), Self::Error> {
        self.route_note_on(note, velocity);
        Ok(())
    }

    fn note_off(&mut self, note: u8) -> Result<(), Self::Error> {
        self.route_note_off(note);
        Ok(())
    }
}

#[inline]
fn note_index(note: u8) -> Option<usize> {
    let index = usize::from(note);
    (index < NOTE_COUNT).then_some(index)
}
