//! Lock-free parameters shared between the control and render domains.
//!
//! Each parameter has exactly one writer (the control-side handle) and one
//! reader (the render thread). Values are stored in an `AtomicF32`, so the
//! render thread can never observe a torn write. Stages read their parameters
//! once at the top of each block.

use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use atomic_float::AtomicF32;

/// Cache-line aligned atomic `f32` with a fixed valid range.
#[derive(Debug)]
#[repr(align(64))]
pub struct AtomicParam {
    value: AtomicF32,
    min: f32,
    max: f32,
}

impl AtomicParam {
    pub fn new(value: f32, min: f32, max: f32) -> Self {
        Self {
            value: AtomicF32::new(value.clamp(min, max)),
            min,
            max,
        }
    }

    /// A parameter in the unit range, e.g. a dry/wet balance.
    pub fn unit(value: f32) -> Self {
        Self::new(value, 0.0, 1.0)
    }

    #[inline]
    pub fn get(&self) -> f32 {
        self.value.load(Ordering::Acquire)
    }

    /// Store a new value, clamped to the parameter's range.
    #[inline]
    pub fn set(&self, value: f32) {
        if value.is_finite() {
            self.value.store(value.clamp(self.min, self.max), Ordering::Release);
        }
    }

    pub fn range(&self) -> (f32, f32) {
        (self.min, self.max)
    }
}

/// Shared handle to one stage parameter.
pub type ParamHandle = Arc<AtomicParam>;

/// A named parameter exposed by a stage.
#[derive(Debug, Clone)]
pub struct StageParam {
    pub stage: String,
    pub name: &'static str,
    pub handle: ParamHandle,
}

/// All runtime-settable parameters of a signal graph.
#[derive(Debug, Clone, Default)]
pub struct ParamRegistry {
    params: Vec<StageParam>,
}

impl ParamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, stage: &str, name: &'static str, handle: ParamHandle) {
        self.params.push(StageParam {
            stage: stage.to_owned(),
            name,
            handle,
        });
    }

    pub fn get(&self, stage: &str, name: &str) -> Option<ParamHandle> {
        self.params
            .iter()
            .find(|p| p.stage == stage && p.name == name)
            .map(|p| Arc::clone(&p.handle))
    }

    pub fn iter(&self) -> impl Iterator<Item = &StageParam> {
        self.params.iter()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

/// Cache-line aligned atomic bool.
#[derive(Debug, Default)]
#[repr(align(64))]
pub struct AtomicFlag {
    value: AtomicBool,
}

impl AtomicFlag {
    pub fn new(value: bool) -> Self {
        Self {
            value: AtomicBool::new(value),
        }
    }

    #[inline]
    pub fn get(&self) -> bool {
        self.value.load(Ordering::Acquire)
    }

    #[inline]
    pub fn set(&self, value: bool) {
        self.value.store(value, Ordering::Release);
    }
}

/// Render-domain counters, readable from the control domain.
#[derive(Debug, Default)]
pub struct EngineStats {
    voices_stolen: AtomicU64,
    ignored_note_offs: AtomicU64,
    retriggers: AtomicU64,
    late_events: AtomicU64,
    scheduler_overflows: AtomicU64,
    stage_faults: AtomicU64,
}

/// Point-in-time copy of [`EngineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub voices_stolen: u64,
    pub ignored_note_offs: u64,
    pub retriggers: u64,
    pub late_events: u64,
    pub scheduler_overflows: u64,
    pub stage_faults: u64,
}

impl EngineStats {
    #[inline]
    pub(crate) fn voice_stolen(&self) {
        self.voices_stolen.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn ignored_note_off(&self) {
        self.ignored_note_offs.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn retrigger(&self) {
        self.retriggers.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn late_event(&self) {
        self.late_events.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn scheduler_overflow(&self) {
        self.scheduler_overflows.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn stage_faults(&self, count: usize) {
        if count > 0 {
            self.stage_faults.fetch_add(count as u64, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            voices_stolen: self.voices_stolen.load(Ordering::Relaxed),
            ignored_note_offs: self.ignored_note_offs.load(Ordering::Relaxed),
            retriggers: self.retriggers.load(Ordering::Relaxed),
            late_events: self.late_events.load(Ordering::Relaxed),
            scheduler_overflows: self.scheduler_overflows.load(Ordering::Relaxed),
            stage_faults: self.stage_faults.load(Ordering::Relaxed),
        }
    }
}
