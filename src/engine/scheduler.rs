use crate::synth::message::EngineEvent;

/// Events the scheduler can hold before it starts applying them early.
pub const SCHEDULER_CAPACITY: usize = 256;

/// Future-stamped events waiting for their frame.
///
/// Storage is reserved once. Entries are kept sorted by frame, latest first,
/// so the next due event is always at the end; events stamped with the same
/// frame come out in the order they were enqueued.
pub struct Scheduler {
    pending: Vec<(u64, EngineEvent)>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            pending: Vec::with_capacity(SCHEDULER_CAPACITY),
        }
    }

    /// Hold `event` until `frame`. When full, the event is handed back.
    pub fn enqueue(&mut self, frame: u64, event: EngineEvent) -> Result<(), EngineEvent> {
        if self.pending.len() >= SCHEDULER_CAPACITY {
            return Err(event);
        }

        let index = self.pending.partition_point(|(at, _)| *at > frame);
        self.pending.insert(index, (frame, event));
        Ok(())
    }

    /// Frame of the earliest pending event.
    pub fn next_due(&self) -> Option<u64> {
        self.pending.last().map(|(at, _)| *at)
    }

    /// Remove the earliest event stamped before `until`.
    pub fn pop_due(&mut self, until: u64) -> Option<EngineEvent> {
        match self.pending.last() {
            Some((at, _)) if *at < until => self.pending.pop().map(|(_, event)| event),
            _ => None,
        }
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
