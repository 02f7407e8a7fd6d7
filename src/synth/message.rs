use rtrb::Consumer;

use crate::engine::routing::RoutingTable;

/// A command for the render domain.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
    AllNotesOff,
    SetRouting(RoutingTable),
}

/// An event plus the absolute frame it should take effect on.
/// `at: None` applies at the start of the next block.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEvent {
    pub at: Option<u64>,
    pub event: EngineEvent,
}

impl TimedEvent {
    pub fn now(event: EngineEvent) -> Self {
        Self { at: None, event }
    }

    pub fn at(frame: u64, event: EngineEvent) -> Self {
        Self {
            at: Some(frame),
            event,
        }
    }
}

pub trait MessageReceiver {
    fn pop(&mut self) -> Option<TimedEvent>;
}

impl MessageReceiver for Consumer<TimedEvent> {
    fn pop(&mut self) -> Option<TimedEvent> {
        Consumer::pop(self).ok()
    }
}
