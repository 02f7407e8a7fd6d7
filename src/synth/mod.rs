// Purpose: voices, voice pools, and the instruments built from them
// This layer sits below the conductor and above the dsp primitives

pub mod instrument;
pub mod message;
pub mod pool;
pub mod timbre;
pub mod voice;

pub use instrument::{Instrument, VelocityCurve};
pub use message::{EngineEvent, TimedEvent};
pub use pool::{Allocation, AllocationOutcome, VoiceHandle, VoicePool};
pub use timbre::{EnvelopeDescriptor, Timbre};
pub use voice::{Voice, VoiceState};
