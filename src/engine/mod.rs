//! Note routing and block rendering.
//!
//! A [`Conductor`] owns the instruments and the signal graph and lives in the
//! render domain. Its [`ConductorHandle`] is the only way in from the control
//! domain: events go through a lock-free SPSC queue, parameters through
//! atomics.

pub mod conductor;
pub mod config;
pub mod handle;
pub mod routing;
pub mod scheduler;

pub use conductor::{Conductor, NoteState};
pub use config::{EngineConfig, InstrumentConfig};
pub use handle::ConductorHandle;
pub use routing::{Route, RouteConfig, RoutingConfig, RoutingTable, Targets, MAX_ROUTES};
pub use scheduler::{Scheduler, SCHEDULER_CAPACITY};
