//! Which instruments a note-on reaches.
//!
//! The table has two parts. Every **layer** receives every note. The
//! **rotation** contributes one entry per note-on, advancing round-robin, so a
//! rotation of `[sine, triangle]` alternates timbres note by note while the
//! layers always sound underneath. A rotation of length one is a fixed extra
//! layer; an empty rotation adds nothing.
//!
//! Config names instruments by id; a resolved [`RoutingTable`] holds indices in
//! fixed-capacity storage so it can be moved into the render domain and used
//! there without touching the heap.

use arrayvec::ArrayVec;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Most routes a single note-on can reach, and most entries per table part.
pub const MAX_ROUTES: usize = 16;

/// The instruments one note-on was sent to.
pub type Targets = ArrayVec<Route, MAX_ROUTES>;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct RouteConfig {
    pub instrument: String,
    /// Multiplies the velocity gain of every voice this route starts.
    pub gain: f32,
}

impl RouteConfig {
    pub fn new(instrument: impl Into<String>, gain: f32) -> Self {
        Self {
            instrument: instrument.into(),
            gain,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoutingConfig {
    pub layers: Vec<RouteConfig>,
    pub rotation: Vec<RouteConfig>,
}

impl RoutingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn layer(mut self, instrument: impl Into<String>, gain: f32) -> Self {
        self.layers.push(RouteConfig::new(instrument, gain));
        self
    }

    pub fn rotate(mut self, instrument: impl Into<String>, gain: f32) -> Self {
        self.rotation.push(RouteConfig::new(instrument, gain));
        self
    }
}

/// A route resolved to an instrument index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Route {
    pub instrument: usize,
    pub gain: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoutingTable {
    layers: ArrayVec<Route, MAX_ROUTES>,
    rotation: ArrayVec<Route, MAX_ROUTES>,
    cursor: usize,
}

impl RoutingTable {
    pub fn resolve<S: AsRef<str>>(
        config: &RoutingConfig,
        instrument_ids: &[S],
    ) -> Result<Self, ConfigError> {
        // Layers plus the one rotation entry must fit in `Targets`.
        let reserved = usize::from(!config.rotation.is_empty());
        if config.layers.len() + reserved > MAX_ROUTES {
            return Err(ConfigError::TooManyRoutes {
                count: config.layers.len() + reserved,
                max: MAX_ROUTES,
            });
        }
        if config.rotation.len() > MAX_ROUTES {
            return Err(ConfigError::TooManyRoutes {
                count: config.rotation.len(),
                max: MAX_ROUTES,
            });
        }

        let mut table = Self::default();
        for route in &config.layers {
            let resolved = resolve_route(route, instrument_ids)?;
            if table.layers.iter().any(|r| r.instrument == resolved.instrument) {
                return Err(ConfigError::DuplicateRoute(route.instrument.clone()));
            }
            table.layers.push(resolved);
        }
        for route in &config.rotation {
            let resolved = resolve_route(route, instrument_ids)?;
            if table.rotation.iter().any(|r| r.instrument == resolved.instrument) {
                return Err(ConfigError::DuplicateRoute(route.instrument.clone()));
            }
            table.rotation.push(resolved);
        }
        Ok(table)
    }

    pub fn layers(&self) -> &[Route] {
        &self.layers
    }

    pub fn rotation(&self) -> &[Route] {
        &self.rotation
    }

    /// Targets for the next note-on. Advances the rotation.
    ///
    /// A rotation entry whose instrument is also a layer is skipped for that
    /// note rather than voiced twice.
    pub fn next_targets(&mut self) -> Targets {
        let mut targets: Targets = self.layers.iter().copied().collect();

        if !self.rotation.is_empty() {
            let pick = self.rotation[self.cursor % self.rotation.len()];
            self.cursor = (self.cursor + 1) % self.rotation.len();
            if !targets.iter().any(|r| r.instrument == pick.instrument) {
                targets.push(pick);
            }
        }
        targets
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty() && self.rotation.is_empty()
    }
}

fn resolve_route<S: AsRef<str>>(
    route: &RouteConfig,
    instrument_ids: &[S],
) -> Result<Route, ConfigError> {
    let instrument = instrument_ids
        .iter()
        .position(|id| id.as_ref() == route.instrument)
        .ok_or_else(|| ConfigError::UnknownRoutingTarget(route.instrument.clone()))?;

    if !route.gain.is_finite() || route.gain < 0.0 {
        return Err(ConfigError::InvalidParameter {
            stage: format!("route '{}'", route.instrument),
            param: "gain",
            value: route.gain,
        });
    }

    Ok(Route {
        instrument,
        gain: route.gain,
    })
}
