use crate::interface::EngineSnapshot;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shared configuration for an engine instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Wave propagation speed in distance units per second.
    pub propagation_speed: f64,
    pub viewport_width: f64,
    pub viewport_height: f64,
    /// Fixed pruning distance; replaces the viewport-derived bound when set.
    pub max_distance: Option<f64>,
    /// Initial frequency of a freshly created source, in Hz.
    pub default_frequency: f64,
    pub max_frequency: f64,
    /// Floor for `propagation_speed + v_source` in the Doppler ratio.
    pub min_doppler_denominator: f64,
    pub max_wavefronts_per_source: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            propagation_speed: 200.0,
            viewport_width: 1200.0,
            viewport_height: 800.0,
            max_distance: None,
            default_frequency: 1.0,
            max_frequency: 50.0,
            min_doppler_denominator: 1.0,
            max_wavefronts_per_source: 512,
        }
    }
}

impl EngineConfig {
    /// Distance past which a wavefront is no longer tracked.
    pub fn visibility_bound(&self) -> f64 {
        self.max_distance
            .unwrap_or_else(|| self.viewport_width.max(self.viewport_height))
    }

    pub fn viewport_center(&self) -> (f64, f64) {
        (self.viewport_width / 2.0, self.viewport_height / 2.0)
    }

    /// Wavefronts a source at `max_frequency` keeps alive inside the
    /// visibility bound. The per-source cap must not be below this.
    pub fn required_wavefront_capacity(&self) -> usize {
        let lifetime = self.visibility_bound() / self.propagation_speed;
        (lifetime * self.max_frequency).ceil() as usize + 1
    }
}

/// Engine-issued object identifier. Never reused within one engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Source,
    Perceiver,
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectKind::Source => f.write_str("source"),
            ObjectKind::Perceiver => f.write_str("perceiver"),
        }
    }
}

/// Common error type for engine operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    #[error("unknown object {0}")]
    UnknownObject(ObjectId),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Consumer of per-frame engine snapshots (renderers, probes, reporters).
pub trait FrameObserver {
    fn initialize(&mut self, config: &EngineConfig) -> EngineResult<()>;
    fn observe(&mut self, snapshot: &EngineSnapshot) -> EngineResult<()>;
    fn cleanup(&mut self);
}
