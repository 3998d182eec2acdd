use crate::prelude::EngineConfig;
use crate::simulation::object::MovableObject;

/// Classical Doppler ratio with both velocities resolved along the
/// source-to-perceiver line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DopplerModel {
    pub propagation_speed: f64,
    pub min_denominator: f64,
}

impl DopplerModel {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            propagation_speed: config.propagation_speed,
            min_denominator: config.min_doppler_denominator,
        }
    }

    /// Frequency heard at `perceiver` from `source`.
    ///
    /// Coincident objects hear the raw source frequency. The denominator
    /// `c + v_source` is floored at `min_denominator` and negative results
    /// (perceiver outrunning the wave) are reported as silence.
    pub fn perceived(&self, source: &MovableObject, perceiver: &MovableObject) -> f64 {
        let Some(direction) = (perceiver.position() - source.position()).normalize() else {
            return source.frequency();
        };

        let v_source = source.velocity().dot(direction);
        let v_perceiver = perceiver.velocity().dot(direction);

        let numerator = self.propagation_speed + v_perceiver;
        let denominator = (self.propagation_speed + v_source).max(self.min_denominator);

        (source.frequency() * numerator / denominator).max(0.0)
    }
}
