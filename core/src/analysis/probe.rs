use crate::interface::EngineSnapshot;
use crate::math::{FftHelper, StatsHelper};
use crate::prelude::{EngineConfig, EngineError, EngineResult, FrameObserver, ObjectId};
use crate::telemetry::log::LogManager;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Records what one perceiver hears from one source, frame by frame.
///
/// Besides the raw perceived frequencies the probe synthesizes the heard tone
/// (a unit sine whose phase advances at the perceived frequency) so the
/// dominant pitch over a run can be estimated with an FFT.
pub struct PerceptionProbe {
    source: ObjectId,
    perceiver: ObjectId,
    sample_rate_hz: f64,
    frequencies: Vec<f64>,
    tone: Vec<f64>,
    phase: f64,
    logger: LogManager,
}

/// Aggregate view of a finished probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeSummary {
    pub source: ObjectId,
    pub perceiver: ObjectId,
    pub samples: usize,
    pub min_hz: f64,
    pub mean_hz: f64,
    pub max_hz: f64,
    pub dominant_hz: Option<f64>,
}

impl PerceptionProbe {
    pub fn new(source: ObjectId, perceiver: ObjectId, sample_rate_hz: f64) -> Self {
        Self {
            source,
            perceiver,
            sample_rate_hz,
            frequencies: Vec::new(),
            tone: Vec::new(),
            phase: 0.0,
            logger: LogManager::new("probe"),
        }
    }

    pub fn source(&self) -> ObjectId {
        self.source
    }

    pub fn perceiver(&self) -> ObjectId {
        self.perceiver
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn record(&mut self, frequency: f64) {
        self.phase = (self.phase + TAU * frequency / self.sample_rate_hz) % TAU;
        self.frequencies.push(frequency);
        self.tone.push(self.phase.sin());
    }

    /// Strongest pitch of the synthesized tone, in Hz.
    pub fn dominant_frequency(&self) -> Option<f64> {
        if self.tone.len() < 2 {
            return None;
        }
        let size = self.tone.len().next_power_of_two();
        let fft = FftHelper::new(size);
        fft.peak_bin(&self.tone)
            .map(|bin| bin as f64 * self.sample_rate_hz / size as f64)
    }

    pub fn summary(&self) -> ProbeSummary {
        let (min_hz, max_hz) = StatsHelper::min_max(&self.frequencies).unwrap_or((0.0, 0.0));
        ProbeSummary {
            source: self.source,
            perceiver: self.perceiver,
            samples: self.frequencies.len(),
            min_hz,
            mean_hz: StatsHelper::mean(&self.frequencies),
            max_hz,
            dominant_hz: self.dominant_frequency(),
        }
    }
}

impl FrameObserver for PerceptionProbe {
    fn initialize(&mut self, _config: &EngineConfig) -> EngineResult<()> {
        if !self.sample_rate_hz.is_finite() || self.sample_rate_hz <= 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "probe sample rate must be positive, got {}",
                self.sample_rate_hz
            )));
        }
        self.cleanup();
        Ok(())
    }

    fn observe(&mut self, snapshot: &EngineSnapshot) -> EngineResult<()> {
        // Pairs whose objects were deleted mid-run simply stop recording.
        if let Some(frequency) = snapshot.perception(self.source, self.perceiver) {
            self.record(frequency);
        }
        Ok(())
    }

    fn cleanup(&mut self) {
        if !self.frequencies.is_empty() {
            self.logger.record(&format!(
                "probe {}->{} discarded {} samples",
                self.source,
                self.perceiver,
                self.frequencies.len()
            ));
        }
        self.frequencies.clear();
        self.tone.clear();
        self.phase = 0.0;
    }
}
