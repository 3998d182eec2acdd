use crate::workflow::runner::RunResult;
use dopplercore::analysis::ProbeSummary;
use dopplercore::interface::EngineSnapshot;
use dopplercore::telemetry::EngineMetrics;
use serde::{Deserialize, Serialize};

/// State served to front ends by the bridge.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VisualizationModel {
    pub scenario: Option<String>,
    pub frames: usize,
    pub snapshot: EngineSnapshot,
    pub probes: Vec<ProbeSummary>,
    pub metrics: EngineMetrics,
}

impl From<&RunResult> for VisualizationModel {
    fn from(result: &RunResult) -> Self {
        Self {
            scenario: result.name.clone(),
            frames: result.frames,
            snapshot: result.snapshot.clone(),
            probes: result.probes.clone(),
            metrics: result.metrics,
        }
    }
}
