use anyhow::Context;
use dopplercore::analysis::{PerceptionProbe, ProbeSummary};
use dopplercore::interface::{EngineSnapshot, Scenario};
use dopplercore::telemetry::EngineMetrics;
use dopplercore::{Engine, FrameObserver};
use log::info;

pub struct RunResult {
    pub name: Option<String>,
    pub frames: usize,
    pub snapshot: EngineSnapshot,
    pub probes: Vec<ProbeSummary>,
    pub metrics: EngineMetrics,
}

/// Drives scenarios at a fixed frame step with one probe per observed pair.
#[derive(Clone)]
pub struct Runner {
    scenario: Scenario,
}

impl Runner {
    pub fn new(scenario: Scenario) -> Self {
        Self { scenario }
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn run(&self) -> anyhow::Result<RunResult> {
        self.execute(&self.scenario)
    }

    pub fn execute(&self, scenario: &Scenario) -> anyhow::Result<RunResult> {
        let (mut engine, ids) =
            Engine::from_scenario(scenario).context("building engine from scenario")?;

        let sample_rate = 1.0 / scenario.frame_dt_s;
        let mut probes: Vec<PerceptionProbe> = scenario
            .effective_probes()
            .iter()
            .map(|spec| PerceptionProbe::new(ids[spec.source], ids[spec.perceiver], sample_rate))
            .collect();
        for probe in &mut probes {
            probe
                .initialize(engine.config())
                .context("initializing perception probe")?;
        }

        let frames = scenario.frame_count();
        info!(
            "running scenario {} for {} frames ({} objects, {} probes)",
            scenario.name.as_deref().unwrap_or("<unnamed>"),
            frames,
            ids.len(),
            probes.len()
        );

        for frame in 0..frames {
            engine
                .step(scenario.frame_dt_s)
                .with_context(|| format!("stepping frame {}", frame))?;
            let snapshot = engine.snapshot();
            for probe in &mut probes {
                probe
                    .observe(&snapshot)
                    .with_context(|| format!("observing frame {}", frame))?;
            }
        }

        let summaries = probes.iter().map(|probe| probe.summary()).collect();
        for probe in &mut probes {
            probe.cleanup();
        }

        Ok(RunResult {
            name: scenario.name.clone(),
            frames,
            snapshot: engine.snapshot(),
            probes: summaries,
            metrics: engine.metrics(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::config;
    use dopplercore::ObjectId;

    #[test]
    fn runner_executes_stationary_pair() {
        let scenario = config::from_args(1.5, 1.0 / 60.0, 200.0);
        let runner = Runner::new(scenario);
        let result = runner.run().unwrap();

        assert_eq!(result.frames, 90);
        assert_eq!(result.metrics.frames, 90);
        let source = result.snapshot.object(ObjectId(1)).unwrap();
        let oldest = &source.wavefronts[0];
        assert!((oldest.radius - 300.0).abs() < 5.0);
        assert!(oldest.radius > config::DEFAULT_SEPARATION);

        assert_eq!(result.probes.len(), 1);
        assert_eq!(result.probes[0].mean_hz, 1.0);
        assert_eq!(result.probes[0].samples, 90);
    }

    #[test]
    fn runner_probes_every_pair_when_unspecified() {
        let mut scenario = config::from_args(0.5, 0.1, 200.0);
        scenario.probes.clear();
        scenario
            .objects
            .push(dopplercore::interface::ObjectSpec::new(dopplercore::ObjectKind::Perceiver));
        let result = Runner::new(scenario).run().unwrap();
        assert_eq!(result.probes.len(), 2);
        assert_eq!(result.frames, 5);
    }

    #[test]
    fn runner_rejects_invalid_frame_step() {
        let mut scenario = config::from_args(1.0, 0.1, 200.0);
        scenario.frame_dt_s = 0.0;
        assert!(Runner::new(scenario).run().is_err());
    }
}
