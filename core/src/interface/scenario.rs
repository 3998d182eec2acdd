use crate::math::Vec2;
use crate::prelude::{EngineConfig, EngineError, EngineResult, ObjectId, ObjectKind};
use crate::simulation::Engine;
use serde::{Deserialize, Serialize};

/// Longest run a scenario may request, in frames (about 4.6 h at 60 fps).
pub const MAX_FRAMES: usize = 1_000_000;
/// Most objects a scenario may declare.
pub const MAX_OBJECTS: usize = 256;

/// Declarative description of a run: engine settings, objects and probes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub name: Option<String>,
    pub engine: EngineConfig,
    pub duration_s: f64,
    pub frame_dt_s: f64,
    pub objects: Vec<ObjectSpec>,
    pub probes: Vec<ProbeSpec>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            name: None,
            engine: EngineConfig::default(),
            duration_s: 10.0,
            frame_dt_s: 1.0 / 60.0,
            objects: Vec::new(),
            probes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSpec {
    pub kind: ObjectKind,
    /// Defaults to the viewport center.
    #[serde(default)]
    pub position: Option<Vec2>,
    #[serde(default)]
    pub velocity: Vec2,
    #[serde(default)]
    pub acceleration: Vec2,
    /// Defaults to the engine's default frequency for sources.
    #[serde(default)]
    pub frequency: Option<f64>,
}

impl ObjectSpec {
    pub fn new(kind: ObjectKind) -> Self {
        Self {
            kind,
            position: None,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            frequency: None,
        }
    }
}

/// Source/perceiver pair to record, by index into `Scenario::objects`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeSpec {
    pub source: usize,
    pub perceiver: usize,
}

impl Scenario {
    pub fn validate(&self) -> EngineResult<()> {
        if !self.duration_s.is_finite() || self.duration_s < 0.0 {
            return Err(EngineError::InvalidInput(
                "duration_s must be a non-negative number".into(),
            ));
        }
        if !self.frame_dt_s.is_finite() || self.frame_dt_s <= 0.0 {
            return Err(EngineError::InvalidInput("frame_dt_s must be positive".into()));
        }
        let frames = (self.duration_s / self.frame_dt_s).ceil();
        if frames > MAX_FRAMES as f64 {
            return Err(EngineError::InvalidInput(format!(
                "{} s at {} s per frame needs {} frames, limit is {}",
                self.duration_s, self.frame_dt_s, frames, MAX_FRAMES
            )));
        }
        if self.objects.len() > MAX_OBJECTS {
            return Err(EngineError::InvalidInput(format!(
                "{} objects exceeds the limit of {}",
                self.objects.len(),
                MAX_OBJECTS
            )));
        }
        for probe in &self.probes {
            let source = self.objects.get(probe.source);
            let perceiver = self.objects.get(probe.perceiver);
            match (source, perceiver) {
                (Some(s), Some(p))
                    if s.kind == ObjectKind::Source && p.kind == ObjectKind::Perceiver => {}
                _ => {
                    return Err(EngineError::InvalidInput(format!(
                        "probe {}->{} must reference a source and a perceiver",
                        probe.source, probe.perceiver
                    )))
                }
            }
        }
        Ok(())
    }

    /// Number of fixed-size frames needed to cover `duration_s`.
    pub fn frame_count(&self) -> usize {
        ((self.duration_s / self.frame_dt_s) - 1e-9).ceil().max(0.0) as usize
    }

    /// Explicit probes, or every source/perceiver pair when none are listed.
    pub fn effective_probes(&self) -> Vec<ProbeSpec> {
        if !self.probes.is_empty() {
            return self.probes.clone();
        }
        let of_kind = |kind: ObjectKind| -> Vec<usize> {
            self.objects
                .iter()
                .enumerate()
                .filter(|(_, spec)| spec.kind == kind)
                .map(|(index, _)| index)
                .collect()
        };
        let perceivers = of_kind(ObjectKind::Perceiver);
        of_kind(ObjectKind::Source)
            .into_iter()
            .flat_map(|source| {
                perceivers
                    .iter()
                    .map(move |&perceiver| ProbeSpec { source, perceiver })
            })
            .collect()
    }
}

impl Engine {
    /// Builds an engine populated from `scenario`; ids follow `scenario.objects` order.
    pub fn from_scenario(scenario: &Scenario) -> EngineResult<(Engine, Vec<ObjectId>)> {
        scenario.validate()?;
        let mut engine = Engine::new(scenario.engine.clone())?;
        let mut ids = Vec::with_capacity(scenario.objects.len());

        for spec in &scenario.objects {
            let id = engine.create_object(spec.kind).id();
            if let Some(position) = spec.position {
                engine.set_position(id, position)?;
            }
            engine.set_velocity(id, spec.velocity)?;
            engine.set_acceleration(id, spec.acceleration)?;
            if let Some(frequency) = spec.frequency {
                if spec.kind == ObjectKind::Source {
                    engine.set_frequency(id, frequency)?;
                }
            }
            ids.push(id);
        }
        Ok((engine, ids))
    }

    /// Captures the current objects as a scenario that starts from this state.
    pub fn to_scenario(&self, duration_s: f64, frame_dt_s: f64) -> Scenario {
        let objects = self
            .objects()
            .iter()
            .map(|object| ObjectSpec {
                kind: object.kind(),
                position: Some(object.position()),
                velocity: object.velocity(),
                acceleration: object.acceleration(),
                frequency: object.is_source().then(|| object.frequency()),
            })
            .collect();

        Scenario {
            name: None,
            engine: self.config().clone(),
            duration_s,
            frame_dt_s,
            objects,
            probes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> Scenario {
        let mut source = ObjectSpec::new(ObjectKind::Source);
        source.position = Some(Vec2::new(100.0, 100.0));
        source.velocity = Vec2::new(20.0, 0.0);
        source.frequency = Some(2.0);
        let mut perceiver = ObjectSpec::new(ObjectKind::Perceiver);
        perceiver.position = Some(Vec2::new(150.0, 100.0));
        Scenario {
            objects: vec![source, perceiver],
            ..Default::default()
        }
    }

    #[test]
    fn engine_from_scenario_applies_specs() {
        let (engine, ids) = Engine::from_scenario(&pair()).unwrap();
        assert_eq!(ids.len(), 2);
        let source = engine.object(ids[0]).unwrap();
        assert_eq!(source.frequency(), 2.0);
        assert_eq!(source.velocity(), Vec2::new(20.0, 0.0));
        assert_eq!(
            engine.object(ids[1]).unwrap().position(),
            Vec2::new(150.0, 100.0)
        );
    }

    #[test]
    fn capture_preserves_objects() {
        let (engine, _) = Engine::from_scenario(&pair()).unwrap();
        let captured = engine.to_scenario(5.0, 0.1);
        assert_eq!(captured.objects.len(), 2);
        assert_eq!(captured.objects[0].kind, ObjectKind::Source);
        assert_eq!(captured.objects[0].frequency, Some(2.0));
        assert_eq!(captured.objects[1].frequency, None);
        assert_eq!(captured.frame_count(), 50);
    }

    #[test]
    fn probes_must_pair_source_with_perceiver() {
        let mut scenario = pair();
        scenario.probes = vec![ProbeSpec {
            source: 1,
            perceiver: 0,
        }];
        assert!(scenario.validate().is_err());
        scenario.probes = vec![ProbeSpec {
            source: 0,
            perceiver: 7,
        }];
        assert!(Engine::from_scenario(&scenario).is_err());
    }

    #[test]
    fn implicit_probes_cover_every_pair() {
        let mut scenario = pair();
        scenario.objects.push(ObjectSpec::new(ObjectKind::Perceiver));
        let probes = scenario.effective_probes();
        assert_eq!(
            probes,
            vec![
                ProbeSpec {
                    source: 0,
                    perceiver: 1
                },
                ProbeSpec {
                    source: 0,
                    perceiver: 2
                },
            ]
        );
    }

    #[test]
    fn oversized_runs_are_rejected() {
        let mut scenario = pair();
        scenario.duration_s = 1.0e9;
        assert!(matches!(
            scenario.validate(),
            Err(EngineError::InvalidInput(_))
        ));
        assert!(Engine::from_scenario(&scenario).is_err());

        let mut crowded = pair();
        crowded.objects = vec![ObjectSpec::new(ObjectKind::Perceiver); MAX_OBJECTS + 1];
        assert!(crowded.validate().is_err());

        let mut longest = pair();
        longest.frame_dt_s = 0.5;
        longest.duration_s = 0.5 * MAX_FRAMES as f64;
        assert!(longest.validate().is_ok());
    }

    #[test]
    fn frame_count_covers_duration() {
        let scenario = Scenario {
            duration_s: 1.5,
            ..Default::default()
        };
        assert_eq!(scenario.frame_count(), 90);
    }
}
