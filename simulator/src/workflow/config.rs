use anyhow::Context;
use dopplercore::interface::{ObjectSpec, ProbeSpec, Scenario};
use dopplercore::math::Vec2;
use dopplercore::{EngineConfig, ObjectKind};
use std::fs;
use std::path::Path;

/// Spacing between the source and perceiver of the built-in scenario.
pub const DEFAULT_SEPARATION: f64 = 50.0;

pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Scenario> {
    let path_ref = path.as_ref();
    let contents = fs::read_to_string(path_ref)
        .with_context(|| format!("reading scenario {}", path_ref.display()))?;
    let scenario: Scenario = serde_yaml::from_str(&contents)
        .with_context(|| format!("parsing scenario {}", path_ref.display()))?;
    scenario
        .validate()
        .with_context(|| format!("validating scenario {}", path_ref.display()))?;
    Ok(scenario)
}

/// One stationary source and one perceiver to its right, both at rest.
pub fn from_args(duration_s: f64, frame_dt_s: f64, propagation_speed: f64) -> Scenario {
    let engine = EngineConfig {
        propagation_speed,
        ..Default::default()
    };
    let (cx, cy) = engine.viewport_center();

    let mut source = ObjectSpec::new(ObjectKind::Source);
    source.position = Some(Vec2::new(cx, cy));
    let mut perceiver = ObjectSpec::new(ObjectKind::Perceiver);
    perceiver.position = Some(Vec2::new(cx + DEFAULT_SEPARATION, cy));

    Scenario {
        name: Some("stationary pair".into()),
        engine,
        duration_s,
        frame_dt_s,
        objects: vec![source, perceiver],
        probes: vec![ProbeSpec {
            source: 0,
            perceiver: 1,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn from_args_builds_valid_pair() {
        let scenario = from_args(1.5, 0.02, 340.0);
        assert!(scenario.validate().is_ok());
        assert_eq!(scenario.engine.propagation_speed, 340.0);
        assert_eq!(scenario.frame_count(), 75);
    }

    #[test]
    fn load_reads_yaml() {
        let mut temp = NamedTempFile::new().unwrap();
        let yaml = "name: convoy
engine:
  propagation_speed: 300.0
  max_distance: 900.0
duration_s: 2.0
objects:
  - kind: source
    position: {x: 0.0, y: 0.0}
    velocity: {x: 40.0, y: 0.0}
    frequency: 3.0
  - kind: perceiver
    position: {x: 200.0, y: 0.0}
";
        temp.write_all(yaml.as_bytes()).unwrap();
        let path = temp.into_temp_path();
        let scenario = load(&path).unwrap();
        assert_eq!(scenario.name.as_deref(), Some("convoy"));
        assert_eq!(scenario.engine.propagation_speed, 300.0);
        assert_eq!(scenario.engine.default_frequency, 1.0);
        assert_eq!(scenario.objects.len(), 2);
        assert_eq!(scenario.objects[0].frequency, Some(3.0));
        assert_eq!(scenario.objects[1].kind, ObjectKind::Perceiver);
    }

    #[test]
    fn load_rejects_invalid_probe() {
        let mut temp = NamedTempFile::new().unwrap();
        temp.write_all(
            b"objects:\n  - kind: perceiver\nprobes:\n  - {source: 0, perceiver: 0}\n",
        )
        .unwrap();
        let path = temp.into_temp_path();
        assert!(load(&path).is_err());
    }

    #[test]
    fn bundled_scenario_round_trips_through_engine() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("scenarios")
            .join("passing_siren.yaml");
        let scenario = load(&path).unwrap();
        assert_eq!(scenario.probes.len(), 2);

        let (engine, ids) = dopplercore::Engine::from_scenario(&scenario).unwrap();
        assert_eq!(ids.len(), 3);
        let captured = engine.to_scenario(scenario.duration_s, scenario.frame_dt_s);
        let kinds: Vec<ObjectKind> = captured.objects.iter().map(|spec| spec.kind).collect();
        assert_eq!(
            kinds,
            vec![ObjectKind::Source, ObjectKind::Perceiver, ObjectKind::Perceiver]
        );
        assert_eq!(captured.objects[0].frequency, Some(3.0));
    }
}
