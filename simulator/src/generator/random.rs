use anyhow::bail;
use dopplercore::interface::{ObjectSpec, Scenario, MAX_OBJECTS};
use dopplercore::math::Vec2;
use dopplercore::{EngineConfig, ObjectKind};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Configuration for generating reproducible random scenarios.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub objects: usize,
    /// Number of sources; defaults to half of `objects`.
    pub sources: Option<usize>,
    pub seed: u64,
    pub max_speed: f64,
    pub max_acceleration: f64,
    pub min_frequency: f64,
    pub max_frequency: f64,
    pub duration_s: f64,
    pub frame_dt_s: f64,
    pub engine: EngineConfig,
    pub name: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            objects: 4,
            sources: None,
            seed: 0,
            max_speed: 120.0,
            max_acceleration: 0.0,
            min_frequency: 0.5,
            max_frequency: 4.0,
            duration_s: 10.0,
            frame_dt_s: 1.0 / 60.0,
            engine: EngineConfig::default(),
            name: None,
        }
    }
}

impl GeneratorConfig {
    fn source_count(&self) -> usize {
        self.sources
            .unwrap_or(self.objects / 2)
            .clamp(1, self.objects.saturating_sub(1).max(1))
    }
}

fn random_vector(rng: &mut StdRng, max_magnitude: f64) -> Vec2 {
    if max_magnitude <= 0.0 {
        return Vec2::ZERO;
    }
    let magnitude = rng.gen_range(0.0..=max_magnitude);
    let heading = rng.gen_range(0.0..360.0);
    Vec2::from_polar(magnitude, heading)
}

pub fn build_scenario(config: &GeneratorConfig) -> anyhow::Result<Scenario> {
    if config.objects < 2 {
        bail!(
            "a random scenario needs at least two objects, got {}",
            config.objects
        );
    }
    if config.objects > MAX_OBJECTS {
        bail!(
            "a random scenario holds at most {} objects, got {}",
            MAX_OBJECTS,
            config.objects
        );
    }
    if !(config.min_frequency >= 0.0 && config.min_frequency <= config.max_frequency) {
        bail!(
            "frequency range {}..{} is empty",
            config.min_frequency,
            config.max_frequency
        );
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let sources = config.source_count();
    let width = config.engine.viewport_width.max(1.0);
    let height = config.engine.viewport_height.max(1.0);

    let objects = (0..config.objects)
        .map(|index| {
            let kind = if index < sources {
                ObjectKind::Source
            } else {
                ObjectKind::Perceiver
            };
            let mut spec = ObjectSpec::new(kind);
            spec.position = Some(Vec2::new(
                rng.gen_range(0.0..=width),
                rng.gen_range(0.0..=height),
            ));
            spec.velocity = random_vector(&mut rng, config.max_speed);
            spec.acceleration = random_vector(&mut rng, config.max_acceleration);
            if kind == ObjectKind::Source {
                spec.frequency =
                    Some(rng.gen_range(config.min_frequency..=config.max_frequency));
            }
            spec
        })
        .collect();

    Ok(Scenario {
        name: config
            .name
            .clone()
            .or_else(|| Some(format!("random-{}", config.seed))),
        engine: config.engine.clone(),
        duration_s: config.duration_s,
        frame_dt_s: config.frame_dt_s,
        objects,
        probes: Vec::new(),
    })
}
