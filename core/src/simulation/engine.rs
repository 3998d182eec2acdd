use crate::interface::{EngineSnapshot, ObjectSnapshot, PerceptionRecord, WavefrontSnapshot};
use crate::math::Vec2;
use crate::prelude::{EngineConfig, EngineError, EngineResult, ObjectId, ObjectKind};
use crate::simulation::doppler::DopplerModel;
use crate::simulation::object::MovableObject;
use crate::telemetry::{EngineMetrics, LogManager, MetricsRecorder};

/// Kinematics and perception engine.
///
/// Owns every movable object and its wavefronts. Drivers call [`Engine::step`]
/// (or [`Engine::advance`] followed by [`Engine::prune_wavefronts`]) once per
/// frame and read state back through [`Engine::snapshot`].
pub struct Engine {
    config: EngineConfig,
    objects: Vec<MovableObject>,
    next_id: u64,
    now: f64,
    last_timestamp: Option<f64>,
    logger: LogManager,
    metrics: MetricsRecorder,
}

impl Engine {
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        validate_config(&config)?;
        Ok(Self::build(config))
    }

    fn build(config: EngineConfig) -> Self {
        Self {
            config,
            objects: Vec::new(),
            next_id: 1,
            now: 0.0,
            last_timestamp: None,
            logger: LogManager::new("engine"),
            metrics: MetricsRecorder::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Simulated seconds elapsed since creation or the last [`Engine::clear`].
    pub fn time(&self) -> f64 {
        self.now
    }

    pub fn metrics(&self) -> EngineMetrics {
        self.metrics.snapshot()
    }

    /// Objects in creation order.
    pub fn objects(&self) -> &[MovableObject] {
        &self.objects
    }

    pub fn object(&self, id: ObjectId) -> Option<&MovableObject> {
        self.objects.iter().find(|object| object.id() == id)
    }

    pub fn sources(&self) -> impl Iterator<Item = &MovableObject> {
        self.objects.iter().filter(|object| object.is_source())
    }

    pub fn perceivers(&self) -> impl Iterator<Item = &MovableObject> {
        self.objects.iter().filter(|object| !object.is_source())
    }

    /// Adds an object at the viewport center with zero motion.
    pub fn create_object(&mut self, kind: ObjectKind) -> &MovableObject {
        let id = ObjectId(self.next_id);
        self.next_id += 1;

        let (cx, cy) = self.config.viewport_center();
        let frequency = match kind {
            ObjectKind::Source => self.config.default_frequency.max(0.0),
            ObjectKind::Perceiver => 0.0,
        };
        self.logger.record(&format!("created {} {}", kind, id));

        let index = self.objects.len();
        self.objects
            .push(MovableObject::new(id, kind, Vec2::new(cx, cy), frequency));
        &self.objects[index]
    }

    /// Removes an object together with its wavefronts.
    pub fn delete_object(&mut self, id: ObjectId) -> EngineResult<MovableObject> {
        let index = self
            .objects
            .iter()
            .position(|object| object.id() == id)
            .ok_or(EngineError::UnknownObject(id))?;
        let removed = self.objects.remove(index);
        self.logger.record(&format!(
            "deleted {} {} ({} wavefronts discarded)",
            removed.kind(),
            id,
            removed.wavefronts().len()
        ));
        Ok(removed)
    }

    /// Removes every object and rewinds the clock.
    pub fn clear(&mut self) {
        self.objects.clear();
        self.now = 0.0;
        self.last_timestamp = None;
        self.metrics.reset();
        self.logger.record("cleared all objects");
    }

    pub fn set_position(&mut self, id: ObjectId, position: Vec2) -> EngineResult<()> {
        self.check_vector("position", position)?;
        self.object_mut(id)?.set_position(position);
        Ok(())
    }

    pub fn set_velocity(&mut self, id: ObjectId, velocity: Vec2) -> EngineResult<()> {
        self.check_vector("velocity", velocity)?;
        self.object_mut(id)?.set_velocity(velocity);
        Ok(())
    }

    /// Sets velocity from a speed and a heading in degrees (0° = +x).
    pub fn set_velocity_polar(
        &mut self,
        id: ObjectId,
        speed: f64,
        direction_deg: f64,
    ) -> EngineResult<()> {
        self.set_velocity(id, Vec2::from_polar(speed, direction_deg))
    }

    pub fn set_acceleration(&mut self, id: ObjectId, acceleration: Vec2) -> EngineResult<()> {
        self.check_vector("acceleration", acceleration)?;
        self.object_mut(id)?.set_acceleration(acceleration);
        Ok(())
    }

    /// Sets a frequency clamped into `[0, max_frequency]`; returns the applied value.
    pub fn set_frequency(&mut self, id: ObjectId, frequency: f64) -> EngineResult<f64> {
        if !frequency.is_finite() {
            self.metrics.record_rejected();
            return Err(EngineError::InvalidInput(format!(
                "frequency must be finite, got {}",
                frequency
            )));
        }

        let applied = frequency.clamp(0.0, self.config.max_frequency);
        if applied != frequency {
            self.logger.warn(&format!(
                "frequency {} for {} clamped to {}",
                frequency, id, applied
            ));
        }
        self.object_mut(id)?.set_frequency(applied);
        Ok(applied)
    }

    /// Integrates every object by `dt` seconds and emits due wavefronts.
    /// Returns the number of wavefronts emitted.
    pub fn advance(&mut self, dt: f64) -> EngineResult<usize> {
        if !dt.is_finite() || dt < 0.0 {
            self.metrics.record_rejected();
            return Err(EngineError::InvalidInput(format!(
                "delta time must be a non-negative number of seconds, got {}",
                dt
            )));
        }

        self.now += dt;
        let now = self.now;
        let cap = self.config.max_wavefronts_per_source;

        let mut emitted = 0;
        for object in &mut self.objects {
            object.integrate(dt);
            emitted += object.try_emit(now, cap);
        }

        self.metrics.record_frame();
        self.metrics.record_emitted(emitted);
        if emitted > 0 {
            self.logger
                .trace_frame(&format!("t={:.3}s emitted {} wavefronts", now, emitted));
        }
        Ok(emitted)
    }

    /// Advances by the time elapsed since the previous timestamp.
    ///
    /// The first call only records the timestamp. A timestamp that goes
    /// backwards counts as zero elapsed. Returns the delta applied.
    pub fn tick(&mut self, timestamp: f64) -> EngineResult<f64> {
        if !timestamp.is_finite() {
            self.metrics.record_rejected();
            return Err(EngineError::InvalidInput(format!(
                "frame timestamp must be finite, got {}",
                timestamp
            )));
        }

        let dt = match self.last_timestamp {
            Some(previous) => (timestamp - previous).max(0.0),
            None => 0.0,
        };
        self.last_timestamp = Some(match self.last_timestamp {
            Some(previous) => previous.max(timestamp),
            None => timestamp,
        });
        self.advance(dt)?;
        Ok(dt)
    }

    /// Forgets the last frame timestamp so the next [`Engine::tick`] counts as
    /// zero elapsed. Used when a driver pauses its frame clock.
    pub fn resync_clock(&mut self) {
        self.last_timestamp = None;
    }

    /// Removes wavefronts that have grown past the visibility bound.
    pub fn prune_wavefronts(&mut self) -> usize {
        let bound = self.config.visibility_bound();
        let speed = self.config.propagation_speed;
        let now = self.now;

        let pruned: usize = self
            .objects
            .iter_mut()
            .map(|object| object.prune(now, speed, bound))
            .sum();
        self.metrics.record_pruned(pruned);
        pruned
    }

    /// One full frame: advance then prune.
    pub fn step(&mut self, dt: f64) -> EngineResult<()> {
        self.advance(dt)?;
        self.prune_wavefronts();
        Ok(())
    }

    pub fn perceived_frequency(&self, source: ObjectId, perceiver: ObjectId) -> EngineResult<f64> {
        let source = self.object(source).ok_or(EngineError::UnknownObject(source))?;
        let perceiver = self
            .object(perceiver)
            .ok_or(EngineError::UnknownObject(perceiver))?;
        Ok(DopplerModel::from_config(&self.config).perceived(source, perceiver))
    }

    /// Perceived frequency from every source at one perceiver.
    pub fn perceptions(&self, perceiver: ObjectId) -> EngineResult<Vec<PerceptionRecord>> {
        let target = self
            .object(perceiver)
            .ok_or(EngineError::UnknownObject(perceiver))?;
        let model = DopplerModel::from_config(&self.config);
        Ok(self
            .sources()
            .filter(|source| source.id() != perceiver)
            .map(|source| PerceptionRecord {
                source: source.id(),
                perceiver,
                frequency: model.perceived(source, target),
            })
            .collect())
    }

    /// Topmost object within `radius` of `point`; later objects win ties.
    pub fn object_at(&self, point: Vec2, radius: f64) -> Option<ObjectId> {
        self.objects
            .iter()
            .rev()
            .find(|object| object.position().distance(point) <= radius)
            .map(|object| object.id())
    }

    /// Read-only copy of the current state for renderers and reporters.
    pub fn snapshot(&self) -> EngineSnapshot {
        let speed = self.config.propagation_speed;
        let model = DopplerModel::from_config(&self.config);

        let objects = self
            .objects
            .iter()
            .map(|object| ObjectSnapshot {
                id: object.id(),
                kind: object.kind(),
                position: object.position(),
                velocity: object.velocity(),
                acceleration: object.acceleration(),
                speed: object.speed(),
                frequency: object.frequency(),
                wavefronts: object
                    .wavefronts()
                    .iter()
                    .map(|wave| WavefrontSnapshot {
                        origin: wave.origin,
                        created_at: wave.created_at,
                        radius: wave.radius(self.now, speed),
                    })
                    .collect(),
            })
            .collect();

        let perceptions = self
            .perceivers()
            .flat_map(|perceiver| {
                self.sources().map(move |source| PerceptionRecord {
                    source: source.id(),
                    perceiver: perceiver.id(),
                    frequency: model.perceived(source, perceiver),
                })
            })
            .collect();

        EngineSnapshot {
            time: self.now,
            visibility_bound: self.config.visibility_bound(),
            objects,
            perceptions,
        }
    }

    fn object_mut(&mut self, id: ObjectId) -> EngineResult<&mut MovableObject> {
        self.objects
            .iter_mut()
            .find(|object| object.id() == id)
            .ok_or(EngineError::UnknownObject(id))
    }

    fn check_vector(&self, name: &str, value: Vec2) -> EngineResult<()> {
        if value.is_finite() {
            Ok(())
        } else {
            self.metrics.record_rejected();
            Err(EngineError::InvalidInput(format!(
                "{} must be finite, got ({}, {})",
                name, value.x, value.y
            )))
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::build(EngineConfig::default())
    }
}

fn validate_config(config: &EngineConfig) -> EngineResult<()> {
    if !config.propagation_speed.is_finite() || config.propagation_speed <= 0.0 {
        return Err(EngineError::InvalidInput(
            "propagation_speed must be positive".into(),
        ));
    }
    if !config.visibility_bound().is_finite() || config.visibility_bound() <= 0.0 {
        return Err(EngineError::InvalidInput(
            "visibility bound must be positive".into(),
        ));
    }
    if !config.max_frequency.is_finite() || config.max_frequency < 0.0 {
        return Err(EngineError::InvalidInput(
            "max_frequency must be non-negative".into(),
        ));
    }
    if !config.min_doppler_denominator.is_finite() || config.min_doppler_denominator <= 0.0 {
        return Err(EngineError::InvalidInput(
            "min_doppler_denominator must be positive".into(),
        ));
    }
    let required = config.required_wavefront_capacity();
    if config.max_wavefronts_per_source < required {
        return Err(EngineError::InvalidInput(format!(
            "max_wavefronts_per_source {} is below the {} wavefronts a {} Hz source keeps within {} units",
            config.max_wavefronts_per_source,
            required,
            config.max_frequency,
            config.visibility_bound()
        )));
    }
    Ok(())
}
