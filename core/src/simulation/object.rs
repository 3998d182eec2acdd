use crate::math::Vec2;
use crate::prelude::{ObjectId, ObjectKind};
use std::collections::VecDeque;

/// Slack on due-time comparisons so accumulated frame deltas land on the period.
const EMISSION_TOLERANCE: f64 = 1e-9;

/// A circle emitted by a source; its radius is derived from the engine clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wavefront {
    pub source: ObjectId,
    pub created_at: f64,
    /// Source position at the moment of emission.
    pub origin: Vec2,
}

impl Wavefront {
    pub fn radius(&self, now: f64, propagation_speed: f64) -> f64 {
        (now - self.created_at).max(0.0) * propagation_speed
    }
}

/// Point object tracked by the engine: either a wave source or a perceiver.
#[derive(Debug, Clone)]
pub struct MovableObject {
    id: ObjectId,
    kind: ObjectKind,
    position: Vec2,
    velocity: Vec2,
    acceleration: Vec2,
    frequency: f64,
    wavefronts: VecDeque<Wavefront>,
    last_emission: Option<f64>,
    retuned: bool,
}

impl MovableObject {
    pub(crate) fn new(id: ObjectId, kind: ObjectKind, position: Vec2, frequency: f64) -> Self {
        Self {
            id,
            kind,
            position,
            velocity: Vec2::ZERO,
            acceleration: Vec2::ZERO,
            frequency,
            wavefronts: VecDeque::new(),
            last_emission: None,
            retuned: false,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn is_source(&self) -> bool {
        self.kind == ObjectKind::Source
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn acceleration(&self) -> Vec2 {
        self.acceleration
    }

    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    /// Emitted wavefronts, oldest first.
    pub fn wavefronts(&self) -> &VecDeque<Wavefront> {
        &self.wavefronts
    }

    pub fn last_emission(&self) -> Option<f64> {
        self.last_emission
    }

    pub(crate) fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub(crate) fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    pub(crate) fn set_acceleration(&mut self, acceleration: Vec2) {
        self.acceleration = acceleration;
    }

    pub(crate) fn set_frequency(&mut self, frequency: f64) {
        if frequency != self.frequency {
            self.retuned = true;
        }
        self.frequency = frequency;
    }

    /// Semi-implicit Euler: velocity first, then position with the new velocity.
    pub(crate) fn integrate(&mut self, dt: f64) {
        self.velocity += self.acceleration * dt;
        self.position += self.velocity * dt;
    }

    /// Emits every wavefront that fell due up to `now` and returns how many
    /// were appended.
    ///
    /// Due times follow the source period from the previous due time rather
    /// than from the frame that emitted it, so the count does not drift with
    /// the frame rate. At most `max_wavefronts` are emitted per call.
    pub(crate) fn try_emit(&mut self, now: f64, max_wavefronts: usize) -> usize {
        let retuned = std::mem::take(&mut self.retuned);
        if !self.is_source() || self.frequency <= 0.0 {
            return 0;
        }
        let period = 1.0 / self.frequency;

        let Some(mut last) = self.last_emission else {
            self.push_wavefront(now, now, max_wavefronts);
            self.last_emission = Some(now);
            return 1;
        };
        if retuned {
            // new period counts from the retune, not from the old schedule
            last = last.max(now - period);
        }

        let due = ((now - last + EMISSION_TOLERANCE) / period).floor().max(0.0) as usize;
        let skipped = due.saturating_sub(max_wavefronts.max(1));
        last += skipped as f64 * period;
        for _ in skipped..due {
            last += period;
            self.push_wavefront(last.min(now), now, max_wavefronts);
        }
        self.last_emission = Some(last);
        due - skipped
    }

    /// Appends a wavefront created at `created_at`, evicting the oldest past the cap.
    /// The origin is extrapolated back from the current position.
    fn push_wavefront(&mut self, created_at: f64, now: f64, max_wavefronts: usize) {
        while self.wavefronts.len() >= max_wavefronts.max(1) {
            self.wavefronts.pop_front();
        }
        self.wavefronts.push_back(Wavefront {
            source: self.id,
            created_at,
            origin: self.position - self.velocity * (now - created_at),
        });
    }

    /// Drops wavefronts whose radius exceeds `bound`. Returns how many were removed.
    pub(crate) fn prune(&mut self, now: f64, propagation_speed: f64, bound: f64) -> usize {
        let before = self.wavefronts.len();
        self.wavefronts
            .retain(|wave| wave.radius(now, propagation_speed) <= bound);
        before - self.wavefronts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAP: usize = 512;

    fn source(frequency: f64) -> MovableObject {
        MovableObject::new(ObjectId(1), ObjectKind::Source, Vec2::ZERO, frequency)
    }

    #[test]
    fn integrate_applies_velocity_after_acceleration() {
        let mut object = source(1.0);
        object.set_acceleration(Vec2::new(2.0, 0.0));
        object.integrate(0.5);
        assert_eq!(object.velocity(), Vec2::new(1.0, 0.0));
        assert_eq!(object.position(), Vec2::new(0.5, 0.0));
    }

    #[test]
    fn first_emission_is_immediate_then_spaced_by_period() {
        let mut object = source(2.0);
        assert_eq!(object.try_emit(0.0, CAP), 1);
        assert_eq!(object.try_emit(0.25, CAP), 0);
        assert_eq!(object.try_emit(0.5, CAP), 1);
        assert_eq!(object.wavefronts().len(), 2);
    }

    #[test]
    fn perceiver_and_silent_source_never_emit() {
        let mut perceiver = MovableObject::new(ObjectId(2), ObjectKind::Perceiver, Vec2::ZERO, 5.0);
        assert_eq!(perceiver.try_emit(0.0, CAP), 0);
        let mut silent = source(0.0);
        assert_eq!(silent.try_emit(10.0, CAP), 0);
    }

    #[test]
    fn cap_drops_oldest_wavefront() {
        let mut object = source(1.0);
        for step in 0..4 {
            object.try_emit(step as f64, 3);
        }
        let created: Vec<f64> = object.wavefronts().iter().map(|w| w.created_at).collect();
        assert_eq!(created, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn long_frame_emits_every_due_wavefront_at_its_due_time() {
        let mut object = source(5.0);
        object.set_velocity(Vec2::new(10.0, 0.0));
        assert_eq!(object.try_emit(1.0, CAP), 1);
        object.integrate(1.0);
        assert_eq!(object.try_emit(2.0, CAP), 5);

        let created: Vec<f64> = object.wavefronts().iter().map(|w| w.created_at).collect();
        for (actual, expected) in created.iter().zip([1.0, 1.2, 1.4, 1.6, 1.8, 2.0]) {
            assert!((actual - expected).abs() < 1e-9, "{:?}", created);
        }
        // origin trails the source back along its path
        let second = object.wavefronts()[1];
        assert!((second.origin.x - 2.0).abs() < 1e-9);
    }

    #[test]
    fn schedule_keeps_phase_across_uneven_frames() {
        let mut object = source(7.0);
        let mut now = 0.0;
        for _ in 0..600 {
            now += 1.0 / 60.0;
            object.try_emit(now, CAP);
        }
        // first emission at 1/60 s, then every 1/7 s
        assert_eq!(object.wavefronts().len(), 70);
    }

    #[test]
    fn huge_gap_emits_at_most_the_cap() {
        let mut object = source(50.0);
        object.try_emit(0.0, 8);
        assert_eq!(object.try_emit(1.0e6, 8), 8);
        assert_eq!(object.wavefronts().len(), 8);
        let newest = object.wavefronts().back().unwrap().created_at;
        assert!((newest - 1.0e6).abs() < 1e-3);
    }

    #[test]
    fn retune_restarts_the_schedule_instead_of_bursting() {
        let mut object = source(0.5);
        object.try_emit(0.0, CAP);
        object.set_frequency(50.0);
        // the old 2 s period never came due; one wavefront, not fifty
        assert_eq!(object.try_emit(1.0, CAP), 1);
        assert_eq!(object.try_emit(1.02 + 1e-12, CAP), 1);
    }

    #[test]
    fn wavefront_keeps_emission_origin() {
        let mut object = source(1.0);
        object.set_position(Vec2::new(4.0, 5.0));
        object.try_emit(0.0, CAP);
        object.set_position(Vec2::new(40.0, 50.0));
        assert_eq!(object.wavefronts()[0].origin, Vec2::new(4.0, 5.0));
    }
}
