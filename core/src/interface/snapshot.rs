use crate::math::Vec2;
use crate::prelude::{EngineError, EngineResult, ObjectId, ObjectKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WavefrontSnapshot {
    pub origin: Vec2,
    pub created_at: f64,
    pub radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectSnapshot {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub position: Vec2,
    pub velocity: Vec2,
    pub acceleration: Vec2,
    pub speed: f64,
    pub frequency: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wavefronts: Vec<WavefrontSnapshot>,
}

/// Frequency heard by one perceiver from one source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerceptionRecord {
    pub source: ObjectId,
    pub perceiver: ObjectId,
    pub frequency: f64,
}

/// Read-only copy of engine state handed to renderers once per frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSnapshot {
    pub time: f64,
    pub visibility_bound: f64,
    pub objects: Vec<ObjectSnapshot>,
    pub perceptions: Vec<PerceptionRecord>,
}

impl EngineSnapshot {
    pub fn object(&self, id: ObjectId) -> Option<&ObjectSnapshot> {
        self.objects.iter().find(|object| object.id == id)
    }

    pub fn perception(&self, source: ObjectId, perceiver: ObjectId) -> Option<f64> {
        self.perceptions
            .iter()
            .find(|record| record.source == source && record.perceiver == perceiver)
            .map(|record| record.frequency)
    }

    pub fn wavefront_count(&self) -> usize {
        self.objects.iter().map(|object| object.wavefronts.len()).sum()
    }

    pub fn to_json(&self) -> EngineResult<String> {
        serde_json::to_string(self)
            .map_err(|err| EngineError::Internal(format!("encoding snapshot: {}", err)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::Engine;

    #[test]
    fn snapshot_json_names_kinds_in_snake_case() {
        let mut engine = Engine::default();
        engine.create_object(ObjectKind::Source);
        engine.create_object(ObjectKind::Perceiver);
        engine.advance(0.1).unwrap();

        let json = engine.snapshot().to_json().unwrap();
        assert!(json.contains(r#""kind":"source""#));
        assert!(json.contains(r#""kind":"perceiver""#));
        assert!(json.contains("radius"));

        let decoded: EngineSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.wavefront_count(), 1);
        assert_eq!(decoded.perceptions.len(), 1);
    }
}
