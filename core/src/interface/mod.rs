pub mod scenario;
pub mod snapshot;

pub use scenario::{ObjectSpec, ProbeSpec, Scenario, MAX_FRAMES, MAX_OBJECTS};
pub use snapshot::{EngineSnapshot, ObjectSnapshot, PerceptionRecord, WavefrontSnapshot};
