//! Kinematics and Doppler perception engine for the Doppler workbench.
//!
//! Sources emit wavefronts that expand at a fixed propagation speed while the
//! engine integrates every object's motion; perceivers query the frequency
//! they hear through a classical Doppler ratio. Rendering lives elsewhere and
//! consumes read-only [`interface::EngineSnapshot`] values.

pub mod analysis;
pub mod interface;
pub mod math;
pub mod prelude;
pub mod simulation;
pub mod telemetry;

pub use prelude::{EngineConfig, EngineError, EngineResult, FrameObserver, ObjectId, ObjectKind};
pub use simulation::Engine;
