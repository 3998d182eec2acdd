pub mod doppler;
pub mod engine;
pub mod interaction;
pub mod object;

pub use doppler::DopplerModel;
pub use engine::Engine;
pub use interaction::{PointerState, PICK_RADIUS};
pub use object::{MovableObject, Wavefront};
