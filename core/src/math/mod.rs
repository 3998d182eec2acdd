pub mod fft;
pub mod stats;
pub mod vector;

pub use fft::FftHelper;
pub use stats::StatsHelper;
pub use vector::Vec2;
