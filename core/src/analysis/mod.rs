pub mod probe;

pub use probe::{PerceptionProbe, ProbeSummary};
