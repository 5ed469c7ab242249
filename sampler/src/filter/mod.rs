pub mod sampler;
pub mod traits;

pub use sampler::{ExportStats, FrameSampler};
pub use traits::FrameSink;
