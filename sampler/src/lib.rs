//! Pass-through video filter that periodically exports frames as JPEG stills.

pub mod export;
pub mod filter;
pub mod source;

pub use export::{ExportError, ExportOutcome, ExportRequest};
pub use filter::{ExportStats, FrameSampler, FrameSink};
