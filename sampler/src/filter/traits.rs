use frame_sampler_common::frame::Frame;
use std::convert::Infallible;

/// Downstream consumer of forwarded frames (the next pipeline stage).
pub trait FrameSink {
    type Error;

    /// Take ownership of a forwarded frame. Errors belong to the sink and are
    /// passed back to the caller untouched.
    fn push(&mut self, frame: Frame) -> Result<(), Self::Error>;
}

impl FrameSink for Vec<Frame> {
    type Error = Infallible;

    fn push(&mut self, frame: Frame) -> Result<(), Infallible> {
        Vec::push(self, frame);
        Ok(())
    }
}
