pub mod convert;
pub mod encoder;
pub mod keys;

use frame_sampler_common::frame::{Frame, PixelFormat};
use std::path::{Path, PathBuf};

/// One pending export: the frame to encode and where its image goes.
/// Built right before the encoder is invoked and dropped right after.
#[derive(Debug)]
pub struct ExportRequest<'a> {
    pub frame: &'a Frame,
    pub path: PathBuf,
}

impl<'a> ExportRequest<'a> {
    pub fn new(frame: &'a Frame, path: impl Into<PathBuf>) -> Self {
        Self {
            frame,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// What a successful export attempt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written { path: PathBuf, bytes: usize },
    /// The encoder had no output for this submission. Nothing was written.
    NotReady,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("still-image encoder unavailable: {0}")]
    EncoderUnavailable(String),
    #[error("pixel format {0} cannot be converted for still-image export")]
    UnsupportedPixelFormat(PixelFormat),
    #[error("failed to configure encoder: {0}")]
    Configure(String),
    #[error("failed to submit frame to encoder: {0}")]
    Submit(String),
    #[error("failed to encode frame: {0}")]
    Encode(String),
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    /// Export step that failed, for log fields.
    pub fn stage(&self) -> &'static str {
        match self {
            ExportError::EncoderUnavailable(_) => "acquire",
            ExportError::UnsupportedPixelFormat(_) => "convert",
            ExportError::Configure(_) => "configure",
            ExportError::Submit(_) => "submit",
            ExportError::Encode(_) => "encode",
            ExportError::Io { .. } => "write",
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
