use frame_sampler_common::config::{ConfigError, SamplerConfig, Schedule};
use frame_sampler_common::frame::Frame;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::traits::FrameSink;
use crate::export::convert::to_encoder_image;
use crate::export::encoder::{EncoderFactory, EncoderParams, JpegEncoderFactory, StillEncoder};
use crate::export::keys::export_path;
use crate::export::{ExportError, ExportOutcome, ExportRequest};

/// Running totals for one sampler instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Frames passed through `process`.
    pub frames: u64,
    /// Export attempts (qualifying frames).
    pub attempted: u64,
    pub written: u64,
    pub not_ready: u64,
    /// Attempts that could not get an encoder.
    pub unavailable: u64,
    /// Attempts that failed after an encoder was acquired.
    pub failed: u64,
}

/// Pass-through video filter that exports every Nth frame as a still image.
///
/// Every frame handed to [`FrameSampler::process`] comes back unchanged.
/// Frames whose schedule index is a multiple of the interval are also
/// encoded and written to `<output_dir>/<prefix>-<index:06>.jpg`. Export
/// problems are logged and counted, never returned.
pub struct FrameSampler<F: EncoderFactory = JpegEncoderFactory> {
    interval: u64,
    schedule: Schedule,
    quality: u8,
    output_dir: PathBuf,
    filename_prefix: String,
    encoders: F,
    /// Frames seen so far, the index for `Schedule::Arrival`.
    arrivals: u64,
    stats: ExportStats,
    /// Set after the first "encoder unavailable" warning of an outage.
    unavailable_reported: bool,
}

impl FrameSampler<JpegEncoderFactory> {
    pub fn jpeg(config: SamplerConfig) -> Result<Self, ConfigError> {
        Self::new(config, JpegEncoderFactory)
    }
}

impl<F: EncoderFactory> FrameSampler<F> {
    pub fn new(config: SamplerConfig, encoders: F) -> Result<Self, ConfigError> {
        config.validate()?;
        let output_dir = config.resolve_output_dir()?;

        info!(
            interval = config.interval,
            schedule = ?config.schedule,
            quality = config.quality,
            encoder = encoders.name(),
            output_dir = output_dir.display().to_string(),
            "frame sampler initialized"
        );

        Ok(Self {
            // validate() bounds this to 1..=i32::MAX
            interval: config.interval as u64,
            schedule: config.schedule,
            quality: config.quality,
            output_dir,
            filename_prefix: config.filename_prefix,
            encoders,
            arrivals: 0,
            stats: ExportStats::default(),
            unavailable_reported: false,
        })
    }

    /// Run one frame through the filter and hand it back for forwarding.
    pub fn process(&mut self, frame: Frame) -> Frame {
        let index = self.schedule_index(&frame);
        self.arrivals += 1;
        self.stats.frames += 1;

        if !self.should_export(index) {
            debug!(seq = frame.seq(), index, "frame passed through");
            return frame;
        }

        let request = self.export_request(&frame, index);
        match self.export(&request) {
            Ok(ExportOutcome::Written { path, bytes }) => {
                info!(
                    seq = frame.seq(),
                    path = path.display().to_string(),
                    bytes,
                    "wrote sampled frame"
                );
            }
            Ok(ExportOutcome::NotReady) => {
                debug!(
                    seq = frame.seq(),
                    "encoder has no output for this frame, nothing written"
                );
            }
            Err(e) => self.report_failure(&frame, &e),
        }
        frame
    }

    /// `process`, then forward the frame to exactly one downstream sink.
    /// Only the sink's own error is returned.
    pub fn filter_frame<S: FrameSink>(&mut self, frame: Frame, sink: &mut S) -> Result<(), S::Error> {
        let frame = self.process(frame);
        sink.push(frame)
    }

    /// Whether a frame at `index` is due for export.
    pub fn should_export(&self, index: u64) -> bool {
        index % self.interval == 0
    }

    /// The number the interval is applied to for `frame`, given the frames
    /// seen so far.
    pub fn schedule_index(&self, frame: &Frame) -> u64 {
        match self.schedule {
            Schedule::Sequence => frame.seq(),
            Schedule::Arrival => self.arrivals,
        }
    }

    pub fn export_request<'a>(&self, frame: &'a Frame, index: u64) -> ExportRequest<'a> {
        ExportRequest::new(
            frame,
            export_path(&self.output_dir, &self.filename_prefix, index),
        )
    }

    /// Encode the request's frame and write it out, counting the result.
    pub fn export(&mut self, request: &ExportRequest<'_>) -> Result<ExportOutcome, ExportError> {
        self.stats.attempted += 1;
        let result = self.encode_and_write(request);
        match &result {
            Ok(ExportOutcome::Written { .. }) => self.stats.written += 1,
            Ok(ExportOutcome::NotReady) => self.stats.not_ready += 1,
            Err(ExportError::EncoderUnavailable(_)) => self.stats.unavailable += 1,
            Err(_) => self.stats.failed += 1,
        }
        result
    }

    fn encode_and_write(&mut self, request: &ExportRequest<'_>) -> Result<ExportOutcome, ExportError> {
        // Released on drop, whichever way this function returns.
        let mut encoder = self.encoders.acquire()?;
        if self.unavailable_reported {
            info!(encoder = self.encoders.name(), "still-image encoder available again");
            self.unavailable_reported = false;
        }

        let image = to_encoder_image(request.frame)?;
        let (width, height) = image.dimensions();
        encoder.configure(&EncoderParams {
            width,
            height,
            input: image.input(),
            quality: self.quality,
        })?;
        encoder.submit(&image)?;

        let Some(bytes) = encoder.receive()? else {
            return Ok(ExportOutcome::NotReady);
        };
        drop(encoder);

        write_image(request.path(), &bytes)?;
        Ok(ExportOutcome::Written {
            path: request.path.clone(),
            bytes: bytes.len(),
        })
    }

    fn report_failure(&mut self, frame: &Frame, error: &ExportError) {
        match error {
            ExportError::EncoderUnavailable(_) if self.unavailable_reported => {
                debug!(seq = frame.seq(), error = %error, "export skipped, encoder still unavailable");
            }
            ExportError::EncoderUnavailable(_) => {
                warn!(
                    seq = frame.seq(),
                    encoder = self.encoders.name(),
                    error = %error,
                    "still-image encoder unavailable, skipping exports until it recovers"
                );
                self.unavailable_reported = true;
            }
            _ => {
                warn!(
                    seq = frame.seq(),
                    stage = error.stage(),
                    format = %frame.format(),
                    error = %error,
                    "frame export failed, frame passed through"
                );
            }
        }
    }

    pub fn stats(&self) -> ExportStats {
        self.stats
    }

    pub fn interval(&self) -> u64 {
        self.interval
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// Write through a temp file in the same directory so a failed write never
/// leaves a partial image under the export name.
fn write_image(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".dumpframe-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| ExportError::io(path, e))?;
    tmp.write_all(bytes).map_err(|e| ExportError::io(path, e))?;
    tmp.as_file().sync_all().map_err(|e| ExportError::io(path, e))?;
    tmp.persist(path).map_err(|e| ExportError::io(path, e.error))?;
    Ok(())
}
