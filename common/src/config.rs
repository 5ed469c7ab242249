use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::frame::PixelFormat;

/// Largest accepted sampling interval (the range of a C `int` option).
pub const MAX_INTERVAL: i64 = i32::MAX as i64;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sampler: SamplerConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which counter the sampling interval is applied to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Schedule {
    /// The sequence index carried by each frame.
    #[default]
    Sequence,
    /// Frames seen by this sampler instance, starting at 0. Ignores gaps
    /// left by frames dropped upstream.
    Arrival,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SamplerConfig {
    /// Export every `interval`th frame.
    #[serde(default = "default_interval")]
    pub interval: i64,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_filename_prefix")]
    pub filename_prefix: String,
    /// JPEG quality, 1..=100.
    #[serde(default = "default_quality")]
    pub quality: u8,
    #[serde(default)]
    pub schedule: Schedule,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            output_dir: default_output_dir(),
            filename_prefix: default_filename_prefix(),
            quality: default_quality(),
            schedule: Schedule::default(),
        }
    }
}

impl SamplerConfig {
    pub fn with_interval(interval: i64, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            interval,
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// Check every field that does not touch the filesystem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_INTERVAL).contains(&self.interval) {
            return Err(ConfigError::Invalid {
                field: "interval",
                reason: format!("must be in 1..={MAX_INTERVAL}, got {}", self.interval),
            });
        }
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::Invalid {
                field: "quality",
                reason: format!("must be in 1..=100, got {}", self.quality),
            });
        }
        if self.filename_prefix.is_empty()
            || self.filename_prefix.contains(['/', '\\'])
        {
            return Err(ConfigError::Invalid {
                field: "filename_prefix",
                reason: format!(
                    "must be a non-empty file name without separators, got {:?}",
                    self.filename_prefix
                ),
            });
        }
        Ok(())
    }

    /// Create the output directory if needed and make sure files can go there.
    pub fn resolve_output_dir(&self) -> Result<PathBuf, ConfigError> {
        let dir = &self.output_dir;
        let out_dir_err = |reason: String| ConfigError::OutputDir {
            path: dir.display().to_string(),
            reason,
        };

        std::fs::create_dir_all(dir).map_err(|e| out_dir_err(e.to_string()))?;
        let meta = std::fs::metadata(dir).map_err(|e| out_dir_err(e.to_string()))?;
        if !meta.is_dir() {
            return Err(out_dir_err("not a directory".into()));
        }
        // Removed again when dropped.
        tempfile::Builder::new()
            .prefix(".frame-sampler-")
            .tempfile_in(dir)
            .map_err(|e| out_dir_err(format!("directory is not writable: {e}")))?;

        let resolved = dir.canonicalize().map_err(|e| out_dir_err(e.to_string()))?;
        debug!(path = resolved.display().to_string(), "output directory ready");
        Ok(resolved)
    }
}

/// Synthetic upstream used by the driver binary.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default = "default_format")]
    pub format: PixelFormat,
    /// Number of frames to emit.
    #[serde(default = "default_frames")]
    pub frames: u64,
    #[serde(default)]
    pub start_seq: u64,
    /// Skip every Nth sequence index to mimic upstream drops. Values below 2 disable it.
    #[serde(default)]
    pub drop_every: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            format: default_format(),
            frames: default_frames(),
            start_seq: 0,
            drop_every: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.sampler.validate()?;
        Ok(config)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("unusable output directory {path}: {reason}")]
    OutputDir { path: String, reason: String },
}

// Default value functions
fn default_interval() -> i64 {
    2
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_filename_prefix() -> String {
    "dumpframe".into()
}
fn default_quality() -> u8 {
    75
}
fn default_width() -> u32 {
    320
}
fn default_height() -> u32 {
    240
}
fn default_format() -> PixelFormat {
    PixelFormat::Yuv420p
}
fn default_frames() -> u64 {
    10
}
fn default_log_level() -> String {
    "info".into()
}
