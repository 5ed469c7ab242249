use frame_sampler::source::TestPatternSource;
use frame_sampler::{FrameSampler, FrameSink};
use frame_sampler_common::config::Config;
use frame_sampler_common::frame::Frame;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

#[derive(Debug, thiserror::Error)]
enum SinkError {
    #[error("frame {got} arrived after {previous}")]
    OutOfOrder { previous: u64, got: u64 },
}

/// Last stage of the demo chain: checks ordering and counts what arrives.
#[derive(Default)]
struct CountingSink {
    forwarded: u64,
    last_seq: Option<u64>,
}

impl FrameSink for CountingSink {
    type Error = SinkError;

    fn push(&mut self, frame: Frame) -> Result<(), SinkError> {
        if let Some(previous) = self.last_seq {
            if frame.seq() <= previous {
                return Err(SinkError::OutOfOrder {
                    previous,
                    got: frame.seq(),
                });
            }
        }
        self.last_seq = Some(frame.seq());
        self.forwarded += 1;
        Ok(())
    }
}

fn main() {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config.toml"));

    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", config_path.display());
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .init();

    info!(
        interval = config.sampler.interval,
        output_dir = config.sampler.output_dir.display().to_string(),
        width = config.source.width,
        height = config.source.height,
        format = %config.source.format,
        frames = config.source.frames,
        "starting frame sampler"
    );

    let mut sampler = match FrameSampler::jpeg(config.sampler.clone()) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to initialize frame sampler");
            std::process::exit(1);
        }
    };

    let mut sink = CountingSink::default();
    for frame in TestPatternSource::new(config.source.clone()) {
        let frame = match frame {
            Ok(f) => f,
            Err(e) => {
                warn!(error = %e, "source produced an invalid frame, skipping");
                continue;
            }
        };
        if let Err(e) = sampler.filter_frame(frame, &mut sink) {
            error!(error = %e, "downstream rejected frame, stopping");
            std::process::exit(1);
        }
        if sink.forwarded % 100 == 0 {
            debug!(total = sink.forwarded, "frames forwarded");
        }
    }

    let stats = sampler.stats();
    info!(
        forwarded = sink.forwarded,
        attempted = stats.attempted,
        written = stats.written,
        not_ready = stats.not_ready,
        unavailable = stats.unavailable,
        failed = stats.failed,
        "frame sampler finished"
    );
}
