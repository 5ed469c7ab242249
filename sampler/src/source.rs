use chrono::Utc;
use frame_sampler_common::config::SourceConfig;
use frame_sampler_common::frame::{Frame, FrameError, PixelFormat};
use tracing::debug;

/// Synthetic upstream: a diagonal luma ramp that scrolls by a few pixels per
/// frame, with a slowly rotating chroma tint.
pub struct TestPatternSource {
    config: SourceConfig,
    next_seq: u64,
    emitted: u64,
}

impl TestPatternSource {
    pub fn new(config: SourceConfig) -> Self {
        Self {
            next_seq: config.start_seq,
            config,
            emitted: 0,
        }
    }

    fn is_dropped(&self, seq: u64) -> bool {
        self.config.drop_every > 1 && (seq + 1) % self.config.drop_every == 0
    }

    fn render(&self, seq: u64) -> Result<Frame, FrameError> {
        let SourceConfig {
            width,
            height,
            format,
            ..
        } = self.config;
        let (w, h) = (width as usize, height as usize);
        let (cw, ch) = (w.div_ceil(2), h.div_ceil(2));
        let shift = (seq as usize).wrapping_mul(4);
        let luma = |x: usize, y: usize| ((x + y + shift) % 256) as u8;
        let u = (128 + (seq % 64) as u8 * 2) ^ 0x40;
        let v = 255 - u;

        let mut buf = Vec::with_capacity(format.buffer_len(width, height).unwrap_or(0));
        match format {
            PixelFormat::Gray8 => {
                for y in 0..h {
                    buf.extend((0..w).map(|x| luma(x, y)));
                }
            }
            PixelFormat::Rgb24 | PixelFormat::Bgr24 | PixelFormat::Rgba => {
                for y in 0..h {
                    for x in 0..w {
                        buf.extend_from_slice(&[luma(x, y), u, v]);
                        if format == PixelFormat::Rgba {
                            buf.push(255);
                        }
                    }
                }
            }
            PixelFormat::Yuv420p | PixelFormat::Yuvj420p => {
                for y in 0..h {
                    buf.extend((0..w).map(|x| luma(x, y)));
                }
                buf.resize(w * h + cw * ch, u);
                buf.resize(w * h + 2 * cw * ch, v);
            }
            PixelFormat::Nv12 => {
                for y in 0..h {
                    buf.extend((0..w).map(|x| luma(x, y)));
                }
                for _ in 0..cw * ch {
                    buf.extend_from_slice(&[u, v]);
                }
            }
            PixelFormat::Yuv422p10le => {
                for y in 0..h {
                    for x in 0..w {
                        buf.extend_from_slice(&((luma(x, y) as u16) << 2).to_le_bytes());
                    }
                }
                let chroma = 2 * cw * h;
                for _ in 0..chroma {
                    buf.extend_from_slice(&512u16.to_le_bytes());
                }
            }
        }

        Frame::new(
            seq,
            width,
            height,
            format,
            Utc::now().timestamp_millis(),
            buf,
        )
    }
}

impl Iterator for TestPatternSource {
    type Item = Result<Frame, FrameError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.emitted >= self.config.frames {
            return None;
        }
        while self.is_dropped(self.next_seq) {
            debug!(seq = self.next_seq, "dropping frame upstream");
            self.next_seq += 1;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.emitted += 1;
        Some(self.render(seq))
    }
}
