use bytes::Bytes;
use serde::Deserialize;
use std::fmt;

/// Pixel layout of a decoded frame buffer.
///
/// Planes are tightly packed one after another with no row padding:
///
///   Yuv420p / Yuvj420p: [Y: w*h][U: cw*ch][V: cw*ch]   cw = ceil(w/2), ch = ceil(h/2)
///   Nv12:               [Y: w*h][UV interleaved: 2*cw*ch]
///   Yuv422p10le:        [Y: 2*w*h][U: 2*cw*h][V: 2*cw*h] (little-endian u16 samples)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    Gray8,
    Rgb24,
    Bgr24,
    Rgba,
    /// Planar 4:2:0, limited (TV) range.
    Yuv420p,
    /// Planar 4:2:0, full (JPEG) range.
    Yuvj420p,
    /// Semi-planar 4:2:0, limited range.
    Nv12,
    /// Planar 4:2:2, 10 bits per sample. Passed through but never exported.
    Yuv422p10le,
}

impl PixelFormat {
    /// Expected buffer length in bytes for a `width` x `height` image, or
    /// `None` when it does not fit in `usize`.
    pub fn buffer_len(self, width: u32, height: u32) -> Option<usize> {
        let (w, h) = (width as usize, height as usize);
        let (cw, ch) = (w.div_ceil(2), h.div_ceil(2));
        let luma = w.checked_mul(h)?;
        match self {
            PixelFormat::Gray8 => Some(luma),
            PixelFormat::Rgb24 | PixelFormat::Bgr24 => luma.checked_mul(3),
            PixelFormat::Rgba => luma.checked_mul(4),
            PixelFormat::Yuv420p | PixelFormat::Yuvj420p | PixelFormat::Nv12 => {
                let chroma = cw.checked_mul(ch)?.checked_mul(2)?;
                luma.checked_add(chroma)
            }
            PixelFormat::Yuv422p10le => {
                let chroma = cw.checked_mul(h)?.checked_mul(2)?;
                luma.checked_add(chroma)?.checked_mul(2)
            }
        }
    }

    /// Whether the still-image exporter knows how to convert this layout.
    pub fn is_exportable(self) -> bool {
        !matches!(self, PixelFormat::Yuv422p10le)
    }

    pub fn name(self) -> &'static str {
        match self {
            PixelFormat::Gray8 => "gray8",
            PixelFormat::Rgb24 => "rgb24",
            PixelFormat::Bgr24 => "bgr24",
            PixelFormat::Rgba => "rgba",
            PixelFormat::Yuv420p => "yuv420p",
            PixelFormat::Yuvj420p => "yuvj420p",
            PixelFormat::Nv12 => "nv12",
            PixelFormat::Yuv422p10le => "yuv422p10le",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded video frame handed to a filter by the host pipeline.
///
/// The pixel buffer is reference counted: cloning a frame or forwarding it
/// never copies pixel data, and the filter only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    seq: u64,
    width: u32,
    height: u32,
    format: PixelFormat,
    captured_at_ms: i64,
    data: Bytes,
}

impl Frame {
    /// Wrap a decoded buffer, checking that its size matches the declared layout.
    pub fn new(
        seq: u64,
        width: u32,
        height: u32,
        format: PixelFormat,
        captured_at_ms: i64,
        data: impl Into<Bytes>,
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::EmptyDimensions { width, height });
        }
        let data = data.into();
        let expected = format
            .buffer_len(width, height)
            .ok_or(FrameError::TooLarge {
                format,
                width,
                height,
            })?;
        if data.len() != expected {
            return Err(FrameError::BufferSize {
                format,
                width,
                height,
                got: data.len(),
                expected,
            });
        }
        Ok(Self {
            seq,
            width,
            height,
            format,
            captured_at_ms,
            data,
        })
    }

    /// Position of this frame in the stream, assigned upstream.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn captured_at_ms(&self) -> i64 {
        self.captured_at_ms
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// True when both frames view the same underlying buffer.
    pub fn shares_buffer(&self, other: &Frame) -> bool {
        self.data.as_ptr() == other.data.as_ptr() && self.data.len() == other.data.len()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("frame dimensions must be non-zero, got {width}x{height}")]
    EmptyDimensions { width: u32, height: u32 },
    #[error("{format} buffer for {width}x{height} does not fit in memory")]
    TooLarge {
        format: PixelFormat,
        width: u32,
        height: u32,
    },
    #[error("{format} buffer for {width}x{height} must be {expected} bytes, got {got}")]
    BufferSize {
        format: PixelFormat,
        width: u32,
        height: u32,
        got: usize,
        expected: usize,
    },
}
