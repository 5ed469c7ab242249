use image::codecs::jpeg::JpegEncoder;
use image::{GrayImage, RgbImage};
use tracing::debug;

use super::ExportError;

/// Largest edge a baseline JPEG can describe.
const MAX_JPEG_DIMENSION: u32 = u16::MAX as u32;

/// Pixel layout an encoder accepts on `submit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncoderInput {
    Rgb8,
    Luma8,
}

/// A frame already converted into an encoder input layout.
#[derive(Debug, Clone)]
pub enum EncoderImage {
    Rgb8(RgbImage),
    Luma8(GrayImage),
}

impl EncoderImage {
    pub fn input(&self) -> EncoderInput {
        match self {
            EncoderImage::Rgb8(_) => EncoderInput::Rgb8,
            EncoderImage::Luma8(_) => EncoderInput::Luma8,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            EncoderImage::Rgb8(img) => img.dimensions(),
            EncoderImage::Luma8(img) => img.dimensions(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderParams {
    pub width: u32,
    pub height: u32,
    pub input: EncoderInput,
    pub quality: u8,
}

/// A still-image codec session, scoped to a single export.
///
/// Dropping the value releases the session, so every exit path of an
/// export gives it back.
pub trait StillEncoder {
    fn configure(&mut self, params: &EncoderParams) -> Result<(), ExportError>;

    /// Hand one image to the encoder. Only one submission may be outstanding.
    fn submit(&mut self, image: &EncoderImage) -> Result<(), ExportError>;

    /// Collect encoded bytes. `Ok(None)` means no output is available yet.
    fn receive(&mut self) -> Result<Option<Vec<u8>>, ExportError>;
}

/// Hands out encoder sessions. Fails with `ExportError::EncoderUnavailable`
/// when no codec can be set up.
pub trait EncoderFactory {
    type Encoder: StillEncoder;

    fn acquire(&self) -> Result<Self::Encoder, ExportError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}

/// JPEG encoding backed by the `image` crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegEncoderFactory;

impl EncoderFactory for JpegEncoderFactory {
    type Encoder = JpegStillEncoder;

    fn acquire(&self) -> Result<JpegStillEncoder, ExportError> {
        Ok(JpegStillEncoder::default())
    }

    fn name(&self) -> &str {
        "jpeg"
    }
}

#[derive(Debug, Default)]
pub struct JpegStillEncoder {
    params: Option<EncoderParams>,
    pending: Option<Vec<u8>>,
}

impl StillEncoder for JpegStillEncoder {
    fn configure(&mut self, params: &EncoderParams) -> Result<(), ExportError> {
        if params.width == 0
            || params.height == 0
            || params.width > MAX_JPEG_DIMENSION
            || params.height > MAX_JPEG_DIMENSION
        {
            return Err(ExportError::Configure(format!(
                "{}x{} is outside the JPEG size limits",
                params.width, params.height
            )));
        }
        if !(1..=100).contains(&params.quality) {
            return Err(ExportError::Configure(format!(
                "quality {} is outside 1..=100",
                params.quality
            )));
        }
        self.params = Some(*params);
        Ok(())
    }

    fn submit(&mut self, image: &EncoderImage) -> Result<(), ExportError> {
        let params = self
            .params
            .ok_or_else(|| ExportError::Submit("encoder was not configured".into()))?;
        if self.pending.is_some() {
            return Err(ExportError::Submit(
                "previous output has not been retrieved".into(),
            ));
        }
        if image.input() != params.input || image.dimensions() != (params.width, params.height) {
            return Err(ExportError::Submit(format!(
                "image {:?} {:?} does not match configured {:?} {}x{}",
                image.input(),
                image.dimensions(),
                params.input,
                params.width,
                params.height
            )));
        }

        let mut buf = Vec::new();
        {
            let mut encoder = JpegEncoder::new_with_quality(&mut buf, params.quality);
            match image {
                EncoderImage::Rgb8(img) => encoder.encode_image(img),
                EncoderImage::Luma8(img) => encoder.encode_image(img),
            }
            .map_err(|e| ExportError::Encode(e.to_string()))?;
        }

        debug!(
            width = params.width,
            height = params.height,
            quality = params.quality,
            bytes = buf.len(),
            "jpeg encoded"
        );
        self.pending = Some(buf);
        Ok(())
    }

    fn receive(&mut self) -> Result<Option<Vec<u8>>, ExportError> {
        Ok(self.pending.take())
    }
}

impl Drop for JpegStillEncoder {
    fn drop(&mut self) {
        if let Some(unread) = &self.pending {
            debug!(bytes = unread.len(), "jpeg encoder released with unread output");
        }
    }
}
