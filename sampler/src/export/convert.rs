use frame_sampler_common::frame::{Frame, PixelFormat};
use image::{GrayImage, Rgb, RgbImage};

use super::encoder::EncoderImage;
use super::ExportError;

/// Convert a decoded frame into a layout the JPEG encoder accepts.
///
/// Grayscale frames stay single-channel; everything else becomes packed RGB.
/// YUV input uses BT.601 coefficients, limited range for `Yuv420p`/`Nv12`
/// and full range for `Yuvj420p`.
pub fn to_encoder_image(frame: &Frame) -> Result<EncoderImage, ExportError> {
    let (w, h) = (frame.width(), frame.height());
    let data = frame.data().as_ref();

    match frame.format() {
        PixelFormat::Gray8 => GrayImage::from_raw(w, h, data.to_vec())
            .map(EncoderImage::Luma8)
            .ok_or_else(|| short_buffer(frame)),
        PixelFormat::Rgb24 => RgbImage::from_raw(w, h, data.to_vec())
            .map(EncoderImage::Rgb8)
            .ok_or_else(|| short_buffer(frame)),
        PixelFormat::Bgr24 => {
            let rgb = data
                .chunks_exact(3)
                .flat_map(|px| [px[2], px[1], px[0]])
                .collect();
            RgbImage::from_raw(w, h, rgb)
                .map(EncoderImage::Rgb8)
                .ok_or_else(|| short_buffer(frame))
        }
        PixelFormat::Rgba => {
            let rgb = data
                .chunks_exact(4)
                .flat_map(|px| [px[0], px[1], px[2]])
                .collect();
            RgbImage::from_raw(w, h, rgb)
                .map(EncoderImage::Rgb8)
                .ok_or_else(|| short_buffer(frame))
        }
        PixelFormat::Yuv420p => Ok(EncoderImage::Rgb8(planar_420(frame, yuv_limited_to_rgb))),
        PixelFormat::Yuvj420p => Ok(EncoderImage::Rgb8(planar_420(frame, yuv_full_to_rgb))),
        PixelFormat::Nv12 => Ok(EncoderImage::Rgb8(nv12(frame))),
        other => Err(ExportError::UnsupportedPixelFormat(other)),
    }
}

fn short_buffer(frame: &Frame) -> ExportError {
    ExportError::Configure(format!(
        "{} buffer of {} bytes does not fill {}x{}",
        frame.format(),
        frame.data().len(),
        frame.width(),
        frame.height()
    ))
}

fn planar_420(frame: &Frame, to_rgb: fn(u8, u8, u8) -> [u8; 3]) -> RgbImage {
    let (w, h) = (frame.width() as usize, frame.height() as usize);
    let cw = w.div_ceil(2);
    let ch = h.div_ceil(2);
    let data = frame.data().as_ref();
    let (y_plane, chroma) = data.split_at(w * h);
    let (u_plane, v_plane) = chroma.split_at(cw * ch);

    RgbImage::from_fn(frame.width(), frame.height(), |x, y| {
        let (x, y) = (x as usize, y as usize);
        let c = (y / 2) * cw + x / 2;
        Rgb(to_rgb(y_plane[y * w + x], u_plane[c], v_plane[c]))
    })
}

fn nv12(frame: &Frame) -> RgbImage {
    let (w, h) = (frame.width() as usize, frame.height() as usize);
    let uv_stride = 2 * w.div_ceil(2);
    let data = frame.data().as_ref();
    let (y_plane, uv_plane) = data.split_at(w * h);
    debug_assert_eq!(uv_plane.len(), uv_stride * h.div_ceil(2));

    RgbImage::from_fn(frame.width(), frame.height(), |x, y| {
        let (x, y) = (x as usize, y as usize);
        let c = (y / 2) * uv_stride + (x / 2) * 2;
        Rgb(yuv_limited_to_rgb(y_plane[y * w + x], uv_plane[c], uv_plane[c + 1]))
    })
}

fn clamp(v: i32) -> u8 {
    v.clamp(0, 255) as u8
}

/// BT.601 studio swing: Y in 16..=235, Cb/Cr in 16..=240.
fn yuv_limited_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let c = 298 * (y as i32 - 16);
    let d = u as i32 - 128;
    let e = v as i32 - 128;
    [
        clamp((c + 409 * e + 128) >> 8),
        clamp((c - 100 * d - 208 * e + 128) >> 8),
        clamp((c + 516 * d + 128) >> 8),
    ]
}

/// BT.601 full swing (JFIF), 16.16 fixed point.
fn yuv_full_to_rgb(y: u8, u: u8, v: u8) -> [u8; 3] {
    let y = y as i32;
    let d = u as i32 - 128;
    let e = v as i32 - 128;
    [
        clamp(y + ((91_881 * e + 32_768) >> 16)),
        clamp(y - ((22_554 * d + 46_802 * e + 32_768) >> 16)),
        clamp(y + ((116_130 * d + 32_768) >> 16)),
    ]
}
