use std::path::Path;

use crate::shared::error::SummaryError;

/// ffmpeg's internal time unit for container-level timestamps (microseconds).
pub(crate) const AV_TIME_BASE: f64 = 1_000_000.0;

/// Output size for a frame of `width`x`height` capped at `max_width`,
/// preserving aspect ratio. Frames already narrow enough are left alone.
pub(crate) fn scaled_dimensions(width: u32, height: u32, max_width: Option<u32>) -> (u32, u32) {
    match max_width {
        Some(max) if max > 0 && width > max => {
            let scaled_height = (height as u64 * max as u64 / width as u64).max(1) as u32;
            (max, scaled_height)
        }
        _ => (width, height),
    }
}

/// Builds an RGB24 scaler that also applies the width cap.
pub(crate) fn rgb_scaler(
    decoder: &ffmpeg_next::decoder::Video,
    out_width: u32,
    out_height: u32,
) -> Result<ffmpeg_next::software::scaling::Context, ffmpeg_next::Error> {
    let flags = if out_width < decoder.width() {
        ffmpeg_next::software::scaling::Flags::AREA
    } else {
        ffmpeg_next::software::scaling::Flags::BILINEAR
    };
    ffmpeg_next::software::scaling::Context::get(
        decoder.format(),
        decoder.width(),
        decoder.height(),
        ffmpeg_next::format::Pixel::RGB24,
        out_width,
        out_height,
        flags,
    )
}

/// Copies pixel data from an ffmpeg frame into a contiguous RGB buffer.
///
/// ffmpeg frames may have padding bytes at the end of each row (stride > width*3).
/// This strips that padding to produce a tightly-packed pixel buffer.
pub(crate) fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}

pub(crate) fn unavailable(path: &Path, reason: impl std::fmt::Display) -> SummaryError {
    SummaryError::SourceUnavailable {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    }
}
