use std::path::Path;

use crate::shared::error::SummaryError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

use super::ffmpeg_support::{extract_rgb_pixels, rgb_scaler, scaled_dimensions, unavailable};

/// Adapts a single still image to the [`VideoReader`] interface.
///
/// Treats the image as a zero-length video with `fps=0`, so the sampler
/// produces exactly one frame at timestamp 0 and images flow through the
/// same encode and request path as videos.
///
/// Uses ffmpeg for decoding, which handles every format the video path does
/// (JPEG, PNG, BMP, TIFF, WebP, PNM) without a second decoder stack.
pub struct ImageFileReader {
    frame: Option<Frame>,
}

impl ImageFileReader {
    pub fn new() -> Self {
        Self { frame: None }
    }
}

impl Default for ImageFileReader {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_single_frame(
    ictx: &mut ffmpeg_next::format::context::Input,
    decoder: &mut ffmpeg_next::decoder::Video,
    scaler: &mut ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
    stream_index: usize,
) -> Result<Frame, Box<dyn std::error::Error>> {
    for (stream, packet) in ictx.packets() {
        if stream.index() != stream_index {
            continue;
        }
        decoder.send_packet(&packet)?;
        if let Some(frame) = try_receive_frame(decoder, scaler, width, height)? {
            return Ok(frame);
        }
    }

    // Flush decoder for formats that buffer the single frame
    let _ = decoder.send_eof();
    try_receive_frame(decoder, scaler, width, height)?
        .ok_or_else(|| "failed to decode image".into())
}

fn try_receive_frame(
    decoder: &mut ffmpeg_next::decoder::Video,
    scaler: &mut ffmpeg_next::software::scaling::Context,
    width: u32,
    height: u32,
) -> Result<Option<Frame>, Box<dyn std::error::Error>> {
    let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
    if decoder.receive_frame(&mut decoded).is_ok() {
        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(&decoded, &mut rgb_frame)?;
        let pixels = extract_rgb_pixels(&rgb_frame, width, height);
        Ok(Some(Frame::new(pixels, width, height, 3)))
    } else {
        Ok(None)
    }
}

impl VideoReader for ImageFileReader {
    fn open(
        &mut self,
        path: &Path,
        max_width: Option<u32>,
    ) -> Result<VideoMetadata, SummaryError> {
        self.close();
        ffmpeg_next::init().map_err(|e| unavailable(path, e))?;

        let mut ictx = ffmpeg_next::format::input(path).map_err(|e| unavailable(path, e))?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| unavailable(path, "no image data found"))?;
        let stream_index = stream.index();

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| unavailable(path, e))?;
        let mut decoder = codec_ctx.decoder().video().map_err(|e| unavailable(path, e))?;
        let codec = decoder
            .codec()
            .map(|c| c.name().to_string())
            .unwrap_or_default();

        let (width, height) = scaled_dimensions(decoder.width(), decoder.height(), max_width);
        let mut scaler = rgb_scaler(&decoder, width, height).map_err(|e| unavailable(path, e))?;

        let frame = decode_single_frame(
            &mut ictx,
            &mut decoder,
            &mut scaler,
            width,
            height,
            stream_index,
        )
        .map_err(|e| unavailable(path, e))?;
        self.frame = Some(frame);

        Ok(VideoMetadata {
            width,
            height,
            fps: 0.0,
            duration_seconds: 0.0,
            codec,
            source_path: Some(path.to_path_buf()),
        })
    }

    fn frame_at(&mut self, _seconds: f64) -> Result<Frame, Box<dyn std::error::Error>> {
        self.frame
            .clone()
            .ok_or_else(|| "ImageFileReader: not opened".into())
    }

    fn close(&mut self) {
        self.frame = None;
    }
}
