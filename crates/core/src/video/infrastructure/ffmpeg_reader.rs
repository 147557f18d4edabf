use std::path::Path;

use crate::shared::error::SummaryError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::video_reader::VideoReader;

use super::ffmpeg_support::{
    extract_rgb_pixels, rgb_scaler, scaled_dimensions, unavailable, AV_TIME_BASE,
};

/// Decodes video frames via ffmpeg-next (libavformat + libavcodec).
///
/// Each `frame_at` seeks to the nearest preceding keyframe and decodes
/// forward to the requested time, converting the result to RGB24.
pub struct FfmpegReader {
    stream: Option<OpenStream>,
}

// Safety: FfmpegReader is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegReader {}

struct OpenStream {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    layout: FrameLayout,
    frame_duration: f64,
}

/// What is needed to turn a decoded ffmpeg frame into a timed [`Frame`].
#[derive(Clone, Copy)]
struct FrameLayout {
    time_base: f64,
    start_offset: i64,
    width: u32,
    height: u32,
}

impl FfmpegReader {
    pub fn new() -> Self {
        Self { stream: None }
    }
}

impl Default for FfmpegReader {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoReader for FfmpegReader {
    fn open(
        &mut self,
        path: &Path,
        max_width: Option<u32>,
    ) -> Result<VideoMetadata, SummaryError> {
        self.close();
        ffmpeg_next::init().map_err(|e| unavailable(path, e))?;

        let ictx = ffmpeg_next::format::input(path).map_err(|e| unavailable(path, e))?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| unavailable(path, "no video stream found"))?;

        let stream_index = stream.index();
        let time_base = f64::from(stream.time_base());
        let start_offset = stream.start_time().max(0);
        let fps = frame_rate(&stream);
        let duration_seconds = duration_seconds(&ictx, &stream, fps);

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| unavailable(path, e))?;
        let decoder = codec_ctx.decoder().video().map_err(|e| unavailable(path, e))?;
        let codec = decoder
            .codec()
            .map(|c| c.name().to_string())
            .unwrap_or_default();

        let (width, height) = scaled_dimensions(decoder.width(), decoder.height(), max_width);
        let scaler = rgb_scaler(&decoder, width, height).map_err(|e| unavailable(path, e))?;

        let metadata = VideoMetadata {
            width,
            height,
            fps,
            duration_seconds,
            codec,
            source_path: Some(path.to_path_buf()),
        };
        log::debug!(
            "Opened {}: {}x{} {:.2}fps {:.2}s ({})",
            path.display(),
            width,
            height,
            fps,
            duration_seconds,
            metadata.codec
        );

        self.stream = Some(OpenStream {
            ictx,
            decoder,
            scaler,
            stream_index,
            layout: FrameLayout {
                time_base,
                start_offset,
                width,
                height,
            },
            frame_duration: if fps > 0.0 { 1.0 / fps } else { 0.0 },
        });

        Ok(metadata)
    }

    fn frame_at(&mut self, seconds: f64) -> Result<Frame, Box<dyn std::error::Error>> {
        let stream = self.stream.as_mut().ok_or("FfmpegReader: not opened")?;
        stream.seek(seconds)?;
        stream.decode_until(seconds)
    }

    fn close(&mut self) {
        self.stream = None;
    }
}

impl OpenStream {
    fn seek(&mut self, seconds: f64) -> Result<(), ffmpeg_next::Error> {
        let offset = self.layout.start_offset as f64 * self.layout.time_base;
        let target = ((seconds + offset) * AV_TIME_BASE) as i64;
        self.ictx.seek(target, ..target)?;
        self.decoder.flush();
        Ok(())
    }

    /// Decodes forward from the current position and returns the first frame
    /// whose presentation time reaches `target`.
    ///
    /// A target past the last decodable frame (the end timestamp of a clip)
    /// resolves to that last frame when it is within one frame duration.
    fn decode_until(&mut self, target: f64) -> Result<Frame, Box<dyn std::error::Error>> {
        let tolerance = self.frame_duration / 2.0;
        let mut last: Option<(f64, Frame)> = None;

        for (stream, packet) in self.ictx.packets() {
            if stream.index() != self.stream_index {
                continue;
            }
            if let Err(e) = self.decoder.send_packet(&packet) {
                log::debug!("Dropping undecodable packet: {e}");
                continue;
            }
            while let Some((pts, frame)) =
                receive_frame(&mut self.decoder, &mut self.scaler, self.layout)?
            {
                if pts + tolerance >= target {
                    return Ok(frame);
                }
                last = Some((pts, frame));
            }
        }

        let _ = self.decoder.send_eof();
        while let Some((pts, frame)) =
            receive_frame(&mut self.decoder, &mut self.scaler, self.layout)?
        {
            if pts + tolerance >= target {
                return Ok(frame);
            }
            last = Some((pts, frame));
        }

        match last {
            Some((pts, frame)) if target - pts <= self.frame_duration + tolerance => Ok(frame),
            Some((pts, _)) => {
                Err(format!("no frame at {target:.2}s (stream ends at {pts:.2}s)").into())
            }
            None => Err(format!("no frame decoded at {target:.2}s").into()),
        }
    }
}

/// Pulls one decoded frame, if the decoder has one ready, as `(seconds, frame)`.
fn receive_frame(
    decoder: &mut ffmpeg_next::decoder::Video,
    scaler: &mut ffmpeg_next::software::scaling::Context,
    layout: FrameLayout,
) -> Result<Option<(f64, Frame)>, Box<dyn std::error::Error>> {
    let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
    if decoder.receive_frame(&mut decoded).is_err() {
        return Ok(None);
    }

    let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
    scaler.run(&decoded, &mut rgb_frame)?;

    let ts = decoded.timestamp().or(decoded.pts()).unwrap_or(0);
    let seconds = (ts - layout.start_offset) as f64 * layout.time_base;
    let pixels = extract_rgb_pixels(&rgb_frame, layout.width, layout.height);
    Ok(Some((
        seconds,
        Frame::new(pixels, layout.width, layout.height, 3),
    )))
}

fn frame_rate(stream: &ffmpeg_next::format::stream::Stream) -> f64 {
    let avg = stream.avg_frame_rate();
    let rate = if avg.denominator() != 0 && avg.numerator() > 0 {
        avg
    } else {
        stream.rate()
    };
    if rate.denominator() != 0 {
        rate.numerator() as f64 / rate.denominator() as f64
    } else {
        0.0
    }
}

/// Total duration in seconds: container header first, then the stream's own
/// duration, then frame count over frame rate. Unknown durations are 0.
fn duration_seconds(
    ictx: &ffmpeg_next::format::context::Input,
    stream: &ffmpeg_next::format::stream::Stream,
    fps: f64,
) -> f64 {
    let container = ictx.duration();
    if container > 0 {
        return container as f64 / AV_TIME_BASE;
    }
    let stream_duration = stream.duration();
    if stream_duration > 0 {
        return stream_duration as f64 * f64::from(stream.time_base());
    }
    if fps > 0.0 && stream.frames() > 0 {
        return stream.frames() as f64 / fps;
    }
    0.0
}
