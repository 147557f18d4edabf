use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::encoding::domain::encoded_frame::EncodedFrame;
use crate::encoding::domain::frame_encoder::FrameEncoder;
use crate::shared::constants::{
    DEFAULT_JPEG_QUALITY, DEFAULT_MAX_PAYLOAD_BYTES, JPEG_MIME_TYPE, JPEG_QUALITY_STEP,
    MIN_JPEG_QUALITY,
};
use crate::shared::error::SummaryError;
use crate::shared::frame::{Frame, SampledFrame};

/// JPEG encoder backed by the `image` crate.
///
/// Payloads larger than `max_payload_bytes` are re-encoded at
/// `quality_step` lower quality until they fit or `min_quality` is reached.
#[derive(Clone, Debug)]
pub struct JpegFrameEncoder {
    quality: u8,
    max_payload_bytes: usize,
    min_quality: u8,
    quality_step: u8,
}

impl JpegFrameEncoder {
    pub fn new() -> Self {
        Self {
            quality: DEFAULT_JPEG_QUALITY,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            min_quality: MIN_JPEG_QUALITY,
            quality_step: JPEG_QUALITY_STEP,
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_max_payload_bytes(mut self, max_payload_bytes: usize) -> Self {
        self.max_payload_bytes = max_payload_bytes;
        self
    }

    pub fn with_min_quality(mut self, min_quality: u8) -> Self {
        self.min_quality = min_quality.clamp(1, 100);
        self
    }

    pub fn with_quality_step(mut self, quality_step: u8) -> Self {
        self.quality_step = quality_step.max(1);
        self
    }

    pub fn max_payload_bytes(&self) -> usize {
        self.max_payload_bytes
    }
}

impl Default for JpegFrameEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameEncoder for JpegFrameEncoder {
    fn default_quality(&self) -> u8 {
        self.quality
    }

    fn encode(&self, frame: &SampledFrame, quality: u8) -> Result<EncodedFrame, SummaryError> {
        if !(1..=100).contains(&quality) {
            return Err(SummaryError::InvalidQuality(quality));
        }

        let mut current = quality;
        loop {
            let payload = encode_jpeg(&frame.image, current)?;
            if payload.len() <= self.max_payload_bytes {
                return Ok(EncodedFrame {
                    timestamp: frame.timestamp,
                    payload,
                    mime_type: JPEG_MIME_TYPE,
                    quality: current,
                });
            }
            if current <= self.min_quality {
                return Err(SummaryError::PayloadTooLarge {
                    size: payload.len(),
                    limit: self.max_payload_bytes,
                    quality: current,
                });
            }
            let next = current
                .saturating_sub(self.quality_step)
                .max(self.min_quality);
            log::debug!(
                "Frame at {:.2}s is {} bytes at quality {current}, retrying at {next}",
                frame.timestamp,
                payload.len()
            );
            current = next;
        }
    }
}

fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, SummaryError> {
    if !frame.is_consistent() {
        return Err(SummaryError::Encode(format!(
            "frame declares {}x{}x{} ({} bytes) but holds {} bytes",
            frame.width(),
            frame.height(),
            frame.channels(),
            frame.expected_len(),
            frame.data().len()
        )));
    }

    let color = match frame.channels() {
        1 => ExtendedColorType::L8,
        3 => ExtendedColorType::Rgb8,
        n => {
            return Err(SummaryError::Encode(format!(
                "unsupported channel count {n}, expected 1 or 3"
            )))
        }
    };

    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .encode(frame.data(), frame.width(), frame.height(), color)
        .map_err(|e| SummaryError::Encode(e.to_string()))?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn flat_frame(width: u32, height: u32, value: u8) -> SampledFrame {
        let data = vec![value; (width * height * 3) as usize];
        SampledFrame::new(2.0, Frame::new(data, width, height, 3))
    }

    /// Deterministic high-entropy frame; noise compresses poorly so quality
    /// changes show up in payload size.
    fn noise_frame(width: u32, height: u32) -> SampledFrame {
        let mut state: u32 = 0x1234_5678;
        let data = (0..width * height * 3)
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (state >> 24) as u8
            })
            .collect();
        SampledFrame::new(0.0, Frame::new(data, width, height, 3))
    }

    #[test]
    fn test_encode_produces_jpeg() {
        let encoder = JpegFrameEncoder::new();
        let encoded = encoder.encode(&flat_frame(64, 48, 128), 85).unwrap();
        assert_eq!(&encoded.payload[..2], &[0xFF, 0xD8]);
        assert_eq!(encoded.mime_type, "image/jpeg");
        assert_eq!(encoded.timestamp, 2.0);
        assert_eq!(encoded.quality, 85);
        assert!(!encoded.is_empty());
    }

    #[test]
    fn test_encoded_jpeg_decodes_to_same_size() {
        let encoder = JpegFrameEncoder::new();
        let encoded = encoder.encode(&flat_frame(64, 48, 90), 85).unwrap();
        let decoded = image::load_from_memory(&encoded.payload).unwrap();
        assert_eq!(decoded.width(), 64);
        assert_eq!(decoded.height(), 48);
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let encoder = JpegFrameEncoder::new();
        let frame = noise_frame(64, 64);
        let first = encoder.encode(&frame, 70).unwrap();
        let second = encoder.encode(&frame, 70).unwrap();
        assert_eq!(first.payload, second.payload);
    }

    #[test]
    fn test_grayscale_frame_is_supported() {
        let frame = SampledFrame::new(0.0, Frame::new(vec![200; 32 * 32], 32, 32, 1));
        let encoded = JpegFrameEncoder::new().encode(&frame, 85).unwrap();
        assert_eq!(&encoded.payload[..2], &[0xFF, 0xD8]);
    }

    #[test]
    fn test_mismatched_dimensions_fail() {
        let frame = SampledFrame::new(0.0, Frame::new(vec![0; 100], 10, 10, 3));
        let result = JpegFrameEncoder::new().encode(&frame, 85);
        assert!(matches!(result, Err(SummaryError::Encode(_))));
    }

    #[test]
    fn test_unsupported_channel_count_fails() {
        let frame = SampledFrame::new(0.0, Frame::new(vec![0; 10 * 10 * 4], 10, 10, 4));
        let result = JpegFrameEncoder::new().encode(&frame, 85);
        assert!(matches!(result, Err(SummaryError::Encode(_))));
    }

    #[rstest]
    #[case(0)]
    #[case(101)]
    #[case(255)]
    fn test_out_of_range_quality_rejected(#[case] quality: u8) {
        let result = JpegFrameEncoder::new().encode(&flat_frame(8, 8, 0), quality);
        assert!(matches!(result, Err(SummaryError::InvalidQuality(q)) if q == quality));
    }

    #[test]
    fn test_lower_quality_gives_smaller_payload() {
        let encoder = JpegFrameEncoder::new();
        let frame = noise_frame(128, 128);
        let high = encoder.encode(&frame, 95).unwrap();
        let low = encoder.encode(&frame, 20).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn test_oversized_payload_steps_quality_down() {
        let frame = noise_frame(128, 128);
        let unbounded = JpegFrameEncoder::new();
        let at_top = unbounded.encode(&frame, 90).unwrap().len();
        let at_floor = unbounded.encode(&frame, MIN_JPEG_QUALITY).unwrap().len();
        let limit = (at_top + at_floor) / 2;

        let bounded = JpegFrameEncoder::new().with_max_payload_bytes(limit);
        let encoded = bounded.encode(&frame, 90).unwrap();
        assert!(encoded.len() <= limit);
        assert!(encoded.quality < 90);
        assert!(encoded.quality >= MIN_JPEG_QUALITY);
    }

    #[test]
    fn test_payload_too_large_at_floor() {
        let encoder = JpegFrameEncoder::new().with_max_payload_bytes(16);
        let result = encoder.encode(&noise_frame(64, 64), 85);
        match result {
            Err(SummaryError::PayloadTooLarge {
                limit, quality, size,
            }) => {
                assert_eq!(limit, 16);
                assert_eq!(quality, MIN_JPEG_QUALITY);
                assert!(size > 16);
            }
            other => panic!("expected PayloadTooLarge, got {other:?}"),
        }
    }

    #[test]
    fn test_default_quality() {
        assert_eq!(JpegFrameEncoder::new().default_quality(), 85);
        assert_eq!(JpegFrameEncoder::new().with_quality(60).default_quality(), 60);
    }
}
