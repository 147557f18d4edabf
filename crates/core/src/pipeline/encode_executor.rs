use crate::encoding::domain::encoded_frame::EncodedFrame;
use crate::encoding::domain::frame_encoder::FrameEncoder;
use crate::shared::error::SummaryError;
use crate::shared::frame::SampledFrame;

/// Abstracts how a batch of sampled frames is encoded.
///
/// This is a port (application-layer interface). Implementations must
/// return exactly one payload per frame, in input order, or the error of
/// the earliest frame that failed.
pub trait EncodeExecutor: Send {
    fn encode_all(
        &self,
        encoder: &dyn FrameEncoder,
        frames: &[SampledFrame],
        quality: u8,
    ) -> Result<Vec<EncodedFrame>, SummaryError>;
}

/// Encodes frames one after another on the calling thread.
pub struct SequentialEncodeExecutor;

impl EncodeExecutor for SequentialEncodeExecutor {
    fn encode_all(
        &self,
        encoder: &dyn FrameEncoder,
        frames: &[SampledFrame],
        quality: u8,
    ) -> Result<Vec<EncodedFrame>, SummaryError> {
        frames
            .iter()
            .map(|frame| encoder.encode(frame, quality))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::infrastructure::jpeg_frame_encoder::JpegFrameEncoder;
    use crate::shared::frame::Frame;

    fn frames(n: usize) -> Vec<SampledFrame> {
        (0..n)
            .map(|i| {
                let value = (i * 30) as u8;
                SampledFrame::new(i as f64, Frame::new(vec![value; 16 * 16 * 3], 16, 16, 3))
            })
            .collect()
    }

    #[test]
    fn test_one_payload_per_frame_in_order() {
        let encoded = SequentialEncodeExecutor
            .encode_all(&JpegFrameEncoder::new(), &frames(4), 85)
            .unwrap();
        let timestamps: Vec<_> = encoded.iter().map(|f| f.timestamp).collect();
        assert_eq!(timestamps, vec![0.0, 1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_first_failure_aborts() {
        let mut batch = frames(3);
        batch[1] = SampledFrame::new(1.0, Frame::new(vec![0; 3], 16, 16, 3));
        let result = SequentialEncodeExecutor.encode_all(&JpegFrameEncoder::new(), &batch, 85);
        assert!(matches!(result, Err(SummaryError::Encode(_))));
    }
}
