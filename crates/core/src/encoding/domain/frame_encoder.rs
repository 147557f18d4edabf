use crate::shared::error::SummaryError;
use crate::shared::frame::SampledFrame;

use super::encoded_frame::EncodedFrame;

/// Domain interface for compressing a frame into a transmittable payload.
///
/// Implementations are pure: the same frame at the same quality always
/// produces the same bytes, and no state is shared between calls, so one
/// encoder may serve several threads.
pub trait FrameEncoder: Send + Sync {
    /// Quality used when the caller does not override it.
    fn default_quality(&self) -> u8;

    /// Encodes at `quality`, stepping quality down if the payload exceeds
    /// the encoder's size limit.
    fn encode(&self, frame: &SampledFrame, quality: u8) -> Result<EncodedFrame, SummaryError>;
}
