use crate::encoding::domain::encoded_frame::EncodedFrame;
use crate::prompt::summary_style::SummaryStyle;

/// Everything sent to the remote model in one call.
///
/// Built once per invocation, sent once, and dropped after the response.
/// `frames` keeps the sampling order.
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryRequest {
    pub style: Option<SummaryStyle>,
    pub frames: Vec<EncodedFrame>,
    pub instruction: String,
    pub max_tokens: u32,
}

impl SummaryRequest {
    pub fn payload_bytes(&self) -> usize {
        self.frames.iter().map(EncodedFrame::len).sum()
    }
}

/// The sole output of a summary invocation.
///
/// `text` is the model's response, unmodified.
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryResult {
    pub text: String,
    pub frames_used: usize,
    pub model: String,
}
