use super::image_style::ImageStyle;
use super::summary_style::SummaryStyle;

/// What the remote model is asked to do with the frames.
#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
    /// Summarize a video in one of the fixed styles.
    Summary(SummaryStyle),
    /// Describe a still image in one of the fixed styles.
    ImageAnalysis(ImageStyle),
    /// Count occurrences of the named object in a still image.
    Count(String),
    /// Caller-supplied question or instruction.
    Custom(String),
}

impl Instruction {
    /// Summary style carried by this instruction, if any.
    pub fn summary_style(&self) -> Option<SummaryStyle> {
        match self {
            Instruction::Summary(style) => Some(*style),
            _ => None,
        }
    }
}
