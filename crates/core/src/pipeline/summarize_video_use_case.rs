use std::path::Path;

use crate::pipeline::summary_pipeline::SummaryPipeline;
use crate::prompt::instruction::Instruction;
use crate::prompt::summary_style::SummaryStyle;
use crate::remote::domain::summary_request::SummaryResult;
use crate::shared::error::SummaryError;

/// Video summarization: sample frames at a fixed interval, send them with a
/// style template or a custom prompt, return the model's answer.
pub struct SummarizeVideoUseCase {
    pipeline: SummaryPipeline,
}

impl SummarizeVideoUseCase {
    pub fn new(pipeline: SummaryPipeline) -> Self {
        Self { pipeline }
    }

    /// Summarizes the video at `path` in the named style (default `short`).
    ///
    /// An unknown style fails with `UnknownStyle` before the video is
    /// opened.
    pub fn summarize(
        &mut self,
        path: &Path,
        style: Option<&str>,
    ) -> Result<SummaryResult, SummaryError> {
        let style = SummaryStyle::parse_optional(style)?;
        self.summarize_with_style(path, style)
    }

    pub fn summarize_with_style(
        &mut self,
        path: &Path,
        style: SummaryStyle,
    ) -> Result<SummaryResult, SummaryError> {
        log::info!("Summarizing {} ({style} style)", path.display());
        self.pipeline.run(path, &Instruction::Summary(style))
    }

    /// Asks `prompt` about the sampled frames instead of using a template.
    pub fn analyze_with_prompt(
        &mut self,
        path: &Path,
        prompt: &str,
    ) -> Result<SummaryResult, SummaryError> {
        log::info!("Analyzing {} with a custom prompt", path.display());
        self.pipeline.run(path, &Instruction::Custom(prompt.to_string()))
    }

    pub fn pipeline(&self) -> &SummaryPipeline {
        &self.pipeline
    }
}
