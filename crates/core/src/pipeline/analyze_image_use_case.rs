use std::path::Path;

use crate::pipeline::summary_pipeline::SummaryPipeline;
use crate::prompt::image_style::ImageStyle;
use crate::prompt::instruction::Instruction;
use crate::remote::domain::summary_request::SummaryResult;
use crate::shared::error::SummaryError;

/// Still-image analysis through the same sample → encode → request path.
///
/// The pipeline is expected to carry an image reader, which presents the
/// file as a zero-length video so exactly one frame is sent.
pub struct AnalyzeImageUseCase {
    pipeline: SummaryPipeline,
}

impl AnalyzeImageUseCase {
    pub fn new(pipeline: SummaryPipeline) -> Self {
        Self { pipeline }
    }

    /// Describes the image in the named style (default `short`).
    pub fn analyze(
        &mut self,
        path: &Path,
        style: Option<&str>,
    ) -> Result<SummaryResult, SummaryError> {
        let style = ImageStyle::parse_optional(style)?;
        log::info!("Analyzing image {} ({style} style)", path.display());
        self.pipeline.run(path, &Instruction::ImageAnalysis(style))
    }

    /// Counts how many `object_name` are visible in the image.
    pub fn count_items(
        &mut self,
        path: &Path,
        object_name: &str,
    ) -> Result<SummaryResult, SummaryError> {
        log::info!("Counting '{object_name}' in {}", path.display());
        self.pipeline
            .run(path, &Instruction::Count(object_name.to_string()))
    }

    pub fn analyze_with_prompt(
        &mut self,
        path: &Path,
        prompt: &str,
    ) -> Result<SummaryResult, SummaryError> {
        log::info!("Analyzing image {} with a custom prompt", path.display());
        self.pipeline.run(path, &Instruction::Custom(prompt.to_string()))
    }
}
