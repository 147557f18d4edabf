use crate::shared::error::SummaryError;

use super::image_style::ImageStyle;
use super::instruction::Instruction;
use super::summary_style::SummaryStyle;

const SHORT_SUMMARY: &str = "Summarize what happens in this video. \
    Focus on actions, events, and salient changes. \
    Keep it concise.";

const TIMELINE_SUMMARY: &str = "Summarize the video. \
    Then produce a timeline of key events with approximate timestamps. \
    Format as: [Time] - Event description";

const DETAILED_SUMMARY: &str = "Provide a detailed summary of this video. \
    Describe key actions, scene changes, objects, people, and timeline. \
    Include as much context as possible.";

const TECHNICAL_SUMMARY: &str = "Provide a technical summary of this video. \
    Focus on measurable actions, scene transitions, and objective observations. \
    Use bullet points for clarity.";

const SHORT_IMAGE: &str = "Analyze this image. \
    Describe what you see, including key objects, people, scenes, and any notable details. \
    Keep it concise.";

const DETAILED_IMAGE: &str = "Provide a detailed analysis of this image. \
    Describe all visible objects, people, scenes, colors, composition, lighting, \
    and any other relevant details. Include context and potential interpretations.";

const TECHNICAL_IMAGE: &str = "Provide a technical analysis of this image. \
    Focus on objective observations: objects, colors, composition, lighting conditions, \
    image quality, and measurable characteristics. Use bullet points for clarity.";

const DESCRIPTIVE_IMAGE: &str = "Provide a rich, descriptive analysis of this image. \
    Describe the scene, atmosphere, mood, and visual elements in detail. \
    Include artistic and aesthetic observations.";

/// Turns a style (or free-form instruction) into the text sent alongside
/// the frames. Pure lookup and template fill.
pub struct PromptBuilder;

impl PromptBuilder {
    /// Instruction text for a video summary.
    ///
    /// The timeline style also lists `frame_timestamps` in order so the model
    /// can tie each image to a moment in the video.
    pub fn build(style: SummaryStyle, frame_timestamps: &[f64]) -> String {
        match style {
            SummaryStyle::Short => SHORT_SUMMARY.to_string(),
            SummaryStyle::Detailed => DETAILED_SUMMARY.to_string(),
            SummaryStyle::Technical => TECHNICAL_SUMMARY.to_string(),
            SummaryStyle::Timeline => {
                format!(
                    "{TIMELINE_SUMMARY}\n\nThe {} images are frames from the video in order, \
                     captured at these timestamps: {}.",
                    frame_timestamps.len(),
                    format_timestamps(frame_timestamps)
                )
            }
        }
    }

    /// Like [`PromptBuilder::build`] but takes the style by name.
    pub fn build_named(style: &str, frame_timestamps: &[f64]) -> Result<String, SummaryError> {
        Ok(Self::build(style.parse()?, frame_timestamps))
    }

    pub fn build_image(style: ImageStyle) -> String {
        match style {
            ImageStyle::Short => SHORT_IMAGE,
            ImageStyle::Detailed => DETAILED_IMAGE,
            ImageStyle::Technical => TECHNICAL_IMAGE,
            ImageStyle::Descriptive => DESCRIPTIVE_IMAGE,
        }
        .to_string()
    }

    pub fn build_count(object_name: &str) -> String {
        format!(
            "Count how many {object_name} are visible in this image. \
             Be precise and careful. Respond with only a number, or '0' if none are found. \
             If you cannot determine the exact count, provide your best estimate followed \
             by a brief explanation."
        )
    }

    /// Instruction text for any [`Instruction`]. Free-form text must not be
    /// blank.
    pub fn instruction_text(
        instruction: &Instruction,
        frame_timestamps: &[f64],
    ) -> Result<String, SummaryError> {
        match instruction {
            Instruction::Summary(style) => Ok(Self::build(*style, frame_timestamps)),
            Instruction::ImageAnalysis(style) => Ok(Self::build_image(*style)),
            Instruction::Count(object) => {
                non_blank(object).map(Self::build_count)
            }
            Instruction::Custom(prompt) => non_blank(prompt).map(str::to_string),
        }
    }
}

fn non_blank(text: &str) -> Result<&str, SummaryError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(SummaryError::InvalidPrompt)
    } else {
        Ok(trimmed)
    }
}

/// `[0.0, 2.5, 0.25]` -> `"0.0s, 2.5s, 0.25s"`.
///
/// Each value is printed with the shortest digits that parse back to the
/// same `f64`, so distinct timestamps never collapse into one label.
pub fn format_timestamps(timestamps: &[f64]) -> String {
    timestamps
        .iter()
        .map(|&t| format!("{}s", format_seconds(t)))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_seconds(t: f64) -> String {
    let text = t.to_string();
    if text.contains('.') || !t.is_finite() {
        text
    } else {
        format!("{text}.0")
    }
}
