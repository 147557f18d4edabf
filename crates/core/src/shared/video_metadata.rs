use std::path::PathBuf;

/// Properties of an opened video source.
///
/// `width`/`height` describe the frames the reader will hand out, which may
/// already be downscaled from the stream's native size.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoMetadata {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub duration_seconds: f64,
    pub codec: String,
    pub source_path: Option<PathBuf>,
}
