use std::path::Path;

use crate::shared::error::SummaryError;
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;

/// Random-access frame source over a video or image file.
///
/// Implementations handle I/O details (codec, container format, scaling)
/// while the sampler works with the abstract `Frame` and `VideoMetadata`
/// types. One reader holds at most one open source at a time.
pub trait VideoReader: Send {
    /// Opens the file and returns its metadata. Frames handed out later are
    /// downscaled so their width does not exceed `max_width`.
    fn open(&mut self, path: &Path, max_width: Option<u32>)
        -> Result<VideoMetadata, SummaryError>;

    /// Decodes the frame on screen at `seconds` from the start of the source.
    fn frame_at(&mut self, seconds: f64) -> Result<Frame, Box<dyn std::error::Error>>;

    /// Releases the decoder and file handle. Safe to call more than once.
    fn close(&mut self);
}
