use std::path::{Path, PathBuf};

use crate::shared::constants::{DEFAULT_INTERVAL_SECONDS, DEFAULT_MAX_WIDTH, MAX_SAMPLED_FRAMES};
use crate::shared::error::SummaryError;
use crate::shared::frame::SampledFrame;
use crate::shared::video_metadata::VideoMetadata;

use super::video_reader::VideoReader;

/// Absorbs float error when dividing a duration by the interval.
const EPSILON: f64 = 1e-9;

/// How frames are picked out of a source.
#[derive(Clone, Debug, PartialEq)]
pub struct SamplingOptions {
    pub interval_seconds: f64,
    pub start_time: Option<f64>,
    pub end_time: Option<f64>,
    pub max_width: Option<u32>,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            interval_seconds: DEFAULT_INTERVAL_SECONDS,
            start_time: None,
            end_time: None,
            max_width: Some(DEFAULT_MAX_WIDTH),
        }
    }
}

/// Timestamps are snapped to this grid (microseconds, ffmpeg's time base).
const TIMESTAMP_RESOLUTION: f64 = 1_000_000.0;

/// Intervals finer than the timestamp grid would schedule duplicates.
const MIN_INTERVAL_SECONDS: f64 = 1.0 / TIMESTAMP_RESOLUTION;

fn is_usable_interval(interval: f64) -> bool {
    interval.is_finite() && interval >= MIN_INTERVAL_SECONDS
}

/// Timestamps `start, start + interval, ...` up to and including `end`.
///
/// Always contains `start`, so a source shorter than one interval still
/// yields one frame. Fails with `TooManyFrames` when the schedule would
/// exceed [`MAX_SAMPLED_FRAMES`].
pub fn sample_timestamps(
    start: f64,
    end: f64,
    interval: f64,
) -> Result<Vec<f64>, SummaryError> {
    if !is_usable_interval(interval) {
        return Err(SummaryError::InvalidInterval(interval));
    }

    let span = (end - start).max(0.0);
    let steps = (span / interval + EPSILON).floor();
    if !steps.is_finite() || steps >= MAX_SAMPLED_FRAMES as f64 {
        return Err(SummaryError::TooManyFrames {
            interval,
            span,
            limit: MAX_SAMPLED_FRAMES,
        });
    }

    let last = end.max(start);
    Ok((0..=steps as usize)
        .map(|i| snap(start + i as f64 * interval).min(last))
        .collect())
}

fn snap(seconds: f64) -> f64 {
    (seconds * TIMESTAMP_RESOLUTION).round() / TIMESTAMP_RESOLUTION
}

/// Resolves the optional window against the source duration.
pub fn resolve_window(
    duration: f64,
    options: &SamplingOptions,
) -> Result<(f64, f64), SummaryError> {
    let start = options.start_time.unwrap_or(0.0);
    let end = options.end_time.unwrap_or(duration);

    if start < 0.0 {
        return Err(SummaryError::InvalidTimeRange(format!(
            "start time cannot be negative: {start}"
        )));
    }
    if end > duration + EPSILON {
        return Err(SummaryError::InvalidTimeRange(format!(
            "end time ({end}s) exceeds video duration ({duration:.2}s)"
        )));
    }
    let windowed = options.start_time.is_some() || options.end_time.is_some();
    if windowed && start >= end {
        return Err(SummaryError::InvalidTimeRange(format!(
            "start time ({start}s) must be less than end time ({end}s)"
        )));
    }
    Ok((start, end.max(start)))
}

/// Picks frames at a fixed interval from a [`VideoReader`].
///
/// Holds no state between calls: each `sample` opens the source, and the
/// returned iterator closes it when exhausted or dropped.
pub struct FrameSampler {
    reader: Box<dyn VideoReader>,
}

impl FrameSampler {
    pub fn new(reader: Box<dyn VideoReader>) -> Self {
        Self { reader }
    }

    /// Opens `path` and returns a lazy sequence of frames in timestamp order.
    ///
    /// Fails with `SourceUnavailable` before any frame is produced if the
    /// file cannot be opened.
    pub fn sample(
        &mut self,
        path: &Path,
        options: &SamplingOptions,
    ) -> Result<SampledFrames<'_>, SummaryError> {
        let interval = options.interval_seconds;
        if !is_usable_interval(interval) {
            return Err(SummaryError::InvalidInterval(interval));
        }

        let metadata = match self.reader.open(path, options.max_width) {
            Ok(metadata) => metadata,
            Err(e) => {
                self.reader.close();
                return Err(e);
            }
        };

        // Constructed before validation so the guard releases the source
        // on the error path too.
        let mut frames = SampledFrames {
            reader: &mut *self.reader,
            path: path.to_path_buf(),
            metadata,
            timestamps: Vec::new().into_iter(),
            yielded: 0,
            skipped: Vec::new(),
            finished: false,
        };

        let (start, end) = resolve_window(frames.metadata.duration_seconds, options)?;
        let timestamps = sample_timestamps(start, end, interval)?;
        log::debug!(
            "Sampling {} at {interval}s intervals: {} candidate timestamps",
            path.display(),
            timestamps.len()
        );
        frames.timestamps = timestamps.into_iter();
        Ok(frames)
    }
}

/// Lazy, single-pass sequence of sampled frames.
///
/// Timestamps that fail to decode are skipped with a warning. If every
/// candidate is skipped the final item is `Err(NoFramesExtracted)`.
pub struct SampledFrames<'a> {
    reader: &'a mut dyn VideoReader,
    path: PathBuf,
    metadata: VideoMetadata,
    timestamps: std::vec::IntoIter<f64>,
    yielded: usize,
    skipped: Vec<f64>,
    finished: bool,
}

impl SampledFrames<'_> {
    pub fn metadata(&self) -> &VideoMetadata {
        &self.metadata
    }

    /// Timestamps skipped so far because they could not be decoded.
    pub fn skipped(&self) -> &[f64] {
        &self.skipped
    }
}

impl Iterator for SampledFrames<'_> {
    type Item = Result<SampledFrame, SummaryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        for timestamp in self.timestamps.by_ref() {
            match self.reader.frame_at(timestamp) {
                Ok(image) => {
                    self.yielded += 1;
                    return Some(Ok(SampledFrame::new(timestamp, image)));
                }
                Err(e) => {
                    let skip = SummaryError::FrameDecodeSkipped {
                        timestamp,
                        reason: e.to_string(),
                    };
                    log::warn!("{skip}");
                    self.skipped.push(timestamp);
                }
            }
        }

        self.finished = true;
        self.reader.close();
        if self.yielded == 0 {
            Some(Err(SummaryError::NoFramesExtracted {
                path: self.path.clone(),
            }))
        } else {
            None
        }
    }
}

impl Drop for SampledFrames<'_> {
    fn drop(&mut self) {
        self.reader.close();
    }
}
