use std::path::PathBuf;

use thiserror::Error;

/// Failures of a summary invocation.
///
/// Every variant except [`SummaryError::FrameDecodeSkipped`] aborts the
/// invocation and is returned to the caller unchanged. Skips are logged and
/// counted by the sampler.
#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("cannot open video source {path}: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },
    #[error("no frames could be extracted from {path}")]
    NoFramesExtracted { path: PathBuf },
    #[error("skipped frame at {timestamp:.2}s: {reason}")]
    FrameDecodeSkipped { timestamp: f64, reason: String },
    #[error("failed to encode frame: {0}")]
    Encode(String),
    #[error("encoded payload is {size} bytes at quality {quality}, limit is {limit} bytes")]
    PayloadTooLarge {
        size: usize,
        limit: usize,
        quality: u8,
    },
    #[error("unknown style '{0}'")]
    UnknownStyle(String),
    #[error("sampling interval must be a positive number of seconds, got {0}")]
    InvalidInterval(f64),
    #[error("sampling every {interval}s over {span:.2}s exceeds the limit of {limit} frames")]
    TooManyFrames {
        interval: f64,
        span: f64,
        limit: usize,
    },
    #[error("invalid time range: {0}")]
    InvalidTimeRange(String),
    #[error("JPEG quality must be between 1 and 100, got {0}")]
    InvalidQuality(u8),
    #[error("prompt text must not be empty")]
    InvalidPrompt,
    #[error("remote model request failed: {0}")]
    RemoteRequestFailed(#[from] RemoteError),
}

/// Failures reported by the remote model collaborator.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("authentication rejected: {0}")]
    Authentication(String),
    #[error("quota or rate limit exceeded: {0}")]
    Quota(String),
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("API returned status {status}: {message}")]
    Api { status: u16, message: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_error_converts_into_summary_error() {
        let err: SummaryError = RemoteError::Quota("slow down".into()).into();
        assert!(matches!(
            err,
            SummaryError::RemoteRequestFailed(RemoteError::Quota(_))
        ));
        assert!(err.to_string().contains("slow down"));
    }

    #[test]
    fn test_messages_name_the_input() {
        let err = SummaryError::UnknownStyle("bogus".into());
        assert_eq!(err.to_string(), "unknown style 'bogus'");

        let err = SummaryError::NoFramesExtracted {
            path: PathBuf::from("clip.mp4"),
        };
        assert!(err.to_string().contains("clip.mp4"));
    }
}
