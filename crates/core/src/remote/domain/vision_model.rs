use crate::shared::error::RemoteError;

use super::summary_request::SummaryRequest;

/// Domain interface for the remote vision-capable language model.
///
/// One blocking call per request; retries, if any, belong to the caller.
pub trait VisionModel: Send + Sync {
    /// Identifier of the model answering requests.
    fn model_name(&self) -> &str;

    /// Sends the frames and instruction and returns the response text.
    fn complete(&self, request: &SummaryRequest) -> Result<String, RemoteError>;
}
