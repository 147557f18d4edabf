use std::fmt;

/// Stages of one summary invocation.
///
/// Transitions are strictly sequential; `Failed` is reachable from any
/// stage and short-circuits the rest.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Sampling,
    Encoding,
    PromptBuilding,
    Requesting,
    Done,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Idle => "idle",
            PipelineState::Sampling => "sampling",
            PipelineState::Encoding => "encoding",
            PipelineState::PromptBuilding => "prompt-building",
            PipelineState::Requesting => "requesting",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        f.write_str(name)
    }
}
