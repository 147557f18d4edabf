use std::path::Path;
use std::time::Instant;

use crate::encoding::domain::encoded_frame::EncodedFrame;
use crate::encoding::domain::frame_encoder::FrameEncoder;
use crate::pipeline::encode_executor::{EncodeExecutor, SequentialEncodeExecutor};
use crate::pipeline::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use crate::pipeline::pipeline_state::PipelineState;
use crate::prompt::instruction::Instruction;
use crate::prompt::prompt_builder::PromptBuilder;
use crate::remote::domain::summary_request::{SummaryRequest, SummaryResult};
use crate::remote::domain::vision_model::VisionModel;
use crate::shared::constants::{COUNT_MAX_TOKENS, DEFAULT_MAX_TOKENS};
use crate::shared::error::SummaryError;
use crate::shared::frame::SampledFrame;
use crate::video::domain::frame_sampler::{FrameSampler, SamplingOptions};
use crate::video::domain::video_reader::VideoReader;

/// Shared orchestration behind every summary and analysis call:
/// sample → encode → build prompt → one remote request.
///
/// Each `run` is independent. The pipeline keeps no frames or responses
/// between runs; only the last [`PipelineState`] is retained for callers
/// that want to inspect how far a failed run got.
pub struct SummaryPipeline {
    sampler: FrameSampler,
    encoder: Box<dyn FrameEncoder>,
    executor: Box<dyn EncodeExecutor>,
    model: Box<dyn VisionModel>,
    logger: Box<dyn PipelineLogger>,
    options: SamplingOptions,
    max_tokens: u32,
    state: PipelineState,
}

impl SummaryPipeline {
    pub fn new(
        reader: Box<dyn VideoReader>,
        encoder: Box<dyn FrameEncoder>,
        model: Box<dyn VisionModel>,
    ) -> Self {
        Self {
            sampler: FrameSampler::new(reader),
            encoder,
            executor: Box::new(SequentialEncodeExecutor),
            model,
            logger: Box::new(NullPipelineLogger),
            options: SamplingOptions::default(),
            max_tokens: DEFAULT_MAX_TOKENS,
            state: PipelineState::Idle,
        }
    }

    pub fn with_sampling(mut self, options: SamplingOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_executor(mut self, executor: Box<dyn EncodeExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn sampling_options(&self) -> &SamplingOptions {
        &self.options
    }

    /// Runs the whole pipeline for one source and one instruction.
    ///
    /// The remote model is called at most once, and never when no frame
    /// could be extracted or the instruction is invalid.
    pub fn run(
        &mut self,
        path: &Path,
        instruction: &Instruction,
    ) -> Result<SummaryResult, SummaryError> {
        self.transition(PipelineState::Idle);
        let result = self.execute(path, instruction);
        match &result {
            Ok(_) => {
                self.transition(PipelineState::Done);
                self.logger.summary();
            }
            Err(e) => {
                log::debug!("Pipeline for {} failed in {}: {e}", path.display(), self.state);
                self.transition(PipelineState::Failed);
            }
        }
        result
    }

    fn execute(
        &mut self,
        path: &Path,
        instruction: &Instruction,
    ) -> Result<SummaryResult, SummaryError> {
        // Free-form text is validated before any decoding work.
        PromptBuilder::instruction_text(instruction, &[])?;

        self.transition(PipelineState::Sampling);
        let started = Instant::now();
        let frames = self.sample(path)?;
        self.logger.timing("sample", elapsed_ms(started));
        self.logger.metric("frames", frames.len() as f64);
        self.logger.info(&format!(
            "Extracted {} frames from {}",
            frames.len(),
            path.display()
        ));

        self.transition(PipelineState::Encoding);
        let started = Instant::now();
        let encoded = self.encode_uniform(&frames)?;
        drop(frames);
        self.logger.timing("encode", elapsed_ms(started));

        self.transition(PipelineState::PromptBuilding);
        let started = Instant::now();
        let timestamps: Vec<f64> = encoded.iter().map(|f| f.timestamp).collect();
        let instruction_text = PromptBuilder::instruction_text(instruction, &timestamps)?;
        let request = SummaryRequest {
            style: instruction.summary_style(),
            frames: encoded,
            instruction: instruction_text,
            max_tokens: self.max_tokens_for(instruction),
        };
        self.logger.timing("prompt", elapsed_ms(started));
        self.logger.metric("payload_bytes", request.payload_bytes() as f64);

        self.transition(PipelineState::Requesting);
        let started = Instant::now();
        let text = self.model.complete(&request)?;
        self.logger.timing("request", elapsed_ms(started));

        Ok(SummaryResult {
            text,
            frames_used: request.frames.len(),
            model: self.model.model_name().to_string(),
        })
    }

    fn sample(&mut self, path: &Path) -> Result<Vec<SampledFrame>, SummaryError> {
        let frames = self.sampler.sample(path, &self.options)?;
        frames.collect()
    }

    /// Encodes every frame at the same quality.
    ///
    /// When the size bound pushes any frame below the current quality, the
    /// whole batch is redone at the lowest quality seen. The lowest quality
    /// strictly decreases between rounds, so this terminates at the
    /// encoder's floor at the latest.
    fn encode_uniform(
        &mut self,
        frames: &[SampledFrame],
    ) -> Result<Vec<EncodedFrame>, SummaryError> {
        let mut quality = self.encoder.default_quality();
        loop {
            let encoded = self
                .executor
                .encode_all(self.encoder.as_ref(), frames, quality)?;
            let lowest = encoded.iter().map(|f| f.quality).min().unwrap_or(quality);
            if encoded.iter().all(|f| f.quality == lowest) {
                self.logger.metric("encode_quality", f64::from(lowest));
                return Ok(encoded);
            }
            log::debug!(
                "Re-encoding {} frames at quality {lowest} to keep the request uniform",
                frames.len()
            );
            quality = lowest;
        }
    }

    fn max_tokens_for(&self, instruction: &Instruction) -> u32 {
        match instruction {
            Instruction::Count(_) => COUNT_MAX_TOKENS,
            _ => self.max_tokens,
        }
    }

    fn transition(&mut self, next: PipelineState) {
        if self.state != next {
            log::debug!("Pipeline state: {} -> {next}", self.state);
            self.state = next;
        }
    }
}

fn elapsed_ms(started: Instant) -> f64 {
    started.elapsed().as_secs_f64() * 1000.0
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::shared::error::RemoteError;
    use crate::shared::frame::Frame;
    use crate::shared::video_metadata::VideoMetadata;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    pub struct ReaderLog {
        pub opened: usize,
        pub closed: usize,
        pub requested: Vec<f64>,
    }

    /// Serves flat gray frames for any timestamp below `duration`.
    pub struct StubReader {
        pub duration: f64,
        pub width: u32,
        pub fail_decodes: bool,
        pub log: Arc<Mutex<ReaderLog>>,
    }

    impl StubReader {
        pub fn new(duration: f64) -> Self {
            Self {
                duration,
                width: 16,
                fail_decodes: false,
                log: Arc::new(Mutex::new(ReaderLog::default())),
            }
        }
    }

    impl VideoReader for StubReader {
        fn open(
            &mut self,
            path: &Path,
            _max_width: Option<u32>,
        ) -> Result<VideoMetadata, SummaryError> {
            if path.to_string_lossy().contains("missing") {
                return Err(SummaryError::SourceUnavailable {
                    path: path.to_path_buf(),
                    reason: "No such file or directory".into(),
                });
            }
            self.log.lock().unwrap().opened += 1;
            Ok(VideoMetadata {
                width: self.width,
                height: 12,
                fps: 30.0,
                duration_seconds: self.duration,
                codec: "stub".into(),
                source_path: Some(path.to_path_buf()),
            })
        }

        fn frame_at(&mut self, seconds: f64) -> Result<Frame, Box<dyn std::error::Error>> {
            self.log.lock().unwrap().requested.push(seconds);
            if self.fail_decodes {
                return Err("corrupt packet".into());
            }
            let value = (seconds * 10.0) as u8;
            Ok(Frame::new(
                vec![value; (self.width * 12 * 3) as usize],
                self.width,
                12,
                3,
            ))
        }

        fn close(&mut self) {
            self.log.lock().unwrap().closed += 1;
        }
    }

    /// Records every request and answers with a canned response.
    pub struct StubModel {
        pub response: Result<String, fn() -> RemoteError>,
        pub requests: Arc<Mutex<Vec<SummaryRequest>>>,
    }

    impl StubModel {
        pub fn answering(text: &str) -> Self {
            Self {
                response: Ok(text.to_string()),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn failing(error: fn() -> RemoteError) -> Self {
            Self {
                response: Err(error),
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    impl VisionModel for StubModel {
        fn model_name(&self) -> &str {
            "stub-vision"
        }

        fn complete(&self, request: &SummaryRequest) -> Result<String, RemoteError> {
            self.requests.lock().unwrap().push(request.clone());
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(make_error) => Err(make_error()),
            }
        }
    }
}
