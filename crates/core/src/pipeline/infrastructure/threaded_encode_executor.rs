use crate::encoding::domain::encoded_frame::EncodedFrame;
use crate::encoding::domain::frame_encoder::FrameEncoder;
use crate::pipeline::encode_executor::{EncodeExecutor, SequentialEncodeExecutor};
use crate::shared::error::SummaryError;
use crate::shared::frame::SampledFrame;

const DEFAULT_CHANNEL_CAPACITY: usize = 8;

type EncodeResult = (usize, Result<EncodedFrame, SummaryError>);

/// Encodes frames on a pool of scoped worker threads.
///
/// Layout: `main [enqueue] → workers [encode] → main [reassemble]`
///
/// Frames are tagged with their position so the output keeps sampling
/// order regardless of which worker finishes first.
pub struct ThreadedEncodeExecutor {
    workers: usize,
    channel_capacity: usize,
}

impl ThreadedEncodeExecutor {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// One worker per available core.
    pub fn with_available_parallelism() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(workers)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }
}

impl Default for ThreadedEncodeExecutor {
    fn default() -> Self {
        Self::with_available_parallelism()
    }
}

impl EncodeExecutor for ThreadedEncodeExecutor {
    fn encode_all(
        &self,
        encoder: &dyn FrameEncoder,
        frames: &[SampledFrame],
        quality: u8,
    ) -> Result<Vec<EncodedFrame>, SummaryError> {
        let workers = self.workers.min(frames.len());
        if workers <= 1 {
            return SequentialEncodeExecutor.encode_all(encoder, frames, quality);
        }

        let (job_tx, job_rx) =
            crossbeam_channel::bounded::<(usize, &SampledFrame)>(self.channel_capacity);
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<EncodeResult>();

        std::thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for (index, frame) in job_rx {
                        if result_tx.send((index, encoder.encode(frame, quality))).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(result_tx);

            for job in frames.iter().enumerate() {
                if job_tx.send(job).is_err() {
                    break;
                }
            }
            drop(job_tx);
        });

        reassemble(result_rx, frames.len())
    }
}

/// Puts worker results back in input order, surfacing the error of the
/// earliest failing frame.
fn reassemble(
    results: crossbeam_channel::Receiver<EncodeResult>,
    count: usize,
) -> Result<Vec<EncodedFrame>, SummaryError> {
    let mut slots: Vec<Option<EncodedFrame>> = vec![None; count];
    let mut first_error: Option<(usize, SummaryError)> = None;

    for (index, result) in results {
        match result {
            Ok(encoded) => slots[index] = Some(encoded),
            Err(e) => {
                if first_error.as_ref().map_or(true, |(i, _)| index < *i) {
                    first_error = Some((index, e));
                }
            }
        }
    }

    if let Some((_, e)) = first_error {
        return Err(e);
    }
    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| {
            slot.ok_or_else(|| SummaryError::Encode(format!("frame {i} was never encoded")))
        })
        .collect()
}
