//! # Parallel dispatcher
//!
//! Splits a trial into contiguous frame blocks and evaluates each block on its
//! own scoped thread.
//!
//! Ownership
//! -----------------
//! * Each worker gets a private clone of the pipeline (the geometry functions are
//!   `Arc`-shared) and a shared reference to the immutable marker data.
//! * The two flat output buffers are allocated once for the whole trial and cut
//!   with `split_at_mut` into one disjoint chunk per worker, so a worker can only
//!   ever write its own frames and no lock is needed.
//!
//! Failure
//! -----------------
//! The first failing worker raises a shared abort flag; its siblings stop at their
//! next frame boundary. The run then reports the failure of the lowest-numbered
//! worker that did not merely stop because of that flag or the cancel token:
//! [`CgmError::WorkerFailed`], [`CgmError::WorkerPanicked`] or
//! [`CgmError::DeadlineExceeded`]. A run stopped only through the
//! [`CancelToken`] returns [`CgmError::Cancelled`]. No partial result is returned.

use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::{
    cgm_errors::CgmError,
    markers::MarkerSet,
    pipeline::Pipeline,
    trial::{
        cancel::CancelToken, run_params::RunParams, structured_result::StructuredResult,
        trial_runner::evaluate_block,
    },
};

/// Split `0..n` into at most `k` contiguous blocks; the first `n % k` blocks
/// hold one extra frame. No block is empty.
pub fn array_split(n: usize, k: usize) -> Vec<Range<usize>> {
    let k = k.min(n);
    if k == 0 {
        return Vec::new();
    }
    let (base, extra) = (n / k, n % k);
    let mut start = 0;
    (0..k)
        .map(|i| {
            let len = base + usize::from(i < extra);
            let block = start..start + len;
            start += len;
            block
        })
        .collect()
}

/// Stop conditions shared by every worker of one run.
struct Watch<'a> {
    abort: &'a AtomicBool,
    cancel: &'a CancelToken,
    started: Instant,
    deadline: Option<Duration>,
    poll_interval: Duration,
}

impl Watch<'_> {
    /// Per-frame check of one worker. The flags are read every frame; the clock only
    /// every `poll_interval`.
    fn checkpoint(
        &self,
        worker: usize,
        last_poll: &mut Option<Instant>,
        frame: usize,
    ) -> Result<(), CgmError> {
        if self.abort.load(Ordering::Relaxed) || self.cancel.is_cancelled() {
            return Err(CgmError::Cancelled);
        }
        let Some(deadline) = self.deadline else {
            return Ok(());
        };
        let now = Instant::now();
        if last_poll.map_or(true, |t| now.duration_since(t) >= self.poll_interval) {
            *last_poll = Some(now);
            if now.duration_since(self.started) > deadline {
                return Err(CgmError::DeadlineExceeded { worker, frame });
            }
        }
        Ok(())
    }
}

/// Runs one subject's trial across worker threads.
#[derive(Debug, Clone, Copy)]
pub struct ParallelDispatcher<'a> {
    pipeline: &'a Pipeline,
    markers: &'a MarkerSet,
}

impl<'a> ParallelDispatcher<'a> {
    pub fn new(pipeline: &'a Pipeline, markers: &'a MarkerSet) -> Self {
        ParallelDispatcher { pipeline, markers }
    }

    /// Evaluate every frame with `params.workers` workers.
    ///
    /// The result is identical to a sequential run over the same frames.
    ///
    /// Errors
    /// ----------
    /// [`CgmError::InvalidRunParameter`] when `params` fails
    /// [`RunParams::validate`], before any worker starts.
    pub fn run(
        &self,
        params: &RunParams,
        cancel: &CancelToken,
    ) -> Result<StructuredResult, CgmError> {
        params.validate()?;
        let num_frames = self.markers.num_frames();
        let layout = self.pipeline.registry().layout();
        let (axis_len, angle_len) = layout.buffer_lens(num_frames);
        let mut axes = vec![0.0; axis_len];
        let mut angles = vec![0.0; angle_len];

        let blocks = array_split(num_frames, params.resolved_workers());
        info!(
            frames = num_frames,
            workers = blocks.len(),
            deadline = ?params.deadline,
            "parallel trial run"
        );

        let abort = AtomicBool::new(false);
        let watch = Watch {
            abort: &abort,
            cancel,
            started: Instant::now(),
            deadline: params.deadline,
            poll_interval: params.poll_interval,
        };

        let outcomes: Vec<Result<(), CgmError>> = std::thread::scope(|scope| {
            let mut axis_rest: &mut [f64] = &mut axes;
            let mut angle_rest: &mut [f64] = &mut angles;
            let mut handles = Vec::with_capacity(blocks.len());

            for (worker, frames) in blocks.iter().cloned().enumerate() {
                let (axis_chunk, axis_tail) = std::mem::take(&mut axis_rest)
                    .split_at_mut(frames.len() * layout.axis_floats_per_frame);
                axis_rest = axis_tail;
                let (angle_chunk, angle_tail) = std::mem::take(&mut angle_rest)
                    .split_at_mut(frames.len() * layout.angle_floats_per_frame);
                angle_rest = angle_tail;

                let pipeline = self.pipeline.clone();
                let markers = self.markers;
                let watch = &watch;
                let block = frames.clone();
                let handle = scope.spawn(move || {
                    let mut last_poll = None;
                    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                        evaluate_block(
                            &pipeline,
                            markers,
                            block.clone(),
                            axis_chunk,
                            angle_chunk,
                            |frame| watch.checkpoint(worker, &mut last_poll, frame),
                        )
                    }))
                    .unwrap_or_else(|_| {
                        Err(CgmError::WorkerPanicked {
                            worker,
                            frames: block.clone(),
                        })
                    });
                    if outcome.is_err() {
                        watch.abort.store(true, Ordering::Relaxed);
                    }
                    debug!(worker, frames = ?block, ok = outcome.is_ok(), "worker done");
                    outcome
                });
                handles.push((worker, frames, handle));
            }

            handles
                .into_iter()
                .map(|(worker, frames, handle)| {
                    handle
                        .join()
                        .unwrap_or(Err(CgmError::WorkerPanicked { worker, frames }))
                })
                .collect()
        });

        let failure = outcomes
            .into_iter()
            .zip(&blocks)
            .enumerate()
            .filter_map(|(worker, (outcome, frames))| {
                outcome.err().map(|e| tag_worker(e, worker, frames))
            })
            .reduce(|first, next| match first {
                CgmError::Cancelled => next,
                _ => first,
            });
        if let Some(err) = failure {
            return Err(err);
        }

        StructuredResult::from_flat(self.pipeline.registry(), num_frames, axes, angles)
    }
}

/// Attach the worker context to an evaluation error; stop reasons pass through.
fn tag_worker(err: CgmError, worker: usize, frames: &Range<usize>) -> CgmError {
    match err {
        CgmError::Cancelled
        | CgmError::DeadlineExceeded { .. }
        | CgmError::WorkerPanicked { .. } => err,
        other => CgmError::WorkerFailed {
            worker,
            frames: frames.clone(),
            source: Box::new(other),
        },
    }
}
