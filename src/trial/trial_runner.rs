//! # Sequential trial runner
//!
//! Evaluates a pipeline frame by frame, in frame order, writing every frame's
//! outputs into its slot of two flat buffers, then structures them into a
//! [`StructuredResult`].
//!
//! ### Cancellation
//! [`TrialRunner::run_with_cancel`] calls `should_cancel()` on **wall-clock
//! intervals** (not every frame), so the cancellation latency stays roughly
//! constant whatever the per-frame cost. A cancelled run returns
//! [`CgmError::Cancelled`] and no partial result.
//!
//! ### Progress UI (feature: `progress`)
//! With the `progress` feature the loop renders an `indicatif` bar with the
//! smoothed frame rate and the slowest frame so far.
//!
//! The block loop `evaluate_block` is shared with the parallel dispatcher: each
//! worker runs it on its own frame block and its own output chunks.

use std::ops::Range;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::{
    cgm_errors::CgmError,
    eval::FrameEvaluator,
    markers::MarkerSet,
    pipeline::Pipeline,
    trial::structured_result::StructuredResult,
};

#[cfg(feature = "progress")]
use super::progress_bar::FrameRate;
#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};

/// Evaluate the frames of `frames` into `axis_out` and `angle_out`.
///
/// Arguments
/// -----------------
/// * `axis_out`, `angle_out` - Output chunks of exactly `frames.len()` frames, in
///   the pipeline's layout.
/// * `checkpoint` - Called with the absolute frame index before each frame; an
///   error stops the block and is returned as is.
///
/// Return
/// ----------
/// * The first evaluation error, wrapped with its absolute frame index.
pub(crate) fn evaluate_block<C>(
    pipeline: &Pipeline,
    markers: &MarkerSet,
    frames: Range<usize>,
    axis_out: &mut [f64],
    angle_out: &mut [f64],
    mut checkpoint: C,
) -> Result<(), CgmError>
where
    C: FnMut(usize) -> Result<(), CgmError>,
{
    let layout = pipeline.registry().layout();
    let (axis_len, angle_len) = layout.buffer_lens(frames.len());
    if axis_out.len() != axis_len {
        return Err(CgmError::BufferShape {
            context: "axis output block",
            expected: axis_len,
            found: axis_out.len(),
        });
    }
    if angle_out.len() != angle_len {
        return Err(CgmError::BufferShape {
            context: "angle output block",
            expected: angle_len,
            found: angle_out.len(),
        });
    }

    let block = markers.frames(frames.clone())?;
    let frame_len = markers.floats_per_frame();
    let (axis_stride, angle_stride) = (
        layout.axis_floats_per_frame,
        layout.angle_floats_per_frame,
    );
    let mut evaluator = FrameEvaluator::new();

    for (i, frame) in frames.enumerate() {
        checkpoint(frame)?;
        let buffer = &block[i * frame_len..(i + 1) * frame_len];
        evaluator
            .evaluate(pipeline, buffer)
            .map_err(|e| e.at_frame(frame))?;
        evaluator.write_flat(
            &mut axis_out[i * axis_stride..(i + 1) * axis_stride],
            &mut angle_out[i * angle_stride..(i + 1) * angle_stride],
        );
    }
    Ok(())
}

/// Sequential runner over one subject's frames.
#[derive(Debug, Clone, Copy)]
pub struct TrialRunner<'a> {
    pipeline: &'a Pipeline,
    markers: &'a MarkerSet,
}

impl<'a> TrialRunner<'a> {
    pub fn new(pipeline: &'a Pipeline, markers: &'a MarkerSet) -> Self {
        TrialRunner { pipeline, markers }
    }

    /// Evaluate `frames` in order and structure the result, re-indexed from zero.
    pub fn run(&self, frames: Range<usize>) -> Result<StructuredResult, CgmError> {
        self.run_with_cancel(frames, Duration::MAX, || false)
    }

    /// Same as [`run`](Self::run), polling `should_cancel` before the first frame
    /// and then every `poll_interval`.
    pub fn run_with_cancel<F>(
        &self,
        frames: Range<usize>,
        poll_interval: Duration,
        mut should_cancel: F,
    ) -> Result<StructuredResult, CgmError>
    where
        F: FnMut() -> bool,
    {
        self.check_range(&frames)?;
        let num_frames = frames.len();
        let (axis_len, angle_len) = self.pipeline.registry().layout().buffer_lens(num_frames);
        let mut axes = vec![0.0; axis_len];
        let mut angles = vec![0.0; angle_len];

        info!(
            frames = num_frames,
            functions = self.pipeline.function_names().count(),
            "sequential trial run"
        );

        let mut progress = FrameProgress::new(num_frames);
        let mut last_poll: Option<Instant> = None;
        let outcome = evaluate_block(
            self.pipeline,
            self.markers,
            frames,
            &mut axes,
            &mut angles,
            |frame| {
                if last_poll.map_or(true, |t| t.elapsed() >= poll_interval) {
                    if should_cancel() {
                        return Err(CgmError::Cancelled);
                    }
                    last_poll = Some(Instant::now());
                }
                progress.tick(frame);
                Ok(())
            },
        );
        progress.finish();
        if let Err(e) = outcome {
            debug!(error = %e, "sequential trial run stopped");
            return Err(e);
        }

        StructuredResult::from_flat(self.pipeline.registry(), num_frames, axes, angles)
    }

    fn check_range(&self, frames: &Range<usize>) -> Result<(), CgmError> {
        let num_frames = self.markers.num_frames();
        if frames.start > frames.end || frames.end > num_frames {
            return Err(CgmError::FrameRange {
                start: frames.start,
                end: frames.end,
                num_frames,
            });
        }
        Ok(())
    }
}

#[cfg(feature = "progress")]
struct FrameProgress {
    bar: ProgressBar,
    rate: FrameRate,
}

#[cfg(feature = "progress")]
impl FrameProgress {
    fn new(num_frames: usize) -> Self {
        let bar = ProgressBar::new((num_frames as u64).max(1));
        bar.set_style(
            ProgressStyle::with_template(
                "{bar:40.cyan/blue} {pos}/{len} frames ({percent:>3}%) | ETA {eta_precise} | {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.enable_steady_tick(Duration::from_millis(200));
        FrameProgress {
            bar,
            rate: FrameRate::new(0.2),
        }
    }

    fn tick(&mut self, frame: usize) {
        self.rate.tick(frame);
        self.bar.set_message(self.rate.message());
        self.bar.inc(1);
    }

    fn finish(&self) {
        self.bar.disable_steady_tick();
        self.bar.finish_and_clear();
    }
}

#[cfg(not(feature = "progress"))]
struct FrameProgress;

#[cfg(not(feature = "progress"))]
impl FrameProgress {
    fn new(_num_frames: usize) -> Self {
        FrameProgress
    }

    #[inline]
    fn tick(&mut self, _frame: usize) {}

    #[inline]
    fn finish(&self) {}
}
