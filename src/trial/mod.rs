//! # Trial execution
//!
//! Running a configured pipeline over the frames of one subject.
//!
//! Components
//! -----------------
//! * [`trial_runner`] – Sequential evaluation of all frames or a sub-range, with
//!   optional cooperative cancellation and a progress bar (feature `progress`).
//! * [`parallel`] – Contiguous frame blocks evaluated on scoped worker threads,
//!   each owning a disjoint region of the output buffers.
//! * [`run_params`] – Worker count, deadline and poll interval of a parallel run.
//! * [`cancel`] – Cancellation token shared between a caller and the workers.
//! * [`structured_result`] – Frame- and name-indexed view over the flat outputs.

pub mod cancel;
pub mod parallel;
#[cfg(feature = "progress")]
pub mod progress_bar;
pub mod run_params;
pub mod structured_result;
pub mod trial_runner;
