use std::ops::Range;

use thiserror::Error;

use crate::pipeline::EntryKind;

/// Errors raised synchronously by [`override_function`](crate::cgm::Cgm::override_function)
/// and [`add_function`](crate::cgm::Cgm::add_function).
///
/// A configuration call that fails leaves the model exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("Unknown function '{0}': it is registered neither as an axis nor as an angle function")]
    UnknownFunction(String),

    #[error("Function '{0}' declares both axis and angle outputs")]
    AmbiguousReturnKind(String),

    #[error("Function '{0}' declares neither axis nor angle outputs")]
    MissingReturnKind(String),

    #[error("Function '{0}' has no callable attached")]
    MissingFunction(String),

    #[error("Function '{function}' is an {expected} function, got {found} outputs or callable")]
    KindMismatch {
        function: String,
        expected: EntryKind,
        found: EntryKind,
    },

    #[error("Function '{0}' is already registered, use override_function to replace it")]
    DuplicateFunction(String),

    #[error("Function '{0}' declares an empty output list")]
    EmptyOutputs(String),

    #[error("Function '{function}' declares output '{name}' which is already registered")]
    DuplicateOutputName { function: String, name: String },

    #[error(
        "Function '{function}' reads {kind} '{reference}' before it is produced (evaluation follows declaration order)"
    )]
    OrderingHazard {
        function: String,
        reference: String,
        kind: EntryKind,
    },

    #[error("Model is locked after its first run, cannot reconfigure '{0}'")]
    ModelLocked(String),
}

/// Errors raised by the [`Args`](crate::eval::Args) accessors when a geometry function
/// reads its argument list.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArgumentError {
    #[error("Function '{function}' asked for argument {index} but only {len} were bound")]
    OutOfRange {
        function: String,
        index: usize,
        len: usize,
    },

    #[error("Function '{function}' expected argument {index} to be a {expected}, found a {found}")]
    Kind {
        function: String,
        index: usize,
        expected: &'static str,
        found: &'static str,
    },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CgmError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Argument error: {0}")]
    Argument(#[from] ArgumentError),

    #[error("Function '{function}' returned {found} results for {expected} declared outputs")]
    OutputArity {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("Evaluation failed at frame {frame}: {source}")]
    Frame {
        frame: usize,
        #[source]
        source: Box<CgmError>,
    },

    #[error("Frame range {start}..{end} is out of bounds for a trial of {num_frames} frames")]
    FrameRange {
        start: usize,
        end: usize,
        num_frames: usize,
    },

    #[error("Inconsistent marker layout: {0}")]
    MarkerLayout(String),

    #[error("Buffer of {found} floats does not match the expected {expected} floats ({context})")]
    BufferShape {
        context: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("Invalid run parameter: {0}")]
    InvalidRunParameter(String),

    #[error("Worker {worker} failed on frames {frames:?}: {source}")]
    WorkerFailed {
        worker: usize,
        frames: Range<usize>,
        #[source]
        source: Box<CgmError>,
    },

    #[error("Worker {worker} panicked while evaluating frames {frames:?}")]
    WorkerPanicked { worker: usize, frames: Range<usize> },

    #[error("Worker {worker} exceeded the run deadline at frame {frame}")]
    DeadlineExceeded { worker: usize, frame: usize },

    #[error("Run cancelled")]
    Cancelled,

    #[error("Subject '{subject}' failed: {source}")]
    SubjectFailed {
        subject: String,
        #[source]
        source: Box<CgmError>,
    },
}

impl CgmError {
    /// Wrap an error with the index of the frame it was raised on.
    pub(crate) fn at_frame(self, frame: usize) -> Self {
        CgmError::Frame {
            frame,
            source: Box::new(self),
        }
    }

    /// True for every error raised by a configuration call.
    pub fn is_configuration(&self) -> bool {
        matches!(self, CgmError::Configuration(_))
    }

    /// Walk down `Frame`, `WorkerFailed` and `SubjectFailed` wrappers to the error
    /// that was actually raised.
    pub fn root_cause(&self) -> &CgmError {
        match self {
            CgmError::Frame { source, .. }
            | CgmError::WorkerFailed { source, .. }
            | CgmError::SubjectFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
