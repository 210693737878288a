pub mod cgm;
pub mod cgm_errors;
pub mod constants;
pub mod eval;
pub mod geometry;
pub mod markers;
pub mod measurements;
pub mod pipeline;
pub mod registry;
pub mod subjects;
pub mod trial;

pub use crate::{
    cgm::{Cgm, ModelState},
    cgm_errors::{ArgumentError, CgmError, ConfigurationError},
    eval::{Arg, Args, FrameResult},
    markers::MarkerSet,
    measurements::MeasurementSet,
    pipeline::{
        function_spec::{CgmFunction, FunctionSpec},
        params::ParamRequest,
        EntryKind,
    },
    subjects::{SubjectResults, SubjectSet},
    trial::{cancel::CancelToken, run_params::RunParams, structured_result::StructuredResult},
};
