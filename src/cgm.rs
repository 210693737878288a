//! # Cgm: one subject's gait model
//!
//! [`Cgm`] is the façade that ties together:
//!
//! 1. **Subject data** – the [`MarkerSet`] of the trial and the calibrated
//!    [`MeasurementSet`], both fixed at construction.
//! 2. **Pipeline** – the ordered axis and angle functions with their bound
//!    arguments, and the [`ResultKeyRegistry`] of their outputs.
//! 3. **Runs** – sequential, cancellable and parallel evaluation of the trial
//!    into a [`StructuredResult`].
//!
//! ## Lifecycle
//!
//! A model starts in [`ModelState::Configuring`]: functions may be overridden or
//! added. The first run moves it to [`ModelState::Locked`]; from then on every
//! configuration call fails with
//! [`ConfigurationError::ModelLocked`](crate::cgm_errors::ConfigurationError::ModelLocked).
//! Runs themselves can be repeated and are idempotent.
//!
//! ## Typical usage
//!
//! ```rust,no_run
//! use cgm::{Cgm, FunctionSpec, MarkerSet, MeasurementSet, RunParams};
//! use cgm::constants::Axis;
//!
//! # let markers: MarkerSet = unimplemented!();
//! let measurements = MeasurementSet::new()
//!     .with("MeanLegLength", 940.0)
//!     .with("InterAsisDistance", 250.0);
//! let mut model = Cgm::new(measurements, markers).unwrap();
//!
//! // Replace the pelvis with a user function reading the same markers.
//! model
//!     .override_function(
//!         FunctionSpec::new("pelvis_axis")
//!             .axis_function(|_args| Ok(vec![Axis::identity()]))
//!             .markers(["RASI", "LASI", "RPSI", "LPSI", "SACR"]),
//!     )
//!     .unwrap();
//!
//! let result = model.run_parallel(&RunParams::default()).unwrap();
//! let rknee = result.frame(0).unwrap().angle("RKnee");
//! ```

use std::fmt;
use std::ops::Range;

use tracing::info;

use crate::{
    cgm_errors::{CgmError, ConfigurationError},
    constants::Axis,
    eval::{FrameEvaluator, FrameResult},
    markers::{MarkerSet, MarkerSlice},
    measurements::MeasurementSet,
    pipeline::{
        defaults::default_specs,
        function_spec::FunctionSpec,
        params::{MissingInput, ParamBinder},
        Pipeline,
    },
    registry::{FrameLayout, ResultKeyRegistry},
    trial::{
        cancel::CancelToken, parallel::ParallelDispatcher, run_params::RunParams,
        structured_result::StructuredResult, trial_runner::TrialRunner,
    },
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelState {
    Configuring,
    Locked,
}

#[derive(Debug, Clone)]
pub struct Cgm {
    markers: MarkerSet,
    measurements: MeasurementSet,
    pipeline: Pipeline,
    state: ModelState,
}

impl Cgm {
    /// Build a model running the default pipeline of
    /// [`pipeline::defaults`](crate::pipeline::defaults).
    pub fn new(measurements: MeasurementSet, markers: MarkerSet) -> Result<Self, CgmError> {
        Self::with_specs(measurements, markers, default_specs())
    }

    /// Build a model from user declarations, registered in order.
    pub fn with_specs(
        measurements: MeasurementSet,
        markers: MarkerSet,
        specs: impl IntoIterator<Item = FunctionSpec>,
    ) -> Result<Self, CgmError> {
        let pipeline = {
            let binder = ParamBinder::new(&markers, &measurements);
            Pipeline::from_specs(specs, &binder)?
        };
        info!(
            frames = markers.num_frames(),
            markers = markers.marker_names().len(),
            measurements = measurements.len(),
            layout = %pipeline.registry().layout(),
            "model built"
        );
        Ok(Cgm {
            markers,
            measurements,
            pipeline,
            state: ModelState::Configuring,
        })
    }

    /// A model with no function registered; build its pipeline with
    /// [`add_function`](Self::add_function).
    pub fn empty(measurements: MeasurementSet, markers: MarkerSet) -> Self {
        Cgm {
            markers,
            measurements,
            pipeline: Pipeline::new(),
            state: ModelState::Configuring,
        }
    }

    pub fn markers(&self) -> &MarkerSet {
        &self.markers
    }

    pub fn measurements(&self) -> &MeasurementSet {
        &self.measurements
    }

    pub fn marker_slice(&self, name: &str) -> Option<MarkerSlice> {
        self.markers.slice_of(name)
    }

    pub fn measurement_value(&self, name: &str) -> Option<f64> {
        self.measurements.value_of(name)
    }

    pub fn axis_index(&self, name: &str) -> Option<usize> {
        self.pipeline.registry().axis_index(name)
    }

    pub fn angle_index(&self, name: &str) -> Option<usize> {
        self.pipeline.registry().angle_index(name)
    }

    pub fn axis_names(&self) -> &[String] {
        self.pipeline.registry().axis_names()
    }

    pub fn angle_names(&self) -> &[String] {
        self.pipeline.registry().angle_names()
    }

    /// Per-frame float counts of the current registry.
    pub fn layout(&self) -> FrameLayout {
        self.pipeline.registry().layout()
    }

    pub fn registry(&self) -> &ResultKeyRegistry {
        self.pipeline.registry()
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Arguments that bound to no marker, measurement or result.
    pub fn missing_inputs(&self) -> Vec<MissingInput> {
        self.pipeline.missing_inputs()
    }

    pub fn state(&self) -> ModelState {
        self.state
    }

    pub fn is_locked(&self) -> bool {
        self.state == ModelState::Locked
    }

    fn ensure_configurable(&self, function: &str) -> Result<(), ConfigurationError> {
        match self.state {
            ModelState::Configuring => Ok(()),
            ModelState::Locked => Err(ConfigurationError::ModelLocked(function.to_string())),
        }
    }

    /// Replace a registered function's arguments, and optionally its callable and
    /// outputs. See [`Pipeline::override_function`].
    ///
    /// On error the model is unchanged.
    pub fn override_function(&mut self, spec: FunctionSpec) -> Result<(), CgmError> {
        self.ensure_configurable(&spec.name)?;
        let binder = ParamBinder::new(&self.markers, &self.measurements);
        self.pipeline.override_function(spec, &binder)?;
        Ok(())
    }

    /// Append a function to the axis or the angle pipeline, depending on which
    /// output list `spec` declares. See [`Pipeline::add_function`].
    ///
    /// On error the model is unchanged.
    pub fn add_function(&mut self, spec: FunctionSpec) -> Result<(), CgmError> {
        self.ensure_configurable(&spec.name)?;
        let binder = ParamBinder::new(&self.markers, &self.measurements);
        self.pipeline.add_function(spec, &binder)?;
        Ok(())
    }

    /// Evaluate a single frame, without locking the model.
    pub fn calc(&self, frame: usize) -> Result<FrameResult, CgmError> {
        let buffer = self
            .markers
            .frame(frame)
            .ok_or(CgmError::FrameRange {
                start: frame,
                end: frame + 1,
                num_frames: self.markers.num_frames(),
            })?;
        let mut evaluator = FrameEvaluator::new();
        evaluator
            .evaluate(&self.pipeline, buffer)
            .map_err(|e| e.at_frame(frame))?;
        Ok(evaluator.to_result())
    }

    /// Axis `name` of a single frame.
    pub fn calc_axis(&self, frame: usize, name: &str) -> Result<Option<Axis>, CgmError> {
        let result = self.calc(frame)?;
        Ok(self
            .axis_index(name)
            .and_then(|i| result.axes.get(i).copied()))
    }

    fn lock(&mut self) {
        if self.state == ModelState::Configuring {
            info!(functions = self.pipeline.function_names().count(), "model locked");
            self.state = ModelState::Locked;
        }
    }

    /// Evaluate every frame sequentially.
    pub fn run_all(&mut self) -> Result<StructuredResult, CgmError> {
        self.run_range(0..self.markers.num_frames())
    }

    /// Evaluate the frames of `frames` sequentially; the result is re-indexed from zero.
    pub fn run_range(&mut self, frames: Range<usize>) -> Result<StructuredResult, CgmError> {
        self.lock();
        TrialRunner::new(&self.pipeline, &self.markers).run(frames)
    }

    /// Evaluate every frame sequentially, polling `should_cancel` every
    /// [`RunParams::DEFAULT_POLL_INTERVAL`].
    pub fn run_all_with_cancel<F>(&mut self, should_cancel: F) -> Result<StructuredResult, CgmError>
    where
        F: FnMut() -> bool,
    {
        self.lock();
        TrialRunner::new(&self.pipeline, &self.markers).run_with_cancel(
            0..self.markers.num_frames(),
            RunParams::DEFAULT_POLL_INTERVAL,
            should_cancel,
        )
    }

    /// Evaluate every frame on `params.workers` threads.
    pub fn run_parallel(&mut self, params: &RunParams) -> Result<StructuredResult, CgmError> {
        self.run_parallel_with_cancel(params, &CancelToken::new())
    }

    pub fn run_parallel_with_cancel(
        &mut self,
        params: &RunParams,
        cancel: &CancelToken,
    ) -> Result<StructuredResult, CgmError> {
        self.lock();
        ParallelDispatcher::new(&self.pipeline, &self.markers).run(params, cancel)
    }
}

impl fmt::Display for Cgm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Cgm ({:?}): {} frames, {} markers, {} measurements",
            self.state,
            self.markers.num_frames(),
            self.markers.marker_names().len(),
            self.measurements.len()
        )?;
        writeln!(f, "  {}", self.layout())?;
        if f.alternate() {
            for entry in self.pipeline.axis_entries() {
                writeln!(f, "  axis  {:<18} -> {}", entry.name(), entry.outputs().join(", "))?;
            }
            for entry in self.pipeline.angle_entries() {
                writeln!(f, "  angle {:<18} -> {}", entry.name(), entry.outputs().join(", "))?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod cgm_test {
    use super::*;
    use crate::constants::{Angle, Point};

    fn model() -> Cgm {
        let frames = (0..4)
            .map(|i| vec![("A", Point::new(i as f64, 0.0, 0.0))])
            .collect::<Vec<_>>();
        let markers = MarkerSet::from_frames(frames).unwrap();
        Cgm::with_specs(
            MeasurementSet::new(),
            markers,
            [FunctionSpec::new("a")
                .angle_function(|args| Ok(vec![args.point_or_nan(0)?]))
                .marker("A")
                .returns_angles(["A"])],
        )
        .unwrap()
    }

    #[test]
    fn test_run_locks_configuration() {
        let mut m = model();
        assert_eq!(m.state(), ModelState::Configuring);
        m.calc(1).unwrap();
        assert!(!m.is_locked());

        m.run_all().unwrap();
        assert!(m.is_locked());
        let err = m
            .add_function(
                FunctionSpec::new("b")
                    .angle_function(|_| Ok(vec![Angle::zeros()]))
                    .returns_angles(["B"]),
            )
            .unwrap_err();
        assert_eq!(
            err,
            CgmError::Configuration(ConfigurationError::ModelLocked("b".into()))
        );
        assert_eq!(m.angle_names().to_vec(), vec!["A".to_string()]);
    }

    #[test]
    fn test_calc_single_frame() {
        let m = model();
        assert_eq!(m.calc(2).unwrap().angles, vec![Angle::new(2.0, 0.0, 0.0)]);
        assert!(matches!(m.calc(4), Err(CgmError::FrameRange { .. })));
        assert_eq!(m.calc_axis(0, "Pelvis").unwrap(), None);
    }
}
