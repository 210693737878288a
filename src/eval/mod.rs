//! # Frame evaluation
//!
//! [`FrameEvaluator`] runs the pipeline on one frame of marker data: every axis entry
//! in declaration order, then every angle entry in declaration order. Each entry's
//! bound parameters are resolved into an [`Args`] list against
//!
//! - the frame buffer (markers),
//! - the values baked at bind time (measurements, literals),
//! - the results already produced in this frame (axes, angles).
//!
//! The evaluator keeps its result lists between calls only to reuse their
//! allocations; they are cleared at the start of every frame, so no state leaks
//! from one frame to the next.

use smallvec::SmallVec;

use crate::{
    cgm_errors::{ArgumentError, CgmError, ConfigurationError},
    constants::{Angle, Axis, Point, FLOATS_PER_ANGLE, FLOATS_PER_AXIS},
    pipeline::{function_spec::CgmFunction, params::BoundParam, EntryKind, Pipeline, PipelineEntry},
};

/// One resolved argument. `None` marks an input the subject does not provide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Arg<'a> {
    Point(Option<Point>),
    Scalar(Option<f64>),
    Axis(Option<&'a Axis>),
    Angle(Option<&'a Angle>),
    Literal(f64),
}

impl Arg<'_> {
    fn kind_name(&self) -> &'static str {
        match self {
            Arg::Point(_) => "marker",
            Arg::Scalar(_) => "measurement",
            Arg::Axis(_) => "axis",
            Arg::Angle(_) => "angle",
            Arg::Literal(_) => "literal",
        }
    }
}

/// The argument list handed to a geometry function.
///
/// Accessors are positional and check the argument kind; the `*_or_nan` variants
/// turn an absent input into NaN so that it propagates to the outputs.
#[derive(Debug)]
pub struct Args<'a> {
    function: &'a str,
    values: SmallVec<[Arg<'a>; 16]>,
}

impl<'a> Args<'a> {
    pub fn new(function: &'a str, values: impl IntoIterator<Item = Arg<'a>>) -> Self {
        Args {
            function,
            values: values.into_iter().collect(),
        }
    }

    pub fn function(&self) -> &str {
        self.function
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<&Arg<'a>, CgmError> {
        self.values.get(index).ok_or_else(|| {
            ArgumentError::OutOfRange {
                function: self.function.to_string(),
                index,
                len: self.values.len(),
            }
            .into()
        })
    }

    fn kind_error(&self, index: usize, expected: &'static str, found: &Arg<'_>) -> CgmError {
        ArgumentError::Kind {
            function: self.function.to_string(),
            index,
            expected,
            found: found.kind_name(),
        }
        .into()
    }

    /// Marker position at `index`.
    pub fn point(&self, index: usize) -> Result<Option<Point>, CgmError> {
        match self.get(index)? {
            Arg::Point(p) => Ok(*p),
            other => Err(self.kind_error(index, "marker", other)),
        }
    }

    pub fn point_or_nan(&self, index: usize) -> Result<Point, CgmError> {
        Ok(self
            .point(index)?
            .unwrap_or_else(|| Point::repeat(f64::NAN)))
    }

    /// Measurement or literal value at `index`.
    pub fn scalar(&self, index: usize) -> Result<Option<f64>, CgmError> {
        match self.get(index)? {
            Arg::Scalar(v) => Ok(*v),
            Arg::Literal(v) => Ok(Some(*v)),
            other => Err(self.kind_error(index, "measurement or literal", other)),
        }
    }

    pub fn scalar_or_nan(&self, index: usize) -> Result<f64, CgmError> {
        Ok(self.scalar(index)?.unwrap_or(f64::NAN))
    }

    /// Axis computed earlier in the same frame.
    pub fn axis(&self, index: usize) -> Result<Option<&'a Axis>, CgmError> {
        match self.get(index)? {
            Arg::Axis(a) => Ok(*a),
            other => Err(self.kind_error(index, "axis", other)),
        }
    }

    pub fn axis_or_nan(&self, index: usize) -> Result<Axis, CgmError> {
        Ok(self
            .axis(index)?
            .copied()
            .unwrap_or_else(|| Axis::repeat(f64::NAN)))
    }

    pub fn angle(&self, index: usize) -> Result<Option<&'a Angle>, CgmError> {
        match self.get(index)? {
            Arg::Angle(a) => Ok(*a),
            other => Err(self.kind_error(index, "angle", other)),
        }
    }

    pub fn angle_or_nan(&self, index: usize) -> Result<Angle, CgmError> {
        Ok(self
            .angle(index)?
            .copied()
            .unwrap_or_else(|| Angle::repeat(f64::NAN)))
    }
}

fn resolve<'a>(
    entry: &'a PipelineEntry,
    frame: &[f64],
    axes: &'a [Axis],
    angles: &'a [Angle],
) -> Args<'a> {
    let values = entry.params().iter().map(|p| match p {
        BoundParam::Marker { slice, .. } => Arg::Point(slice.and_then(|s| s.read(frame))),
        BoundParam::Measurement { value, .. } => Arg::Scalar(*value),
        BoundParam::Axis { index, .. } => Arg::Axis(index.and_then(|i| axes.get(i))),
        BoundParam::Angle { index, .. } => Arg::Angle(index.and_then(|i| angles.get(i))),
        BoundParam::Literal(v) => Arg::Literal(*v),
    });
    Args::new(entry.name(), values)
}

fn misplaced(entry: &PipelineEntry, expected: EntryKind) -> CgmError {
    ConfigurationError::KindMismatch {
        function: entry.name().to_string(),
        expected,
        found: entry.kind(),
    }
    .into()
}

fn check_arity(entry: &PipelineEntry, found: usize) -> Result<(), CgmError> {
    let expected = entry.outputs().len();
    if found != expected {
        return Err(CgmError::OutputArity {
            function: entry.name().to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

/// Everything one frame produced, in registry order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameResult {
    pub axes: Vec<Axis>,
    pub angles: Vec<Angle>,
}

#[derive(Debug, Clone, Default)]
pub struct FrameEvaluator {
    axes: Vec<Axis>,
    angles: Vec<Angle>,
}

impl FrameEvaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Evaluate `pipeline` on one frame buffer.
    ///
    /// Return
    /// ----------
    /// * `Ok(())` with [`axes`](Self::axes) and [`angles`](Self::angles) holding this
    ///   frame's results.
    /// * The first error raised by a geometry function, or [`CgmError::OutputArity`]
    ///   when a function returns a different number of results than it declares.
    pub fn evaluate(&mut self, pipeline: &Pipeline, frame: &[f64]) -> Result<(), CgmError> {
        self.axes.clear();
        self.angles.clear();

        for entry in pipeline.axis_entries() {
            let produced = match entry.function() {
                CgmFunction::Axis(f) => f(&resolve(entry, frame, &self.axes, &self.angles))?,
                CgmFunction::Angle(_) => return Err(misplaced(entry, EntryKind::Axis)),
            };
            check_arity(entry, produced.len())?;
            self.axes.extend(produced);
        }

        for entry in pipeline.angle_entries() {
            let produced = match entry.function() {
                CgmFunction::Angle(f) => f(&resolve(entry, frame, &self.axes, &self.angles))?,
                CgmFunction::Axis(_) => return Err(misplaced(entry, EntryKind::Angle)),
            };
            check_arity(entry, produced.len())?;
            self.angles.extend(produced);
        }
        Ok(())
    }

    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    pub fn angles(&self) -> &[Angle] {
        &self.angles
    }

    /// Copy the current results into one frame's slots of the flat buffers.
    ///
    /// Axes are written row-major, 16 floats each; angles 3 floats each.
    pub fn write_flat(&self, axis_out: &mut [f64], angle_out: &mut [f64]) {
        for (axis, out) in self.axes.iter().zip(axis_out.chunks_exact_mut(FLOATS_PER_AXIS)) {
            // nalgebra stores column-major: the transpose's storage is the row-major order.
            out.copy_from_slice(axis.transpose().as_slice());
        }
        for (angle, out) in self
            .angles
            .iter()
            .zip(angle_out.chunks_exact_mut(FLOATS_PER_ANGLE))
        {
            out.copy_from_slice(angle.as_slice());
        }
    }

    pub fn to_result(&self) -> FrameResult {
        FrameResult {
            axes: self.axes.clone(),
            angles: self.angles.clone(),
        }
    }
}
