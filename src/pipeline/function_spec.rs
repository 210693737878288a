//! Declarations handed to [`add_function`](crate::cgm::Cgm::add_function) and
//! [`override_function`](crate::cgm::Cgm::override_function).
//!
//! ```rust
//! use cgm::pipeline::function_spec::FunctionSpec;
//! use cgm::geometry::axes::pelvis_axis;
//!
//! // Run the pelvis with a different marker set; outputs stay as registered.
//! let spec = FunctionSpec::new("pelvis_axis")
//!     .axis_function(pelvis_axis)
//!     .markers(["RASI", "LASI", "RPSI", "LPSI", "SACR"]);
//! assert!(spec.returns_axes.is_none());
//! ```

use std::fmt;
use std::sync::Arc;

use crate::{
    cgm_errors::CgmError,
    constants::{Angle, Axis},
    eval::Args,
    pipeline::{params::ParamRequest, EntryKind},
};

pub type AxisFn = dyn Fn(&Args<'_>) -> Result<Vec<Axis>, CgmError> + Send + Sync;
pub type AngleFn = dyn Fn(&Args<'_>) -> Result<Vec<Angle>, CgmError> + Send + Sync;

/// A registered geometry function.
///
/// Cloning shares the underlying closure, which lets every parallel worker hold its
/// own copy of the pipeline.
#[derive(Clone)]
pub enum CgmFunction {
    Axis(Arc<AxisFn>),
    Angle(Arc<AngleFn>),
}

impl CgmFunction {
    pub fn axis<F>(f: F) -> Self
    where
        F: Fn(&Args<'_>) -> Result<Vec<Axis>, CgmError> + Send + Sync + 'static,
    {
        CgmFunction::Axis(Arc::new(f))
    }

    pub fn angle<F>(f: F) -> Self
    where
        F: Fn(&Args<'_>) -> Result<Vec<Angle>, CgmError> + Send + Sync + 'static,
    {
        CgmFunction::Angle(Arc::new(f))
    }

    pub fn kind(&self) -> EntryKind {
        match self {
            CgmFunction::Axis(_) => EntryKind::Axis,
            CgmFunction::Angle(_) => EntryKind::Angle,
        }
    }
}

impl fmt::Debug for CgmFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CgmFunction::{:?}", self.kind())
    }
}

/// A function declaration: name, optional callable, argument requests and outputs.
///
/// For `add_function` the callable and exactly one of `returns_axes` /
/// `returns_angles` are required. For `override_function` both are optional; the
/// argument list always replaces the registered one.
#[derive(Debug, Clone)]
pub struct FunctionSpec {
    pub name: String,
    pub function: Option<CgmFunction>,
    pub params: Vec<ParamRequest>,
    pub returns_axes: Option<Vec<String>>,
    pub returns_angles: Option<Vec<String>>,
}

impl FunctionSpec {
    pub fn new(name: impl Into<String>) -> Self {
        FunctionSpec {
            name: name.into(),
            function: None,
            params: Vec::new(),
            returns_axes: None,
            returns_angles: None,
        }
    }

    pub fn function(mut self, f: CgmFunction) -> Self {
        self.function = Some(f);
        self
    }

    pub fn axis_function<F>(self, f: F) -> Self
    where
        F: Fn(&Args<'_>) -> Result<Vec<Axis>, CgmError> + Send + Sync + 'static,
    {
        self.function(CgmFunction::axis(f))
    }

    pub fn angle_function<F>(self, f: F) -> Self
    where
        F: Fn(&Args<'_>) -> Result<Vec<Angle>, CgmError> + Send + Sync + 'static,
    {
        self.function(CgmFunction::angle(f))
    }

    pub fn param(mut self, p: ParamRequest) -> Self {
        self.params.push(p);
        self
    }

    pub fn marker(self, name: impl Into<String>) -> Self {
        self.param(ParamRequest::Marker(name.into()))
    }

    pub fn markers<S: Into<String>>(self, names: impl IntoIterator<Item = S>) -> Self {
        names.into_iter().fold(self, |spec, n| spec.marker(n))
    }

    pub fn measurement(self, name: impl Into<String>) -> Self {
        self.param(ParamRequest::Measurement(name.into()))
    }

    pub fn measurements<S: Into<String>>(self, names: impl IntoIterator<Item = S>) -> Self {
        names.into_iter().fold(self, |spec, n| spec.measurement(n))
    }

    pub fn axis(self, name: impl Into<String>) -> Self {
        self.param(ParamRequest::Axis(name.into()))
    }

    pub fn axes<S: Into<String>>(self, names: impl IntoIterator<Item = S>) -> Self {
        names.into_iter().fold(self, |spec, n| spec.axis(n))
    }

    pub fn angle(self, name: impl Into<String>) -> Self {
        self.param(ParamRequest::Angle(name.into()))
    }

    pub fn angles<S: Into<String>>(self, names: impl IntoIterator<Item = S>) -> Self {
        names.into_iter().fold(self, |spec, n| spec.angle(n))
    }

    pub fn literal(self, value: f64) -> Self {
        self.param(ParamRequest::Literal(value))
    }

    pub fn returns_axes<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.returns_axes = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn returns_angles<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.returns_angles = Some(names.into_iter().map(Into::into).collect());
        self
    }
}
