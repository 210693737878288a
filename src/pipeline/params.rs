//! # Parameter binding
//!
//! A function declares its arguments as a list of [`ParamRequest`]s (by name).
//! The [`ParamBinder`] resolves that list once, at registration time, into
//! [`BoundParam`]s:
//!
//! | Request        | Bound to                                   | Resolved per frame as          |
//! |----------------|--------------------------------------------|--------------------------------|
//! | `Marker`       | offset range in the frame buffer           | the marker's 3D position       |
//! | `Measurement`  | the subject's value, baked in              | the same scalar on every frame |
//! | `Axis`         | position in the axis registry              | this frame's computed 4x4      |
//! | `Angle`        | position in the angle registry             | this frame's computed angle    |
//! | `Literal`      | the constant itself                        | the constant                   |
//!
//! A name the subject or the registry does not know binds to an explicit absent
//! value and is logged with `tracing::warn!`; the geometry function decides how
//! to handle it (fallback or NaN output).

use std::fmt;

use tracing::warn;

use crate::{
    markers::{MarkerSet, MarkerSlice},
    measurements::MeasurementSet,
    pipeline::EntryKind,
    registry::ResultKeyRegistry,
};

/// One argument as declared by the user, before binding.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamRequest {
    Marker(String),
    Measurement(String),
    Axis(String),
    Angle(String),
    Literal(f64),
}

/// One argument after binding.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundParam {
    Marker {
        name: String,
        slice: Option<MarkerSlice>,
    },
    Measurement {
        name: String,
        value: Option<f64>,
    },
    Axis {
        name: String,
        index: Option<usize>,
    },
    Angle {
        name: String,
        index: Option<usize>,
    },
    Literal(f64),
}

impl BoundParam {
    pub fn name(&self) -> Option<&str> {
        match self {
            BoundParam::Marker { name, .. }
            | BoundParam::Measurement { name, .. }
            | BoundParam::Axis { name, .. }
            | BoundParam::Angle { name, .. } => Some(name),
            BoundParam::Literal(_) => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            BoundParam::Marker { .. } => "marker",
            BoundParam::Measurement { .. } => "measurement",
            BoundParam::Axis { .. } => "axis",
            BoundParam::Angle { .. } => "angle",
            BoundParam::Literal(_) => "literal",
        }
    }

    pub fn is_absent(&self) -> bool {
        match self {
            BoundParam::Marker { slice, .. } => slice.is_none(),
            BoundParam::Measurement { value, .. } => value.is_none(),
            BoundParam::Axis { index, .. } | BoundParam::Angle { index, .. } => index.is_none(),
            BoundParam::Literal(_) => false,
        }
    }

    /// Registry reference carried by this parameter, if any.
    pub(crate) fn result_ref(&self) -> Option<(EntryKind, &str, Option<usize>)> {
        match self {
            BoundParam::Axis { name, index } => Some((EntryKind::Axis, name, *index)),
            BoundParam::Angle { name, index } => Some((EntryKind::Angle, name, *index)),
            _ => None,
        }
    }
}

/// An argument that bound to nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingInput {
    pub function: String,
    pub position: usize,
    pub kind: &'static str,
    pub name: String,
}

impl fmt::Display for MissingInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: argument {} ({} '{}') is not provided",
            self.function, self.position, self.kind, self.name
        )
    }
}

/// Resolves parameter requests against one subject and the current registry.
pub struct ParamBinder<'a> {
    markers: &'a MarkerSet,
    measurements: &'a MeasurementSet,
}

impl<'a> ParamBinder<'a> {
    pub fn new(markers: &'a MarkerSet, measurements: &'a MeasurementSet) -> Self {
        ParamBinder {
            markers,
            measurements,
        }
    }

    /// Bind a request list for `function`.
    ///
    /// Axis and angle positions are looked up in `registry` as it is now; they are
    /// refreshed by [`rebind_results`](Self::rebind_results) after every registry change.
    pub fn bind(
        &self,
        function: &str,
        requests: &[ParamRequest],
        registry: &ResultKeyRegistry,
    ) -> Vec<BoundParam> {
        let params: Vec<BoundParam> = requests
            .iter()
            .map(|req| match req {
                ParamRequest::Marker(name) => BoundParam::Marker {
                    name: name.clone(),
                    slice: self.markers.slice_of(name),
                },
                ParamRequest::Measurement(name) => BoundParam::Measurement {
                    name: name.clone(),
                    value: self.measurements.value_of(name),
                },
                ParamRequest::Axis(name) => BoundParam::Axis {
                    name: name.clone(),
                    index: registry.axis_index(name),
                },
                ParamRequest::Angle(name) => BoundParam::Angle {
                    name: name.clone(),
                    index: registry.angle_index(name),
                },
                ParamRequest::Literal(v) => BoundParam::Literal(*v),
            })
            .collect();

        for (position, p) in params.iter().enumerate() {
            // Result references may still resolve once later outputs are registered.
            if p.is_absent() && p.result_ref().is_none() {
                warn!(
                    function,
                    position,
                    kind = p.kind_name(),
                    name = p.name().unwrap_or_default(),
                    "input not provided by the subject, the function receives an absent value"
                );
            }
        }
        params
    }

    /// Re-resolve every axis/angle position of `params` by name.
    pub fn rebind_results(params: &mut [BoundParam], registry: &ResultKeyRegistry) {
        for p in params.iter_mut() {
            match p {
                BoundParam::Axis { name, index } => *index = registry.axis_index(name),
                BoundParam::Angle { name, index } => *index = registry.angle_index(name),
                _ => {}
            }
        }
    }
}

pub(crate) fn missing_inputs(function: &str, params: &[BoundParam]) -> Vec<MissingInput> {
    params
        .iter()
        .enumerate()
        .filter(|(_, p)| p.is_absent())
        .map(|(position, p)| MissingInput {
            function: function.to_string(),
            position,
            kind: p.kind_name(),
            name: p.name().unwrap_or_default().to_string(),
        })
        .collect()
}
