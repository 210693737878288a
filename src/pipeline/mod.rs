//! # Pipeline registry
//!
//! Two ordered lists of [`PipelineEntry`]: the axis pipeline, evaluated first, and the
//! angle pipeline, evaluated second. **Declaration order is evaluation order**; no
//! dependency sorting takes place. Each entry owns its bound parameters and its output
//! names, and the embedded [`ResultKeyRegistry`] maps every output name to its
//! position in the per-frame result lists.
//!
//! ## Key responsibilities
//!
//! - Register new functions ([`Pipeline::add_function`]) and replace registered ones
//!   ([`Pipeline::override_function`]).
//! - Keep the registry, the bound axis/angle positions and the frame layout consistent
//!   after every mutation.
//! - Reject at registration time any axis/angle argument that would be read before the
//!   entry producing it has run ([`ConfigurationError::OrderingHazard`]).
//!
//! Every mutation works on a copy of the pipeline and commits only when all checks
//! pass, so a failed call has no side effect.
//!
//! ## See also
//! ------------
//! * [`params`] – Request → bound parameter resolution.
//! * [`function_spec::FunctionSpec`] – Declarations passed to add/override.
//! * [`defaults`] – The default Conventional Gait Model pipeline.

pub mod defaults;
pub mod function_spec;
pub mod params;

use std::fmt;

use tracing::{debug, warn};

use crate::{
    cgm_errors::ConfigurationError,
    pipeline::{
        function_spec::{CgmFunction, FunctionSpec},
        params::{missing_inputs, BoundParam, MissingInput, ParamBinder},
    },
    registry::ResultKeyRegistry,
};

/// Which of the two pipelines an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Axis,
    Angle,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Axis => write!(f, "axis"),
            EntryKind::Angle => write!(f, "angle"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineEntry {
    name: String,
    function: CgmFunction,
    params: Vec<BoundParam>,
    outputs: Vec<String>,
}

impl PipelineEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntryKind {
        self.function.kind()
    }

    pub fn function(&self) -> &CgmFunction {
        &self.function
    }

    pub fn params(&self) -> &[BoundParam] {
        &self.params
    }

    pub fn outputs(&self) -> &[String] {
        &self.outputs
    }

    fn warn_unresolved_results(&self) {
        for (position, p) in self.params.iter().enumerate() {
            if let Some((kind, name, None)) = p.result_ref() {
                warn!(
                    function = %self.name,
                    position,
                    %kind,
                    name,
                    "result reference does not match any registered output, the function receives an absent value"
                );
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    axis_entries: Vec<PipelineEntry>,
    angle_entries: Vec<PipelineEntry>,
    registry: ResultKeyRegistry,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every declaration of `specs` in order.
    pub fn from_specs(
        specs: impl IntoIterator<Item = FunctionSpec>,
        binder: &ParamBinder<'_>,
    ) -> Result<Self, ConfigurationError> {
        let mut pipeline = Pipeline::new();
        for spec in specs {
            pipeline.add_function(spec, binder)?;
        }
        Ok(pipeline)
    }

    pub fn axis_entries(&self) -> &[PipelineEntry] {
        &self.axis_entries
    }

    pub fn angle_entries(&self) -> &[PipelineEntry] {
        &self.angle_entries
    }

    pub fn registry(&self) -> &ResultKeyRegistry {
        &self.registry
    }

    pub fn entry(&self, name: &str) -> Option<&PipelineEntry> {
        self.axis_entries
            .iter()
            .chain(&self.angle_entries)
            .find(|e| e.name == name)
    }

    /// Registered function names, axis pipeline first.
    pub fn function_names(&self) -> impl Iterator<Item = &str> {
        self.axis_entries
            .iter()
            .chain(&self.angle_entries)
            .map(|e| e.name.as_str())
    }

    /// Every argument of every entry that bound to nothing.
    pub fn missing_inputs(&self) -> Vec<MissingInput> {
        self.axis_entries
            .iter()
            .chain(&self.angle_entries)
            .flat_map(|e| missing_inputs(&e.name, &e.params))
            .collect()
    }

    fn entries_mut(&mut self, kind: EntryKind) -> &mut Vec<PipelineEntry> {
        match kind {
            EntryKind::Axis => &mut self.axis_entries,
            EntryKind::Angle => &mut self.angle_entries,
        }
    }

    /// Append a new function at the end of its pipeline.
    ///
    /// Arguments
    /// -----------------
    /// * `spec` - declaration carrying a callable and exactly one output list.
    /// * `binder` - resolves the argument requests against the subject.
    ///
    /// Return
    /// ----------
    /// * `Ok(())` once the entry, its outputs and the updated layout are committed.
    /// * A [`ConfigurationError`] otherwise, with the pipeline left untouched:
    ///   `AmbiguousReturnKind`, `MissingReturnKind`, `DuplicateFunction`,
    ///   `MissingFunction`, `KindMismatch`, `EmptyOutputs`, `DuplicateOutputName`
    ///   or `OrderingHazard`.
    pub fn add_function(
        &mut self,
        spec: FunctionSpec,
        binder: &ParamBinder<'_>,
    ) -> Result<(), ConfigurationError> {
        let name = spec.name;
        let (kind, outputs) = match (spec.returns_axes, spec.returns_angles) {
            (Some(_), Some(_)) => return Err(ConfigurationError::AmbiguousReturnKind(name)),
            (None, None) => return Err(ConfigurationError::MissingReturnKind(name)),
            (Some(axes), None) => (EntryKind::Axis, axes),
            (None, Some(angles)) => (EntryKind::Angle, angles),
        };
        if self.entry(&name).is_some() {
            return Err(ConfigurationError::DuplicateFunction(name));
        }
        let function = match spec.function {
            Some(f) if f.kind() == kind => f,
            Some(f) => {
                return Err(ConfigurationError::KindMismatch {
                    function: name,
                    expected: kind,
                    found: f.kind(),
                })
            }
            None => return Err(ConfigurationError::MissingFunction(name)),
        };
        if outputs.is_empty() {
            return Err(ConfigurationError::EmptyOutputs(name));
        }

        let mut next = self.clone();
        match kind {
            EntryKind::Axis => next.registry.register_axis_names(&name, &outputs)?,
            EntryKind::Angle => next.registry.register_angle_names(&name, &outputs)?,
        }
        let params = binder.bind(&name, &spec.params, &next.registry);
        next.entries_mut(kind).push(PipelineEntry {
            name,
            function,
            params,
            outputs,
        });
        next.rebind_results();
        next.check_order()?;

        if let Some(entry) = next.entries_mut(kind).last() {
            entry.warn_unresolved_results();
            debug!(function = %entry.name, %kind, outputs = ?entry.outputs, "function registered");
        }
        *self = next;
        Ok(())
    }

    /// Replace the arguments, and optionally the callable and outputs, of a registered function.
    ///
    /// The argument list of `spec` always replaces the registered one. A `None`
    /// callable or output list keeps the registered value. Changing the number of
    /// outputs shifts the positions of every later output; all bound axis/angle
    /// positions are re-resolved by name afterwards.
    ///
    /// Return
    /// ----------
    /// * A [`ConfigurationError`] (`UnknownFunction`, `AmbiguousReturnKind`,
    ///   `KindMismatch`, `EmptyOutputs`, `DuplicateOutputName`, `OrderingHazard`)
    ///   with the pipeline left untouched, or `Ok(())`.
    pub fn override_function(
        &mut self,
        spec: FunctionSpec,
        binder: &ParamBinder<'_>,
    ) -> Result<(), ConfigurationError> {
        let name = spec.name;
        let kind = match self.entry(&name) {
            Some(entry) => entry.kind(),
            None => return Err(ConfigurationError::UnknownFunction(name)),
        };
        let outputs = match (spec.returns_axes, spec.returns_angles) {
            (Some(_), Some(_)) => return Err(ConfigurationError::AmbiguousReturnKind(name)),
            (Some(_), None) if kind == EntryKind::Angle => {
                return Err(ConfigurationError::KindMismatch {
                    function: name,
                    expected: kind,
                    found: EntryKind::Axis,
                })
            }
            (None, Some(_)) if kind == EntryKind::Axis => {
                return Err(ConfigurationError::KindMismatch {
                    function: name,
                    expected: kind,
                    found: EntryKind::Angle,
                })
            }
            (Some(outs), None) | (None, Some(outs)) => Some(outs),
            (None, None) => None,
        };
        if let Some(f) = &spec.function {
            if f.kind() != kind {
                return Err(ConfigurationError::KindMismatch {
                    function: name,
                    expected: kind,
                    found: f.kind(),
                });
            }
        }
        if outputs.as_ref().is_some_and(Vec::is_empty) {
            return Err(ConfigurationError::EmptyOutputs(name));
        }

        let mut next = self.clone();
        let pos = next.entries_mut(kind).iter().position(|e| e.name == name);
        let Some(pos) = pos else {
            return Err(ConfigurationError::UnknownFunction(name));
        };
        {
            let entry = &mut next.entries_mut(kind)[pos];
            if let Some(f) = spec.function {
                entry.function = f;
            }
            if let Some(outs) = outputs {
                entry.outputs = outs;
            }
        }
        next.rebuild_registry()?;
        let params = binder.bind(&name, &spec.params, &next.registry);
        next.entries_mut(kind)[pos].params = params;
        next.rebind_results();
        next.check_order()?;

        let entry = &next.entries_mut(kind)[pos];
        entry.warn_unresolved_results();
        debug!(function = %entry.name, %kind, outputs = ?entry.outputs, "function overridden");
        *self = next;
        Ok(())
    }

    fn rebuild_registry(&mut self) -> Result<(), ConfigurationError> {
        let mut registry = ResultKeyRegistry::new();
        for e in &self.axis_entries {
            registry.register_axis_names(&e.name, &e.outputs)?;
        }
        for e in &self.angle_entries {
            registry.register_angle_names(&e.name, &e.outputs)?;
        }
        self.registry = registry;
        Ok(())
    }

    fn rebind_results(&mut self) {
        let Pipeline {
            axis_entries,
            angle_entries,
            registry,
        } = self;
        for e in axis_entries.iter_mut().chain(angle_entries.iter_mut()) {
            ParamBinder::rebind_results(&mut e.params, registry);
        }
    }

    /// Every resolved axis/angle reference must point at an output produced earlier
    /// in the same frame: axis entries read earlier axes only, angle entries read any
    /// axis and earlier angles.
    fn check_order(&self) -> Result<(), ConfigurationError> {
        let hazard = |entry: &PipelineEntry, kind: EntryKind, name: &str| {
            ConfigurationError::OrderingHazard {
                function: entry.name.clone(),
                reference: name.to_string(),
                kind,
            }
        };

        let mut produced = 0;
        for entry in &self.axis_entries {
            for p in &entry.params {
                match p.result_ref() {
                    Some((EntryKind::Axis, name, Some(i))) if i >= produced => {
                        return Err(hazard(entry, EntryKind::Axis, name))
                    }
                    Some((EntryKind::Angle, name, Some(_))) => {
                        return Err(hazard(entry, EntryKind::Angle, name))
                    }
                    _ => {}
                }
            }
            produced += entry.outputs.len();
        }

        let mut produced = 0;
        for entry in &self.angle_entries {
            for p in &entry.params {
                if let Some((EntryKind::Angle, name, Some(i))) = p.result_ref() {
                    if i >= produced {
                        return Err(hazard(entry, EntryKind::Angle, name));
                    }
                }
            }
            produced += entry.outputs.len();
        }
        Ok(())
    }
}

#[cfg(test)]
mod pipeline_test {
    use super::*;
    use crate::{
        constants::{Angle, Axis, Point},
        markers::MarkerSet,
        measurements::MeasurementSet,
    };

    fn subject() -> (MarkerSet, MeasurementSet) {
        let markers =
            MarkerSet::from_frames(vec![vec![("RASI", Point::zeros()), ("LASI", Point::zeros())]])
                .unwrap();
        (markers, MeasurementSet::new())
    }

    fn identity_axes(n: usize) -> FunctionSpec {
        FunctionSpec::new("tmp").axis_function(move |_| Ok(vec![Axis::identity(); n]))
    }

    fn zero_angle() -> FunctionSpec {
        FunctionSpec::new("tmp").angle_function(|_| Ok(vec![Angle::zeros()]))
    }

    fn named(mut spec: FunctionSpec, name: &str) -> FunctionSpec {
        spec.name = name.to_string();
        spec
    }

    fn base(binder: &ParamBinder<'_>) -> Pipeline {
        Pipeline::from_specs(
            [
                named(identity_axes(1), "pelvis").returns_axes(["Pelvis"]),
                named(identity_axes(2), "hjc")
                    .axis("Pelvis")
                    .returns_axes(["RHipJC", "LHipJC"]),
                named(identity_axes(1), "hip")
                    .axes(["RHipJC", "LHipJC", "Pelvis"])
                    .returns_axes(["Hip"]),
                named(zero_angle(), "pelvis_angle")
                    .axis("Pelvis")
                    .returns_angles(["Pelvis"]),
            ],
            binder,
        )
        .unwrap()
    }

    #[test]
    fn test_from_specs_layout() {
        let (m, s) = subject();
        let binder = ParamBinder::new(&m, &s);
        let p = base(&binder);
        let layout = p.registry().layout();
        assert_eq!(layout.num_axes, 4);
        assert_eq!(layout.axis_floats_per_frame, 64);
        assert_eq!(layout.angle_floats_per_frame, 3);
        assert_eq!(
            p.function_names().collect::<Vec<_>>(),
            vec!["pelvis", "hjc", "hip", "pelvis_angle"]
        );
    }

    #[test]
    fn test_override_shifts_indices() {
        let (m, s) = subject();
        let binder = ParamBinder::new(&m, &s);
        let mut p = base(&binder);

        p.override_function(
            named(identity_axes(3), "hjc")
                .axis("Pelvis")
                .returns_axes(["RHipJC", "LHipJC", "MidHipJC"]),
            &binder,
        )
        .unwrap();

        assert_eq!(p.registry().axis_index("Hip"), Some(4));
        let hip = p.entry("hip").unwrap();
        assert_eq!(
            hip.params()[2],
            BoundParam::Axis {
                name: "Pelvis".into(),
                index: Some(0)
            }
        );
        assert_eq!(p.registry().layout().axis_floats_per_frame, 80);
    }

    #[test]
    fn test_forward_reference_is_ordering_hazard() {
        let (m, s) = subject();
        let binder = ParamBinder::new(&m, &s);
        let mut p = base(&binder);

        let err = p
            .override_function(FunctionSpec::new("pelvis").axis("Hip"), &binder)
            .unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::OrderingHazard {
                function: "pelvis".into(),
                reference: "Hip".into(),
                kind: EntryKind::Axis
            }
        );

        // self reference
        let err = p
            .override_function(FunctionSpec::new("hip").axis("Hip"), &binder)
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::OrderingHazard { .. }));

        // axis functions run before any angle exists
        let err = p
            .override_function(FunctionSpec::new("hip").angle("Pelvis"), &binder)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::OrderingHazard {
                kind: EntryKind::Angle,
                ..
            }
        ));

        assert_eq!(p.entry("hip").unwrap().params().len(), 3);
    }

    #[test]
    fn test_add_validation() {
        let (m, s) = subject();
        let binder = ParamBinder::new(&m, &s);
        let mut p = base(&binder);

        let both = named(identity_axes(1), "x")
            .returns_axes(["X"])
            .returns_angles(["X"]);
        assert_eq!(
            p.add_function(both, &binder),
            Err(ConfigurationError::AmbiguousReturnKind("x".into()))
        );
        assert_eq!(
            p.add_function(named(identity_axes(1), "x"), &binder),
            Err(ConfigurationError::MissingReturnKind("x".into()))
        );
        assert_eq!(
            p.add_function(FunctionSpec::new("x").returns_axes(["X"]), &binder),
            Err(ConfigurationError::MissingFunction("x".into()))
        );
        assert!(matches!(
            p.add_function(named(zero_angle(), "x").returns_axes(["X"]), &binder),
            Err(ConfigurationError::KindMismatch { .. })
        ));
        assert!(matches!(
            p.add_function(named(identity_axes(1), "hip").returns_axes(["X"]), &binder),
            Err(ConfigurationError::DuplicateFunction(_))
        ));
        assert!(matches!(
            p.add_function(named(identity_axes(1), "x").returns_axes(["Hip"]), &binder),
            Err(ConfigurationError::DuplicateOutputName { .. })
        ));
        assert!(matches!(
            p.add_function(
                named(identity_axes(1), "x").returns_axes(Vec::<String>::new()),
                &binder
            ),
            Err(ConfigurationError::EmptyOutputs(_))
        ));
        assert_eq!(p.registry().layout().num_axes, 4);
        assert!(p.entry("x").is_none());
    }

    #[test]
    fn test_override_kind_checks() {
        let (m, s) = subject();
        let binder = ParamBinder::new(&m, &s);
        let mut p = base(&binder);

        assert!(matches!(
            p.override_function(FunctionSpec::new("nope"), &binder),
            Err(ConfigurationError::UnknownFunction(_))
        ));
        assert!(matches!(
            p.override_function(FunctionSpec::new("hip").returns_angles(["Hip"]), &binder),
            Err(ConfigurationError::KindMismatch { .. })
        ));
        assert!(matches!(
            p.override_function(named(zero_angle(), "hip"), &binder),
            Err(ConfigurationError::KindMismatch { .. })
        ));
        assert!(matches!(
            p.override_function(
                FunctionSpec::new("hip").returns_axes(["A"]).returns_angles(["B"]),
                &binder
            ),
            Err(ConfigurationError::AmbiguousReturnKind(_))
        ));
    }

    #[test]
    fn test_missing_inputs_listed() {
        let (m, s) = subject();
        let binder = ParamBinder::new(&m, &s);
        let mut p = base(&binder);
        p.override_function(
            FunctionSpec::new("pelvis").markers(["RASI", "LASI", "SACR"]),
            &binder,
        )
        .unwrap();

        let missing = p.missing_inputs();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].function, "pelvis");
        assert_eq!(missing[0].name, "SACR");
    }
}
