//! # Subject batches
//!
//! A [`SubjectSet`] holds the models of several subjects under a name and runs
//! them together: whole subjects are spread over worker threads, each worker
//! running its subjects one after the other with [`Cgm::run_all`].
//!
//! [`SubjectResults`] keeps the per-subject [`StructuredResult`]s in insertion
//! order and answers cross-subject queries such as "the right knee angle of every
//! subject over frames 10..50".
//!
//! ```rust,no_run
//! use cgm::subjects::SubjectSet;
//! # let (model_a, model_b): (cgm::Cgm, cgm::Cgm) = unimplemented!();
//!
//! let mut subjects = SubjectSet::new();
//! subjects.insert("S01", model_a);
//! subjects.insert("S02", model_b);
//!
//! let results = subjects.run_all(2).unwrap();
//! for (subject, knee) in results.joint_angle("RKnee", 0..10).unwrap() {
//!     println!("{subject}: {:?}", knee.map(|s| s.len()));
//! }
//! ```

use std::ops::Range;

use tracing::info;

use crate::{
    cgm::Cgm,
    cgm_errors::CgmError,
    constants::{Angle, Axis},
    trial::{parallel::array_split, structured_result::StructuredResult},
};

#[derive(Debug, Clone, Default)]
pub struct SubjectSet {
    subjects: Vec<(String, Cgm)>,
}

impl SubjectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subject, or replace the model of a subject with the same name in place.
    ///
    /// Return
    /// ----------
    /// * The replaced model, if any.
    pub fn insert(&mut self, name: impl Into<String>, model: Cgm) -> Option<Cgm> {
        let name = name.into();
        match self.subjects.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => Some(std::mem::replace(slot, model)),
            None => {
                self.subjects.push((name, model));
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.subjects.iter().map(|(n, _)| n.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&Cgm> {
        self.subjects
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, m)| m)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Cgm> {
        self.subjects
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, m)| m)
    }

    /// Run every subject's full trial on up to `workers` threads.
    ///
    /// Every model is locked afterwards. The first failing subject, in insertion
    /// order, fails the batch with [`CgmError::SubjectFailed`].
    pub fn run_all(&mut self, workers: usize) -> Result<SubjectResults, CgmError> {
        let blocks = array_split(self.subjects.len(), workers.max(1));
        info!(
            subjects = self.subjects.len(),
            workers = blocks.len(),
            "subject batch run"
        );

        let outcomes: Vec<Vec<Result<StructuredResult, CgmError>>> =
            std::thread::scope(|scope| {
                let mut rest: &mut [(String, Cgm)] = &mut self.subjects;
                let mut handles = Vec::with_capacity(blocks.len());
                for (worker, block) in blocks.iter().cloned().enumerate() {
                    let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(block.len());
                    rest = tail;
                    let handle = scope.spawn(move || {
                        chunk
                            .iter_mut()
                            .map(|(_, model)| model.run_all())
                            .collect::<Vec<_>>()
                    });
                    handles.push((worker, block, handle));
                }
                handles
                    .into_iter()
                    .map(|(worker, frames, handle)| {
                        let len = frames.len();
                        handle.join().unwrap_or_else(|_| {
                            (0..len)
                                .map(|_| {
                                    Err(CgmError::WorkerPanicked {
                                        worker,
                                        frames: frames.clone(),
                                    })
                                })
                                .collect()
                        })
                    })
                    .collect()
            });

        let results = self
            .subjects
            .iter()
            .zip(outcomes.into_iter().flatten())
            .map(|((name, _), outcome)| match outcome {
                Ok(result) => Ok((name.clone(), result)),
                Err(e) => Err(CgmError::SubjectFailed {
                    subject: name.clone(),
                    source: Box::new(e),
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SubjectResults { results })
    }
}

/// Results of a [`SubjectSet`] run, in subject insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubjectResults {
    results: Vec<(String, StructuredResult)>,
}

impl SubjectResults {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.results.iter().map(|(n, _)| n.as_str())
    }

    pub fn get(&self, subject: &str) -> Option<&StructuredResult> {
        self.results
            .iter()
            .find(|(n, _)| n == subject)
            .map(|(_, r)| r)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &StructuredResult)> {
        self.results.iter().map(|(n, r)| (n.as_str(), r))
    }

    fn series<T>(
        &self,
        frames: &Range<usize>,
        pick: impl Fn(&StructuredResult) -> Option<Vec<T>>,
    ) -> Result<Vec<(&str, Option<Vec<T>>)>, CgmError> {
        self.results
            .iter()
            .map(|(subject, result)| {
                let window = result
                    .frames_range(frames.clone())
                    .map_err(|e| CgmError::SubjectFailed {
                        subject: subject.clone(),
                        source: Box::new(e),
                    })?;
                Ok((subject.as_str(), pick(&window)))
            })
            .collect()
    }

    /// Axis `name` over `frames` for every subject; `None` for a subject whose
    /// model has no such axis.
    pub fn joint_axis(
        &self,
        name: &str,
        frames: Range<usize>,
    ) -> Result<Vec<(&str, Option<Vec<Axis>>)>, CgmError> {
        self.series(&frames, |r| r.axis_series(name))
    }

    pub fn joint_angle(
        &self,
        name: &str,
        frames: Range<usize>,
    ) -> Result<Vec<(&str, Option<Vec<Angle>>)>, CgmError> {
        self.series(&frames, |r| r.angle_series(name))
    }
}

#[cfg(test)]
mod subjects_test {
    use super::*;
    use crate::{
        constants::Point, markers::MarkerSet, measurements::MeasurementSet,
        pipeline::function_spec::FunctionSpec,
    };

    fn model(offset: f64, frames: usize) -> Cgm {
        let frames = (0..frames)
            .map(|i| vec![("A", Point::new(offset + i as f64, 0.0, 0.0))])
            .collect::<Vec<_>>();
        Cgm::with_specs(
            MeasurementSet::new(),
            MarkerSet::from_frames(frames).unwrap(),
            [FunctionSpec::new("a")
                .angle_function(|args| {
                    let p = args.point_or_nan(0)?;
                    if p.x < 0.0 {
                        return Err(CgmError::InvalidRunParameter("negative".into()));
                    }
                    Ok(vec![p])
                })
                .marker("A")
                .returns_angles(["A"])],
        )
        .unwrap()
    }

    #[test]
    fn test_insertion_order_kept_across_workers() {
        let mut set = SubjectSet::new();
        for (i, name) in ["c", "a", "d", "b", "e"].iter().enumerate() {
            set.insert(*name, model(100.0 * i as f64, 3));
        }
        let results = set.run_all(2).unwrap();
        assert_eq!(results.names().collect::<Vec<_>>(), ["c", "a", "d", "b", "e"]);

        let series = results.joint_angle("A", 1..3).unwrap();
        assert_eq!(series[3].0, "b");
        assert_eq!(
            series[3].1,
            Some(vec![Angle::new(301.0, 0.0, 0.0), Angle::new(302.0, 0.0, 0.0)])
        );
        assert!(results.joint_axis("A", 0..1).unwrap()[0].1.is_none());
        assert!(set.get("a").unwrap().is_locked());
    }

    #[test]
    fn test_failing_subject_names_itself() {
        let mut set = SubjectSet::new();
        set.insert("ok", model(0.0, 2));
        set.insert("bad", model(-10.0, 2));
        let err = set.run_all(4).unwrap_err();
        assert!(matches!(err, CgmError::SubjectFailed { ref subject, .. } if subject == "bad"));
        assert!(matches!(err.root_cause(), CgmError::InvalidRunParameter(_)));
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut set = SubjectSet::new();
        assert!(set.insert("a", model(0.0, 1)).is_none());
        set.insert("b", model(0.0, 1));
        assert!(set.insert("a", model(5.0, 2)).is_some());
        assert_eq!(set.names().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(set.get("a").unwrap().markers().num_frames(), 2);
    }
}
