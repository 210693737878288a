//! Subject anthropometric measurements (leg length, joint widths, calibration offsets).
//!
//! Values are frozen once the model is built. A name the subject does not carry is
//! reported as `None`, never as a silent default.

use std::collections::HashMap;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use crate::constants::MeasurementName;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MeasurementSet {
    values: HashMap<MeasurementName, f64, RandomState>,
}

impl MeasurementSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair a list of names with a list of values; extra entries on either side are ignored.
    pub fn from_pairs<S: Into<MeasurementName>>(
        names: impl IntoIterator<Item = S>,
        values: impl IntoIterator<Item = f64>,
    ) -> Self {
        names
            .into_iter()
            .map(Into::into)
            .zip(values)
            .collect()
    }

    /// Insert or replace a value, for building a subject before the model exists.
    pub fn with(mut self, name: impl Into<MeasurementName>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn value_of(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl<S: Into<MeasurementName>> FromIterator<(S, f64)> for MeasurementSet {
    fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
        MeasurementSet {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

#[cfg(test)]
mod measurements_test {
    use super::*;

    #[test]
    fn test_absent_is_none() {
        let m = MeasurementSet::from_pairs(["MeanLegLength", "InterAsisDistance"], [940.0, 240.0]);
        assert_eq!(m.value_of("MeanLegLength"), Some(940.0));
        assert_eq!(m.value_of("RightKneeWidth"), None);
        assert_eq!(m.len(), 2);
    }

    #[test]
    fn test_with_overrides_previous_value() {
        let m = MeasurementSet::new().with("HeadOffset", 0.1).with("HeadOffset", 0.2);
        assert_eq!(m.value_of("HeadOffset"), Some(0.2));
    }
}
