//! # Result key registry
//!
//! Ordered axis and angle output names, the name → position lookup derived from
//! that order, and the per-frame shape of the flat result buffers.
//!
//! The registry is the single source of truth for result positions: an axis named
//! `"Pelvis"` at position `i` occupies floats `16*i .. 16*i+16` of every frame's axis
//! block. The [`FrameLayout`] is recomputed inside every mutating call, so a caller
//! can never observe names and block sizes that disagree.

use std::collections::HashMap;
use std::fmt;

use ahash::RandomState;
use itertools::Itertools;

use crate::{
    cgm_errors::ConfigurationError,
    constants::{FLOATS_PER_ANGLE, FLOATS_PER_AXIS},
};

/// Shape of one frame in the flat result buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameLayout {
    pub num_axes: usize,
    pub num_angles: usize,
    pub axis_floats_per_frame: usize,
    pub angle_floats_per_frame: usize,
}

impl FrameLayout {
    pub fn for_counts(num_axes: usize, num_angles: usize) -> Self {
        FrameLayout {
            num_axes,
            num_angles,
            axis_floats_per_frame: num_axes * FLOATS_PER_AXIS,
            angle_floats_per_frame: num_angles * FLOATS_PER_ANGLE,
        }
    }

    /// Lengths of the axis and angle buffers for `num_frames` frames.
    pub fn buffer_lens(&self, num_frames: usize) -> (usize, usize) {
        (
            num_frames * self.axis_floats_per_frame,
            num_frames * self.angle_floats_per_frame,
        )
    }
}

impl fmt::Display for FrameLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} axes ({} floats/frame), {} angles ({} floats/frame)",
            self.num_axes, self.axis_floats_per_frame, self.num_angles, self.angle_floats_per_frame
        )
    }
}

#[derive(Debug, Clone, Default)]
struct NameIndex {
    names: Vec<String>,
    index: HashMap<String, usize, RandomState>,
}

impl NameIndex {
    fn check_new(&self, function: &str, new: &[String]) -> Result<(), ConfigurationError> {
        let clash = new
            .iter()
            .duplicates()
            .chain(new.iter().filter(|n| self.index.contains_key(n.as_str())))
            .next();
        match clash {
            Some(name) => Err(ConfigurationError::DuplicateOutputName {
                function: function.to_string(),
                name: name.clone(),
            }),
            None => Ok(()),
        }
    }

    fn extend(&mut self, new: &[String]) {
        for name in new {
            self.index.insert(name.clone(), self.names.len());
            self.names.push(name.clone());
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResultKeyRegistry {
    axes: NameIndex,
    angles: NameIndex,
    layout: FrameLayout,
}

impl ResultKeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn axis_index(&self, name: &str) -> Option<usize> {
        self.axes.index.get(name).copied()
    }

    pub fn angle_index(&self, name: &str) -> Option<usize> {
        self.angles.index.get(name).copied()
    }

    pub fn axis_names(&self) -> &[String] {
        &self.axes.names
    }

    pub fn angle_names(&self) -> &[String] {
        &self.angles.names
    }

    pub fn layout(&self) -> FrameLayout {
        self.layout
    }

    /// Append the outputs of a newly registered axis function.
    ///
    /// Fails without mutating if any name is repeated in `names` or already registered.
    pub fn register_axis_names(
        &mut self,
        function: &str,
        names: &[String],
    ) -> Result<(), ConfigurationError> {
        self.axes.check_new(function, names)?;
        self.axes.extend(names);
        self.refresh_layout();
        Ok(())
    }

    /// Append the outputs of a newly registered angle function.
    pub fn register_angle_names(
        &mut self,
        function: &str,
        names: &[String],
    ) -> Result<(), ConfigurationError> {
        self.angles.check_new(function, names)?;
        self.angles.extend(names);
        self.refresh_layout();
        Ok(())
    }

    fn refresh_layout(&mut self) {
        self.layout = FrameLayout::for_counts(self.axes.names.len(), self.angles.names.len());
    }
}
