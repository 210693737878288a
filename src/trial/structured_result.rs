//! # Structured trial results
//!
//! [`StructuredResult`] wraps the two flat output buffers of a run together with
//! the axis and angle names that were registered when the run started, and offers
//! frame-indexed and name-indexed access:
//!
//! ```rust,no_run
//! # use cgm::trial::structured_result::StructuredResult;
//! # let result: StructuredResult = unimplemented!();
//! let pelvis = result.frame(10).unwrap().axis("Pelvis").unwrap();      // 4x4
//! let rknee = result.frame(10).unwrap().angle("RKnee").unwrap();       // 3-vector
//! let series = result.axis_series("Pelvis").unwrap();                  // one 4x4 per frame
//! let window = result.frames_range(5..15).unwrap().axis_series("Pelvis");
//! ```
//!
//! Axes are stored row-major (16 floats each) and rebuilt with
//! [`Matrix4::from_row_slice`](nalgebra::Matrix4::from_row_slice) on access.

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use ahash::RandomState;

use crate::{
    cgm_errors::CgmError,
    constants::{Angle, Axis, FLOATS_PER_ANGLE, FLOATS_PER_AXIS},
    registry::{FrameLayout, ResultKeyRegistry},
};

#[derive(Debug)]
struct Keys {
    axis_names: Vec<String>,
    angle_names: Vec<String>,
    axis_index: HashMap<String, usize, RandomState>,
    angle_index: HashMap<String, usize, RandomState>,
    layout: FrameLayout,
}

#[derive(Debug, Clone)]
pub struct StructuredResult {
    keys: Arc<Keys>,
    num_frames: usize,
    axes: Vec<f64>,
    angles: Vec<f64>,
}

impl StructuredResult {
    /// Structure the flat buffers of a run over `num_frames` frames.
    ///
    /// Fails with [`CgmError::BufferShape`] when a buffer does not hold exactly
    /// `num_frames` frames of the registry's layout.
    pub fn from_flat(
        registry: &ResultKeyRegistry,
        num_frames: usize,
        axes: Vec<f64>,
        angles: Vec<f64>,
    ) -> Result<Self, CgmError> {
        let layout = registry.layout();
        let (axis_len, angle_len) = layout.buffer_lens(num_frames);
        if axes.len() != axis_len {
            return Err(CgmError::BufferShape {
                context: "axis result buffer",
                expected: axis_len,
                found: axes.len(),
            });
        }
        if angles.len() != angle_len {
            return Err(CgmError::BufferShape {
                context: "angle result buffer",
                expected: angle_len,
                found: angles.len(),
            });
        }

        let index = |names: &[String]| -> HashMap<String, usize, RandomState> {
            names
                .iter()
                .enumerate()
                .map(|(i, n)| (n.clone(), i))
                .collect()
        };
        let keys = Keys {
            axis_names: registry.axis_names().to_vec(),
            angle_names: registry.angle_names().to_vec(),
            axis_index: index(registry.axis_names()),
            angle_index: index(registry.angle_names()),
            layout,
        };
        Ok(StructuredResult {
            keys: Arc::new(keys),
            num_frames,
            axes,
            angles,
        })
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    pub fn is_empty(&self) -> bool {
        self.num_frames == 0
    }

    pub fn layout(&self) -> FrameLayout {
        self.keys.layout
    }

    pub fn axis_names(&self) -> &[String] {
        &self.keys.axis_names
    }

    pub fn angle_names(&self) -> &[String] {
        &self.keys.angle_names
    }

    /// The flat axis buffer, `num_frames * axis_floats_per_frame` floats.
    pub fn flat_axes(&self) -> &[f64] {
        &self.axes
    }

    /// The flat angle buffer, `num_frames * angle_floats_per_frame` floats.
    pub fn flat_angles(&self) -> &[f64] {
        &self.angles
    }

    pub fn frame(&self, frame: usize) -> Option<FrameView<'_>> {
        (frame < self.num_frames).then_some(FrameView {
            result: self,
            frame,
        })
    }

    pub fn frames(&self) -> impl Iterator<Item = FrameView<'_>> {
        (0..self.num_frames).map(move |frame| FrameView {
            result: self,
            frame,
        })
    }

    fn axis_at(&self, frame: usize, index: usize) -> Axis {
        let start = frame * self.keys.layout.axis_floats_per_frame + index * FLOATS_PER_AXIS;
        Axis::from_row_slice(&self.axes[start..start + FLOATS_PER_AXIS])
    }

    fn angle_at(&self, frame: usize, index: usize) -> Angle {
        let start = frame * self.keys.layout.angle_floats_per_frame + index * FLOATS_PER_ANGLE;
        Angle::from_column_slice(&self.angles[start..start + FLOATS_PER_ANGLE])
    }

    /// The 4x4 axis `name` at `frame`, `None` for an unknown name or frame.
    pub fn axis(&self, frame: usize, name: &str) -> Option<Axis> {
        let index = *self.keys.axis_index.get(name)?;
        (frame < self.num_frames).then(|| self.axis_at(frame, index))
    }

    pub fn angle(&self, frame: usize, name: &str) -> Option<Angle> {
        let index = *self.keys.angle_index.get(name)?;
        (frame < self.num_frames).then(|| self.angle_at(frame, index))
    }

    /// Every frame's axis `name`, in frame order.
    pub fn axis_series(&self, name: &str) -> Option<Vec<Axis>> {
        let index = *self.keys.axis_index.get(name)?;
        Some(
            (0..self.num_frames)
                .map(|f| self.axis_at(f, index))
                .collect(),
        )
    }

    pub fn angle_series(&self, name: &str) -> Option<Vec<Angle>> {
        let index = *self.keys.angle_index.get(name)?;
        Some(
            (0..self.num_frames)
                .map(|f| self.angle_at(f, index))
                .collect(),
        )
    }

    /// Copy of the frames in `range`, re-indexed from zero.
    pub fn frames_range(&self, range: Range<usize>) -> Result<StructuredResult, CgmError> {
        if range.start > range.end || range.end > self.num_frames {
            return Err(CgmError::FrameRange {
                start: range.start,
                end: range.end,
                num_frames: self.num_frames,
            });
        }
        let layout = self.keys.layout;
        Ok(StructuredResult {
            keys: Arc::clone(&self.keys),
            num_frames: range.len(),
            axes: self.axes[range.start * layout.axis_floats_per_frame
                ..range.end * layout.axis_floats_per_frame]
                .to_vec(),
            angles: self.angles[range.start * layout.angle_floats_per_frame
                ..range.end * layout.angle_floats_per_frame]
                .to_vec(),
        })
    }
}

impl PartialEq for StructuredResult {
    fn eq(&self, other: &Self) -> bool {
        self.num_frames == other.num_frames
            && self.keys.axis_names == other.keys.axis_names
            && self.keys.angle_names == other.keys.angle_names
            && self.axes == other.axes
            && self.angles == other.angles
    }
}

impl fmt::Display for StructuredResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Trial result: {} frames, {}",
            self.num_frames, self.keys.layout
        )?;
        if f.alternate() {
            writeln!(f, "  axes   : {}", self.keys.axis_names.join(", "))?;
            writeln!(f, "  angles : {}", self.keys.angle_names.join(", "))?;
        }
        Ok(())
    }
}

/// One frame of a [`StructuredResult`].
#[derive(Debug, Clone, Copy)]
pub struct FrameView<'a> {
    result: &'a StructuredResult,
    frame: usize,
}

impl FrameView<'_> {
    pub fn index(&self) -> usize {
        self.frame
    }

    pub fn axis(&self, name: &str) -> Option<Axis> {
        let index = *self.result.keys.axis_index.get(name)?;
        Some(self.result.axis_at(self.frame, index))
    }

    pub fn angle(&self, name: &str) -> Option<Angle> {
        let index = *self.result.keys.angle_index.get(name)?;
        Some(self.result.angle_at(self.frame, index))
    }
}
