//! # Marker trajectories
//!
//! [`MarkerSet`] stores the per-frame marker positions of one subject as a single
//! flat `f64` buffer: frame after frame, each frame holding the `x, y, z` triple of
//! every marker in a fixed name order. A [`MarkerSlice`] is the offset range of
//! one marker inside a frame buffer; it is computed once when a function is
//! registered and re-applied to every frame.
//!
//! ## Typical usage
//!
//! ```rust
//! use cgm::markers::MarkerSet;
//! use nalgebra::Vector3;
//!
//! let frames = vec![
//!     vec![("RASI", Vector3::new(0.0, -120.0, 900.0)), ("LASI", Vector3::new(0.0, 120.0, 900.0))],
//!     vec![("RASI", Vector3::new(5.0, -120.0, 900.0)), ("LASI", Vector3::new(5.0, 120.0, 900.0))],
//! ];
//! let markers = MarkerSet::from_frames(frames).unwrap();
//!
//! let lasi = markers.slice_of("LASI").unwrap();
//! assert_eq!(lasi.range(), 3..6);
//! assert_eq!(markers.position(1, "RASI").unwrap().x, 5.0);
//! ```

use std::collections::HashMap;
use std::ops::Range;

use ahash::RandomState;
use itertools::Itertools;

use crate::{
    cgm_errors::CgmError,
    constants::{MarkerName, Point, FLOATS_PER_MARKER},
};

/// Location of one marker inside a frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerSlice {
    start: usize,
}

impl MarkerSlice {
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + FLOATS_PER_MARKER
    }

    /// Read the marker position out of one frame buffer.
    ///
    /// Returns `None` if the buffer is too short, which only happens when the slice
    /// was computed for another marker layout.
    #[inline]
    pub fn read(&self, frame: &[f64]) -> Option<Point> {
        frame
            .get(self.range())
            .map(|xyz| Point::new(xyz[0], xyz[1], xyz[2]))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MarkerSet {
    names: Vec<MarkerName>,
    index: HashMap<MarkerName, usize, RandomState>,
    data: Vec<f64>,
    num_frames: usize,
}

impl MarkerSet {
    /// Build the set from labelled frames.
    ///
    /// The marker order of the first frame defines the layout of the flat buffer.
    /// Every subsequent frame must list the same markers in the same order.
    ///
    /// Arguments
    /// -----------------
    /// * `frames` - one iterable of `(name, position)` pairs per frame.
    ///
    /// Return
    /// ----------
    /// * The marker set, or [`CgmError::MarkerLayout`] when a frame deviates from the
    ///   first frame's layout or a marker name is repeated inside a frame.
    pub fn from_frames<I, F, S>(frames: I) -> Result<Self, CgmError>
    where
        I: IntoIterator<Item = F>,
        F: IntoIterator<Item = (S, Point)>,
        S: Into<MarkerName>,
    {
        let mut names: Vec<MarkerName> = Vec::new();
        let mut data = Vec::new();
        let mut num_frames = 0;

        for (frame_idx, frame) in frames.into_iter().enumerate() {
            let mut count = 0;
            for (pos, (name, point)) in frame.into_iter().enumerate() {
                let name: MarkerName = name.into();
                if frame_idx == 0 {
                    names.push(name);
                } else if names.get(pos) != Some(&name) {
                    return Err(CgmError::MarkerLayout(format!(
                        "frame {frame_idx} has marker '{name}' at position {pos}, expected {:?}",
                        names.get(pos)
                    )));
                }
                data.extend_from_slice(point.as_slice());
                count += 1;
            }
            if count != names.len() {
                return Err(CgmError::MarkerLayout(format!(
                    "frame {frame_idx} has {count} markers, expected {}",
                    names.len()
                )));
            }
            num_frames += 1;
        }

        let mut set = Self::from_parts(names, data)?;
        set.num_frames = num_frames;
        Ok(set)
    }

    /// Build the set from an already flattened buffer.
    ///
    /// `data.len()` must be a multiple of `3 * names.len()`; the quotient is the
    /// number of frames. An empty name list with an empty buffer is a valid zero-frame set.
    pub fn from_flat(names: Vec<MarkerName>, data: Vec<f64>) -> Result<Self, CgmError> {
        let floats_per_frame = names.len() * FLOATS_PER_MARKER;
        if floats_per_frame == 0 {
            if !data.is_empty() {
                return Err(CgmError::BufferShape {
                    context: "marker buffer without marker names",
                    expected: 0,
                    found: data.len(),
                });
            }
            return Self::from_parts(names, data);
        }
        if data.len() % floats_per_frame != 0 {
            return Err(CgmError::BufferShape {
                context: "marker buffer is not a whole number of frames",
                expected: (data.len() / floats_per_frame + 1) * floats_per_frame,
                found: data.len(),
            });
        }
        let num_frames = data.len() / floats_per_frame;
        let mut set = Self::from_parts(names, data)?;
        set.num_frames = num_frames;
        Ok(set)
    }

    fn from_parts(names: Vec<MarkerName>, data: Vec<f64>) -> Result<Self, CgmError> {
        if let Some(dup) = names.iter().duplicates().next() {
            return Err(CgmError::MarkerLayout(format!(
                "marker '{dup}' appears twice in a frame"
            )));
        }
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Ok(MarkerSet {
            names,
            index,
            data,
            num_frames: 0,
        })
    }

    /// Offset range of `name` inside a frame buffer, `None` if the subject has no such marker.
    pub fn slice_of(&self, name: &str) -> Option<MarkerSlice> {
        self.index.get(name).map(|&i| MarkerSlice {
            start: i * FLOATS_PER_MARKER,
        })
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    pub fn is_empty(&self) -> bool {
        self.num_frames == 0
    }

    pub fn marker_names(&self) -> &[MarkerName] {
        &self.names
    }

    pub fn floats_per_frame(&self) -> usize {
        self.names.len() * FLOATS_PER_MARKER
    }

    /// Flat buffer of one frame.
    pub fn frame(&self, frame: usize) -> Option<&[f64]> {
        if frame >= self.num_frames {
            return None;
        }
        let n = self.floats_per_frame();
        self.data.get(frame * n..(frame + 1) * n)
    }

    /// Flat buffer of a contiguous block of frames.
    pub fn frames(&self, frames: Range<usize>) -> Result<&[f64], CgmError> {
        if frames.start > frames.end || frames.end > self.num_frames {
            return Err(CgmError::FrameRange {
                start: frames.start,
                end: frames.end,
                num_frames: self.num_frames,
            });
        }
        let n = self.floats_per_frame();
        Ok(&self.data[frames.start * n..frames.end * n])
    }

    pub fn position(&self, frame: usize, name: &str) -> Option<Point> {
        self.slice_of(name)?.read(self.frame(frame)?)
    }

    /// Build a new set holding the given frames in the given order.
    ///
    /// Out of range indices are rejected with [`CgmError::FrameRange`].
    pub fn reordered(&self, order: &[usize]) -> Result<Self, CgmError> {
        let mut data = Vec::with_capacity(order.len() * self.floats_per_frame());
        for &i in order {
            let frame = self.frame(i).ok_or(CgmError::FrameRange {
                start: i,
                end: i + 1,
                num_frames: self.num_frames,
            })?;
            data.extend_from_slice(frame);
        }
        Ok(MarkerSet {
            names: self.names.clone(),
            index: self.index.clone(),
            data,
            num_frames: order.len(),
        })
    }
}

#[cfg(test)]
mod markers_test {
    use super::*;

    fn two_frames() -> MarkerSet {
        MarkerSet::from_frames(vec![
            vec![
                ("RASI", Point::new(1.0, 2.0, 3.0)),
                ("LASI", Point::new(4.0, 5.0, 6.0)),
            ],
            vec![
                ("RASI", Point::new(7.0, 8.0, 9.0)),
                ("LASI", Point::new(10.0, 11.0, 12.0)),
            ],
        ])
        .unwrap()
    }

    #[test]
    fn test_slices_follow_first_frame_order() {
        let set = two_frames();
        assert_eq!(set.num_frames(), 2);
        assert_eq!(set.slice_of("RASI").unwrap().range(), 0..3);
        assert_eq!(set.slice_of("LASI").unwrap().range(), 3..6);
        assert!(set.slice_of("SACR").is_none());
        assert_eq!(set.frame(1).unwrap(), &[7.0, 8.0, 9.0, 10.0, 11.0, 12.0]);
        assert_eq!(set.position(1, "LASI"), Some(Point::new(10.0, 11.0, 12.0)));
        assert!(set.frame(2).is_none());
    }

    #[test]
    fn test_layout_mismatch_rejected() {
        let err = MarkerSet::from_frames(vec![
            vec![("RASI", Point::zeros()), ("LASI", Point::zeros())],
            vec![("LASI", Point::zeros()), ("RASI", Point::zeros())],
        ])
        .unwrap_err();
        assert!(matches!(err, CgmError::MarkerLayout(_)));

        let err = MarkerSet::from_frames(vec![
            vec![("RASI", Point::zeros()), ("LASI", Point::zeros())],
            vec![("RASI", Point::zeros())],
        ])
        .unwrap_err();
        assert!(matches!(err, CgmError::MarkerLayout(_)));
    }

    #[test]
    fn test_flat_buffer_shape() {
        let set = MarkerSet::from_flat(vec!["A".into()], vec![0.0; 9]).unwrap();
        assert_eq!(set.num_frames(), 3);
        assert!(MarkerSet::from_flat(vec!["A".into()], vec![0.0; 8]).is_err());
        assert!(MarkerSet::from_flat(vec!["A".into(), "A".into()], vec![]).is_err());

        let empty = MarkerSet::from_flat(vec!["A".into()], vec![]).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.frames(0..0).unwrap().len(), 0);
    }

    #[test]
    fn test_reordered() {
        let set = two_frames();
        let swapped = set.reordered(&[1, 0]).unwrap();
        assert_eq!(swapped.position(0, "RASI"), set.position(1, "RASI"));
        assert!(set.reordered(&[2]).is_err());
    }
}
