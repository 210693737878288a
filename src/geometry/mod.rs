//! # Segment geometry
//!
//! Default axis and angle functions of the Conventional Gait Model and the vector
//! helpers they share.
//!
//! Conventions
//! -----------------
//! * Laboratory and segment frames are right-handed.
//! * An [`Axis`] stores the unit x, y, z directions of the segment frame in its first
//!   three columns and the origin in its last column, bottom row `[0, 0, 0, 1]`.
//! * Lengths are in millimetres, measurements given as angles are in radians except
//!   tibial torsion (degrees), and joint angles are reported in degrees.
//! * An absent input without a defined fallback yields NaN outputs.
//!
//! See also
//! ------------
//! * [`axes`] – Segment frame construction (pelvis to hand).
//! * [`angles`] – Cardan decomposition of relative segment orientations.

pub mod angles;
pub mod axes;

use nalgebra::{Matrix3, Rotation3, Unit, Vector3};

use crate::constants::{Axis, Point};

/// Body side of a bilateral segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Right,
    Left,
}

impl Side {
    /// `+1` on the right, `-1` on the left; mirrors left-side quantities.
    #[inline]
    pub fn sign(self) -> f64 {
        match self {
            Side::Right => 1.0,
            Side::Left => -1.0,
        }
    }
}

#[inline]
pub fn is_finite(p: &Point) -> bool {
    p.iter().all(|v| v.is_finite())
}

/// Normalize `v`; a zero or non finite vector becomes NaN instead of dividing by zero.
#[inline]
pub fn unit(v: Vector3<f64>) -> Vector3<f64> {
    let n = v.norm();
    if n > 0.0 && n.is_finite() {
        v / n
    } else {
        Vector3::repeat(f64::NAN)
    }
}

#[inline]
pub fn midpoint(a: &Point, b: &Point) -> Point {
    (a + b) * 0.5
}

/// Assemble a segment frame from its origin and its three unit directions.
pub fn frame_from_axes(origin: &Point, x: &Vector3<f64>, y: &Vector3<f64>, z: &Vector3<f64>) -> Axis {
    Axis::new(
        x.x, y.x, z.x, origin.x, //
        x.y, y.y, z.y, origin.y, //
        x.z, y.z, z.z, origin.z, //
        0.0, 0.0, 0.0, 1.0,
    )
}

/// Assemble a segment frame from an origin and a rotation whose columns are the directions.
pub fn frame_from_rotation(origin: &Point, rot: &Matrix3<f64>) -> Axis {
    frame_from_axes(
        origin,
        &rot.column(0).into_owned(),
        &rot.column(1).into_owned(),
        &rot.column(2).into_owned(),
    )
}

#[inline]
pub fn origin(axis: &Axis) -> Point {
    Point::new(axis[(0, 3)], axis[(1, 3)], axis[(2, 3)])
}

/// Column `k` (0 = x, 1 = y, 2 = z) of the segment frame.
#[inline]
pub fn direction(axis: &Axis, k: usize) -> Vector3<f64> {
    Vector3::new(axis[(0, k)], axis[(1, k)], axis[(2, k)])
}

#[inline]
pub fn rotation(axis: &Axis) -> Matrix3<f64> {
    axis.fixed_view::<3, 3>(0, 0).into_owned()
}

/// Rotate a frame's directions about one of its own axes by `angle` radians.
pub fn rotate_about_local(axis: &Axis, k: usize, angle: f64) -> Axis {
    let local = match k {
        0 => Vector3::x_axis(),
        1 => Vector3::y_axis(),
        _ => Vector3::z_axis(),
    };
    let rot = rotation(axis) * Rotation3::from_axis_angle(&local, angle).matrix();
    frame_from_rotation(&origin(axis), &rot)
}

/// Joint centre from a plane of three points (the CGM "chord function").
///
/// `a` is a reference point defining the plane, `b` the proximal joint centre and `c`
/// the marker on the joint. The returned point `j` lies in the plane of `a, b, c`
/// at distance `delta` from `c`, with `(j - c)` perpendicular to `(j - b)`.
///
/// Arguments
/// -----------------
/// * `a` - Reference point (wand or thigh marker).
/// * `b` - Proximal joint centre.
/// * `c` - Lateral joint marker.
/// * `delta` - Joint half width plus marker radius.
///
/// Return
/// ----------
/// * The joint centre; NaN when `delta` exceeds `|b - c|` or the points are collinear.
pub fn chord_joint_center(a: &Point, b: &Point, c: &Point, delta: f64) -> Point {
    let v1 = a - c;
    let v2 = b - c;
    let normal = v1.cross(&v2);
    let mid = midpoint(b, c);
    let half_length = v2.norm() * 0.5;
    let theta = (delta / v2.norm()).acos();

    let rot = Rotation3::from_axis_angle(&Unit::new_unchecked(unit(normal)), 2.0 * theta);
    let r = unit(rot * v2) * half_length;
    mid + r
}
