//! # Constants and type definitions for the gait model
//!
//! This module centralizes the **numeric conventions**, **model constants** and
//! **common type aliases** used throughout the crate.
//!
//! ## Overview
//!
//! - Per-entity float counts of the flat result buffers
//! - Anthropometric constants of the Conventional Gait Model
//! - Core type aliases (positions, axes, angles, names)
//!
//! Every geometric quantity is stored as `f64`.

use nalgebra::{Matrix4, Vector3};

// -------------------------------------------------------------------------------------------------
// Flat buffer layout
// -------------------------------------------------------------------------------------------------

/// Floats stored per marker in a frame buffer (x, y, z).
pub const FLOATS_PER_MARKER: usize = 3;

/// Floats stored per axis in the flat result buffer (row-major 4x4).
pub const FLOATS_PER_AXIS: usize = 16;

/// Floats stored per angle in the flat result buffer.
pub const FLOATS_PER_ANGLE: usize = 3;

// -------------------------------------------------------------------------------------------------
// Model constants
// -------------------------------------------------------------------------------------------------

/// Radius of the retro-reflective markers, in millimetres.
pub const MARKER_RADIUS: Millimeter = 7.0;

/// Davis regression: angle between the ASIS plane and the hip joint centre direction (rad).
pub const HJC_THETA: Radian = 0.5;

/// Davis regression: pelvic tilt of the regression frame (rad).
pub const HJC_BETA: Radian = 0.314;

/// Davis regression of the hip joint centre distance on leg length: `C = slope * L - intercept`.
pub const HJC_LEG_SLOPE: f64 = 0.115;
pub const HJC_LEG_INTERCEPT: Millimeter = 15.3;

/// Regression used when the ASIS to trochanter distance was not measured.
pub const ASIS_TROCANTER_SLOPE: f64 = 0.1288;
pub const ASIS_TROCANTER_INTERCEPT: Millimeter = 48.56;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

pub type Millimeter = f64;
pub type Radian = f64;
pub type Degree = f64;

/// A marker position or a free vector in the laboratory frame.
pub type Point = Vector3<f64>;

/// A segment frame: columns 0..3 are the unit x, y, z directions, column 3 the origin.
pub type Axis = Matrix4<f64>;

/// A joint angle triple `[flexion, abduction, rotation]` in degrees.
pub type Angle = Vector3<Degree>;

pub type MarkerName = String;
pub type MeasurementName = String;
