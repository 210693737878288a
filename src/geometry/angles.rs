//! Default angle functions.
//!
//! Every joint angle is the Cardan decomposition (y, then x, then z) of a distal
//! segment frame expressed in a proximal frame, or in the laboratory frame for the
//! segment orientation angles (pelvis, foot progression, head, thorax). Results are
//! `[flexion, abduction, rotation]` in degrees. On the left side abduction and
//! rotation are mirrored so that both sides share the same clinical sign.

use nalgebra::Matrix3;

use crate::{
    cgm_errors::CgmError,
    constants::{Angle, Axis},
    eval::Args,
    geometry::{rotation, Side},
};

/// Cardan angles of `distal` relative to `proximal` (both rotation matrices whose
/// columns are the segment directions), sequence y-x-z, in degrees.
pub fn cardan_angles(proximal: &Matrix3<f64>, distal: &Matrix3<f64>) -> Angle {
    // m[(i, j)] = distal_i . proximal_j
    let m = distal.transpose() * proximal;
    let flexion = m[(2, 0)].atan2(m[(2, 2)]);
    let abduction = (-m[(2, 1)]).atan2(m[(2, 0)].hypot(m[(2, 2)]));
    let rotation = m[(0, 1)].atan2(m[(1, 1)]);
    Angle::new(
        flexion.to_degrees(),
        abduction.to_degrees(),
        rotation.to_degrees(),
    )
}

fn mirrored(angle: Angle, side: Side) -> Angle {
    Angle::new(angle.x, side.sign() * angle.y, side.sign() * angle.z)
}

fn joint(proximal: &Axis, distal: &Axis, side: Side) -> Angle {
    mirrored(cardan_angles(&rotation(proximal), &rotation(distal)), side)
}

fn global(segment: &Axis, side: Side) -> Angle {
    mirrored(cardan_angles(&Matrix3::identity(), &rotation(segment)), side)
}

/// Shared shape of the bilateral joints: `[proximal_r, proximal_l, distal_r, distal_l]`.
fn bilateral(args: &Args<'_>) -> Result<Vec<Angle>, CgmError> {
    Ok(vec![
        joint(&args.axis_or_nan(0)?, &args.axis_or_nan(2)?, Side::Right),
        joint(&args.axis_or_nan(1)?, &args.axis_or_nan(3)?, Side::Left),
    ])
}

/// Pelvis orientation in the laboratory. Arguments: `Pelvis`.
pub fn pelvis_angle(args: &Args<'_>) -> Result<Vec<Angle>, CgmError> {
    Ok(vec![global(&args.axis_or_nan(0)?, Side::Right)])
}

/// Thigh relative to pelvis. Arguments: `Pelvis, RKnee, LKnee`.
pub fn hip_angle(args: &Args<'_>) -> Result<Vec<Angle>, CgmError> {
    let pelvis = args.axis_or_nan(0)?;
    Ok(vec![
        joint(&pelvis, &args.axis_or_nan(1)?, Side::Right),
        joint(&pelvis, &args.axis_or_nan(2)?, Side::Left),
    ])
}

/// Shank relative to thigh. Arguments: `RKnee, LKnee, RAnkle, LAnkle`.
pub fn knee_angle(args: &Args<'_>) -> Result<Vec<Angle>, CgmError> {
    bilateral(args)
}

/// Foot relative to shank. Arguments: `RAnkle, LAnkle, RFoot, LFoot`.
pub fn ankle_angle(args: &Args<'_>) -> Result<Vec<Angle>, CgmError> {
    bilateral(args)
}

/// Foot progression in the laboratory. Arguments: `RFoot, LFoot`.
pub fn foot_angle(args: &Args<'_>) -> Result<Vec<Angle>, CgmError> {
    Ok(vec![
        global(&args.axis_or_nan(0)?, Side::Right),
        global(&args.axis_or_nan(1)?, Side::Left),
    ])
}

/// Head orientation in the laboratory. Arguments: `Head`.
pub fn head_angle(args: &Args<'_>) -> Result<Vec<Angle>, CgmError> {
    Ok(vec![global(&args.axis_or_nan(0)?, Side::Right)])
}

/// Thorax orientation in the laboratory. Arguments: `Thorax`.
pub fn thorax_angle(args: &Args<'_>) -> Result<Vec<Angle>, CgmError> {
    Ok(vec![global(&args.axis_or_nan(0)?, Side::Right)])
}

/// Head relative to thorax. Arguments: `Thorax, Head`.
pub fn neck_angle(args: &Args<'_>) -> Result<Vec<Angle>, CgmError> {
    Ok(vec![joint(
        &args.axis_or_nan(0)?,
        &args.axis_or_nan(1)?,
        Side::Right,
    )])
}

/// Thorax relative to pelvis. Arguments: `Pelvis, Thorax`.
pub fn spine_angle(args: &Args<'_>) -> Result<Vec<Angle>, CgmError> {
    Ok(vec![joint(
        &args.axis_or_nan(0)?,
        &args.axis_or_nan(1)?,
        Side::Right,
    )])
}

/// Upper arm relative to thorax. Arguments: `Thorax, RHum, LHum`.
pub fn shoulder_angle(args: &Args<'_>) -> Result<Vec<Angle>, CgmError> {
    let thorax = args.axis_or_nan(0)?;
    Ok(vec![
        joint(&thorax, &args.axis_or_nan(1)?, Side::Right),
        joint(&thorax, &args.axis_or_nan(2)?, Side::Left),
    ])
}

/// Forearm relative to upper arm. Arguments: `RHum, LHum, RRad, LRad`.
pub fn elbow_angle(args: &Args<'_>) -> Result<Vec<Angle>, CgmError> {
    bilateral(args)
}

/// Hand relative to forearm. Arguments: `RRad, LRad, RHand, LHand`.
pub fn wrist_angle(args: &Args<'_>) -> Result<Vec<Angle>, CgmError> {
    bilateral(args)
}
