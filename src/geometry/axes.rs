//! Default axis functions of the Conventional Gait Model.
//!
//! Each function reads its arguments in the order registered by
//! [`default_specs`](crate::pipeline::defaults::default_specs) and returns one
//! frame per declared output. Limb frames have z running toward the proximal
//! joint centre and y toward the subject's left; pelvis, head, thorax and foot
//! frames have x forward and z upward.

use crate::{
    cgm_errors::CgmError,
    constants::{
        Axis, Point, ASIS_TROCANTER_INTERCEPT, ASIS_TROCANTER_SLOPE, HJC_BETA, HJC_LEG_INTERCEPT,
        HJC_LEG_SLOPE, HJC_THETA, MARKER_RADIUS,
    },
    eval::Args,
    geometry::{
        chord_joint_center, direction, frame_from_axes, frame_from_rotation, is_finite, midpoint,
        origin, rotate_about_local, rotation, unit, Side,
    },
};

/// Scalar at `index`, or `fallback` when it is absent or beyond the argument list.
fn scalar_or(args: &Args<'_>, index: usize, fallback: f64) -> Result<f64, CgmError> {
    if index >= args.len() {
        return Ok(fallback);
    }
    Ok(args.scalar(index)?.unwrap_or(fallback))
}

/// Pelvis frame from the ASIS and PSIS markers.
///
/// Arguments: `RASI, LASI, RPSI, LPSI[, SACR]`. The sacrum is the PSIS midpoint when
/// both PSIS markers are present and finite, the SACR marker otherwise.
/// The origin is the ASIS midpoint, y points from RASI to LASI, x points forward
/// (from the sacrum, orthogonalised against y) and z = x × y.
pub fn pelvis_axis(args: &Args<'_>) -> Result<Vec<Axis>, CgmError> {
    let rasi = args.point_or_nan(0)?;
    let lasi = args.point_or_nan(1)?;
    let sacr = if args.len() > 4 { args.point(4)? } else { None };

    let sacrum = match (args.point(2)?, args.point(3)?) {
        (Some(rpsi), Some(lpsi)) if is_finite(&rpsi) && is_finite(&lpsi) => midpoint(&rpsi, &lpsi),
        _ => sacr.unwrap_or_else(|| Point::repeat(f64::NAN)),
    };

    let o = midpoint(&rasi, &lasi);
    let y = unit(lasi - rasi);
    let forward = o - sacrum;
    let x = unit(forward - y * forward.dot(&y));
    let z = x.cross(&y);
    Ok(vec![frame_from_axes(&o, &x, &y, &z)])
}

/// Hip joint centres by the Davis regression, in the pelvis orientation.
///
/// Arguments: `Pelvis, MeanLegLength, R_AsisToTrocanterMeasure,
/// L_AsisToTrocanterMeasure, InterAsisDistance`. An absent or zero ASIS to
/// trochanter distance is estimated from the leg length.
pub fn hip_joint_center(args: &Args<'_>) -> Result<Vec<Axis>, CgmError> {
    let pelvis = args.axis_or_nan(0)?;
    let leg = args.scalar_or_nan(1)?;
    let trochanter = |measured: Option<f64>| match measured {
        Some(v) if v != 0.0 => v,
        _ => ASIS_TROCANTER_SLOPE * leg - ASIS_TROCANTER_INTERCEPT,
    };
    let r_at = trochanter(args.scalar(2)?);
    let l_at = trochanter(args.scalar(3)?);
    let half_asis = args.scalar_or_nan(4)? / 2.0;

    let c = leg * HJC_LEG_SLOPE - HJC_LEG_INTERCEPT;
    let lateral = half_asis - c * HJC_THETA.sin();
    let local = |at: f64, side: Side| {
        Point::new(
            -(at + MARKER_RADIUS) * HJC_BETA.cos() + c * HJC_THETA.cos() * HJC_BETA.sin(),
            -side.sign() * lateral,
            -(at + MARKER_RADIUS) * HJC_BETA.sin() - c * HJC_THETA.cos() * HJC_BETA.cos(),
        )
    };

    let rot = rotation(&pelvis);
    let o = origin(&pelvis);
    let right = o + rot * local(r_at, Side::Right);
    let left = o + rot * local(l_at, Side::Left);
    Ok(vec![
        frame_from_rotation(&right, &rot),
        frame_from_rotation(&left, &rot),
    ])
}

/// Mid-hip frame: origin between the hip joint centres, pelvis orientation.
///
/// Arguments: `RHipJC, LHipJC, Pelvis`.
pub fn hip_axis(args: &Args<'_>) -> Result<Vec<Axis>, CgmError> {
    let r = origin(&args.axis_or_nan(0)?);
    let l = origin(&args.axis_or_nan(1)?);
    let pelvis = args.axis_or_nan(2)?;
    Ok(vec![frame_from_rotation(&midpoint(&r, &l), &rotation(&pelvis))])
}

/// Distal joint frame shared by the knee and the ankle: joint centre from the chord
/// function, z toward the proximal joint, x forward using the lateral marker pair.
fn lower_limb_frame(
    wand: &Point,
    joint_marker: &Point,
    proximal: &Point,
    width: f64,
    side: Side,
) -> Axis {
    let center = chord_joint_center(wand, proximal, joint_marker, width / 2.0 + MARKER_RADIUS);
    let z = unit(proximal - center);
    let lateral = wand - joint_marker;
    let x = match side {
        Side::Right => unit(z.cross(&lateral)),
        Side::Left => unit(lateral.cross(&z)),
    };
    let y = z.cross(&x);
    frame_from_axes(&center, &x, &y, &z)
}

/// Thigh frames at the knee joint centres.
///
/// Arguments: `RTHI, LTHI, RKNE, LKNE, RHipJC, LHipJC, RightKneeWidth, LeftKneeWidth`.
pub fn knee_axis(args: &Args<'_>) -> Result<Vec<Axis>, CgmError> {
    let right = lower_limb_frame(
        &args.point_or_nan(0)?,
        &args.point_or_nan(2)?,
        &origin(&args.axis_or_nan(4)?),
        args.scalar_or_nan(6)?,
        Side::Right,
    );
    let left = lower_limb_frame(
        &args.point_or_nan(1)?,
        &args.point_or_nan(3)?,
        &origin(&args.axis_or_nan(5)?),
        args.scalar_or_nan(7)?,
        Side::Left,
    );
    Ok(vec![right, left])
}

/// Shank frames at the ankle joint centres, turned by the tibial torsion.
///
/// Arguments: `RTIB, LTIB, RANK, LANK, RKnee, LKnee, RightAnkleWidth,
/// LeftAnkleWidth, RightTibialTorsion, LeftTibialTorsion`. Torsion is in degrees,
/// positive external; an absent torsion counts as zero.
pub fn ankle_axis(args: &Args<'_>) -> Result<Vec<Axis>, CgmError> {
    let mut frames = Vec::with_capacity(2);
    for (side, offset) in [(Side::Right, 0), (Side::Left, 1)] {
        let shank = lower_limb_frame(
            &args.point_or_nan(offset)?,
            &args.point_or_nan(2 + offset)?,
            &origin(&args.axis_or_nan(4 + offset)?),
            args.scalar_or_nan(6 + offset)?,
            side,
        );
        let torsion = scalar_or(args, 8 + offset, 0.0)?.to_radians();
        frames.push(rotate_about_local(&shank, 2, -side.sign() * torsion));
    }
    Ok(frames)
}

/// Foot frames at the toe markers.
///
/// Arguments: `RTOE, LTOE, RAnkle, LAnkle, RightStaticRotOff, LeftStaticRotOff,
/// RightStaticPlantFlex, LeftStaticPlantFlex`. x points from the ankle joint centre
/// to the toe, y follows the shank's y. The static offsets (radians, absent = 0)
/// turn the frame about its y axis (plantar flexion) then its z axis (rotation).
pub fn foot_axis(args: &Args<'_>) -> Result<Vec<Axis>, CgmError> {
    let mut frames = Vec::with_capacity(2);
    for (side, offset) in [(Side::Right, 0), (Side::Left, 1)] {
        let toe = args.point_or_nan(offset)?;
        let ankle = args.axis_or_nan(2 + offset)?;

        let x = unit(toe - origin(&ankle));
        let z = unit(x.cross(&direction(&ankle, 1)));
        let y = z.cross(&x);
        let foot = frame_from_axes(&toe, &x, &y, &z);

        let rot_off = scalar_or(args, 4 + offset, 0.0)?;
        let plant_flex = scalar_or(args, 6 + offset, 0.0)?;
        let foot = rotate_about_local(&foot, 1, plant_flex);
        frames.push(rotate_about_local(&foot, 2, -side.sign() * rot_off));
    }
    Ok(frames)
}

/// Head frame from the four head markers.
///
/// Arguments: `LFHD, RFHD, LBHD, RBHD[, HeadOffset]`. The origin is the front
/// midpoint; the offset (radians, absent = 0) turns the frame about its y axis.
pub fn head_axis(args: &Args<'_>) -> Result<Vec<Axis>, CgmError> {
    let lfhd = args.point_or_nan(0)?;
    let rfhd = args.point_or_nan(1)?;
    let lbhd = args.point_or_nan(2)?;
    let rbhd = args.point_or_nan(3)?;

    let front = midpoint(&lfhd, &rfhd);
    let back = midpoint(&lbhd, &rbhd);
    let left = midpoint(&lfhd, &lbhd);
    let right = midpoint(&rfhd, &rbhd);

    let x = unit(front - back);
    let z = unit(x.cross(&(left - right)));
    let y = z.cross(&x);
    let head = frame_from_axes(&front, &x, &y, &z);
    Ok(vec![rotate_about_local(&head, 1, scalar_or(args, 4, 0.0)?)])
}

/// Thorax frame from the trunk markers.
///
/// Arguments: `CLAV, C7, STRN, T10`. z runs from the lower to the upper marker pair,
/// x forward; the origin sits one marker radius behind CLAV.
pub fn thorax_axis(args: &Args<'_>) -> Result<Vec<Axis>, CgmError> {
    let clav = args.point_or_nan(0)?;
    let c7 = args.point_or_nan(1)?;
    let strn = args.point_or_nan(2)?;
    let t10 = args.point_or_nan(3)?;

    let upper = midpoint(&clav, &c7);
    let lower = midpoint(&strn, &t10);
    let front = midpoint(&clav, &strn);
    let back = midpoint(&c7, &t10);

    let z = unit(upper - lower);
    let y = unit(z.cross(&(front - back)));
    let x = y.cross(&z);
    let o = clav - x * MARKER_RADIUS;
    Ok(vec![frame_from_axes(&o, &x, &y, &z)])
}

/// Clavicle frames at the shoulder joint centres.
///
/// Arguments: `RSHO, LSHO, Thorax, RightShoulderOffset, LeftShoulderOffset`.
/// A virtual wand marker perpendicular to the thorax-to-shoulder line fixes the plane
/// in which the shoulder joint centre is placed; z points from the joint centre to
/// the thorax origin.
pub fn clav_axis(args: &Args<'_>) -> Result<Vec<Axis>, CgmError> {
    let thorax = args.axis_or_nan(2)?;
    let thorax_o = origin(&thorax);
    let thorax_x = direction(&thorax, 0);

    let mut frames = Vec::with_capacity(2);
    for (side, offset) in [(Side::Right, 0), (Side::Left, 1)] {
        let sho = args.point_or_nan(offset)?;
        let reach = sho - thorax_o;
        let wand = sho
            + match side {
                Side::Right => unit(reach.cross(&thorax_x)),
                Side::Left => unit(thorax_x.cross(&reach)),
            };
        let delta = args.scalar_or_nan(3 + offset)? + MARKER_RADIUS;
        let sjc = chord_joint_center(&wand, &thorax_o, &sho, delta);

        let z = unit(thorax_o - sjc);
        let up = wand - sjc;
        let x = match side {
            Side::Right => unit(z.cross(&up)),
            Side::Left => unit(up.cross(&z)),
        };
        let y = z.cross(&x);
        frames.push(frame_from_axes(&sjc, &x, &y, &z));
    }
    Ok(frames)
}

/// Upper-arm frames at the elbow joint centres, plus the wrist joint centres.
///
/// Arguments: `RELB, LELB, RWRA, RWRB, LWRA, LWRB, RClav, LClav, RightElbowWidth,
/// LeftElbowWidth, RightWristWidth, LeftWristWidth[, marker radius]`.
/// Returns `[RHum, LHum, RHumJC, LHumJC]`; the wrist joint centre frames carry the
/// upper-arm orientation.
pub fn hum_axis(args: &Args<'_>) -> Result<Vec<Axis>, CgmError> {
    let marker_radius = scalar_or(args, 12, MARKER_RADIUS)?;

    let mut humerus = Vec::with_capacity(2);
    let mut wrists = Vec::with_capacity(2);
    for (side, offset) in [(Side::Right, 0), (Side::Left, 1)] {
        let elb = args.point_or_nan(offset)?;
        let wra = args.point_or_nan(2 + 2 * offset)?;
        let wrb = args.point_or_nan(3 + 2 * offset)?;
        let sjc = origin(&args.axis_or_nan(6 + offset)?);
        let elbow_width = args.scalar_or_nan(8 + offset)?;
        let wrist_width = args.scalar_or_nan(10 + offset)?;

        let wri = midpoint(&wra, &wrb);
        let ejc = chord_joint_center(&wri, &sjc, &elb, elbow_width / 2.0 + marker_radius);

        let z = unit(sjc - ejc);
        // medial-to-lateral line of the epicondyles, oriented to the subject's left
        let leftward = (ejc - elb) * side.sign();
        let x = unit(leftward.cross(&z));
        let y = z.cross(&x);
        let hum = frame_from_axes(&ejc, &x, &y, &z);

        let bar = wra - wrb;
        let toward_palm = match side {
            Side::Right => unit(bar.cross(&(ejc - wri))),
            Side::Left => unit((ejc - wri).cross(&bar)),
        };
        let wjc = wri + toward_palm * (wrist_width / 2.0 + marker_radius);

        wrists.push(frame_from_rotation(&wjc, &rotation(&hum)));
        humerus.push(hum);
    }
    humerus.extend(wrists);
    Ok(humerus)
}

/// Forearm frames at the wrist joint centres.
///
/// Arguments: `RHum, LHum, RHumJC, LHumJC`. z points from the wrist to the elbow
/// joint centre, y follows the upper arm's y.
pub fn rad_axis(args: &Args<'_>) -> Result<Vec<Axis>, CgmError> {
    let mut frames = Vec::with_capacity(2);
    for offset in 0..2 {
        let hum = args.axis_or_nan(offset)?;
        let wjc = origin(&args.axis_or_nan(2 + offset)?);
        let z = unit(origin(&hum) - wjc);
        let x = unit(direction(&hum, 1).cross(&z));
        let y = z.cross(&x);
        frames.push(frame_from_axes(&wjc, &x, &y, &z));
    }
    Ok(frames)
}

/// Hand frames at the hand joint centres.
///
/// Arguments: `RFIN, LFIN, RWRA, RWRB, LWRA, LWRB, RRad, LRad, RightHandThickness,
/// LeftHandThickness`.
pub fn hand_axis(args: &Args<'_>) -> Result<Vec<Axis>, CgmError> {
    let mut frames = Vec::with_capacity(2);
    for offset in 0..2 {
        let fin = args.point_or_nan(offset)?;
        let wri = midpoint(
            &args.point_or_nan(2 + 2 * offset)?,
            &args.point_or_nan(3 + 2 * offset)?,
        );
        let rad = args.axis_or_nan(6 + offset)?;
        let thickness = args.scalar_or_nan(8 + offset)?;

        let wjc = origin(&rad);
        let hjc = chord_joint_center(&wri, &wjc, &fin, thickness / 2.0 + MARKER_RADIUS);
        let z = unit(wjc - hjc);
        let x = unit(direction(&rad, 1).cross(&z));
        let y = z.cross(&x);
        frames.push(frame_from_axes(&hjc, &x, &y, &z));
    }
    Ok(frames)
}
