#![allow(dead_code)]

use approx::assert_relative_eq;
use cgm::{
    constants::{Axis, Point},
    pipeline::defaults::DEFAULT_MARKER_NAMES,
    Cgm, MarkerSet, MeasurementSet, StructuredResult,
};

/// Standing pose, lab frame: x forward, y to the subject's left, z up (mm).
const STANDING_POSE: [(&str, [f64; 3]); 33] = [
    ("RASI", [80.0, -120.0, 950.0]),
    ("LASI", [80.0, 120.0, 950.0]),
    ("RPSI", [-90.0, -45.0, 980.0]),
    ("LPSI", [-90.0, 45.0, 980.0]),
    ("SACR", [-95.0, 0.0, 980.0]),
    ("RTHI", [40.0, -160.0, 700.0]),
    ("LTHI", [40.0, 160.0, 700.0]),
    ("RKNE", [0.0, -140.0, 500.0]),
    ("LKNE", [0.0, 140.0, 500.0]),
    ("RTIB", [30.0, -130.0, 300.0]),
    ("LTIB", [30.0, 130.0, 300.0]),
    ("RANK", [-10.0, -120.0, 90.0]),
    ("LANK", [-10.0, 120.0, 90.0]),
    ("RTOE", [130.0, -110.0, 40.0]),
    ("LTOE", [130.0, 110.0, 40.0]),
    ("LFHD", [90.0, 70.0, 1650.0]),
    ("RFHD", [90.0, -70.0, 1650.0]),
    ("LBHD", [-80.0, 70.0, 1630.0]),
    ("RBHD", [-80.0, -70.0, 1630.0]),
    ("CLAV", [60.0, 0.0, 1400.0]),
    ("C7", [-80.0, 0.0, 1480.0]),
    ("STRN", [80.0, 0.0, 1250.0]),
    ("T10", [-100.0, 0.0, 1200.0]),
    ("RSHO", [0.0, -190.0, 1420.0]),
    ("LSHO", [0.0, 190.0, 1420.0]),
    ("RELB", [-20.0, -220.0, 1130.0]),
    ("LELB", [-20.0, 220.0, 1130.0]),
    ("RWRA", [30.0, -240.0, 880.0]),
    ("RWRB", [-20.0, -200.0, 880.0]),
    ("LWRA", [30.0, 240.0, 880.0]),
    ("LWRB", [-20.0, 200.0, 880.0]),
    ("RFIN", [20.0, -230.0, 780.0]),
    ("LFIN", [20.0, 230.0, 780.0]),
];

/// Marker position of `marker` (index into the pose) at `frame`: the standing pose
/// walking forward with a small marker-specific sway, so that every frame differs.
pub fn marker_at(marker: usize, frame: usize) -> Point {
    let [x, y, z] = STANDING_POSE[marker].1;
    let t = frame as f64;
    let m = marker as f64;
    Point::new(
        x + 12.0 * t + 5.0 * (0.1 * t + m).sin(),
        y + 5.0 * (0.07 * t + m).cos(),
        z + 3.0 * (0.13 * t).sin(),
    )
}

pub fn marker_frames(num_frames: usize) -> Vec<Vec<(&'static str, Point)>> {
    (0..num_frames)
        .map(|f| {
            STANDING_POSE
                .iter()
                .enumerate()
                .map(|(m, (name, _))| (*name, marker_at(m, f)))
                .collect()
        })
        .collect()
}

pub fn subject_markers(num_frames: usize) -> MarkerSet {
    if num_frames == 0 {
        let names = DEFAULT_MARKER_NAMES.map(String::from).to_vec();
        return MarkerSet::from_flat(names, Vec::new()).unwrap();
    }
    MarkerSet::from_frames(marker_frames(num_frames)).unwrap()
}

pub fn subject_measurements() -> MeasurementSet {
    MeasurementSet::from_iter([
        ("MeanLegLength", 940.0),
        ("R_AsisToTrocanterMeasure", 72.5),
        ("L_AsisToTrocanterMeasure", 72.5),
        ("InterAsisDistance", 240.0),
        ("RightKneeWidth", 105.0),
        ("LeftKneeWidth", 105.0),
        ("RightAnkleWidth", 70.0),
        ("LeftAnkleWidth", 70.0),
        ("RightTibialTorsion", 0.0),
        ("LeftTibialTorsion", 0.0),
        ("RightStaticRotOff", 0.01),
        ("LeftStaticRotOff", 0.01),
        ("RightStaticPlantFlex", 0.2),
        ("LeftStaticPlantFlex", 0.2),
        ("HeadOffset", 0.25),
        ("RightShoulderOffset", 40.0),
        ("LeftShoulderOffset", 40.0),
        ("RightElbowWidth", 75.0),
        ("LeftElbowWidth", 75.0),
        ("RightWristWidth", 55.0),
        ("LeftWristWidth", 55.0),
        ("RightHandThickness", 30.0),
        ("LeftHandThickness", 30.0),
    ])
}

/// Default model of the synthetic subject over `num_frames` frames.
pub fn subject_model(num_frames: usize) -> Cgm {
    Cgm::new(subject_measurements(), subject_markers(num_frames)).unwrap()
}

/// Bitwise equality of two results, NaN included.
pub fn assert_results_identical(actual: &StructuredResult, expected: &StructuredResult) {
    assert_eq!(actual.num_frames(), expected.num_frames());
    assert_eq!(actual.axis_names(), expected.axis_names());
    assert_eq!(actual.angle_names(), expected.angle_names());
    let bits = |v: &[f64]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(actual.flat_axes()), bits(expected.flat_axes()));
    assert_eq!(bits(actual.flat_angles()), bits(expected.flat_angles()));
}

pub fn assert_axis_close(actual: &Axis, expected: &Axis, epsilon: f64) {
    assert_relative_eq!(actual, expected, epsilon = epsilon);
}

/// The first three columns of `axis` form a proper rotation.
pub fn assert_orthonormal(axis: &Axis, epsilon: f64) {
    let rot = axis.fixed_view::<3, 3>(0, 0).into_owned();
    assert_relative_eq!(
        rot.transpose() * rot,
        nalgebra::Matrix3::identity(),
        epsilon = epsilon
    );
    assert_relative_eq!(rot.determinant(), 1.0, epsilon = epsilon);
    assert_eq!(axis.row(3).iter().copied().collect::<Vec<_>>(), [0.0, 0.0, 0.0, 1.0]);
}
