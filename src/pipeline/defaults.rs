//! The default Conventional Gait Model pipeline.
//!
//! [`default_specs`] lists every default function in evaluation order with the
//! marker, measurement and result names it reads. The order of the outputs below
//! is the order of the axis and angle registries of a freshly built model.

use crate::{
    geometry::{angles, axes},
    pipeline::function_spec::FunctionSpec,
};

pub const DEFAULT_AXIS_NAMES: [&str; 22] = [
    "Pelvis", "RHipJC", "LHipJC", "Hip", "RKnee", "LKnee", "RAnkle", "LAnkle", "RFoot", "LFoot",
    "Head", "Thorax", "RClav", "LClav", "RHum", "LHum", "RHumJC", "LHumJC", "RRad", "LRad",
    "RHand", "LHand",
];

pub const DEFAULT_ANGLE_NAMES: [&str; 19] = [
    "Pelvis", "RHip", "LHip", "RKnee", "LKnee", "RAnkle", "LAnkle", "RFoot", "LFoot", "Head",
    "Thorax", "Neck", "Spine", "RShoulder", "LShoulder", "RElbow", "LElbow", "RWrist", "LWrist",
];

/// Markers read by the default pipeline.
pub const DEFAULT_MARKER_NAMES: [&str; 33] = [
    "RASI", "LASI", "RPSI", "LPSI", "SACR", "RTHI", "LTHI", "RKNE", "LKNE", "RTIB", "LTIB",
    "RANK", "LANK", "RTOE", "LTOE", "LFHD", "RFHD", "LBHD", "RBHD", "CLAV", "C7", "STRN", "T10",
    "RSHO", "LSHO", "RELB", "LELB", "RWRA", "RWRB", "LWRA", "LWRB", "RFIN", "LFIN",
];

/// Axis pipeline, then angle pipeline, in evaluation order.
pub fn default_specs() -> Vec<FunctionSpec> {
    let mut specs = default_axis_specs();
    specs.extend(default_angle_specs());
    specs
}

pub fn default_axis_specs() -> Vec<FunctionSpec> {
    vec![
        FunctionSpec::new("pelvis_axis")
            .axis_function(axes::pelvis_axis)
            .markers(["RASI", "LASI", "RPSI", "LPSI", "SACR"])
            .returns_axes(["Pelvis"]),
        FunctionSpec::new("hip_joint_center")
            .axis_function(axes::hip_joint_center)
            .axis("Pelvis")
            .measurements([
                "MeanLegLength",
                "R_AsisToTrocanterMeasure",
                "L_AsisToTrocanterMeasure",
                "InterAsisDistance",
            ])
            .returns_axes(["RHipJC", "LHipJC"]),
        FunctionSpec::new("hip_axis")
            .axis_function(axes::hip_axis)
            .axes(["RHipJC", "LHipJC", "Pelvis"])
            .returns_axes(["Hip"]),
        FunctionSpec::new("knee_axis")
            .axis_function(axes::knee_axis)
            .markers(["RTHI", "LTHI", "RKNE", "LKNE"])
            .axes(["RHipJC", "LHipJC"])
            .measurements(["RightKneeWidth", "LeftKneeWidth"])
            .returns_axes(["RKnee", "LKnee"]),
        FunctionSpec::new("ankle_axis")
            .axis_function(axes::ankle_axis)
            .markers(["RTIB", "LTIB", "RANK", "LANK"])
            .axes(["RKnee", "LKnee"])
            .measurements([
                "RightAnkleWidth",
                "LeftAnkleWidth",
                "RightTibialTorsion",
                "LeftTibialTorsion",
            ])
            .returns_axes(["RAnkle", "LAnkle"]),
        FunctionSpec::new("foot_axis")
            .axis_function(axes::foot_axis)
            .markers(["RTOE", "LTOE"])
            .axes(["RAnkle", "LAnkle"])
            .measurements([
                "RightStaticRotOff",
                "LeftStaticRotOff",
                "RightStaticPlantFlex",
                "LeftStaticPlantFlex",
            ])
            .returns_axes(["RFoot", "LFoot"]),
        FunctionSpec::new("head_axis")
            .axis_function(axes::head_axis)
            .markers(["LFHD", "RFHD", "LBHD", "RBHD"])
            .measurement("HeadOffset")
            .returns_axes(["Head"]),
        FunctionSpec::new("thorax_axis")
            .axis_function(axes::thorax_axis)
            .markers(["CLAV", "C7", "STRN", "T10"])
            .returns_axes(["Thorax"]),
        FunctionSpec::new("clav_axis")
            .axis_function(axes::clav_axis)
            .markers(["RSHO", "LSHO"])
            .axis("Thorax")
            .measurements(["RightShoulderOffset", "LeftShoulderOffset"])
            .returns_axes(["RClav", "LClav"]),
        FunctionSpec::new("hum_axis")
            .axis_function(axes::hum_axis)
            .markers(["RELB", "LELB", "RWRA", "RWRB", "LWRA", "LWRB"])
            .axes(["RClav", "LClav"])
            .measurements([
                "RightElbowWidth",
                "LeftElbowWidth",
                "RightWristWidth",
                "LeftWristWidth",
            ])
            .literal(crate::constants::MARKER_RADIUS)
            .returns_axes(["RHum", "LHum", "RHumJC", "LHumJC"]),
        FunctionSpec::new("rad_axis")
            .axis_function(axes::rad_axis)
            .axes(["RHum", "LHum", "RHumJC", "LHumJC"])
            .returns_axes(["RRad", "LRad"]),
        FunctionSpec::new("hand_axis")
            .axis_function(axes::hand_axis)
            .markers(["RFIN", "LFIN", "RWRA", "RWRB", "LWRA", "LWRB"])
            .axes(["RRad", "LRad"])
            .measurements(["RightHandThickness", "LeftHandThickness"])
            .returns_axes(["RHand", "LHand"]),
    ]
}

pub fn default_angle_specs() -> Vec<FunctionSpec> {
    vec![
        FunctionSpec::new("pelvis_angle")
            .angle_function(angles::pelvis_angle)
            .axis("Pelvis")
            .returns_angles(["Pelvis"]),
        FunctionSpec::new("hip_angle")
            .angle_function(angles::hip_angle)
            .axes(["Pelvis", "RKnee", "LKnee"])
            .returns_angles(["RHip", "LHip"]),
        FunctionSpec::new("knee_angle")
            .angle_function(angles::knee_angle)
            .axes(["RKnee", "LKnee", "RAnkle", "LAnkle"])
            .returns_angles(["RKnee", "LKnee"]),
        FunctionSpec::new("ankle_angle")
            .angle_function(angles::ankle_angle)
            .axes(["RAnkle", "LAnkle", "RFoot", "LFoot"])
            .returns_angles(["RAnkle", "LAnkle"]),
        FunctionSpec::new("foot_angle")
            .angle_function(angles::foot_angle)
            .axes(["RFoot", "LFoot"])
            .returns_angles(["RFoot", "LFoot"]),
        FunctionSpec::new("head_angle")
            .angle_function(angles::head_angle)
            .axis("Head")
            .returns_angles(["Head"]),
        FunctionSpec::new("thorax_angle")
            .angle_function(angles::thorax_angle)
            .axis("Thorax")
            .returns_angles(["Thorax"]),
        FunctionSpec::new("neck_angle")
            .angle_function(angles::neck_angle)
            .axes(["Thorax", "Head"])
            .returns_angles(["Neck"]),
        FunctionSpec::new("spine_angle")
            .angle_function(angles::spine_angle)
            .axes(["Pelvis", "Thorax"])
            .returns_angles(["Spine"]),
        FunctionSpec::new("shoulder_angle")
            .angle_function(angles::shoulder_angle)
            .axes(["Thorax", "RHum", "LHum"])
            .returns_angles(["RShoulder", "LShoulder"]),
        FunctionSpec::new("elbow_angle")
            .angle_function(angles::elbow_angle)
            .axes(["RHum", "LHum", "RRad", "LRad"])
            .returns_angles(["RElbow", "LElbow"]),
        FunctionSpec::new("wrist_angle")
            .angle_function(angles::wrist_angle)
            .axes(["RRad", "LRad", "RHand", "LHand"])
            .returns_angles(["RWrist", "LWrist"]),
    ]
}
