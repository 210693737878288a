mod common;

use std::time::Duration;

use cgm::{CgmError, MeasurementSet, RunParams, SubjectSet};
use common::{subject_measurements, subject_model};

#[test]
fn run_params_from_json() {
    let params: RunParams =
        serde_json::from_str(r#"{ "workers": 3, "deadline": { "secs": 2, "nanos": 0 } }"#).unwrap();
    assert_eq!(params.workers, Some(3));
    assert_eq!(params.deadline, Some(Duration::from_secs(2)));
    assert_eq!(params.poll_interval, RunParams::DEFAULT_POLL_INTERVAL);

    let json = serde_json::to_string(&params).unwrap();
    assert_eq!(serde_json::from_str::<RunParams>(&json).unwrap(), params);
}

#[test]
fn measurements_from_json() {
    let json = serde_json::to_string(&subject_measurements()).unwrap();
    let back: MeasurementSet = serde_json::from_str(&json).unwrap();
    assert_eq!(back, subject_measurements());

    let partial: MeasurementSet =
        serde_json::from_str(r#"{ "MeanLegLength": 910.0, "HeadOffset": 0.1 }"#).unwrap();
    assert_eq!(partial.value_of("MeanLegLength"), Some(910.0));
    assert_eq!(partial.value_of("InterAsisDistance"), None);
}

#[test]
fn invalid_run_parameters_are_rejected() {
    let err = RunParams::builder().workers(0).build().unwrap_err();
    assert!(matches!(err, CgmError::InvalidRunParameter(ref m) if m.contains("workers")));
}

#[test]
fn zero_workers_never_reach_a_run() {
    let err = serde_json::from_str::<RunParams>(r#"{ "workers": 0 }"#).unwrap_err();
    assert!(err.to_string().contains("workers"));

    let mut model = subject_model(6);
    let params = RunParams {
        workers: Some(0),
        ..RunParams::default()
    };
    let err = model.run_parallel(&params).unwrap_err();
    assert!(matches!(err, CgmError::InvalidRunParameter(ref m) if m.contains("workers")));

    let zero_poll = RunParams {
        poll_interval: Duration::ZERO,
        ..RunParams::default()
    };
    assert!(model.run_parallel(&zero_poll).is_err());

    let ok = model
        .run_parallel(&RunParams::builder().workers(2).build().unwrap())
        .unwrap();
    common::assert_results_identical(&ok, &model.run_all().unwrap());
}

#[test]
fn subject_batch_keeps_insertion_order() {
    let mut subjects = SubjectSet::new();
    let lengths = [("S03", 5), ("S01", 9), ("S02", 7)];
    for (name, frames) in lengths {
        subjects.insert(name, subject_model(frames));
    }

    let mut alone = subject_model(9);
    let expected = alone.run_all().unwrap();

    let results = subjects.run_all(2).unwrap();
    assert_eq!(results.names().collect::<Vec<_>>(), ["S03", "S01", "S02"]);
    for (name, frames) in lengths {
        assert_eq!(results.get(name).unwrap().num_frames(), frames);
    }
    common::assert_results_identical(results.get("S01").unwrap(), &expected);

    let knees = results.joint_angle("RKnee", 0..5).unwrap();
    assert_eq!(knees.len(), 3);
    assert!(knees.iter().all(|(_, s)| s.as_ref().map(Vec::len) == Some(5)));
    assert!(matches!(
        results.joint_axis("Pelvis", 0..6),
        Err(CgmError::SubjectFailed { ref subject, .. }) if subject == "S03"
    ));
}
