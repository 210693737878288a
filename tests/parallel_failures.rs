mod common;

use std::time::Duration;

use cgm::{constants::Angle, CancelToken, CgmError, FunctionSpec, RunParams};
use common::subject_model;

#[test]
fn failing_worker_fails_the_whole_run() {
    let mut model = subject_model(40);
    model
        .add_function(
            FunctionSpec::new("fails_late")
                .angle_function(|args| {
                    let pelvis = args.axis_or_nan(0)?;
                    // frames advance 12 mm forward each
                    if pelvis[(0, 3)] > 80.0 + 12.0 * 33.0 {
                        return Err(CgmError::InvalidRunParameter("synthetic failure".into()));
                    }
                    Ok(vec![Angle::zeros()])
                })
                .axis("Pelvis")
                .returns_angles(["Probe"]),
        )
        .unwrap();

    let params = RunParams::builder().workers(4).build().unwrap();
    let err = model.run_parallel(&params).unwrap_err();
    match &err {
        CgmError::WorkerFailed { worker, frames, source } => {
            assert_eq!(*worker, 3);
            assert_eq!(*frames, 30..40);
            assert!(matches!(**source, CgmError::Frame { frame: 34, .. }));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(matches!(err.root_cause(), CgmError::InvalidRunParameter(_)));
}

#[test]
fn panicking_worker_is_reported() {
    let mut model = subject_model(8);
    model
        .add_function(
            FunctionSpec::new("panics")
                .angle_function(|_| panic!("geometry bug"))
                .returns_angles(["Never"]),
        )
        .unwrap();
    let err = model
        .run_parallel(&RunParams::builder().workers(2).build().unwrap())
        .unwrap_err();
    assert!(matches!(err, CgmError::WorkerPanicked { .. }), "{err:?}");
}

#[test]
fn cancelled_token_stops_the_run() {
    let mut model = subject_model(16);
    let token = CancelToken::new();
    token.cancel();
    let err = model
        .run_parallel_with_cancel(&RunParams::builder().workers(3).build().unwrap(), &token)
        .unwrap_err();
    assert_eq!(err, CgmError::Cancelled);
}

#[test]
fn deadline_is_enforced() {
    let mut model = subject_model(12);
    model
        .add_function(
            FunctionSpec::new("slow")
                .angle_function(|_| {
                    std::thread::sleep(Duration::from_millis(10));
                    Ok(vec![Angle::zeros()])
                })
                .returns_angles(["Slow"]),
        )
        .unwrap();

    let params = RunParams::builder()
        .workers(2)
        .deadline(Duration::from_millis(5))
        .poll_interval(Duration::from_millis(1))
        .build()
        .unwrap();
    let err = model.run_parallel(&params).unwrap_err();
    assert!(matches!(err, CgmError::DeadlineExceeded { .. }), "{err:?}");

    let relaxed = RunParams::builder()
        .workers(2)
        .deadline(Duration::from_secs(60))
        .build()
        .unwrap();
    assert_eq!(model.run_parallel(&relaxed).unwrap().num_frames(), 12);
}
