use cgm::{constants::Point, Cgm, MarkerSet, MeasurementSet, RunParams};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

const POSE: [(&str, [f64; 3]); 33] = [
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

fn model(num_frames: usize) -> Cgm {
    let frames = (0..num_frames).map(|f| {
        let t = f as f64;
        POSE.iter().enumerate().map(move |(m, (name, [x, y, z]))| {
            let m = m as f64;
            (
                *name,
                Point::new(
                    x + 12.0 * t + 5.0 * (0.1 * t + m).sin(),
                    y + 5.0 * (0.07 * t + m).cos(),
                    z + 3.0 * (0.13 * t).sin(),
                ),
            )
        })
    });
    let measurements: MeasurementSet = [
        ("MeanLegLength", 940.0),
        ("R_AsisToTrocanterMeasure", 72.5),
        ("L_AsisToTrocanterMeasure", 72.5),
        ("InterAsisDistance", 240.0),
        ("RightKneeWidth", 105.0),
        ("LeftKneeWidth", 105.0),
        ("RightAnkleWidth", 70.0),
        ("LeftAnkleWidth", 70.0),
        ("RightShoulderOffset", 40.0),
        ("LeftShoulderOffset", 40.0),
        ("RightElbowWidth", 75.0),
        ("LeftElbowWidth", 75.0),
        ("RightWristWidth", 55.0),
        ("LeftWristWidth", 55.0),
        ("RightHandThickness", 30.0),
        ("LeftHandThickness", 30.0),
    ]
    .into_iter()
    .collect();
    Cgm::new(measurements, MarkerSet::from_frames(frames).unwrap()).unwrap()
}

fn bench_trial_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("trial_run");
    group.sample_size(20);

    for num_frames in [100usize, 1000] {
        let mut m = model(num_frames);
        group.bench_with_input(BenchmarkId::new("sequential", num_frames), &num_frames, |b, _| {
            b.iter(|| black_box(m.run_all().unwrap()))
        });
        for workers in [2usize, 4] {
            let params = RunParams::builder().workers(workers).build().unwrap();
            group.bench_with_input(
                BenchmarkId::new(format!("parallel_{workers}"), num_frames),
                &num_frames,
                |b, _| b.iter(|| black_box(m.run_parallel(&params).unwrap())),
            );
        }
    }

    let m = model(1);
    group.bench_function("single_frame", |b| b.iter(|| black_box(m.calc(0).unwrap())));
    group.finish();
}

criterion_group!(benches, bench_trial_run);
criterion_main!(benches);
