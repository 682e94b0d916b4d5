use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use thermotrack_rs::{Frame, ThermalTracker, FRAME_HEIGHT, FRAME_WIDTH};

const AMBIENT: f32 = 20.0;

fn uniform(temperature: f32) -> Frame {
    [[temperature; FRAME_WIDTH]; FRAME_HEIGHT]
}

fn frame_with_block(col: usize) -> Frame {
    let mut frame = uniform(AMBIENT);
    for row in 1..3 {
        for c in col..col + 2 {
            frame[row][c] = 30.0;
        }
    }
    frame
}

fn bootstrapped_tracker() -> ThermalTracker {
    let mut tracker = ThermalTracker::new(8, 200.0, 2);
    for _ in 0..8 {
        tracker.process_frame(&uniform(AMBIENT));
    }
    tracker
}

fn bench_quiet_frame(c: &mut Criterion) {
    let mut tracker = bootstrapped_tracker();
    let frame = uniform(AMBIENT);

    c.bench_function("process_quiet_frame", |b| {
        b.iter(|| tracker.process_frame(black_box(&frame)))
    });
}

fn bench_moving_blob(c: &mut Criterion) {
    let mut tracker = bootstrapped_tracker();
    let frames: Vec<Frame> = (0..7).map(|i| frame_with_block(2 * i)).collect();

    c.bench_function("process_moving_blob", |b| {
        let mut i = 0;
        b.iter(|| {
            tracker.process_frame(black_box(&frames[i % frames.len()]));
            i += 1;
        })
    });
}

criterion_group!(benches, bench_quiet_frame, bench_moving_blob);
criterion_main!(benches);
