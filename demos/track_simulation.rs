//! Feed the tracker a synthetic scene and print the movement totals.
//!
//! A warm 2x2 object crosses the field of view a few times in each
//! direction; the resulting counters are printed as JSON.

use indicatif::{ProgressBar, ProgressStyle};
use thermotrack_rs::{
    Direction, Frame, ThermalTracker, FRAME_HEIGHT, FRAME_WIDTH,
    NUM_DIRECTIONS,
};

const AMBIENT: f32 = 21.0;
const BODY_HEAT: f32 = 29.5;
const BACKGROUND_WINDOW: usize = 16;

fn ambient_frame() -> Frame {
    [[AMBIENT; FRAME_WIDTH]; FRAME_HEIGHT]
}

fn frame_with_body(row: i32, col: i32) -> Frame {
    let mut frame = ambient_frame();
    for r in row..row + 2 {
        for c in col..col + 2 {
            if r >= 0
                && (r as usize) < FRAME_HEIGHT
                && c >= 0
                && (c as usize) < FRAME_WIDTH
            {
                frame[r as usize][c as usize] = BODY_HEAT;
            }
        }
    }
    frame
}

fn main() {
    let mut tracker = ThermalTracker::new(BACKGROUND_WINDOW, 200.0, 2)
        .with_minimum_travel_threshold(3.0);

    // Three passes: two left-to-right, one right-to-left. Each pass walks
    // the body across the frame two columns at a time with a few quiet
    // frames in between so the tracks retire.
    let passes: [(i32, i32); 3] = [(-2, 2), (-2, 2), (16, -2)];
    let steps_per_pass = 10;
    let quiet_gap = 4;
    let total_frames =
        BACKGROUND_WINDOW + (steps_per_pass + quiet_gap) * passes.len();

    let progress = ProgressBar::new(total_frames as u64);
    progress.set_style(
        ProgressStyle::with_template("{bar:40} {pos}/{len} frames").unwrap(),
    );

    for _ in 0..BACKGROUND_WINDOW {
        tracker.process_frame(&ambient_frame());
        progress.inc(1);
    }

    for (start_col, step) in passes {
        for i in 0..steps_per_pass as i32 {
            tracker.process_frame(&frame_with_body(1, start_col + step * i));
            progress.inc(1);
        }
        for _ in 0..quiet_gap {
            tracker.process_frame(&ambient_frame());
            progress.inc(1);
        }
    }
    progress.finish();

    let mut totals = [0u64; NUM_DIRECTIONS];
    tracker.get_movements(&mut totals);

    let summary = serde_json::json!({
        "frames": total_frames,
        "movements": {
            "left": totals[Direction::Left.index()],
            "right": totals[Direction::Right.index()],
            "up": totals[Direction::Up.index()],
            "down": totals[Direction::Down.index()],
            "none": totals[Direction::None.index()],
        },
        "tracks_still_active": tracker.get_num_tracked_blobs(),
    });
    println!("{}", serde_json::to_string_pretty(&summary).unwrap());
}
