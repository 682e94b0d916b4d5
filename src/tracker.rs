//! Frame-by-frame movement tracking.
//!
//! This module provides the `ThermalTracker` struct that turns a stream of
//! thermopile frames into directional movement counts. Each frame is either
//! folded into the background bootstrap or run through the full pipeline:
//! segment the foreground into blobs, filter out specks, associate the blobs
//! with the tracks carried over from previous frames, retire the tracks that
//! found no match, and convert their accumulated travel into movements.

use crate::{
    assoc,
    background::{BackgroundModel, Frame, EMPTY_FRAME},
    blob::Blob,
    error::ConfigError,
    movement::{Direction, MovementCounts},
    pixel::{Axis, Pixel},
    tracked_blob::TrackedBlob,
    FRAME_HEIGHT, FRAME_WIDTH, MAX_BLOBS, NUM_DIRECTIONS, REFRESH_RATE,
};
use log::{debug, trace};

/*----------------------------------------------------------------------------
Default configuration
----------------------------------------------------------------------------*/

/// Default number of frames in the background window.
pub const RUNNING_AVERAGE_SIZE: usize = 80;
/// Default upper bound on the dissimilarity score of a valid match.
pub const MAX_DISTANCE_THRESHOLD: f32 = 200.0;
/// Default minimum pixel count for a blob to be tracked.
pub const MINIMUM_BLOB_SIZE: usize = 4;
/// Default net travel, in pixels, required to count as directional movement.
pub const MINIMUM_TRAVEL_THRESHOLD: f32 = 5.0;
/// Default number of same-blob-count frames before a stalled scene starts
/// feeding the running background.
pub const UNCHANGED_FRAME_DELAY: usize = REFRESH_RATE * 2;

const PIXEL_CAPACITY: usize = FRAME_WIDTH * FRAME_HEIGHT;

/*----------------------------------------------------------------------------
ThermalTracker
----------------------------------------------------------------------------*/

/// Movement tracker for a low-resolution thermopile array.
///
/// The tracker owns all of its working storage: the current frame, the
/// background model, the fixed-capacity track table, and the movement
/// counters. Everything is bounded at compile time; processing a frame
/// allocates nothing.
///
/// Frames must be submitted serially from a single caller; reads of the
/// counters and background are serialized with `process_frame` by the caller
/// as well.
#[derive(Debug)]
pub struct ThermalTracker {
    background: BackgroundModel,
    frame: Frame,
    tracked_blobs: [TrackedBlob<f32>; MAX_BLOBS],
    movements: MovementCounts,

    max_distance_threshold: f32,
    min_blob_size: usize,
    minimum_travel_threshold: f32,
    unchanged_frame_delay: usize,
    invert_travel_direction: bool,

    num_unchanged_frames: usize,
    num_last_blobs: usize,
}

impl ThermalTracker {
    /// Create a new tracker.
    ///
    /// # Arguments
    /// * `running_average_size` - Frames in the background window
    /// * `max_distance_threshold` - Dissimilarity bound for blob matching
    /// * `min_blob_size` - Minimum pixels for a blob to survive filtering
    ///
    /// # Panics
    /// Panics on an invalid configuration; use [`ThermalTracker::try_new`]
    /// to validate instead.
    ///
    /// # Example
    /// ```
    /// use thermotrack_rs::ThermalTracker;
    /// let tracker = ThermalTracker::new(80, 200.0, 4);
    /// ```
    pub fn new(
        running_average_size: usize,
        max_distance_threshold: f32,
        min_blob_size: usize,
    ) -> Self {
        match Self::try_new(
            running_average_size,
            max_distance_threshold,
            min_blob_size,
        ) {
            Ok(tracker) => tracker,
            Err(err) => panic!("invalid tracker configuration: {}", err),
        }
    }

    /// Fallible counterpart of [`ThermalTracker::new`].
    pub fn try_new(
        running_average_size: usize,
        max_distance_threshold: f32,
        min_blob_size: usize,
    ) -> Result<Self, ConfigError> {
        if running_average_size < 2 {
            return Err(ConfigError::WindowTooSmall(running_average_size));
        }
        if max_distance_threshold <= 0.0 || max_distance_threshold.is_nan() {
            return Err(ConfigError::NonPositiveDistanceThreshold(
                max_distance_threshold,
            ));
        }
        if min_blob_size == 0 {
            return Err(ConfigError::ZeroBlobSize);
        }

        Ok(Self {
            background: BackgroundModel::new(running_average_size),
            frame: EMPTY_FRAME,
            tracked_blobs: [TrackedBlob::new(); MAX_BLOBS],
            movements: MovementCounts::new(),
            max_distance_threshold,
            min_blob_size,
            minimum_travel_threshold: MINIMUM_TRAVEL_THRESHOLD,
            unchanged_frame_delay: UNCHANGED_FRAME_DELAY,
            invert_travel_direction: false,
            num_unchanged_frames: 0,
            num_last_blobs: 0,
        })
    }

    /// Set how many consecutive frames with an unchanged blob count must
    /// pass before an active scene starts feeding the running background.
    pub fn with_unchanged_frame_delay(self, frames: usize) -> Self {
        Self {
            unchanged_frame_delay: frames,
            ..self
        }
    }

    /// Set the net travel, in pixels, a track must cover before its
    /// retirement registers directional movement.
    pub fn with_minimum_travel_threshold(self, threshold: f32) -> Self {
        Self {
            minimum_travel_threshold: threshold,
            ..self
        }
    }

    /// Swap LEFT/RIGHT and UP/DOWN, for sensors mounted the other way up.
    pub fn with_inverted_travel(self, invert: bool) -> Self {
        Self {
            invert_travel_direction: invert,
            ..self
        }
    }

    /*------------------------------------------------------------------------
    Frame ingestion
    ------------------------------------------------------------------------*/

    /// Process an input thermal frame.
    ///
    /// Until the background window has filled, frames go straight into the
    /// background bootstrap and no tracking happens. After that every frame
    /// runs the full segmentation and tracking pipeline, and quiet frames
    /// keep feeding the running background so the scene baseline can drift.
    pub fn process_frame(&mut self, frame: &Frame) {
        self.frame = *frame;

        if !self.background.is_ready() {
            self.background.bootstrap(&self.frame);
            return;
        }

        let mut blobs = [Blob::new(); MAX_BLOBS];
        let num_segments = self.detect_blobs(&mut blobs);
        let num_blobs = self.remove_small_blobs(&mut blobs);
        trace!(
            "{} blobs segmented, {} left after the size filter",
            num_segments,
            num_blobs
        );

        self.track_blobs(&mut blobs);

        // A stationary warm object must not be absorbed immediately, but a
        // scene that stops changing eventually is. Zero-blob frames always
        // feed the background.
        if num_blobs == self.num_last_blobs {
            self.num_unchanged_frames += 1;
        } else {
            self.num_unchanged_frames = 0;
        }
        let add_frame_to_average = num_blobs == 0
            || self.num_unchanged_frames > self.unchanged_frame_delay;
        if add_frame_to_average {
            self.background.blend(&self.frame);
        }

        debug!(
            "frame processed: {} blobs, {} tracks, background fold: {}",
            num_blobs,
            self.get_num_tracked_blobs(),
            add_frame_to_average,
        );

        self.num_last_blobs = num_blobs;
    }

    /// Throw the background away and bootstrap it again from the next
    /// frames.
    pub fn reset_background(&mut self) {
        self.background.reset();
    }

    /// True once the background window has filled and tracking is live.
    pub fn finished_building_background(&self) -> bool {
        self.background.is_ready()
    }

    /// Copy out the per-pixel background averages, in degrees Celsius.
    pub fn get_averages(&self, frame_buffer: &mut Frame) {
        *frame_buffer = *self.background.averages();
    }

    /// Copy out the per-pixel background dispersions.
    pub fn get_variances(&self, frame_buffer: &mut Frame) {
        *frame_buffer = *self.background.variances();
    }

    /*------------------------------------------------------------------------
    Movement reporting
    ------------------------------------------------------------------------*/

    /// Copy out the movement totals in the order
    /// {LEFT, RIGHT, UP, DOWN, NONE}.
    ///
    /// Reading the movements clears the new-movement flag; the totals
    /// themselves are preserved.
    pub fn get_movements(&mut self, movements: &mut [u64; NUM_DIRECTIONS]) {
        *movements = self.movements.snapshot();
    }

    /// True if any movement has been recorded since the last read.
    pub fn has_new_movements(&self) -> bool {
        self.movements.has_new()
    }

    /// Zero the movement totals.
    pub fn reset_movements(&mut self) {
        self.movements.reset();
    }

    /// Number of qualifying blobs in the most recently processed frame.
    pub fn get_num_last_blobs(&self) -> usize {
        self.num_last_blobs
    }

    /// Number of blobs currently being tracked across frames.
    pub fn get_num_tracked_blobs(&self) -> usize {
        self.tracked_blobs
            .iter()
            .filter(|track| track.is_active())
            .count()
    }

    /*------------------------------------------------------------------------
    Blob detection
    ------------------------------------------------------------------------*/

    /// Gather the foreground pixels of the current frame, in row-major
    /// order.
    fn collect_foreground(
        &self,
        pixels: &mut [Pixel<f32>; PIXEL_CAPACITY],
    ) -> usize {
        let mut num_active = 0;

        for row in 0..FRAME_HEIGHT {
            for col in 0..FRAME_WIDTH {
                let temp = self.frame[row][col];
                if self.background.is_foreground(row, col, temp) {
                    pixels[num_active].set(col as i32, row as i32, temp);
                    num_active += 1;
                }
            }
        }

        num_active
    }

    /// Partition the foreground pixels into connected blobs.
    ///
    /// Components are grown one at a time with a flood fill over two
    /// separately owned scratch buffers: an active list that is compacted in
    /// place as pixels are claimed, and an append-only queue holding the
    /// pixels of the component under construction. Every foreground pixel
    /// lands in exactly one blob; components found after the blob table is
    /// full are dropped.
    fn detect_blobs(&self, blobs: &mut [Blob<f32>; MAX_BLOBS]) -> usize {
        for blob in blobs.iter_mut() {
            blob.clear();
        }

        let mut active = [Pixel::empty(); PIXEL_CAPACITY];
        let mut num_active = self.collect_foreground(&mut active);
        trace!("{} foreground pixels", num_active);

        let mut queue = [Pixel::empty(); PIXEL_CAPACITY];
        let mut num_blobs = 0;

        while num_active > 0 && num_blobs < MAX_BLOBS {
            // Seed the component from the front of the active list; the
            // first sweep starts past the seed so it cannot re-claim itself.
            queue[0] = active[0];
            let mut queue_len = 1;
            let mut cursor = 0;
            let mut scan_start = 1;

            while cursor < queue_len {
                let mut vacant = 0;
                for i in scan_start..num_active {
                    if queue[cursor].is_adjacent(&active[i]) {
                        queue[queue_len] = active[i];
                        queue_len += 1;
                    } else {
                        active[vacant] = active[i];
                        vacant += 1;
                    }
                }
                num_active = vacant;
                scan_start = 0;

                blobs[num_blobs].add_pixel(queue[cursor]);
                cursor += 1;
            }

            num_blobs += 1;
        }

        num_blobs
    }

    /// Drop blobs below the minimum size and close the gaps they leave, so
    /// every active blob precedes every inactive slot.
    fn remove_small_blobs(&self, blobs: &mut [Blob<f32>; MAX_BLOBS]) -> usize {
        let mut vacant = 0;

        for i in 0..MAX_BLOBS {
            if blobs[i].size() >= self.min_blob_size {
                if i > vacant {
                    blobs[vacant] = blobs[i];
                    blobs[i].clear();
                }
                vacant += 1;
            } else if blobs[i].is_active() {
                blobs[i].clear();
            }
        }

        vacant
    }

    /*------------------------------------------------------------------------
    Inter-frame tracking
    ------------------------------------------------------------------------*/

    /// Carry the track table forward one frame.
    ///
    /// Matches new blobs against existing tracks cheapest-first, retires the
    /// tracks that found no match, and opens new tracks for the blobs that
    /// matched nothing.
    fn track_blobs(&mut self, blobs: &mut [Blob<f32>; MAX_BLOBS]) {
        for track in self.tracked_blobs.iter_mut() {
            track.reset_updated_status();
        }

        let mut costs = assoc::distance_matrix(&self.tracked_blobs, blobs);
        while let Some((row, col)) =
            assoc::lowest_distance(&costs, self.max_distance_threshold)
        {
            trace!(
                "track {} matched blob {} at distance {}",
                row,
                col,
                costs[(row, col)]
            );
            self.tracked_blobs[row].update_blob(blobs[col]);
            blobs[col].set_assigned();
            assoc::invalidate(&mut costs, row, col);
        }

        self.retire_stale_tracks();
        self.adopt_unassigned_blobs(blobs);
    }

    /// Retire every active track that was not updated this frame, folding
    /// its travel into the movement totals, and compact the survivors to the
    /// front of the table.
    fn retire_stale_tracks(&mut self) {
        let mut vacant = 0;

        for i in 0..MAX_BLOBS {
            if self.tracked_blobs[i].has_updated() {
                if i > vacant {
                    self.tracked_blobs[vacant] = self.tracked_blobs[i];
                    self.tracked_blobs[i].clear();
                }
                vacant += 1;
            } else {
                if self.tracked_blobs[i].is_active() {
                    let retired = self.tracked_blobs[i];
                    self.process_blob_movements(&retired);
                }
                self.tracked_blobs[i].clear();
            }
        }
    }

    /// Open tracks for the active blobs that no existing track claimed.
    /// Surplus blobs beyond the table capacity are dropped.
    fn adopt_unassigned_blobs(&mut self, blobs: &mut [Blob<f32>; MAX_BLOBS]) {
        let mut slot = self.get_num_tracked_blobs();

        for blob in blobs.iter_mut() {
            if !blob.is_active() || blob.is_assigned() {
                continue;
            }
            if slot >= MAX_BLOBS {
                break;
            }
            self.tracked_blobs[slot].set(*blob);
            blob.set_assigned();
            slot += 1;
        }
    }

    /// Convert a retiring track's net travel into movement counts.
    ///
    /// Each axis that cleared the travel threshold registers its direction;
    /// a track that cleared neither registers `Direction::None`. The y axis
    /// follows image coordinates: increasing y registers UP, matching the
    /// sensor orientation this tracker was built around (flip with
    /// [`ThermalTracker::with_inverted_travel`] for the opposite mounting).
    fn process_blob_movements(&mut self, blob: &TrackedBlob<f32>) {
        let mut movement_added = false;

        let travel_x = blob.travel(Axis::X);
        if travel_x.abs() > self.minimum_travel_threshold {
            movement_added = true;
            if travel_x < 0.0 {
                self.add_movement(Direction::Left);
            } else {
                self.add_movement(Direction::Right);
            }
        }

        let travel_y = blob.travel(Axis::Y);
        if travel_y.abs() > self.minimum_travel_threshold {
            movement_added = true;
            if travel_y > 0.0 {
                self.add_movement(Direction::Up);
            } else {
                self.add_movement(Direction::Down);
            }
        }

        if !movement_added {
            self.add_movement(Direction::None);
        }
    }

    fn add_movement(&mut self, direction: Direction) {
        let direction = if self.invert_travel_direction {
            direction.opposite()
        } else {
            direction
        };
        self.movements.record(direction);
    }
}

impl Default for ThermalTracker {
    fn default() -> Self {
        Self::new(
            RUNNING_AVERAGE_SIZE,
            MAX_DISTANCE_THRESHOLD,
            MINIMUM_BLOB_SIZE,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // Construction and configuration
    // ==========================================================================

    #[test]
    fn test_try_new_accepts_defaults() {
        let tracker = ThermalTracker::try_new(
            RUNNING_AVERAGE_SIZE,
            MAX_DISTANCE_THRESHOLD,
            MINIMUM_BLOB_SIZE,
        );
        assert!(tracker.is_ok());
    }

    #[test]
    fn test_try_new_rejects_tiny_window() {
        let result = ThermalTracker::try_new(1, 200.0, 4);
        assert_eq!(result.unwrap_err(), ConfigError::WindowTooSmall(1));
    }

    #[test]
    fn test_try_new_rejects_nonpositive_threshold() {
        let result = ThermalTracker::try_new(80, 0.0, 4);
        assert_eq!(
            result.unwrap_err(),
            ConfigError::NonPositiveDistanceThreshold(0.0)
        );
    }

    #[test]
    fn test_try_new_rejects_zero_blob_size() {
        let result = ThermalTracker::try_new(80, 200.0, 0);
        assert_eq!(result.unwrap_err(), ConfigError::ZeroBlobSize);
    }

    #[test]
    #[should_panic(expected = "invalid tracker configuration")]
    fn test_new_panics_on_bad_config() {
        let _ = ThermalTracker::new(0, 200.0, 4);
    }

    #[test]
    fn test_fresh_tracker_state() {
        let tracker = ThermalTracker::default();
        assert!(!tracker.finished_building_background());
        assert!(!tracker.has_new_movements());
        assert_eq!(tracker.get_num_last_blobs(), 0);
        assert_eq!(tracker.get_num_tracked_blobs(), 0);
    }
}
