use crate::{blob::Blob, pixel::Axis};
use nalgebra::{Scalar, Vector2};
use num::Float;

/*----------------------------------------------------------------------------
Matching penalty weights
----------------------------------------------------------------------------*/

// Only the ratios between the weights matter, not their absolute scale.
pub const POSITION_PENALTY: f32 = 2.0;
pub const AREA_PENALTY: f32 = 2.0;
pub const TEMPERATURE_PENALTY: f32 = 10.0;
pub const ASPECT_RATIO_PENALTY: f32 = 10.0;

const PREDICTION_SENTINEL: f32 = -1.0;

/*----------------------------------------------------------------------------
TrackedBlob struct
----------------------------------------------------------------------------*/

/// A blob carried across frames.
///
/// Wraps the latest blob observation and adds the inter-frame history: the
/// predicted next centroid (constant-velocity extrapolation), the cumulative
/// travel vector, and a flag recording whether the track was refreshed during
/// the current frame. Tracked blobs start off empty until initialized from a
/// regular blob with [`TrackedBlob::set`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackedBlob<T>
where
    T: Float + Scalar,
{
    blob: Blob<T>,
    predicted_position: Vector2<f32>,
    travel: Vector2<f32>,
    has_updated: bool,
}

impl<T> TrackedBlob<T>
where
    T: Float + Scalar,
{
    pub fn new() -> Self {
        Self {
            blob: Blob::new(),
            predicted_position: Vector2::new(
                PREDICTION_SENTINEL,
                PREDICTION_SENTINEL,
            ),
            travel: Vector2::new(0.0, 0.0),
            has_updated: false,
        }
    }

    /// Reset the track. All accumulated travel and prediction state is lost
    /// and the slot is marked inactive.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Start tracking a new blob.
    ///
    /// The first observation carries no motion history, so the predicted
    /// position stays at its sentinel until the first update.
    pub fn set(&mut self, blob: Blob<T>) {
        self.clear();
        self.blob = blob;
        self.has_updated = true;
    }

    /// Fold a new observation of the same object into the track.
    ///
    /// The instantaneous motion between the old and new centroids is added
    /// to the cumulative travel, and the next position is extrapolated by
    /// assuming the motion continues unchanged for one more frame.
    pub fn update_blob(&mut self, blob: Blob<T>) {
        let movement = blob.centroid() - self.blob.centroid();

        self.predicted_position = blob.centroid() + movement;
        self.travel += movement;
        self.blob = blob;
        self.has_updated = true;
    }

    /// Net signed travel along one axis since tracking began.
    pub fn travel(&self, axis: Axis) -> f32 {
        match axis {
            Axis::X => self.travel.x,
            Axis::Y => self.travel.y,
        }
    }

    /// Dissimilarity score between this track and a candidate blob.
    ///
    /// A low score means the blobs likely originate from the same object.
    /// The score is a weighted L1 combination of position, pixel count,
    /// temperature, and aspect ratio differences; position is measured
    /// against the predicted centroid when one exists, otherwise against the
    /// last observed centroid. Unitless.
    pub fn distance_to(&self, other: &Blob<T>) -> f32 {
        let reference = if self.has_prediction() {
            self.predicted_position
        } else {
            self.blob.centroid()
        };

        let mut score = POSITION_PENALTY
            * ((reference.x - other.centroid().x).abs()
                + (reference.y - other.centroid().y).abs());

        score += AREA_PENALTY
            * (self.blob.size() as f32 - other.size() as f32).abs();

        let temperature_gap = (self.blob.average_temperature()
            - other.average_temperature())
        .abs();
        score += TEMPERATURE_PENALTY * temperature_gap.to_f32().unwrap();

        score += ASPECT_RATIO_PENALTY
            * (self.blob.aspect_ratio() - other.aspect_ratio()).abs();

        score
    }

    pub fn is_active(&self) -> bool {
        self.blob.is_active()
    }

    pub fn has_updated(&self) -> bool {
        self.has_updated
    }

    /// Tracks that fail to refresh before the end of the frame are retired.
    pub fn reset_updated_status(&mut self) {
        self.has_updated = false;
    }

    pub fn blob(&self) -> &Blob<T> {
        &self.blob
    }

    pub fn predicted_position(&self) -> Vector2<f32> {
        self.predicted_position
    }

    pub fn has_prediction(&self) -> bool {
        self.predicted_position.x >= 0.0 && self.predicted_position.y >= 0.0
    }
}

impl<T> Default for TrackedBlob<T>
where
    T: Float + Scalar,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::Pixel;
    use nearly_eq::assert_nearly_eq;

    fn square_blob_at(x: i32, y: i32, temperature: f32) -> Blob<f32> {
        let mut blob = Blob::new();
        blob.add_pixel(Pixel::new(x, y, temperature));
        blob.add_pixel(Pixel::new(x + 1, y, temperature));
        blob.add_pixel(Pixel::new(x, y + 1, temperature));
        blob.add_pixel(Pixel::new(x + 1, y + 1, temperature));
        blob
    }

    // ==========================================================================
    // Lifecycle
    // ==========================================================================

    #[test]
    fn test_new_track_is_inactive() {
        let track = TrackedBlob::<f32>::new();
        assert!(!track.is_active());
        assert!(!track.has_updated());
        assert!(!track.has_prediction());
    }

    #[test]
    fn test_set_marks_updated_without_prediction() {
        let mut track = TrackedBlob::new();
        track.set(square_blob_at(2, 1, 30.0));

        assert!(track.is_active());
        assert!(track.has_updated());
        assert!(!track.has_prediction());
        assert_nearly_eq!(track.travel(Axis::X), 0.0);
        assert_nearly_eq!(track.travel(Axis::Y), 0.0);
    }

    #[test]
    fn test_clear_discards_history() {
        let mut track = TrackedBlob::new();
        track.set(square_blob_at(2, 1, 30.0));
        track.update_blob(square_blob_at(5, 1, 30.0));
        track.clear();

        assert!(!track.is_active());
        assert!(!track.has_prediction());
        assert_nearly_eq!(track.travel(Axis::X), 0.0);
    }

    // ==========================================================================
    // Updates, travel, and prediction
    // ==========================================================================

    #[test]
    fn test_update_accumulates_travel() {
        let mut track = TrackedBlob::new();
        track.set(square_blob_at(2, 1, 30.0));
        track.update_blob(square_blob_at(5, 1, 30.0));
        track.update_blob(square_blob_at(8, 1, 30.0));

        assert_nearly_eq!(track.travel(Axis::X), 6.0);
        assert_nearly_eq!(track.travel(Axis::Y), 0.0);
    }

    #[test]
    fn test_update_extrapolates_next_position() {
        let mut track = TrackedBlob::new();
        track.set(square_blob_at(2, 1, 30.0));
        track.update_blob(square_blob_at(5, 1, 30.0));

        // Centroid moved from 2.5 to 5.5; one more step lands on 8.5.
        assert!(track.has_prediction());
        assert_nearly_eq!(track.predicted_position().x, 8.5);
        assert_nearly_eq!(track.predicted_position().y, 1.5);
    }

    #[test]
    fn test_travel_tracks_both_axes() {
        let mut track = TrackedBlob::new();
        track.set(square_blob_at(6, 0, 30.0));
        track.update_blob(square_blob_at(4, 1, 30.0));

        assert_nearly_eq!(track.travel(Axis::X), -2.0);
        assert_nearly_eq!(track.travel(Axis::Y), 1.0);
    }

    // ==========================================================================
    // Distance scoring
    // ==========================================================================

    #[test]
    fn test_distance_uses_centroid_before_first_update() {
        let mut track = TrackedBlob::new();
        track.set(square_blob_at(2, 1, 30.0));

        // Identical blob 3 columns to the right: only the position term
        // fires, |5.5 - 2.5| * 2.
        let candidate = square_blob_at(5, 1, 30.0);
        assert_nearly_eq!(track.distance_to(&candidate), 6.0, 1e-5);
    }

    #[test]
    fn test_distance_uses_prediction_after_update() {
        let mut track = TrackedBlob::new();
        track.set(square_blob_at(2, 1, 30.0));
        track.update_blob(square_blob_at(5, 1, 30.0));

        // The candidate sits exactly on the predicted centroid.
        let on_prediction = square_blob_at(8, 1, 30.0);
        assert_nearly_eq!(track.distance_to(&on_prediction), 0.0, 1e-5);
    }

    #[test]
    fn test_distance_penalizes_temperature_gap() {
        let mut track = TrackedBlob::new();
        track.set(square_blob_at(2, 1, 30.0));

        let warmer = square_blob_at(2, 1, 32.0);
        assert_nearly_eq!(track.distance_to(&warmer), 20.0, 1e-4);
    }

    #[test]
    fn test_distance_penalizes_area_and_shape() {
        let mut track = TrackedBlob::new();
        track.set(square_blob_at(2, 1, 30.0));

        // A 2-pixel single-row blob on the square's top row: area differs
        // by 2, aspect ratio by 1, and the centroid sits half a row up.
        let mut sliver = Blob::new();
        sliver.add_pixel(Pixel::new(2, 1, 30.0));
        sliver.add_pixel(Pixel::new(3, 1, 30.0));

        let expected = AREA_PENALTY * 2.0
            + ASPECT_RATIO_PENALTY * 1.0
            + POSITION_PENALTY * 0.5;
        assert_nearly_eq!(track.distance_to(&sliver), expected, 1e-4);
    }
}
