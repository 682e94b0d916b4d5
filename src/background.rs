//! Per-pixel background model for the thermal scene.
//!
//! The model keeps a running estimate of each pixel's baseline temperature
//! and its dispersion, built in two distinct phases: a bootstrap pass that
//! accumulates exact statistics over a fixed window of frames, and a running
//! phase that decays both estimates exponentially so the scene can drift.

use crate::{FRAME_HEIGHT, FRAME_WIDTH};

/// One sensor snapshot: temperatures in row-major order, degrees Celsius.
pub type Frame = [[f32; FRAME_WIDTH]; FRAME_HEIGHT];

pub(crate) const EMPTY_FRAME: Frame = [[0.0; FRAME_WIDTH]; FRAME_HEIGHT];

/*----------------------------------------------------------------------------
Background phases
----------------------------------------------------------------------------*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Accumulating the initial window; `seen` frames folded in so far.
    Bootstrap { seen: usize },
    /// Window complete; estimates now decay exponentially.
    Running,
}

/*----------------------------------------------------------------------------
BackgroundModel
----------------------------------------------------------------------------*/

/// Per-pixel mean and dispersion of the observed scene.
///
/// During bootstrap the mean and the sum of squared deviations are maintained
/// with Welford's online algorithm; once `window` frames have been seen the
/// accumulator is finalized into a sample standard deviation and the model
/// switches to the running phase. Running updates weight both estimates with
/// an effective window of `window` frames, which degrades the dispersion into
/// a mean absolute deviation. That keeps the state at O(1) per pixel and is
/// close enough for foreground gating.
#[derive(Debug, Clone)]
pub struct BackgroundModel {
    averages: Frame,
    variances: Frame,
    window: usize,
    phase: Phase,
}

impl BackgroundModel {
    /// Create an empty model that will bootstrap over `window` frames.
    pub fn new(window: usize) -> Self {
        Self {
            averages: EMPTY_FRAME,
            variances: EMPTY_FRAME,
            window,
            phase: Phase::Bootstrap { seen: 0 },
        }
    }

    /// Discard the model and start bootstrapping from scratch.
    pub fn reset(&mut self) {
        self.phase = Phase::Bootstrap { seen: 0 };
    }

    /// True once the bootstrap window has been filled.
    pub fn is_ready(&self) -> bool {
        matches!(self.phase, Phase::Running)
    }

    /// Number of frames folded into the bootstrap so far; saturates at the
    /// window size once the model is running.
    pub fn frames_seen(&self) -> usize {
        match self.phase {
            Phase::Bootstrap { seen } => seen,
            Phase::Running => self.window,
        }
    }

    /// Fold a frame into the bootstrap statistics.
    ///
    /// No-op once the model is running; running frames go through
    /// [`BackgroundModel::blend`] instead.
    pub fn bootstrap(&mut self, frame: &Frame) {
        let seen = match self.phase {
            Phase::Bootstrap { seen } => seen,
            Phase::Running => return,
        };

        if seen == 0 {
            self.averages = *frame;
            self.variances = EMPTY_FRAME;
        } else {
            for row in 0..FRAME_HEIGHT {
                for col in 0..FRAME_WIDTH {
                    let temp = frame[row][col];
                    let last_average = self.averages[row][col];

                    self.averages[row][col] +=
                        (temp - last_average) / (seen as f32 + 1.0);
                    self.variances[row][col] += (temp
                        - self.averages[row][col])
                        * (temp - last_average);
                }
            }
        }

        let seen = seen + 1;
        if seen >= self.window {
            // Window complete: turn the squared-deviation accumulator into
            // the sample standard deviation.
            for row in 0..FRAME_HEIGHT {
                for col in 0..FRAME_WIDTH {
                    self.variances[row][col] = (self.variances[row][col]
                        / (self.window as f32 - 1.0))
                        .sqrt();
                }
            }
            self.phase = Phase::Running;
        } else {
            self.phase = Phase::Bootstrap { seen };
        }
    }

    /// Fold a frame into the running background.
    ///
    /// Both estimates are rolled forward as exponentially weighted averages,
    /// so old scenes age out of significance after roughly a window's worth
    /// of quiet frames.
    pub fn blend(&mut self, frame: &Frame) {
        let window = self.window as f32;

        for row in 0..FRAME_HEIGHT {
            for col in 0..FRAME_WIDTH {
                let temp = frame[row][col];

                self.averages[row][col] = (self.averages[row][col]
                    * (window - 1.0)
                    + temp)
                    / window;

                let deviation = (temp - self.averages[row][col]).abs();
                self.variances[row][col] = (self.variances[row][col]
                    * (window - 1.0)
                    + deviation)
                    / window;
            }
        }
    }

    /// A pixel stands out from the background when it strays more than three
    /// dispersions from the per-pixel mean.
    pub fn is_foreground(&self, row: usize, col: usize, temperature: f32) -> bool {
        (self.averages[row][col] - temperature).abs()
            > self.variances[row][col] * 3.0
    }

    pub fn averages(&self) -> &Frame {
        &self.averages
    }

    pub fn variances(&self) -> &Frame {
        &self.variances
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nearly_eq::assert_nearly_eq;

    fn uniform(temperature: f32) -> Frame {
        [[temperature; FRAME_WIDTH]; FRAME_HEIGHT]
    }

    // ==========================================================================
    // Bootstrap phase
    // ==========================================================================

    #[test]
    fn test_ready_exactly_at_window() {
        let mut model = BackgroundModel::new(4);
        for i in 0..4 {
            assert!(!model.is_ready(), "ready too early at frame {}", i);
            model.bootstrap(&uniform(20.0));
        }
        assert!(model.is_ready());
        assert_eq!(model.frames_seen(), 4);
    }

    #[test]
    fn test_identical_frames_give_zero_dispersion() {
        let mut model = BackgroundModel::new(4);
        for _ in 0..4 {
            model.bootstrap(&uniform(20.0));
        }

        assert_nearly_eq!(model.averages()[0][0], 20.0);
        assert_nearly_eq!(model.variances()[0][0], 0.0);
    }

    #[test]
    fn test_welford_matches_two_pass_statistics() {
        // Per-pixel sequence 20, 22, 24, 26: mean 23, sample variance 20/3.
        let mut model = BackgroundModel::new(4);
        for temp in [20.0, 22.0, 24.0, 26.0] {
            model.bootstrap(&uniform(temp));
        }

        assert_nearly_eq!(model.averages()[1][5], 23.0, 1e-5);
        assert_nearly_eq!(
            model.variances()[1][5],
            (20.0f32 / 3.0).sqrt(),
            1e-5
        );
    }

    #[test]
    fn test_bootstrap_is_noop_once_running() {
        let mut model = BackgroundModel::new(2);
        model.bootstrap(&uniform(20.0));
        model.bootstrap(&uniform(20.0));
        assert!(model.is_ready());

        model.bootstrap(&uniform(90.0));
        assert_nearly_eq!(model.averages()[0][0], 20.0);
    }

    #[test]
    fn test_reset_restarts_bootstrap() {
        let mut model = BackgroundModel::new(3);
        for _ in 0..3 {
            model.bootstrap(&uniform(20.0));
        }
        assert!(model.is_ready());

        model.reset();
        assert!(!model.is_ready());
        assert_eq!(model.frames_seen(), 0);

        // The first frame after a reset re-seeds the averages outright.
        model.bootstrap(&uniform(25.0));
        assert_nearly_eq!(model.averages()[2][7], 25.0);
        assert_nearly_eq!(model.variances()[2][7], 0.0);
    }

    // ==========================================================================
    // Running phase
    // ==========================================================================

    #[test]
    fn test_blend_rolls_estimates_forward() {
        let mut model = BackgroundModel::new(4);
        for _ in 0..4 {
            model.bootstrap(&uniform(20.0));
        }

        model.blend(&uniform(24.0));

        // Mean: (20 * 3 + 24) / 4 = 21; dispersion: |24 - 21| / 4 = 0.75.
        assert_nearly_eq!(model.averages()[0][0], 21.0, 1e-5);
        assert_nearly_eq!(model.variances()[0][0], 0.75, 1e-5);
    }

    #[test]
    fn test_blend_converges_toward_new_scene() {
        let mut model = BackgroundModel::new(4);
        for _ in 0..4 {
            model.bootstrap(&uniform(20.0));
        }

        for _ in 0..40 {
            model.blend(&uniform(30.0));
        }
        assert!((model.averages()[3][15] - 30.0).abs() < 0.1);
    }

    // ==========================================================================
    // Foreground gating
    // ==========================================================================

    #[test]
    fn test_foreground_after_flat_bootstrap() {
        let mut model = BackgroundModel::new(4);
        for _ in 0..4 {
            model.bootstrap(&uniform(20.0));
        }

        // Zero dispersion: any deviation at all stands out, equality does not.
        assert!(model.is_foreground(0, 0, 20.1));
        assert!(!model.is_foreground(0, 0, 20.0));
    }

    #[test]
    fn test_foreground_respects_three_sigma() {
        let mut model = BackgroundModel::new(4);
        for temp in [20.0, 22.0, 24.0, 26.0] {
            model.bootstrap(&uniform(temp));
        }

        let sigma = (20.0f32 / 3.0).sqrt();
        assert!(!model.is_foreground(0, 0, 23.0 + 2.9 * sigma));
        assert!(model.is_foreground(0, 0, 23.0 + 3.1 * sigma));
    }
}
