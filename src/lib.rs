pub mod assoc;
pub mod background;
pub mod blob;
pub mod error;
pub mod movement;
pub mod pixel;
pub mod tracked_blob;
pub mod tracker;

pub use background::{BackgroundModel, Frame};
pub use blob::Blob;
pub use error::ConfigError;
pub use movement::{Direction, MovementCounts};
pub use pixel::{Axis, Pixel};
pub use tracked_blob::TrackedBlob;
pub use tracker::ThermalTracker;

/*----------------------------------------------------------------------------
Frame geometry and capacity constants
----------------------------------------------------------------------------*/

/// Number of pixel columns in a sensor frame.
pub const FRAME_WIDTH: usize = 16;
/// Number of pixel rows in a sensor frame.
pub const FRAME_HEIGHT: usize = 4;
/// Maximum number of blobs retained per frame; also the track table size.
pub const MAX_BLOBS: usize = 8;
/// Sensor refresh rate in frames per second.
pub const REFRESH_RATE: usize = 16;
/// Number of movement direction categories.
pub const NUM_DIRECTIONS: usize = 5;
