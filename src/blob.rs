use crate::pixel::Pixel;
use nalgebra::{Scalar, Vector2};
use num::Float;

/*----------------------------------------------------------------------------
Blob struct
----------------------------------------------------------------------------*/

/// A clump of adjacent foreground pixels, aggregated into summary
/// characteristics as pixels are fed in. Blobs start off empty and inactive;
/// the individual pixels are not stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Blob<T>
where
    T: Float + Scalar,
{
    num_pixels: usize,
    min: Vector2<i32>,
    max: Vector2<i32>,
    centroid: Vector2<f32>,
    average_temperature: T,
    width: i32,
    height: i32,
    aspect_ratio: f32,

    total_x: f32,
    total_y: f32,
    assigned: bool,
}

impl<T> Blob<T>
where
    T: Float + Scalar,
{
    pub fn new() -> Self {
        Self {
            num_pixels: 0,
            min: Vector2::new(0, 0),
            max: Vector2::new(0, 0),
            centroid: Vector2::new(0.0, 0.0),
            average_temperature: T::zero(),
            width: 0,
            height: 0,
            aspect_ratio: 0.0,
            total_x: 0.0,
            total_y: 0.0,
            assigned: false,
        }
    }

    /// Reset the blob back to blank and inactive.
    pub fn clear(&mut self) {
        *self = Self::new();
    }

    /// Absorb a pixel into the blob.
    ///
    /// The average temperature, bounds, and centroid are all maintained
    /// incrementally, so pixels can arrive in any order.
    pub fn add_pixel(&mut self, pixel: Pixel<T>) {
        let pixel_x = pixel.x();
        let pixel_y = pixel.y();

        self.num_pixels += 1;
        let n = T::from(self.num_pixels).unwrap();
        self.average_temperature =
            (self.average_temperature * (n - T::one()) + pixel.temperature())
                / n;

        self.recalculate_bounds(pixel_x, pixel_y);
        self.recalculate_centroid(pixel_x, pixel_y);
    }

    /// A blob must have absorbed at least one pixel to be considered active.
    pub fn is_active(&self) -> bool {
        self.num_pixels > 0
    }

    /// Number of pixels the blob has absorbed.
    pub fn size(&self) -> usize {
        self.num_pixels
    }

    #[inline(always)]
    pub fn centroid(&self) -> Vector2<f32> {
        self.centroid
    }

    #[inline(always)]
    pub fn min(&self) -> Vector2<i32> {
        self.min
    }

    #[inline(always)]
    pub fn max(&self) -> Vector2<i32> {
        self.max
    }

    #[inline(always)]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[inline(always)]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[inline(always)]
    pub fn aspect_ratio(&self) -> f32 {
        self.aspect_ratio
    }

    #[inline(always)]
    pub fn average_temperature(&self) -> T {
        self.average_temperature
    }

    /// Mark the blob as assigned to a tracked blob for this frame.
    pub fn set_assigned(&mut self) {
        self.assigned = true;
    }

    pub fn clear_assigned(&mut self) {
        self.assigned = false;
    }

    pub fn is_assigned(&self) -> bool {
        self.assigned
    }

    fn recalculate_bounds(&mut self, pixel_x: i32, pixel_y: i32) {
        // The first pixel initializes the bounds; later pixels only ever
        // push one side outward.
        if self.num_pixels == 1 {
            self.min = Vector2::new(pixel_x, pixel_y);
            self.max = Vector2::new(pixel_x, pixel_y);
        } else {
            if pixel_x > self.max.x {
                self.max.x = pixel_x;
            }
            if pixel_x < self.min.x {
                self.min.x = pixel_x;
            }
            if pixel_y > self.max.y {
                self.max.y = pixel_y;
            }
            if pixel_y < self.min.y {
                self.min.y = pixel_y;
            }
        }

        self.width = (self.max.x - self.min.x) + 1;
        self.height = (self.max.y - self.min.y) + 1;
        self.aspect_ratio = self.width as f32 / self.height as f32;
    }

    fn recalculate_centroid(&mut self, pixel_x: i32, pixel_y: i32) {
        self.total_x += pixel_x as f32;
        self.total_y += pixel_y as f32;

        let n = self.num_pixels as f32;
        self.centroid = Vector2::new(self.total_x / n, self.total_y / n);
    }
}

impl<T> Default for Blob<T>
where
    T: Float + Scalar,
{
    fn default() -> Self {
        Self::new()
    }
}
