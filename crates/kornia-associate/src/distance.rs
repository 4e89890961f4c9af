use crate::types::Location;

/// Distance between the image locations of two features.
///
/// The distance does not need to be in pixels, [`ImageDistance::convert_pixel_distance`]
/// maps a pixel radius into the units returned by [`ImageDistance::distance`].
pub trait ImageDistance: Send + Sync {
    /// Distance between two locations.
    fn distance(&self, a: &Location, b: &Location) -> f64;

    /// Convert a distance in pixels into the units of this function.
    fn convert_pixel_distance(&self, pixels: f64) -> f64;
}

/// Squared Euclidean distance between two locations.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanSqDistance;

impl ImageDistance for EuclideanSqDistance {
    #[inline]
    fn distance(&self, a: &Location, b: &Location) -> f64 {
        let dx = a[0] - b[0];
        let dy = a[1] - b[1];
        dx * dx + dy * dy
    }

    fn convert_pixel_distance(&self, pixels: f64) -> f64 {
        pixels * pixels
    }
}
