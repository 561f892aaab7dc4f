//! Bounding sphere used as the query region for closest-point searches.

use nalgebra::{Point, RealField};

/// Query sphere for closest-point searches. The radius is stored squared;
/// traversal shrinks it monotonically as closer points are found.
#[derive(Debug, Clone)]
pub struct BoundingSphere<T: RealField + Copy, const D: usize> {
    /// Center of the sphere.
    pub center: Point<T, D>,
    /// Squared radius of the sphere.
    pub r2: T,
}

impl<T: RealField + Copy, const D: usize> BoundingSphere<T, D> {
    /// Construct a new `BoundingSphere` instance from a center and radius.
    pub fn new(center: Point<T, D>, radius: T) -> Self {
        debug_assert!(radius >= T::zero(), "Radius must be non-negative");
        Self {
            center,
            r2: radius * radius,
        }
    }

    /// Radius of the sphere.
    pub fn radius(&self) -> T {
        self.r2.sqrt()
    }
}
