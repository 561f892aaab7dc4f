//! Bounded geometry trait.

use nalgebra::{Point, RealField};
use std::borrow::Cow;

use crate::geometry::Aabb;

/// Types implementing this trait can be bounded by an axis-aligned bounding box (`Aabb`).
pub trait Bounded<T: RealField + Copy, const D: usize> {
    /// Get the axis-aligned bounding box of the geometry.
    fn aabb(&self) -> Cow<'_, Aabb<T, D>>;

    /// Get a representative interior point of the geometry; defaults to the
    /// center of the bounding box.
    fn centroid(&self) -> Point<T, D> {
        self.aabb().centre()
    }
}
