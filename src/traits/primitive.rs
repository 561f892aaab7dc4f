//! Primitive capability trait consumed by aggregates.

use nalgebra::{RealField, SVector, Unit};

use crate::{
    geometry::Aabb,
    query::{BoundingSphere, Interaction, Ray},
    traits::Bounded,
};

/// Capability set required of every geometry indexed by an aggregate.
///
/// Aggregates themselves satisfy this contract, so collections may nest.
pub trait Primitive<T: RealField + Copy, const D: usize>: Bounded<T, D> {
    /// Surface area of the geometry; non-negative.
    fn surface_area(&self) -> T;

    /// Signed volume of the geometry; may be negative depending on orientation.
    fn signed_volume(&self) -> T;

    /// Test for intersections between a `Ray` and this geometry within the
    /// ray's `[t_min, t_max]` range, appending them to `interactions`.
    ///
    /// With `check_occlusion`, returns 1 as soon as any intersection exists;
    /// appended interactions are unspecified. With `count_hits`, appends every
    /// intersection. Otherwise appends only the closest intersection.
    /// Returns the number of intersections found.
    fn intersect(
        &self,
        ray: &Ray<T, D>,
        interactions: &mut Vec<Interaction<T, D>>,
        check_occlusion: bool,
        count_hits: bool,
    ) -> usize;

    /// Find the point of this geometry closest to `sphere.center`, reported
    /// only if it lies within the sphere. `boundary_hint` is an optional
    /// direction that sided geometries may use to disambiguate equidistant
    /// closest points; it may be ignored.
    fn find_closest_point(
        &self,
        sphere: &BoundingSphere<T, D>,
        boundary_hint: Option<&Unit<SVector<T, D>>>,
    ) -> Option<Interaction<T, D>>;

    /// Bounding boxes of the geometry clipped to the half-spaces on either
    /// side of the axis-aligned plane `x[dim] = coord`. The default bisects
    /// `parent_box` at the plane, which is correct for any geometry; exact
    /// implementations produce tighter boxes and better spatial splits.
    fn split(&self, dim: usize, coord: T, parent_box: &Aabb<T, D>) -> (Aabb<T, D>, Aabb<T, D>) {
        parent_box.split_at(dim, coord)
    }

    /// Whether queries should skip this primitive.
    fn ignored(&self) -> bool {
        false
    }
}
