//! Axis-aligned bounding box structure.

use nalgebra::{Point, RealField, SVector};
use std::borrow::Cow;

use crate::{query::Ray, traits::Bounded};

/// Axis-aligned bounding box in D-dimensional space.
#[derive(Debug, Clone, PartialEq)]
pub struct Aabb<T: RealField + Copy, const D: usize> {
    /// Minimum corner.
    pub mins: Point<T, D>,
    /// Maximum corner.
    pub maxs: Point<T, D>,
}

impl<T: RealField + Copy, const D: usize> Aabb<T, D> {
    /// Construct a new `Aabb` instance.
    pub fn new(mins: Point<T, D>, maxs: Point<T, D>) -> Self {
        debug_assert!(
            (0..D).all(|i| mins[i] <= maxs[i]),
            "Invalid AABB bounds"
        );
        Self { mins, maxs }
    }

    /// Create an 'empty' `Aabb` with inverted extreme bounds; it is the
    /// identity of [`Aabb::merge`].
    ///
    /// # Panics
    ///
    /// In practice this method will never panic.
    #[must_use]
    pub fn empty() -> Self {
        let min_value = T::min_value().unwrap();
        let max_value = T::max_value().unwrap();
        Self {
            mins: SVector::<T, D>::repeat(max_value).into(),
            maxs: SVector::<T, D>::repeat(min_value).into(),
        }
    }

    /// Whether the bounds describe an actual region of space.
    pub fn is_valid(&self) -> bool {
        (0..D).all(|i| self.mins[i] <= self.maxs[i])
    }

    /// Calculate the center of the `Aabb`.
    ///
    /// # Panics
    ///
    /// In practice this method will never panic.
    pub fn centre(&self) -> Point<T, D> {
        let two = T::from_u8(2).unwrap();
        ((self.mins.coords + self.maxs.coords) / two).into()
    }

    /// Edge lengths along each axis.
    pub fn extents(&self) -> SVector<T, D> {
        self.maxs - self.mins
    }

    /// Index of the axis with the largest extent.
    pub fn widest_axis(&self) -> usize {
        let extents = self.extents();
        let mut axis = 0;
        for i in 1..D {
            if extents[i] > extents[axis] {
                axis = i;
            }
        }
        axis
    }

    /// Calculate the surface area of the `Aabb`: perimeter in 2D, area in 3D.
    ///
    /// # Panics
    ///
    /// In practice this method will never panic.
    pub fn surface_area(&self) -> T {
        let extents = self.extents();
        let mut total = T::zero();
        for i in 0..D {
            let mut product = T::one();
            for j in 0..D {
                if j != i {
                    product *= extents[j];
                }
            }
            total += product;
        }
        T::from_u8(2).unwrap() * total
    }

    /// Calculate the volume of the `Aabb`: area in 2D, volume in 3D.
    pub fn volume(&self) -> T {
        let extents = self.extents();
        let mut volume = T::one();
        for i in 0..D {
            volume *= extents[i];
        }
        volume
    }

    /// Return a new `Aabb` which encapsulates this `Aabb` and another `Aabb`.
    pub fn merge(&self, other: &Self) -> Self {
        let mut mins = self.mins;
        let mut maxs = self.maxs;
        for i in 0..D {
            mins[i] = mins[i].min(other.mins[i]);
            maxs[i] = maxs[i].max(other.maxs[i]);
        }
        Self { mins, maxs }
    }

    /// Grow the `Aabb` to contain the given point.
    pub fn expand_to_include(&mut self, point: &Point<T, D>) {
        for i in 0..D {
            self.mins[i] = self.mins[i].min(point[i]);
            self.maxs[i] = self.maxs[i].max(point[i]);
        }
    }

    /// Intersection of two boxes, or `None` if they are disjoint.
    pub fn overlap(&self, other: &Self) -> Option<Self> {
        let mut mins = self.mins;
        let mut maxs = self.maxs;
        for i in 0..D {
            mins[i] = mins[i].max(other.mins[i]);
            maxs[i] = maxs[i].min(other.maxs[i]);
            if mins[i] > maxs[i] {
                return None;
            }
        }
        Some(Self { mins, maxs })
    }

    /// Whether the given point lies inside the `Aabb` (boundary included).
    pub fn contains_point(&self, point: &Point<T, D>) -> bool {
        (0..D).all(|i| self.mins[i] <= point[i] && point[i] <= self.maxs[i])
    }

    /// Whether the other `Aabb` lies entirely inside this one.
    pub fn contains(&self, other: &Self) -> bool {
        (0..D).all(|i| self.mins[i] <= other.mins[i] && other.maxs[i] <= self.maxs[i])
    }

    /// Bisect the `Aabb` with the axis-aligned plane `x[dim] = coord`; the
    /// coordinate is clamped into the box so both halves remain valid.
    pub fn split_at(&self, dim: usize, coord: T) -> (Self, Self) {
        let coord = coord.max(self.mins[dim]).min(self.maxs[dim]);
        let mut left = self.clone();
        let mut right = self.clone();
        left.maxs[dim] = coord;
        right.mins[dim] = coord;
        (left, right)
    }

    /// Squared Euclidean distance from the given point to the `Aabb`; zero
    /// for points inside.
    pub fn sq_distance_to(&self, point: &Point<T, D>) -> T {
        let mut d2 = T::zero();
        for i in 0..D {
            let excess = (self.mins[i] - point[i]).max(point[i] - self.maxs[i]).max(T::zero());
            d2 += excess * excess;
        }
        d2
    }

    /// Intersect the ray's `[t_min, t_max]` range with the box slabs,
    /// returning the entry and exit distances if the range is non-empty.
    pub fn intersect_interval(&self, ray: &Ray<T, D>) -> Option<(T, T)> {
        let mut t_near = ray.t_min;
        let mut t_far = ray.t_max;

        for i in 0..D {
            let inv_dir_i = ray.inv_direction[i];

            // Parallel ray (inv_direction is inf/-inf): inside the slab or miss
            if !inv_dir_i.is_finite() {
                if ray.origin[i] < self.mins[i] || ray.origin[i] > self.maxs[i] {
                    return None;
                }
                continue;
            }

            let t0 = (self.mins[i] - ray.origin[i]) * inv_dir_i;
            let t1 = (self.maxs[i] - ray.origin[i]) * inv_dir_i;

            // Use ray.sign for branchless min/max
            let t_entry = if ray.sign[i] == 0 { t0 } else { t1 };
            let t_exit = if ray.sign[i] == 0 { t1 } else { t0 };

            t_near = t_near.max(t_entry);
            t_far = t_far.min(t_exit);

            // Early exit if no intersection
            if t_near > t_far {
                return None;
            }
        }

        Some((t_near, t_far))
    }
}

impl<T: RealField + Copy, const D: usize> Bounded<T, D> for Aabb<T, D> {
    fn aabb(&self) -> Cow<'_, Self> {
        Cow::Borrowed(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Unit, Vector3};

    fn unit_box() -> Aabb<f32, 3> {
        Aabb::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn empty_is_merge_identity() {
        let merged = Aabb::<f32, 3>::empty().merge(&unit_box());
        assert_eq!(merged, unit_box());
        assert!(!Aabb::<f32, 3>::empty().is_valid());
    }

    #[test]
    fn surface_area_and_volume() {
        let aabb = Aabb::new(Point3::new(0.0_f32, 0.0, 0.0), Point3::new(2.0, 3.0, 4.0));
        assert_relative_eq!(aabb.surface_area(), 52.0);
        assert_relative_eq!(aabb.volume(), 24.0);

        let rect = Aabb::new(nalgebra::Point2::new(0.0_f32, 0.0), nalgebra::Point2::new(2.0, 3.0));
        assert_relative_eq!(rect.surface_area(), 10.0);
        assert_relative_eq!(rect.volume(), 6.0);
    }

    #[test]
    fn overlap_of_disjoint_boxes_is_none() {
        let other = Aabb::new(Point3::new(2.0, 2.0, 2.0), Point3::new(3.0, 3.0, 3.0));
        assert!(unit_box().overlap(&other).is_none());

        let touching = Aabb::new(Point3::new(1.0, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        let overlap = unit_box().overlap(&touching).unwrap();
        assert_relative_eq!(overlap.volume(), 0.0);
    }

    #[test]
    fn split_at_partitions_the_box() {
        let (left, right) = unit_box().split_at(0, 0.25);
        assert_relative_eq!(left.maxs[0], 0.25);
        assert_relative_eq!(right.mins[0], 0.25);
        assert_eq!(left.merge(&right), unit_box());
    }

    #[test]
    fn sq_distance_is_zero_inside() {
        let aabb = unit_box();
        assert_relative_eq!(aabb.sq_distance_to(&Point3::new(0.5, 0.5, 0.5)), 0.0);
        assert_relative_eq!(aabb.sq_distance_to(&Point3::new(2.0, 0.5, 0.5)), 1.0);
        assert_relative_eq!(aabb.sq_distance_to(&Point3::new(2.0, 2.0, 0.5)), 2.0);
    }

    #[test]
    fn slab_interval_honours_ray_range() {
        let aabb = unit_box();
        let mut ray = Ray::new(Point3::new(-1.0_f32, 0.5, 0.5), Unit::new_normalize(Vector3::x()));
        let (near, far) = aabb.intersect_interval(&ray).unwrap();
        assert_relative_eq!(near, 1.0);
        assert_relative_eq!(far, 2.0);

        ray.t_max = 0.5;
        assert!(aabb.intersect_interval(&ray).is_none());
    }

    #[test]
    fn parallel_ray_outside_slab_misses() {
        let aabb = unit_box();
        let ray = Ray::<f32, 3>::new(Point3::new(0.5, 2.0, 0.5), Unit::new_normalize(Vector3::x()));
        assert!(aabb.intersect_interval(&ray).is_none());
    }
}
