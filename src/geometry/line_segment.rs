//! Line segment geometry embedded in 2D space.

use nalgebra::{Point2, RealField, Unit, Vector2};
use std::borrow::Cow;

use crate::{
    geometry::Aabb,
    query::{BoundingSphere, Interaction, Ray},
    traits::{Bounded, Primitive},
};

/// `LineSegment` geometry embedded in 2D space.
#[derive(Debug, Clone)]
pub struct LineSegment<T: RealField + Copy> {
    /// First endpoint.
    pub a: Point2<T>,
    /// Second endpoint.
    pub b: Point2<T>,
}

/// 2D cross product (z component of the 3D cross product).
fn cross2<T: RealField + Copy>(u: &Vector2<T>, v: &Vector2<T>) -> T {
    u.x * v.y - u.y * v.x
}

impl<T: RealField + Copy> LineSegment<T> {
    /// Construct a new `LineSegment` instance.
    pub fn new(a: Point2<T>, b: Point2<T>) -> Self {
        Self { a, b }
    }

    /// Point of the segment closest to the given point.
    pub fn closest_point(&self, point: &Point2<T>) -> Point2<T> {
        let edge = self.b - self.a;
        let length_sq = edge.norm_squared();
        if length_sq <= T::zero() {
            return self.a;
        }

        let u = ((point - self.a).dot(&edge) / length_sq)
            .max(T::zero())
            .min(T::one());
        self.a + edge.scale(u)
    }

    /// Normal of the supporting line, oriented so that it opposes `towards`
    /// when possible.
    fn oriented_normal(&self, towards: &Vector2<T>) -> Option<Unit<Vector2<T>>> {
        let edge = self.b - self.a;
        if edge.norm_squared() <= T::zero() {
            return None;
        }

        let mut normal = Vector2::new(edge.y, -edge.x);
        if normal.dot(towards) > T::zero() {
            normal = -normal;
        }
        Some(Unit::new_normalize(normal))
    }
}

impl<T: RealField + Copy> Bounded<T, 2> for LineSegment<T> {
    fn aabb(&self) -> Cow<'_, Aabb<T, 2>> {
        let mut aabb = Aabb::empty();
        aabb.expand_to_include(&self.a);
        aabb.expand_to_include(&self.b);
        Cow::Owned(aabb)
    }

    /// Midpoint of the segment.
    ///
    /// # Panics
    ///
    /// In practice this method will never panic.
    fn centroid(&self) -> Point2<T> {
        ((self.a.coords + self.b.coords) / T::from_u8(2).unwrap()).into()
    }
}

impl<T: RealField + Copy> Primitive<T, 2> for LineSegment<T> {
    /// In 2D the "surface area" of a segment is its length.
    fn surface_area(&self) -> T {
        (self.b - self.a).norm()
    }

    /// Shoelace contribution of the segment to the area of a closed polyline.
    ///
    /// # Panics
    ///
    /// In practice this method will never panic.
    fn signed_volume(&self) -> T {
        cross2(&self.a.coords, &self.b.coords) / T::from_u8(2).unwrap()
    }

    fn intersect(
        &self,
        ray: &Ray<T, 2>,
        interactions: &mut Vec<Interaction<T, 2>>,
        _check_occlusion: bool,
        _count_hits: bool,
    ) -> usize {
        let edge = self.b - self.a;
        let denominator = cross2(&ray.direction, &edge);

        // Parallel or degenerate: collinear overlap is not reported
        if denominator.abs() <= T::default_epsilon() {
            return 0;
        }

        let offset = self.a - ray.origin;
        let t = cross2(&offset, &edge) / denominator;
        let u = cross2(&offset, &ray.direction) / denominator;

        if u < T::zero() || u > T::one() || t < ray.t_min || t > ray.t_max {
            return 0;
        }

        let normal = self.oriented_normal(&ray.direction);
        interactions.push(Interaction::new(t, ray.point_at(t), normal));
        1
    }

    fn find_closest_point(
        &self,
        sphere: &BoundingSphere<T, 2>,
        boundary_hint: Option<&Unit<Vector2<T>>>,
    ) -> Option<Interaction<T, 2>> {
        let closest = self.closest_point(&sphere.center);
        let offset = closest - sphere.center;
        let d2 = offset.norm_squared();
        if d2 > sphere.r2 {
            return None;
        }

        // Point the normal back at the query; a boundary hint settles queries
        // lying exactly on the segment
        let towards = if d2 > T::zero() {
            offset
        } else if let Some(hint) = boundary_hint {
            -hint.into_inner()
        } else {
            offset
        };
        let normal = self.oriented_normal(&towards);

        Some(Interaction::new(d2.sqrt(), closest, normal))
    }

    /// Exact split: the crossing point bounds both halves.
    fn split(&self, dim: usize, coord: T, parent_box: &Aabb<T, 2>) -> (Aabb<T, 2>, Aabb<T, 2>) {
        let d0 = self.a[dim] - coord;
        let d1 = self.b[dim] - coord;

        if (d0 < T::zero() && d1 > T::zero()) || (d0 > T::zero() && d1 < T::zero()) {
            let t = d0 / (d0 - d1);
            let mut crossing = self.a + (self.b - self.a).scale(t);
            crossing[dim] = coord;

            let (near, far) = if d0 < T::zero() { (self.a, self.b) } else { (self.b, self.a) };
            let mut left = Aabb::empty();
            left.expand_to_include(&near);
            left.expand_to_include(&crossing);
            let mut right = Aabb::empty();
            right.expand_to_include(&crossing);
            right.expand_to_include(&far);
            return (left, right);
        }

        parent_box.split_at(dim, coord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn diagonal() -> LineSegment<f32> {
        LineSegment::new(Point2::new(0.0, 0.0), Point2::new(2.0, 2.0))
    }

    #[test]
    fn ray_crosses_segment() {
        let segment = diagonal();
        let ray = Ray::new(Point2::new(2.0, 0.0), Unit::new_normalize(Vector2::new(-1.0, 1.0)));
        let mut interactions = Vec::new();
        assert_eq!(segment.intersect(&ray, &mut interactions, false, false), 1);
        assert_relative_eq!(interactions[0].point, Point2::new(1.0, 1.0), epsilon = 1e-6);
    }

    #[test]
    fn parallel_ray_misses() {
        let segment = diagonal();
        let ray = Ray::new(Point2::new(1.0, 0.0), Unit::new_normalize(Vector2::new(1.0, 1.0)));
        let mut interactions = Vec::new();
        assert_eq!(segment.intersect(&ray, &mut interactions, false, false), 0);
    }

    #[test]
    fn closest_point_clamps_to_endpoints() {
        let segment = diagonal();
        assert_relative_eq!(segment.closest_point(&Point2::new(-1.0, -2.0)), Point2::new(0.0, 0.0));
        assert_relative_eq!(segment.closest_point(&Point2::new(2.0, 0.0)), Point2::new(1.0, 1.0));
    }

    #[test]
    fn split_is_exact_at_the_crossing() {
        let segment = diagonal();
        let parent = segment.aabb().into_owned();
        let (left, right) = segment.split(0, 0.5, &parent);

        // The diagonal only reaches y = 0.5 at x = 0.5
        assert_relative_eq!(left.maxs[1], 0.5);
        assert_relative_eq!(right.mins[0], 0.5);
        assert_relative_eq!(right.mins[1], 0.5);
    }
}
