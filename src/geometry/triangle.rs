use nalgebra::{Point3, RealField, Unit, Vector3};
use std::borrow::Cow;

use crate::{
    geometry::Aabb,
    query::{BoundingSphere, Interaction, Ray},
    traits::{Bounded, Primitive},
};

/// `Triangle` geometry embedded in 3D space.
#[derive(Debug, Clone)]
pub struct Triangle<T: RealField + Copy> {
    /// Vertex positions.
    vertices: [Point3<T>; 3],
    /// Geometric normal.
    geometric_normal: Unit<Vector3<T>>,
}

impl<T: RealField + Copy> Triangle<T> {
    /// Construct a new `Triangle` instance.
    pub fn new(vertices: [Point3<T>; 3]) -> Self {
        let edge1 = vertices[1] - vertices[0];
        let edge2 = vertices[2] - vertices[0];
        let geometric_normal = Unit::new_normalize(edge1.cross(&edge2));

        Self {
            vertices,
            geometric_normal,
        }
    }

    /// Vertex positions.
    pub const fn vertices(&self) -> &[Point3<T>; 3] {
        &self.vertices
    }

    /// Point of the triangle closest to the given point (Ericson's
    /// region-based method).
    pub fn closest_point(&self, point: &Point3<T>) -> Point3<T> {
        let [a, b, c] = self.vertices;
        let ab = b - a;
        let ac = c - a;

        // Vertex region A
        let ap = point - a;
        let d1 = ab.dot(&ap);
        let d2 = ac.dot(&ap);
        if d1 <= T::zero() && d2 <= T::zero() {
            return a;
        }

        // Vertex region B
        let bp = point - b;
        let d3 = ab.dot(&bp);
        let d4 = ac.dot(&bp);
        if d3 >= T::zero() && d4 <= d3 {
            return b;
        }

        // Edge region AB
        let vc = d1 * d4 - d3 * d2;
        if vc <= T::zero() && d1 >= T::zero() && d3 <= T::zero() {
            let v = d1 / (d1 - d3);
            return a + ab.scale(v);
        }

        // Vertex region C
        let cp = point - c;
        let d5 = ab.dot(&cp);
        let d6 = ac.dot(&cp);
        if d6 >= T::zero() && d5 <= d6 {
            return c;
        }

        // Edge region AC
        let vb = d5 * d2 - d1 * d6;
        if vb <= T::zero() && d2 >= T::zero() && d6 <= T::zero() {
            let w = d2 / (d2 - d6);
            return a + ac.scale(w);
        }

        // Edge region BC
        let va = d3 * d6 - d5 * d4;
        if va <= T::zero() && (d4 - d3) >= T::zero() && (d5 - d6) >= T::zero() {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return b + (c - b).scale(w);
        }

        // Face region
        let denominator = T::one() / (va + vb + vc);
        let v = vb * denominator;
        let w = vc * denominator;
        a + ab.scale(v) + ac.scale(w)
    }
}

impl<T: RealField + Copy> Bounded<T, 3> for Triangle<T> {
    fn aabb(&self) -> Cow<'_, Aabb<T, 3>> {
        let mut aabb = Aabb::empty();
        for vertex in &self.vertices {
            aabb.expand_to_include(vertex);
        }
        Cow::Owned(aabb)
    }

    /// Barycenter of the vertices.
    ///
    /// # Panics
    ///
    /// In practice this method will never panic.
    fn centroid(&self) -> Point3<T> {
        let three = T::from_u8(3).unwrap();
        ((self.vertices[0].coords + self.vertices[1].coords + self.vertices[2].coords) / three).into()
    }
}

impl<T: RealField + Copy> Primitive<T, 3> for Triangle<T> {
    /// # Panics
    ///
    /// In practice this method will never panic.
    fn surface_area(&self) -> T {
        let edge1 = self.vertices[1] - self.vertices[0];
        let edge2 = self.vertices[2] - self.vertices[0];
        edge1.cross(&edge2).norm() / T::from_u8(2).unwrap()
    }

    /// Signed volume of the tetrahedron spanned with the origin.
    ///
    /// # Panics
    ///
    /// In practice this method will never panic.
    fn signed_volume(&self) -> T {
        let six = T::from_u8(6).unwrap();
        self.vertices[0]
            .coords
            .dot(&self.vertices[1].coords.cross(&self.vertices[2].coords))
            / six
    }

    fn intersect(
        &self,
        ray: &Ray<T, 3>,
        interactions: &mut Vec<Interaction<T, 3>>,
        _check_occlusion: bool,
        _count_hits: bool,
    ) -> usize {
        // Use a relative epsilon based on the triangle's size
        let edge1 = self.vertices[1] - self.vertices[0];
        let edge2 = self.vertices[2] - self.vertices[0];
        let edge_length_sq = edge1.norm_squared().max(edge2.norm_squared());
        let epsilon = T::default_epsilon() * edge_length_sq.sqrt();

        let h = ray.direction.cross(&edge2);
        let a = edge1.dot(&h);

        // Early exit for parallel rays
        if a.abs() < epsilon {
            return 0;
        }

        let inv_a = T::one() / a;
        let s = ray.origin - self.vertices[0];
        let u = inv_a * s.dot(&h);

        // Early exits for barycentric coordinates
        if u < T::zero() || u > T::one() {
            return 0;
        }

        let q = s.cross(&edge1);
        let v = inv_a * ray.direction.dot(&q);

        if v < T::zero() || u + v > T::one() {
            return 0;
        }

        let t = inv_a * edge2.dot(&q);

        if t < ray.t_min || t > ray.t_max {
            return 0;
        }

        interactions.push(Interaction::new(t, ray.point_at(t), Some(self.geometric_normal)));
        1
    }

    fn find_closest_point(
        &self,
        sphere: &BoundingSphere<T, 3>,
        _boundary_hint: Option<&Unit<Vector3<T>>>,
    ) -> Option<Interaction<T, 3>> {
        let closest = self.closest_point(&sphere.center);
        let d2 = (closest - sphere.center).norm_squared();
        if d2 > sphere.r2 {
            return None;
        }

        Some(Interaction::new(d2.sqrt(), closest, Some(self.geometric_normal)))
    }

    /// Clip the triangle against the plane `x[dim] = coord` and bound each half.
    fn split(&self, dim: usize, coord: T, parent_box: &Aabb<T, 3>) -> (Aabb<T, 3>, Aabb<T, 3>) {
        let mut left = Aabb::empty();
        let mut right = Aabb::empty();

        for i in 0..3 {
            let v0 = self.vertices[i];
            let v1 = self.vertices[(i + 1) % 3];
            let d0 = v0[dim] - coord;
            let d1 = v1[dim] - coord;

            if d0 <= T::zero() {
                left.expand_to_include(&v0);
            }
            if d0 >= T::zero() {
                right.expand_to_include(&v0);
            }

            // Edge crosses the plane: its intersection point bounds both halves
            if (d0 < T::zero() && d1 > T::zero()) || (d0 > T::zero() && d1 < T::zero()) {
                let t = d0 / (d0 - d1);
                let mut crossing = v0 + (v1 - v0).scale(t);
                crossing[dim] = coord;
                left.expand_to_include(&crossing);
                right.expand_to_include(&crossing);
            }
        }

        if !left.is_valid() || !right.is_valid() {
            return parent_box.split_at(dim, coord);
        }
        (left, right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_triangle() -> Triangle<f32> {
        Triangle::new([
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ])
    }

    #[test]
    fn ray_hits_interior() {
        let triangle = unit_triangle();
        let ray = Ray::new(Point3::new(0.25, 0.25, 1.0), Unit::new_normalize(-Vector3::z()));
        let mut interactions = Vec::new();
        assert_eq!(triangle.intersect(&ray, &mut interactions, false, false), 1);
        assert_relative_eq!(interactions[0].distance, 1.0);
        assert_relative_eq!(interactions[0].point.z, 0.0);
    }

    #[test]
    fn ray_misses_outside_barycentric_range() {
        let triangle = unit_triangle();
        let ray = Ray::new(Point3::new(0.75, 0.75, 1.0), Unit::new_normalize(-Vector3::z()));
        let mut interactions = Vec::new();
        assert_eq!(triangle.intersect(&ray, &mut interactions, false, false), 0);
    }

    #[test]
    fn parallel_ray_misses() {
        let triangle = unit_triangle();
        let ray = Ray::new(Point3::new(0.0, 0.0, 1.0), Unit::new_normalize(Vector3::x()));
        let mut interactions = Vec::new();
        assert_eq!(triangle.intersect(&ray, &mut interactions, false, false), 0);
    }

    #[test]
    fn closest_point_regions() {
        let triangle = unit_triangle();

        // Face region: straight above the interior
        let face = triangle.closest_point(&Point3::new(0.25, 0.25, 1.0));
        assert_relative_eq!(face, Point3::new(0.25, 0.25, 0.0));

        // Vertex region
        let vertex = triangle.closest_point(&Point3::new(-1.0, -1.0, 0.0));
        assert_relative_eq!(vertex, Point3::new(0.0, 0.0, 0.0));

        // Edge region: beyond the hypotenuse
        let edge = triangle.closest_point(&Point3::new(1.0, 1.0, 0.0));
        assert_relative_eq!(edge, Point3::new(0.5, 0.5, 0.0));
    }

    #[test]
    fn closest_point_respects_sphere_radius() {
        let triangle = unit_triangle();
        let far = BoundingSphere::new(Point3::new(0.25, 0.25, 2.0), 1.0);
        assert!(triangle.find_closest_point(&far, None).is_none());

        let near = BoundingSphere::new(Point3::new(0.25, 0.25, 0.5), 1.0);
        let interaction = triangle.find_closest_point(&near, None).unwrap();
        assert_relative_eq!(interaction.distance, 0.5);
    }

    #[test]
    fn split_produces_tight_halves() {
        let triangle = unit_triangle();
        let parent = triangle.aabb().into_owned();
        let (left, right) = triangle.split(0, 0.5, &parent);

        assert_relative_eq!(left.maxs[0], 0.5);
        assert_relative_eq!(right.mins[0], 0.5);
        // Right half only reaches y = 0.5 where the hypotenuse crosses the plane
        assert_relative_eq!(right.maxs[1], 0.5);
        assert!(parent.contains(&left));
        assert!(parent.contains(&right));
    }
}
