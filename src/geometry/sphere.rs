//! Sphere structure.

use nalgebra::{Point3, RealField, Unit, Vector3};
use std::borrow::Cow;

use crate::{
    geometry::Aabb,
    query::{BoundingSphere, Interaction, Ray},
    traits::{Bounded, Primitive},
};

/// Sphere surface defined by a center point and a radius. Spheres expose no
/// exact plane-split, so spatial splits fall back to bisecting their box.
#[derive(Debug, Clone)]
pub struct Sphere<T: RealField + Copy> {
    /// Center of the sphere.
    pub center: Point3<T>,
    /// Radius of the sphere.
    pub radius: T,
}

impl<T: RealField + Copy> Sphere<T> {
    /// Construct a new `Sphere` instance.
    pub fn new(center: Point3<T>, radius: T) -> Self {
        debug_assert!(radius >= T::zero(), "Radius must be non-negative");
        Self { center, radius }
    }

    /// Parametric ray distances of the two quadratic roots, if any.
    fn roots(&self, ray: &Ray<T, 3>) -> Option<(T, T)> {
        let two = T::from_u8(2)?;
        let oc = ray.origin - self.center;

        // Quadratic equation coefficients: at^2 + bt + c = 0
        let a = ray.direction.dot(&ray.direction);
        let b = two * oc.dot(&ray.direction);
        let c = oc.dot(&oc) - self.radius * self.radius;

        let discriminant = b * b - T::from_u8(4)? * a * c;
        if discriminant < T::zero() {
            return None;
        }

        let sqrt_discriminant = discriminant.sqrt();
        let two_a = two * a;
        Some(((-b - sqrt_discriminant) / two_a, (-b + sqrt_discriminant) / two_a))
    }

    fn interaction_at(&self, ray: &Ray<T, 3>, t: T) -> Interaction<T, 3> {
        let point = ray.point_at(t);
        let normal = Unit::new_normalize((point - self.center) / self.radius);
        Interaction::new(t, point, Some(normal))
    }
}

impl<T: RealField + Copy> Bounded<T, 3> for Sphere<T> {
    fn aabb(&self) -> Cow<'_, Aabb<T, 3>> {
        let r = Vector3::new(self.radius, self.radius, self.radius);
        Cow::Owned(Aabb::new(self.center - r, self.center + r))
    }

    fn centroid(&self) -> Point3<T> {
        self.center
    }
}

impl<T: RealField + Copy> Primitive<T, 3> for Sphere<T> {
    /// # Panics
    ///
    /// In practice this method will never panic.
    fn surface_area(&self) -> T {
        T::from_u8(4).unwrap() * T::pi() * self.radius * self.radius
    }

    /// # Panics
    ///
    /// In practice this method will never panic.
    fn signed_volume(&self) -> T {
        T::from_u8(4).unwrap() * T::pi() * self.radius * self.radius * self.radius / T::from_u8(3).unwrap()
    }

    fn intersect(
        &self,
        ray: &Ray<T, 3>,
        interactions: &mut Vec<Interaction<T, 3>>,
        check_occlusion: bool,
        count_hits: bool,
    ) -> usize {
        let Some((t1, t2)) = self.roots(ray) else {
            return 0;
        };

        let mut hits = 0;
        for t in [t1, t2] {
            if t < ray.t_min || t > ray.t_max {
                continue;
            }
            hits += 1;
            if check_occlusion {
                return 1;
            }
            interactions.push(self.interaction_at(ray, t));
            if !count_hits {
                // The closer valid root comes first; report it alone
                return 1;
            }
        }

        hits
    }

    fn find_closest_point(
        &self,
        sphere: &BoundingSphere<T, 3>,
        _boundary_hint: Option<&Unit<Vector3<T>>>,
    ) -> Option<Interaction<T, 3>> {
        let offset = sphere.center - self.center;
        let norm = offset.norm();

        // Degenerate query at the exact center: every surface point is closest
        let direction = if norm > T::zero() {
            offset / norm
        } else {
            Vector3::x()
        };

        let closest = self.center + direction.scale(self.radius);
        let distance = (norm - self.radius).abs();
        if distance * distance > sphere.r2 {
            return None;
        }

        Some(Interaction::new(distance, closest, Some(Unit::new_unchecked(direction))))
    }
}
