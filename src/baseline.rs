//! Linear-scan aggregate used as a correctness reference for the hierarchy.

use nalgebra::{RealField, SVector, Unit};

use crate::{
    query::{self, BoundingSphere, Interaction, Ray},
    traits::{Aggregate, Primitive},
};

/// Aggregate that tests every primitive in turn. It holds no acceleration
/// state, answers the same contracts as [`crate::sbvh::Sbvh`], and exists to
/// validate it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Baseline;

impl Baseline {
    /// Construct a new `Baseline` instance.
    pub const fn new() -> Self {
        Self
    }
}

impl<T: RealField + Copy, const D: usize> Aggregate<T, D> for Baseline {
    fn intersect_from_node<P: Primitive<T, D>>(
        &self,
        primitives: &[P],
        ray: &mut Ray<T, D>,
        interactions: &mut Vec<Interaction<T, D>>,
        _node_start_index: usize,
        nodes_visited: &mut usize,
        check_occlusion: bool,
        count_hits: bool,
    ) -> usize {
        interactions.clear();
        let mut found = false;
        let mut local = Vec::new();

        for (primitive_index, primitive) in primitives.iter().enumerate() {
            if primitive.ignored() {
                continue;
            }

            local.clear();
            let hit = primitive.intersect(ray, &mut local, check_occlusion, count_hits);
            *nodes_visited += 1;

            if hit > 0 {
                if check_occlusion {
                    return 1;
                }
                found = true;
                if count_hits {
                    for mut interaction in local.drain(..) {
                        interaction.primitive_index = primitive_index;
                        interactions.push(interaction);
                    }
                } else {
                    let mut interaction = local[0].clone();
                    interaction.primitive_index = primitive_index;
                    ray.t_max = ray.t_max.min(interaction.distance);
                    if interactions.is_empty() {
                        interactions.push(interaction);
                    } else {
                        interactions[0] = interaction;
                    }
                }
            }
        }

        if count_hits {
            query::sort_by_distance(interactions);
            query::remove_duplicates(interactions);
            return interactions.len();
        }
        usize::from(found)
    }

    fn find_closest_point_from_node<P: Primitive<T, D>>(
        &self,
        primitives: &[P],
        sphere: &mut BoundingSphere<T, D>,
        _node_start_index: usize,
        boundary_hint: Option<&Unit<SVector<T, D>>>,
        nodes_visited: &mut usize,
    ) -> Option<Interaction<T, D>> {
        let mut best: Option<Interaction<T, D>> = None;

        for (primitive_index, primitive) in primitives.iter().enumerate() {
            if primitive.ignored() {
                continue;
            }
            *nodes_visited += 1;

            // Keep the closest point only
            if let Some(mut interaction) = primitive.find_closest_point(sphere, boundary_hint) {
                sphere.r2 = sphere.r2.min(interaction.distance * interaction.distance);
                interaction.primitive_index = primitive_index;
                best = Some(interaction);
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Sphere;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    #[test]
    fn counted_hits_are_sorted_and_deduplicated() {
        let spheres = vec![
            Sphere::new(Point3::new(0.0_f32, 0.0, 0.0), 1.0),
            Sphere::new(Point3::new(5.0, 0.0, 0.0), 1.0),
        ];
        let mut ray = Ray::new(Point3::new(-3.0, 0.0, 0.0), Unit::new_normalize(Vector3::x()));
        let mut interactions = Vec::new();

        let hits = Baseline::new().intersect(&spheres, &mut ray, &mut interactions, false, true);
        assert_eq!(hits, 4);
        assert_relative_eq!(interactions[0].distance, 2.0);
        assert_relative_eq!(interactions[3].distance, 9.0);
        assert!(interactions.windows(2).all(|pair| pair[0].distance <= pair[1].distance));
    }

    #[test]
    fn closest_point_scans_all_primitives() {
        let spheres = vec![
            Sphere::new(Point3::new(0.0_f32, 0.0, 0.0), 1.0),
            Sphere::new(Point3::new(5.0, 0.0, 0.0), 1.0),
        ];
        let mut query_sphere = BoundingSphere::new(Point3::new(3.5, 0.0, 0.0), 10.0);

        let interaction = Baseline::new().find_closest_point(&spheres, &mut query_sphere).unwrap();
        assert_eq!(interaction.primitive_index, 1);
        assert_relative_eq!(interaction.distance, 0.5);
    }
}
