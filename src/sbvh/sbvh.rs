//! Flattened split bounding volume hierarchy and its traversals.

use nalgebra::{Point, RealField, SVector, Unit};
use num_traits::ToPrimitive;

use crate::{
    config::TRAVERSAL_STACK_SIZE,
    error::Result,
    geometry::Aabb,
    query::{self, BoundingSphere, Interaction, Ray},
    sbvh::{SbvhBuilder, SbvhConfig, SbvhNode},
    traits::{Aggregate, Bounded, Primitive},
};

/// Traversal stack entry: a node index and the minimum distance (parametric
/// for rays, squared for spheres) at which its box can matter.
#[derive(Debug, Clone, Copy)]
struct Traversal<T: RealField + Copy> {
    node: usize,
    distance: T,
}

/// Split bounding volume hierarchy over a collection of primitives.
///
/// The hierarchy stores primitive indices, never the primitives themselves;
/// the slice it was built over is passed back in to every query. Spatial
/// splits may reference the same primitive from several leaves, so the
/// reference array can be longer than the primitive count.
#[derive(Debug)]
pub struct Sbvh<T: RealField + Copy, const D: usize> {
    /// Flattened nodes in depth-first preorder.
    nodes: Vec<SbvhNode<T, D>>,
    /// Primitive indices referenced by leaves, duplicates included.
    references: Vec<usize>,
    /// Number of leaf nodes.
    n_leaves: usize,
    /// Deepest level of the tree.
    depth: usize,
    /// A-priori estimate of the tree depth for the primitive count.
    depth_guess: usize,
}

impl<T: RealField + Copy + ToPrimitive, const D: usize> Sbvh<T, D> {
    /// Construct a new `Sbvh` instance over the given primitives.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree outgrows the 32-bit node layout.
    pub fn new<P: Primitive<T, D>>(config: &SbvhConfig<T>, primitives: &[P]) -> Result<Self> {
        SbvhBuilder::new(config).build(primitives)
    }

    pub(crate) fn from_build(
        nodes: Vec<SbvhNode<T, D>>,
        references: Vec<usize>,
        n_leaves: usize,
        depth: usize,
        depth_guess: usize,
    ) -> Self {
        Self {
            nodes,
            references,
            n_leaves,
            depth,
            depth_guess,
        }
    }

    /// Flattened nodes in depth-first preorder.
    pub fn nodes(&self) -> &[SbvhNode<T, D>] {
        &self.nodes
    }

    /// Primitive indices referenced by leaves, duplicates included.
    pub fn references(&self) -> &[usize] {
        &self.references
    }

    /// Number of nodes in the tree.
    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaf nodes.
    pub const fn n_leaves(&self) -> usize {
        self.n_leaves
    }

    /// Deepest level of the tree.
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// A-priori depth estimate recorded at build time.
    pub const fn depth_guess(&self) -> usize {
        self.depth_guess
    }

    /// Bounding box of the whole hierarchy.
    pub fn bounding_box(&self) -> Aabb<T, D> {
        self.nodes.first().map_or_else(Aabb::empty, |node| node.aabb.clone())
    }

    /// Mean of the indexed primitives' centroids.
    ///
    /// # Panics
    ///
    /// In practice this method will never panic.
    pub fn centroid<P: Bounded<T, D>>(&self, primitives: &[P]) -> Point<T, D> {
        let mut total = SVector::<T, D>::zeros();
        for primitive in primitives {
            total += primitive.centroid().coords;
        }
        if primitives.is_empty() {
            return total.into();
        }
        (total / T::from_usize(primitives.len()).unwrap()).into()
    }

    /// Total surface area of the indexed primitives.
    pub fn surface_area<P: Primitive<T, D>>(&self, primitives: &[P]) -> T {
        primitives
            .iter()
            .fold(T::zero(), |total, primitive| total + primitive.surface_area())
    }

    /// Total signed volume of the indexed primitives.
    pub fn signed_volume<P: Primitive<T, D>>(&self, primitives: &[P]) -> T {
        primitives
            .iter()
            .fold(T::zero(), |total, primitive| total + primitive.signed_volume())
    }
}

impl<T: RealField + Copy, const D: usize> Aggregate<T, D> for Sbvh<T, D> {
    fn intersect_from_node<P: Primitive<T, D>>(
        &self,
        primitives: &[P],
        ray: &mut Ray<T, D>,
        interactions: &mut Vec<Interaction<T, D>>,
        node_start_index: usize,
        nodes_visited: &mut usize,
        check_occlusion: bool,
        count_hits: bool,
    ) -> usize {
        interactions.clear();
        if self.nodes.is_empty() {
            return 0;
        }
        debug_assert!(node_start_index < self.nodes.len());

        let mut stack = [Traversal {
            node: 0,
            distance: T::zero(),
        }; TRAVERSAL_STACK_SIZE];
        stack[0] = Traversal {
            node: node_start_index,
            distance: ray.t_min,
        };
        let mut stack_size = 1;

        let mut found = false;
        let mut local = Vec::new();

        while stack_size > 0 {
            stack_size -= 1;
            let Traversal { node, distance } = stack[stack_size];

            // A closer hit has since shrunk the query range past this subtree
            if distance > ray.t_max {
                continue;
            }
            let current = &self.nodes[node];
            *nodes_visited += 1;

            if current.is_leaf() {
                let start = current.offset as usize;
                let end = start + current.n_references as usize;
                for reference in start..end {
                    let primitive_index = self.references[reference];
                    let primitive = &primitives[primitive_index];
                    if primitive.ignored() {
                        continue;
                    }

                    local.clear();
                    let hit = primitive.intersect(ray, &mut local, check_occlusion, count_hits);
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
            } else {
                let left = node + 1;
                let right = node + current.offset as usize;
                let hit_left = self.nodes[left].aabb.intersect_interval(ray);
                let hit_right = self.nodes[right].aabb.intersect_interval(ray);

                // Push the farther child first so the closer one pops next;
                // ties descend left first
                match (hit_left, hit_right) {
                    (Some((near_left, _)), Some((near_right, _))) => {
                        if near_right < near_left {
                            stack[stack_size] = Traversal {
                                node: left,
                                distance: near_left,
                            };
                            stack[stack_size + 1] = Traversal {
                                node: right,
                                distance: near_right,
                            };
                        } else {
                            stack[stack_size] = Traversal {
                                node: right,
                                distance: near_right,
                            };
                            stack[stack_size + 1] = Traversal {
                                node: left,
                                distance: near_left,
                            };
                        }
                        stack_size += 2;
                    }
                    (Some((near, _)), None) => {
                        stack[stack_size] = Traversal { node: left, distance: near };
                        stack_size += 1;
                    }
                    (None, Some((near, _))) => {
                        stack[stack_size] = Traversal { node: right, distance: near };
                        stack_size += 1;
                    }
                    (None, None) => {}
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
        node_start_index: usize,
        boundary_hint: Option<&Unit<SVector<T, D>>>,
        nodes_visited: &mut usize,
    ) -> Option<Interaction<T, D>> {
        if self.nodes.is_empty() {
            return None;
        }
        debug_assert!(node_start_index < self.nodes.len());

        let mut stack = [Traversal {
            node: 0,
            distance: T::zero(),
        }; TRAVERSAL_STACK_SIZE];
        stack[0] = Traversal {
            node: node_start_index,
            distance: self.nodes[node_start_index].aabb.sq_distance_to(&sphere.center),
        };
        let mut stack_size = 1;

        let mut best: Option<Interaction<T, D>> = None;

        while stack_size > 0 {
            stack_size -= 1;
            let Traversal { node, distance } = stack[stack_size];

            // The sphere has since shrunk inside this subtree's box
            if distance >= sphere.r2 {
                continue;
            }
            let current = &self.nodes[node];
            *nodes_visited += 1;

            if current.is_leaf() {
                let start = current.offset as usize;
                let end = start + current.n_references as usize;
                for reference in start..end {
                    let primitive_index = self.references[reference];
                    let primitive = &primitives[primitive_index];
                    if primitive.ignored() {
                        continue;
                    }

                    if let Some(mut interaction) = primitive.find_closest_point(sphere, boundary_hint) {
                        sphere.r2 = sphere.r2.min(interaction.distance * interaction.distance);
                        interaction.primitive_index = primitive_index;
                        best = Some(interaction);
                    }
                }
            } else {
                let left = node + 1;
                let right = node + current.offset as usize;
                let d2_left = self.nodes[left].aabb.sq_distance_to(&sphere.center);
                let d2_right = self.nodes[right].aabb.sq_distance_to(&sphere.center);

                // Push the farther child first so the closer one pops next
                let (first, second) = if d2_right < d2_left {
                    ((left, d2_left), (right, d2_right))
                } else {
                    ((right, d2_right), (left, d2_left))
                };
                for (child, d2) in [first, second] {
                    if d2 < sphere.r2 {
                        stack[stack_size] = Traversal {
                            node: child,
                            distance: d2,
                        };
                        stack_size += 1;
                    }
                }
            }
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Triangle;
    use approx::assert_relative_eq;
    use nalgebra::{Point3, Vector3};

    fn fan(n: usize) -> Vec<Triangle<f32>> {
        (0..n)
            .map(|i| {
                let x = i as f32 * 2.0;
                Triangle::new([
                    Point3::new(x, 0.0, 0.0),
                    Point3::new(x + 1.0, 0.0, 0.0),
                    Point3::new(x, 1.0, 0.0),
                ])
            })
            .collect()
    }

    #[test]
    fn empty_tree_answers_no_hits() {
        let triangles: Vec<Triangle<f32>> = Vec::new();
        let sbvh = Sbvh::new(&SbvhConfig::default(), &triangles).unwrap();

        let mut ray = Ray::new(Point3::new(0.0, 0.0, 1.0), Unit::new_normalize(-Vector3::z()));
        let mut interactions = Vec::new();
        assert_eq!(sbvh.intersect(&triangles, &mut ray, &mut interactions, false, false), 0);

        let mut sphere = BoundingSphere::new(Point3::new(0.0, 0.0, 0.0), 10.0);
        assert!(sbvh.find_closest_point(&triangles, &mut sphere).is_none());
        assert!(!sbvh.bounding_box().is_valid());
    }

    #[test]
    fn first_hit_clamps_the_ray() {
        let triangles = fan(16);
        let sbvh = Sbvh::new(&SbvhConfig::default(), &triangles).unwrap();

        let mut ray = Ray::new(Point3::new(0.25, 0.25, 5.0), Unit::new_normalize(-Vector3::z()));
        let mut interactions = Vec::new();
        assert_eq!(sbvh.intersect(&triangles, &mut ray, &mut interactions, false, false), 1);
        assert_eq!(interactions[0].primitive_index, 0);
        assert_relative_eq!(ray.t_max, 5.0);
    }

    #[test]
    fn occlusion_matches_first_hit() {
        let triangles = fan(16);
        let sbvh = Sbvh::new(&SbvhConfig::default(), &triangles).unwrap();

        let mut interactions = Vec::new();
        let mut hit_ray = Ray::new(Point3::new(10.25, 0.25, 5.0), Unit::new_normalize(-Vector3::z()));
        assert_eq!(sbvh.intersect(&triangles, &mut hit_ray, &mut interactions, true, false), 1);

        let mut miss_ray = Ray::new(Point3::new(1.5, 0.75, 5.0), Unit::new_normalize(-Vector3::z()));
        assert_eq!(sbvh.intersect(&triangles, &mut miss_ray, &mut interactions, true, false), 0);
    }

    #[test]
    fn closest_point_shrinks_the_query_sphere() {
        let triangles = fan(16);
        let sbvh = Sbvh::new(&SbvhConfig::default(), &triangles).unwrap();

        let mut sphere = BoundingSphere::new(Point3::new(2.5, 0.25, 0.5), 10.0);
        let interaction = sbvh.find_closest_point(&triangles, &mut sphere).unwrap();
        assert_eq!(interaction.primitive_index, 1);
        assert_relative_eq!(interaction.distance, 0.5, epsilon = 1e-6);
        assert_relative_eq!(sphere.r2, 0.25, epsilon = 1e-6);
    }

    #[test]
    fn restart_from_interior_node_finds_local_hits() {
        let triangles = fan(32);
        let sbvh = Sbvh::new(&SbvhConfig::default(), &triangles).unwrap();

        // Restart the traversal at the leaf covering the queried triangle
        let target = sbvh
            .nodes()
            .iter()
            .position(|node| {
                node.is_leaf() && node.aabb.contains_point(&Point3::new(0.25, 0.25, 0.0))
            })
            .unwrap();

        let mut ray = Ray::new(Point3::new(0.25, 0.25, 5.0), Unit::new_normalize(-Vector3::z()));
        let mut interactions = Vec::new();
        let mut nodes_visited = 0;
        let hits = sbvh.intersect_from_node(
            &triangles,
            &mut ray,
            &mut interactions,
            target,
            &mut nodes_visited,
            false,
            false,
        );
        assert_eq!(hits, 1);
        assert_eq!(interactions[0].primitive_index, 0);
        assert_eq!(nodes_visited, 1);
    }
}
