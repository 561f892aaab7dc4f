//! Aggregate query trait shared by the hierarchy and the linear-scan baseline.

use nalgebra::{RealField, SVector, Unit};

use crate::{
    query::{BoundingSphere, Interaction, Ray},
    traits::Primitive,
};

/// Proximity queries over a collection of primitives. Aggregates index the
/// collection but never own it; the same `primitives` slice the aggregate was
/// built over is passed to every query.
pub trait Aggregate<T: RealField + Copy, const D: usize> {
    /// Test for intersections between a `Ray` and the indexed primitives,
    /// starting the traversal at the specified node; use this for
    /// spatially coherent queries.
    ///
    /// With `check_occlusion`, returns 1 as soon as any intersection within
    /// `[t_min, t_max]` is found and the interactions are unspecified. With
    /// `count_hits`, returns the number of distinct interactions, sorted by
    /// distance with duplicates removed. Otherwise returns 0 or 1, filling
    /// `interactions` with the closest hit and clamping `ray.t_max` to it.
    fn intersect_from_node<P: Primitive<T, D>>(
        &self,
        primitives: &[P],
        ray: &mut Ray<T, D>,
        interactions: &mut Vec<Interaction<T, D>>,
        node_start_index: usize,
        nodes_visited: &mut usize,
        check_occlusion: bool,
        count_hits: bool,
    ) -> usize;

    /// Find the primitive point closest to `sphere.center` among primitives
    /// within `sphere.radius`, starting the traversal at the specified node.
    /// `sphere.r2` is shrunk monotonically as closer points are found.
    fn find_closest_point_from_node<P: Primitive<T, D>>(
        &self,
        primitives: &[P],
        sphere: &mut BoundingSphere<T, D>,
        node_start_index: usize,
        boundary_hint: Option<&Unit<SVector<T, D>>>,
        nodes_visited: &mut usize,
    ) -> Option<Interaction<T, D>>;

    /// Test for intersections between a `Ray` and the indexed primitives,
    /// starting at the root.
    fn intersect<P: Primitive<T, D>>(
        &self,
        primitives: &[P],
        ray: &mut Ray<T, D>,
        interactions: &mut Vec<Interaction<T, D>>,
        check_occlusion: bool,
        count_hits: bool,
    ) -> usize {
        let mut nodes_visited = 0;
        self.intersect_from_node(
            primitives,
            ray,
            interactions,
            0,
            &mut nodes_visited,
            check_occlusion,
            count_hits,
        )
    }

    /// Find the primitive point closest to `sphere.center`, starting at the root.
    fn find_closest_point<P: Primitive<T, D>>(
        &self,
        primitives: &[P],
        sphere: &mut BoundingSphere<T, D>,
    ) -> Option<Interaction<T, D>> {
        let mut nodes_visited = 0;
        self.find_closest_point_from_node(primitives, sphere, 0, None, &mut nodes_visited)
    }
}
