//! Split scoring functions.

use nalgebra::RealField;
use serde::{Deserialize, Serialize};

use crate::geometry::Aabb;

/// Scoring function used to rank candidate splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CostHeuristic {
    /// Split the widest centroid axis at its midpoint; not cost-driven.
    LongestAxisCenter,
    /// Surface area heuristic: child areas weighted by primitive counts.
    #[default]
    SurfaceArea,
    /// Surface area heuristic with a penalty for overlapping children.
    OverlapSurfaceArea,
    /// Child volumes weighted by primitive counts.
    Volume,
    /// Volume heuristic with a penalty for overlapping children.
    OverlapVolume,
}

impl CostHeuristic {
    /// Whether candidate splits are scored by bounding-box measures; the
    /// midpoint rule scores by axis width in the object-split finder instead.
    pub(crate) fn is_measure_driven(self) -> bool {
        self != Self::LongestAxisCenter
    }

    /// Score a candidate split into `(box_left, box_right)` with
    /// `(n_left, n_right)` references, normalized by the parent measure so
    /// that the cost is comparable to the leaf cost `n_left + n_right`.
    pub(crate) fn split_cost<T: RealField + Copy, const D: usize>(
        self,
        box_left: &Aabb<T, D>,
        box_right: &Aabb<T, D>,
        parent_surface_area: T,
        parent_volume: T,
        n_left: usize,
        n_right: usize,
    ) -> T {
        let left = T::from_usize(n_left).unwrap();
        let right = T::from_usize(n_right).unwrap();
        let both = left + right;

        match self {
            // Scored by axis width in the object-split finder
            Self::LongestAxisCenter => T::zero(),
            Self::SurfaceArea => {
                (box_left.surface_area() * left + box_right.surface_area() * right)
                    / parent_surface_area.max(T::default_epsilon())
            }
            Self::OverlapSurfaceArea => {
                let overlap = box_left.overlap(box_right).map_or_else(T::zero, |o| o.surface_area());
                (box_left.surface_area() * left + box_right.surface_area() * right + overlap * both)
                    / parent_surface_area.max(T::default_epsilon())
            }
            Self::Volume => {
                (box_left.volume() * left + box_right.volume() * right)
                    / parent_volume.max(T::default_epsilon())
            }
            Self::OverlapVolume => {
                let overlap = box_left.overlap(box_right).map_or_else(T::zero, |o| o.volume());
                (box_left.volume() * left + box_right.volume() * right + overlap * both)
                    / parent_volume.max(T::default_epsilon())
            }
        }
    }

    /// Score the three ways of resolving a reference straddling a spatial
    /// split plane: duplicate it with clipped boxes, or assign it whole to
    /// one side, growing that side's box and shrinking the other's count.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn unsplitting_costs<T: RealField + Copy, const D: usize>(
        self,
        box_left: &Aabb<T, D>,
        box_right: &Aabb<T, D>,
        box_reference: &Aabb<T, D>,
        parent_surface_area: T,
        parent_volume: T,
        n_left: usize,
        n_right: usize,
    ) -> (T, T, T) {
        let duplicate = self.split_cost(box_left, box_right, parent_surface_area, parent_volume, n_left, n_right);
        let unsplit_left = self.split_cost(
            &box_left.merge(box_reference),
            box_right,
            parent_surface_area,
            parent_volume,
            n_left,
            n_right - 1,
        );
        let unsplit_right = self.split_cost(
            box_left,
            &box_right.merge(box_reference),
            parent_surface_area,
            parent_volume,
            n_left - 1,
            n_right,
        );
        (duplicate, unsplit_left, unsplit_right)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn slab(x0: f32, x1: f32) -> Aabb<f32, 3> {
        Aabb::new(Point3::new(x0, 0.0, 0.0), Point3::new(x1, 1.0, 1.0))
    }

    #[test]
    fn surface_area_cost_prefers_balanced_tight_children() {
        let parent = slab(0.0, 2.0);
        let balanced = CostHeuristic::SurfaceArea.split_cost(
            &slab(0.0, 1.0),
            &slab(1.0, 2.0),
            parent.surface_area(),
            parent.volume(),
            4,
            4,
        );
        let lopsided = CostHeuristic::SurfaceArea.split_cost(
            &slab(0.0, 1.8),
            &slab(0.2, 2.0),
            parent.surface_area(),
            parent.volume(),
            4,
            4,
        );
        assert!(balanced < lopsided);
    }

    #[test]
    fn overlap_penalty_separates_equal_area_splits() {
        let parent = slab(0.0, 2.0);
        let disjoint = CostHeuristic::OverlapSurfaceArea.split_cost(
            &slab(0.0, 1.0),
            &slab(1.0, 2.0),
            parent.surface_area(),
            parent.volume(),
            4,
            4,
        );
        let overlapping = CostHeuristic::OverlapSurfaceArea.split_cost(
            &slab(0.0, 1.5),
            &slab(0.5, 2.0),
            parent.surface_area(),
            parent.volume(),
            4,
            4,
        );
        assert!(disjoint < overlapping);
    }

    #[test]
    fn unsplitting_rewards_absorbing_a_near_boundary_reference() {
        let parent = slab(0.0, 2.0);
        // Reference hugging the plane from the left: unsplit-left barely grows
        // the left box while dropping a reference from the right side
        let reference = slab(0.95, 1.05);
        let (duplicate, unsplit_left, _unsplit_right) = CostHeuristic::SurfaceArea.unsplitting_costs(
            &slab(0.0, 1.0),
            &slab(1.0, 2.0),
            &reference,
            parent.surface_area(),
            parent.volume(),
            8,
            8,
        );
        assert!(unsplit_left < duplicate);
    }
}
