//! Top-down construction of the split bounding volume hierarchy.

use nalgebra::{Point, RealField};
use num_traits::ToPrimitive;
use std::{cmp::Ordering, time::Instant};

use crate::{
    config::SBVH_MAX_DEPTH,
    error::{Result, SbvhError},
    geometry::Aabb,
    sbvh::{Sbvh, SbvhConfig, SbvhNode},
    traits::Primitive,
};

/// One (possibly duplicated) primitive reference during construction. The box
/// starts as the primitive's own and tightens as spatial splits clip it; the
/// centroid of a clipped reference is its box center.
#[derive(Debug, Clone)]
pub(crate) struct Reference<T: RealField + Copy, const D: usize> {
    /// Index of the referenced primitive.
    pub primitive: usize,
    /// Bounding box of the referenced geometry, clipped by accumulated split planes.
    pub aabb: Aabb<T, D>,
    /// Representative point used by object splits.
    pub centroid: Point<T, D>,
}

/// Centroid bucket used by the object-split finder.
#[derive(Debug, Clone)]
struct Bucket<T: RealField + Copy, const D: usize> {
    aabb: Aabb<T, D>,
    count: usize,
}

impl<T: RealField + Copy, const D: usize> Bucket<T, D> {
    fn empty() -> Self {
        Self {
            aabb: Aabb::empty(),
            count: 0,
        }
    }
}

/// Spatial bin used by the spatial-split finder. A reference enters in the
/// bin holding its box minimum and exits in the bin holding its box maximum.
#[derive(Debug, Clone)]
struct SpatialBin<T: RealField + Copy, const D: usize> {
    aabb: Aabb<T, D>,
    entries: usize,
    exits: usize,
}

impl<T: RealField + Copy, const D: usize> SpatialBin<T, D> {
    fn empty() -> Self {
        Self {
            aabb: Aabb::empty(),
            entries: 0,
            exits: 0,
        }
    }
}

/// Winning object split of a node.
struct ObjectSplit<T: RealField + Copy, const D: usize> {
    cost: T,
    dim: usize,
    coord: T,
    /// Intersection of the two child boxes; gates the spatial-split attempt.
    overlap: Option<Aabb<T, D>>,
}

/// Winning spatial split of a node.
struct SpatialSplit<T: RealField + Copy, const D: usize> {
    cost: T,
    coord: T,
    box_left: Aabb<T, D>,
    box_right: Aabb<T, D>,
    n_left: usize,
    n_right: usize,
}

/// Transient structure used in building a split bounding volume hierarchy (`Sbvh`).
#[derive(Debug)]
pub struct SbvhBuilder<T: RealField + Copy, const D: usize> {
    /// Configuration parameters for the hierarchy.
    config: SbvhConfig<T>,
    /// Flattened nodes in depth-first preorder.
    nodes: Vec<SbvhNode<T, D>>,
    /// Primitive indices referenced by emitted leaves, duplicates included.
    references: Vec<usize>,
    /// Object-split scratch.
    buckets: Vec<Bucket<T, D>>,
    right_bucket_boxes: Vec<Bucket<T, D>>,
    /// Spatial-split scratch.
    bins: Vec<SpatialBin<T, D>>,
    right_bin_boxes: Vec<Aabb<T, D>>,
    /// Surface area of the root box; spatial splits are gated against it.
    root_surface_area: T,
    n_leaves: usize,
    max_depth: usize,
    depth_guess: usize,
}

impl<T: RealField + Copy + ToPrimitive, const D: usize> SbvhBuilder<T, D> {
    /// Construct a new `SbvhBuilder` instance.
    pub fn new(config: &SbvhConfig<T>) -> Self {
        Self {
            config: config.clone(),
            nodes: Vec::new(),
            references: Vec::new(),
            buckets: Vec::new(),
            right_bucket_boxes: Vec::new(),
            bins: Vec::new(),
            right_bin_boxes: Vec::new(),
            root_surface_area: T::zero(),
            n_leaves: 0,
            max_depth: 0,
            depth_guess: 0,
        }
    }

    /// Construct an `Sbvh` over the given primitives. An empty slice yields
    /// an empty sentinel tree whose queries report no hits.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree outgrows the 32-bit node layout.
    pub fn build<P: Primitive<T, D>>(mut self, primitives: &[P]) -> Result<Sbvh<T, D>> {
        let timer = Instant::now();

        let n_primitives = primitives.len();
        if n_primitives == 0 {
            return Ok(Sbvh::from_build(Vec::new(), Vec::new(), 0, 0, 0));
        }

        let refs: Vec<Reference<T, D>> = primitives
            .iter()
            .enumerate()
            .map(|(index, primitive)| Reference {
                primitive: index,
                aabb: primitive.aabb().into_owned(),
                centroid: primitive.centroid(),
            })
            .collect();

        let root_box = refs.iter().fold(Aabb::empty(), |acc, reference| acc.merge(&reference.aabb));
        self.root_surface_area = root_box.surface_area();
        self.depth_guess = ((n_primitives as f64).log2() * 1.3).ceil().max(0.0) as usize;

        self.nodes.reserve(2 * n_primitives);
        self.references.reserve(n_primitives);
        self.build_recursive(primitives, refs, 0)?;

        if self.config.print_stats {
            tracing::info!(
                primitives = n_primitives,
                nodes = self.nodes.len(),
                leaves = self.n_leaves,
                references = self.references.len(),
                duplicated_references = self.references.len() - n_primitives,
                max_depth = self.max_depth,
                elapsed_ms = timer.elapsed().as_secs_f64() * 1e3,
                "sbvh construction complete"
            );
        }

        Ok(Sbvh::from_build(
            self.nodes,
            self.references,
            self.n_leaves,
            self.max_depth,
            self.depth_guess,
        ))
    }

    /// Recursively build the subtree over an owned reference range, returning
    /// the index of its root node.
    fn build_recursive<P: Primitive<T, D>>(
        &mut self,
        primitives: &[P],
        refs: Vec<Reference<T, D>>,
        depth: usize,
    ) -> Result<usize> {
        let node_index = self.nodes.len();
        self.max_depth = self.max_depth.max(depth);

        let mut node_box = Aabb::empty();
        let mut centroid_box = Aabb::empty();
        for reference in &refs {
            node_box = node_box.merge(&reference.aabb);
            centroid_box.expand_to_include(&reference.centroid);
        }

        if refs.len() <= self.config.leaf_size || depth >= SBVH_MAX_DEPTH {
            if depth >= SBVH_MAX_DEPTH {
                tracing::debug!(references = refs.len(), "maximum depth reached, packing a leaf");
            }
            return self.emit_leaf(node_box, &refs);
        }

        let parent_surface_area = node_box.surface_area();
        let parent_volume = node_box.volume();

        let Some(object_split) =
            self.compute_object_split(&centroid_box, &refs, parent_surface_area, parent_volume)
        else {
            // Coincident centroids leave nothing to split
            return self.emit_leaf(node_box, &refs);
        };

        let heuristic = self.config.cost_heuristic;
        if self.config.pack_leaves
            && heuristic.is_measure_driven()
            && object_split.cost >= T::from_usize(refs.len()).unwrap()
        {
            // Cost plateau: splitting no longer beats testing the range directly
            return self.emit_leaf(node_box, &refs);
        }

        // A spatial split only pays when the object split's children overlap
        // a non-trivial share of the root
        let mut spatial_split = None;
        if heuristic.is_measure_driven() {
            if let Some(overlap) = &object_split.overlap {
                if overlap.surface_area() > self.config.split_alpha * self.root_surface_area {
                    spatial_split = self
                        .compute_spatial_split(
                            primitives,
                            &node_box,
                            &refs,
                            object_split.dim,
                            parent_surface_area,
                            parent_volume,
                        )
                        .filter(|split| split.cost < object_split.cost);
                }
            }
        }

        let (left_refs, right_refs) = match spatial_split {
            Some(split) => {
                let (left, right) = self.perform_spatial_split(
                    primitives,
                    refs,
                    split,
                    object_split.dim,
                    parent_surface_area,
                    parent_volume,
                );
                if left.is_empty() || right.is_empty() {
                    // Degenerate plane; an empty side carries no duplicates,
                    // so the references are intact and the object split stands
                    let mut merged = left;
                    merged.extend(right);
                    perform_object_split(merged, object_split.dim, object_split.coord)
                } else {
                    (left, right)
                }
            }
            None => perform_object_split(refs, object_split.dim, object_split.coord),
        };

        self.nodes.push(SbvhNode {
            aabb: node_box,
            offset: 0,
            n_references: 0,
        });
        let left_index = self.build_recursive(primitives, left_refs, depth + 1)?;
        debug_assert_eq!(left_index, node_index + 1);
        let right_index = self.build_recursive(primitives, right_refs, depth + 1)?;

        let offset = right_index - node_index;
        self.nodes[node_index].offset =
            u32::try_from(offset).map_err(|_| SbvhError::ChildOffsetOverflow { offset })?;
        // Children may carry clipped boxes; keep the parent exactly their union
        self.nodes[node_index].aabb = self.nodes[left_index].aabb.merge(&self.nodes[right_index].aabb);

        Ok(node_index)
    }

    /// Append the range's primitive indices to the persistent reference array
    /// and emit the leaf node covering them.
    fn emit_leaf(&mut self, aabb: Aabb<T, D>, refs: &[Reference<T, D>]) -> Result<usize> {
        let node_index = self.nodes.len();
        let offset = u32::try_from(self.references.len()).map_err(|_| SbvhError::ReferenceRangeOverflow {
            count: self.references.len(),
        })?;
        let n_references = u32::try_from(refs.len()).map_err(|_| SbvhError::ReferenceRangeOverflow {
            count: refs.len(),
        })?;

        self.references.extend(refs.iter().map(|reference| reference.primitive));
        self.nodes.push(SbvhNode {
            aabb,
            offset,
            n_references,
        });
        self.n_leaves += 1;
        Ok(node_index)
    }

    /// Best axis-aligned split of the node's references by centroid bucketing,
    /// or `None` when the centroid bounds are degenerate on every axis.
    ///
    /// # Panics
    ///
    /// In practice this method will never panic.
    fn compute_object_split(
        &mut self,
        centroid_box: &Aabb<T, D>,
        refs: &[Reference<T, D>],
        parent_surface_area: T,
        parent_volume: T,
    ) -> Option<ObjectSplit<T, D>> {
        let extents = centroid_box.extents();

        if !self.config.cost_heuristic.is_measure_driven() {
            let dim = centroid_box.widest_axis();
            if extents[dim] <= T::zero() {
                return None;
            }
            return Some(ObjectSplit {
                cost: extents[dim],
                dim,
                coord: centroid_box.centre()[dim],
                overlap: None,
            });
        }

        let n_buckets = self.config.n_buckets;
        let mut best: Option<(T, usize, T, Aabb<T, D>, Aabb<T, D>)> = None;

        for dim in 0..D {
            let extent = extents[dim];
            if extent <= T::zero() {
                continue;
            }

            // Bucket the references by centroid along this axis
            self.buckets.clear();
            self.buckets.resize(n_buckets, Bucket::empty());
            for reference in refs {
                let bucket_index = ((reference.centroid[dim] - centroid_box.mins[dim]) / extent
                    * T::from_usize(n_buckets).unwrap())
                .floor()
                .to_usize()
                .unwrap_or(0)
                .min(n_buckets - 1);

                self.buckets[bucket_index].aabb = self.buckets[bucket_index].aabb.merge(&reference.aabb);
                self.buckets[bucket_index].count += 1;
            }

            // Suffix sweep: box and count of everything right of each boundary
            self.right_bucket_boxes.clear();
            self.right_bucket_boxes.resize(n_buckets, Bucket::empty());
            self.right_bucket_boxes[n_buckets - 1] = self.buckets[n_buckets - 1].clone();
            for bucket in (0..n_buckets - 1).rev() {
                self.right_bucket_boxes[bucket] = Bucket {
                    aabb: self.buckets[bucket].aabb.merge(&self.right_bucket_boxes[bucket + 1].aabb),
                    count: self.buckets[bucket].count + self.right_bucket_boxes[bucket + 1].count,
                };
            }

            // Prefix sweep scoring the boundary after each bucket
            let mut box_left = Aabb::empty();
            let mut n_left = 0;
            for bucket in 0..n_buckets - 1 {
                box_left = box_left.merge(&self.buckets[bucket].aabb);
                n_left += self.buckets[bucket].count;

                let suffix = &self.right_bucket_boxes[bucket + 1];
                if n_left == 0 || suffix.count == 0 {
                    continue;
                }

                let cost = self.config.cost_heuristic.split_cost(
                    &box_left,
                    &suffix.aabb,
                    parent_surface_area,
                    parent_volume,
                    n_left,
                    suffix.count,
                );
                if best.as_ref().is_none_or(|(best_cost, ..)| cost < *best_cost) {
                    let coord = centroid_box.mins[dim]
                        + extent * T::from_usize(bucket + 1).unwrap() / T::from_usize(n_buckets).unwrap();
                    best = Some((cost, dim, coord, box_left.clone(), suffix.aabb.clone()));
                }
            }
        }

        best.map(|(cost, dim, coord, box_left, box_right)| ObjectSplit {
            cost,
            dim,
            coord,
            overlap: box_left.overlap(&box_right),
        })
    }

    /// Best axis-aligned split of the node's extent into spatial bins along
    /// the object split's axis, clipping straddling references slab by slab.
    ///
    /// # Panics
    ///
    /// In practice this method will never panic.
    fn compute_spatial_split<P: Primitive<T, D>>(
        &mut self,
        primitives: &[P],
        node_box: &Aabb<T, D>,
        refs: &[Reference<T, D>],
        split_dim: usize,
        parent_surface_area: T,
        parent_volume: T,
    ) -> Option<SpatialSplit<T, D>> {
        let extent = node_box.extents()[split_dim];
        if extent <= T::zero() {
            return None;
        }

        let n_bins = self.config.n_bins;
        let bin_width = extent / T::from_usize(n_bins).unwrap();
        let bin_of = |value: T| -> usize {
            ((value - node_box.mins[split_dim]) / bin_width)
                .floor()
                .to_usize()
                .unwrap_or(0)
                .min(n_bins - 1)
        };

        self.bins.clear();
        self.bins.resize(n_bins, SpatialBin::empty());

        for reference in refs {
            let first_bin = bin_of(reference.aabb.mins[split_dim]);
            let last_bin = bin_of(reference.aabb.maxs[split_dim]).max(first_bin);

            // Walk the reference across its bins, clipping at each boundary
            let mut remainder = reference.aabb.clone();
            for bin in first_bin..last_bin {
                let plane = node_box.mins[split_dim] + bin_width * T::from_usize(bin + 1).unwrap();
                let (clipped, rest) =
                    split_reference(&primitives[reference.primitive], split_dim, plane, &remainder);
                self.bins[bin].aabb = self.bins[bin].aabb.merge(&clipped);
                remainder = rest;
            }
            self.bins[last_bin].aabb = self.bins[last_bin].aabb.merge(&remainder);

            self.bins[first_bin].entries += 1;
            self.bins[last_bin].exits += 1;
        }

        // Suffix sweep of bin boxes
        self.right_bin_boxes.clear();
        self.right_bin_boxes.resize(n_bins, Aabb::empty());
        self.right_bin_boxes[n_bins - 1] = self.bins[n_bins - 1].aabb.clone();
        for bin in (0..n_bins - 1).rev() {
            self.right_bin_boxes[bin] = self.bins[bin].aabb.merge(&self.right_bin_boxes[bin + 1]);
        }

        // Prefix sweep scoring the plane after each bin; a reference counts
        // left once entered and right until exited
        let mut box_left = Aabb::empty();
        let mut n_left = 0;
        let mut n_right = refs.len();
        let mut best: Option<SpatialSplit<T, D>> = None;

        for bin in 0..n_bins - 1 {
            box_left = box_left.merge(&self.bins[bin].aabb);
            n_left += self.bins[bin].entries;
            n_right -= self.bins[bin].exits;
            if n_left == 0 || n_right == 0 {
                continue;
            }

            let box_right = &self.right_bin_boxes[bin + 1];
            let cost = self.config.cost_heuristic.split_cost(
                &box_left,
                box_right,
                parent_surface_area,
                parent_volume,
                n_left,
                n_right,
            );
            if best.as_ref().is_none_or(|split| cost < split.cost) {
                best = Some(SpatialSplit {
                    cost,
                    coord: node_box.mins[split_dim] + bin_width * T::from_usize(bin + 1).unwrap(),
                    box_left: box_left.clone(),
                    box_right: box_right.clone(),
                    n_left,
                    n_right,
                });
            }
        }

        best
    }

    /// Partition the references across the winning spatial plane. Straddling
    /// references are duplicated with clipped boxes unless assigning them
    /// whole to one side scores better.
    fn perform_spatial_split<P: Primitive<T, D>>(
        &self,
        primitives: &[P],
        refs: Vec<Reference<T, D>>,
        split: SpatialSplit<T, D>,
        split_dim: usize,
        parent_surface_area: T,
        parent_volume: T,
    ) -> (Vec<Reference<T, D>>, Vec<Reference<T, D>>) {
        let SpatialSplit {
            coord,
            mut box_left,
            mut box_right,
            mut n_left,
            mut n_right,
            ..
        } = split;
        let heuristic = self.config.cost_heuristic;
        let mut left = Vec::with_capacity(n_left);
        let mut right = Vec::with_capacity(n_right);

        for reference in refs {
            if reference.aabb.maxs[split_dim] <= coord {
                left.push(reference);
            } else if reference.aabb.mins[split_dim] >= coord {
                right.push(reference);
            } else {
                let (duplicate, unsplit_left, unsplit_right) = heuristic.unsplitting_costs(
                    &box_left,
                    &box_right,
                    &reference.aabb,
                    parent_surface_area,
                    parent_volume,
                    n_left,
                    n_right,
                );

                // Unsplitting must not empty the other side
                let take_left = n_right > 1 && unsplit_left <= duplicate && unsplit_left <= unsplit_right;
                let take_right = n_left > 1 && unsplit_right <= duplicate && unsplit_right < unsplit_left;

                if take_left {
                    box_left = box_left.merge(&reference.aabb);
                    n_right -= 1;
                    left.push(reference);
                } else if take_right {
                    box_right = box_right.merge(&reference.aabb);
                    n_left -= 1;
                    right.push(reference);
                } else {
                    let (clipped_left, clipped_right) =
                        split_reference(&primitives[reference.primitive], split_dim, coord, &reference.aabb);
                    left.push(Reference {
                        primitive: reference.primitive,
                        centroid: clipped_left.centre(),
                        aabb: clipped_left,
                    });
                    right.push(Reference {
                        primitive: reference.primitive,
                        centroid: clipped_right.centre(),
                        aabb: clipped_right,
                    });
                }
            }
        }

        (left, right)
    }
}

/// Partition the references by centroid against the split plane. A pivot pass
/// that leaves one side empty falls back to the median element along the axis.
fn perform_object_split<T: RealField + Copy, const D: usize>(
    mut refs: Vec<Reference<T, D>>,
    split_dim: usize,
    split_coord: T,
) -> (Vec<Reference<T, D>>, Vec<Reference<T, D>>) {
    let mut mid = 0;
    for i in 0..refs.len() {
        if refs[i].centroid[split_dim] < split_coord {
            refs.swap(i, mid);
            mid += 1;
        }
    }

    if mid == 0 || mid == refs.len() {
        mid = refs.len() / 2;
        refs.select_nth_unstable_by(mid, |a, b| {
            a.centroid[split_dim]
                .partial_cmp(&b.centroid[split_dim])
                .unwrap_or(Ordering::Equal)
        });
    }

    let right = refs.split_off(mid);
    (refs, right)
}

/// Clip a reference box against the plane `x[dim] = coord`, consulting the
/// primitive for tight geometry-aware halves and clamping them to the box.
fn split_reference<T: RealField + Copy, const D: usize, P: Primitive<T, D>>(
    primitive: &P,
    dim: usize,
    coord: T,
    box_reference: &Aabb<T, D>,
) -> (Aabb<T, D>, Aabb<T, D>) {
    let (cut_left, cut_right) = box_reference.split_at(dim, coord);
    let (primitive_left, primitive_right) = primitive.split(dim, coord, box_reference);
    (
        primitive_left.overlap(&cut_left).unwrap_or(cut_left),
        primitive_right.overlap(&cut_right).unwrap_or(cut_right),
    )
}
