//! Interaction records produced by proximity queries.

use nalgebra::{Point, RealField, SVector, Unit};
use std::cmp::Ordering;

use crate::config::INTERACTION_DISTANCE_EPSILON;

/// Records the outcome of a proximity query against a single primitive:
/// either a ray intersection or a closest-point candidate.
#[derive(Debug, Clone)]
pub struct Interaction<T: RealField + Copy, const D: usize> {
    /// Distance to the interaction point: parametric for ray queries,
    /// Euclidean for closest-point queries.
    pub distance: T,
    /// Location of the interaction.
    pub point: Point<T, D>,
    /// Surface normal at the interaction point, when the primitive has one.
    pub normal: Option<Unit<SVector<T, D>>>,
    /// Index of the primitive the interaction belongs to, assigned by the
    /// aggregate that ran the query.
    pub primitive_index: usize,
}

impl<T: RealField + Copy, const D: usize> Interaction<T, D> {
    /// Construct a new `Interaction` instance. The primitive index is filled
    /// in by the aggregate.
    pub fn new(distance: T, point: Point<T, D>, normal: Option<Unit<SVector<T, D>>>) -> Self {
        Self {
            distance,
            point,
            normal,
            primitive_index: 0,
        }
    }
}

/// Order interactions by distance, breaking ties by primitive index so that
/// duplicated references group together.
pub(crate) fn sort_by_distance<T: RealField + Copy, const D: usize>(interactions: &mut [Interaction<T, D>]) {
    interactions.sort_unstable_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.primitive_index.cmp(&b.primitive_index))
    });
}

/// Drop adjacent interactions that refer to the same primitive at the same
/// distance; spatial splits may report one hit from several leaves.
///
/// # Panics
///
/// In practice this method will never panic.
pub(crate) fn remove_duplicates<T: RealField + Copy, const D: usize>(interactions: &mut Vec<Interaction<T, D>>) {
    let epsilon = T::from_f64(INTERACTION_DISTANCE_EPSILON).unwrap();
    interactions.dedup_by(|a, b| a.primitive_index == b.primitive_index && (a.distance - b.distance).abs() < epsilon);
}
