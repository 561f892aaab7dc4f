//! Ray structure.

use nalgebra::{Point, RealField, SVector, Unit};

/// Geometric ray defined by an origin point, a direction vector and a
/// parametric query range `[t_min, t_max]`.
#[derive(Debug, Clone)]
pub struct Ray<T: RealField + Copy, const D: usize> {
    /// Starting location.
    pub origin: Point<T, D>,
    /// Direction.
    pub direction: Unit<SVector<T, D>>,
    /// Reciprocal of each direction component (for fast `Aabb` tests).
    pub inv_direction: SVector<T, D>,
    /// Sign of each direction component (0 if ≥0 else 1), for box-slab ordering.
    pub sign: [usize; D],
    /// Minimum parametric distance considered by queries.
    pub t_min: T,
    /// Maximum parametric distance considered by queries; first-hit queries
    /// clamp this down as closer intersections are found.
    pub t_max: T,
}

impl<T: RealField + Copy, const D: usize> Ray<T, D> {
    /// Construct a new `Ray` instance with an unbounded query range.
    ///
    /// # Panics
    ///
    /// In practice this method will never panic.
    pub fn new(origin: Point<T, D>, direction: Unit<SVector<T, D>>) -> Self {
        Self::bounded(origin, direction, T::max_value().unwrap())
    }

    /// Construct a new `Ray` instance whose query range is `[0, t_max]`.
    pub fn bounded(origin: Point<T, D>, direction: Unit<SVector<T, D>>, t_max: T) -> Self {
        let inv_direction = SVector::from_fn(|i, _| T::one() / direction[i]);
        let sign = std::array::from_fn(|i| usize::from(inv_direction[i] < T::zero()));

        Self {
            origin,
            direction,
            inv_direction,
            sign,
            t_min: T::zero(),
            t_max,
        }
    }

    /// Point reached after travelling a parametric distance `t` along the ray.
    pub fn point_at(&self, t: T) -> Point<T, D> {
        self.origin + self.direction.scale(t)
    }
}
