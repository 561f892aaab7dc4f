//! Triangle mesh backed by its own hierarchy; aggregates nest as primitives.

use nalgebra::{Point3, RealField, Unit, Vector3};
use num_traits::ToPrimitive;
use std::borrow::Cow;

use crate::{
    error::Result,
    geometry::{Aabb, Triangle},
    query::{BoundingSphere, Interaction, Ray},
    sbvh::{Sbvh, SbvhConfig},
    traits::{Aggregate, Bounded, Primitive},
};

/// Triangle mesh with a private `Sbvh` over its faces. A `Mesh` satisfies the
/// [`Primitive`] contract itself, so meshes can be indexed by an outer
/// hierarchy alongside other primitives.
#[derive(Debug)]
pub struct Mesh<T: RealField + Copy> {
    /// Faces of the mesh.
    triangles: Vec<Triangle<T>>,
    /// Hierarchy over the faces.
    sbvh: Sbvh<T, 3>,
}

impl<T: RealField + Copy + ToPrimitive> Mesh<T> {
    /// Construct a new `Mesh` instance, building its hierarchy.
    ///
    /// # Errors
    ///
    /// Returns an error if the hierarchy cannot be built.
    pub fn new(config: &SbvhConfig<T>, triangles: Vec<Triangle<T>>) -> Result<Self> {
        let sbvh = Sbvh::new(config, &triangles)?;
        Ok(Self { triangles, sbvh })
    }

    /// Faces of the mesh.
    pub fn triangles(&self) -> &[Triangle<T>] {
        &self.triangles
    }

    /// Hierarchy over the faces.
    pub const fn sbvh(&self) -> &Sbvh<T, 3> {
        &self.sbvh
    }
}

impl<T: RealField + Copy + ToPrimitive> Bounded<T, 3> for Mesh<T> {
    fn aabb(&self) -> Cow<'_, Aabb<T, 3>> {
        Cow::Owned(self.sbvh.bounding_box())
    }

    fn centroid(&self) -> Point3<T> {
        self.sbvh.centroid(&self.triangles)
    }
}

impl<T: RealField + Copy + ToPrimitive> Primitive<T, 3> for Mesh<T> {
    fn surface_area(&self) -> T {
        self.sbvh.surface_area(&self.triangles)
    }

    /// Volume enclosed by the faces; meaningful for closed meshes.
    fn signed_volume(&self) -> T {
        self.sbvh.signed_volume(&self.triangles)
    }

    fn intersect(
        &self,
        ray: &Ray<T, 3>,
        interactions: &mut Vec<Interaction<T, 3>>,
        check_occlusion: bool,
        count_hits: bool,
    ) -> usize {
        let mut inner_ray = ray.clone();
        let mut inner_interactions = Vec::new();
        let hits = self.sbvh.intersect(
            &self.triangles,
            &mut inner_ray,
            &mut inner_interactions,
            check_occlusion,
            count_hits,
        );
        interactions.append(&mut inner_interactions);
        hits
    }

    fn find_closest_point(
        &self,
        sphere: &BoundingSphere<T, 3>,
        boundary_hint: Option<&Unit<Vector3<T>>>,
    ) -> Option<Interaction<T, 3>> {
        let mut inner_sphere = sphere.clone();
        let mut nodes_visited = 0;
        self.sbvh.find_closest_point_from_node(
            &self.triangles,
            &mut inner_sphere,
            0,
            boundary_hint,
            &mut nodes_visited,
        )
    }
}
