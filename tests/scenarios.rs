//! End-to-end query scenarios over small hand-built scenes.

use approx::assert_relative_eq;
use nalgebra::{Point3, Unit, Vector3};
use nearfield::prelude::*;

fn two_triangles() -> Vec<Triangle<f32>> {
    vec![
        Triangle::new([
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]),
        Triangle::new([
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
        ]),
    ]
}

#[test]
fn first_hit_on_the_near_triangle() {
    let triangles = two_triangles();
    let sbvh = Sbvh::new(&SbvhConfig::default(), &triangles).unwrap();

    let mut ray = Ray::new(Point3::new(0.5, 0.5, 1.0), Unit::new_normalize(-Vector3::z()));
    let mut interactions = Vec::new();
    let hits = sbvh.intersect(&triangles, &mut ray, &mut interactions, false, false);

    assert_eq!(hits, 1);
    assert_eq!(interactions[0].primitive_index, 0);
    assert_relative_eq!(interactions[0].distance, 1.0, epsilon = 1e-6);
    assert_relative_eq!(interactions[0].point, Point3::new(0.5, 0.5, 0.0), epsilon = 1e-6);
}

#[test]
fn counted_hits_come_back_sorted() {
    // Two parallel triangles facing the ray, one behind the other
    let triangles = vec![
        Triangle::new([
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
        ]),
        Triangle::new([
            Point3::new(3.0, 0.0, 0.0),
            Point3::new(3.0, 1.0, 0.0),
            Point3::new(3.0, 0.0, 1.0),
        ]),
    ];
    let sbvh = Sbvh::new(&SbvhConfig::default(), &triangles).unwrap();

    let mut ray = Ray::new(
        Point3::new(4.0, 0.25, 0.25),
        Unit::new_normalize(-Vector3::x()),
    );
    let mut interactions = Vec::new();
    let hits = sbvh.intersect(&triangles, &mut ray, &mut interactions, false, true);

    assert_eq!(hits, 2);
    assert_relative_eq!(interactions[0].distance, 1.0, epsilon = 1e-6);
    assert_relative_eq!(interactions[1].distance, 3.0, epsilon = 1e-6);
    assert_eq!(interactions[0].primitive_index, 1);
    assert_eq!(interactions[1].primitive_index, 0);
}

#[test]
fn closest_point_lands_on_a_triangle_edge() {
    let triangles = two_triangles();
    let sbvh = Sbvh::new(&SbvhConfig::default(), &triangles).unwrap();

    let mut sphere = BoundingSphere::new(Point3::new(1.5, 0.5, 0.0), 1.0);
    let interaction = sbvh.find_closest_point(&triangles, &mut sphere).unwrap();

    // The left edge of the second triangle passes closest
    assert_eq!(interaction.primitive_index, 1);
    assert_relative_eq!(interaction.distance, 0.5, epsilon = 1e-6);
    assert_relative_eq!(interaction.point, Point3::new(2.0, 0.5, 0.0), epsilon = 1e-6);
}

#[test]
fn spanning_triangle_is_duplicated_across_leaves() {
    // One long thin triangle across x ∈ [0, 100] among end clusters: object
    // splits overlap it everywhere, so the spatial split must fire
    let mut triangles = vec![Triangle::new([
        Point3::new(0.0, 0.45, 0.0),
        Point3::new(100.0, 0.45, 0.0),
        Point3::new(50.0, 0.55, 0.0),
    ])];
    for i in 0..8 {
        let x = (i % 4) as f32 * 0.4 + if i < 4 { 0.0 } else { 99.0 };
        triangles.push(Triangle::new([
            Point3::new(x, 0.0, 0.0),
            Point3::new(x + 0.3, 0.0, 0.0),
            Point3::new(x, 1.0, 0.0),
        ]));
    }

    let config = SbvhConfig::new(CostHeuristic::SurfaceArea, 1e-5, 2, 8, 8, false, false).unwrap();
    let sbvh = Sbvh::new(&config, &triangles).unwrap();

    let spanning_references = sbvh.references().iter().filter(|&&index| index == 0).count();
    assert!(
        spanning_references > 1,
        "expected the spanning triangle to be referenced from several leaves, got {spanning_references}"
    );
}

#[test]
fn random_spheres_match_the_baseline() {
    use rand::{Rng, SeedableRng};
    let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(0x5bb7);

    let spheres: Vec<Sphere<f32>> = (0..10_000)
        .map(|_| {
            Sphere::new(
                Point3::new(rng.r#gen::<f32>(), rng.r#gen::<f32>(), rng.r#gen::<f32>()),
                rng.r#gen::<f32>() * 0.05 + 0.005,
            )
        })
        .collect();
    let sbvh = Sbvh::new(&SbvhConfig::default(), &spheres).unwrap();
    let baseline = Baseline::new();

    for _ in 0..1_000 {
        let origin = Point3::new(
            rng.r#gen::<f32>() * 4.0 - 2.0,
            rng.r#gen::<f32>() * 4.0 - 2.0,
            rng.r#gen::<f32>() * 4.0 - 2.0,
        );
        let direction = Unit::new_normalize(Vector3::new(
            rng.r#gen::<f32>() - 0.5,
            rng.r#gen::<f32>() - 0.5,
            rng.r#gen::<f32>() - 0.5,
        ));

        let mut tree_ray = Ray::new(origin, direction);
        let mut tree_interactions = Vec::new();
        let tree_hits = sbvh.intersect(&spheres, &mut tree_ray, &mut tree_interactions, false, false);

        let mut scan_ray = Ray::new(origin, direction);
        let mut scan_interactions = Vec::new();
        let scan_hits = baseline.intersect(&spheres, &mut scan_ray, &mut scan_interactions, false, false);

        assert_eq!(tree_hits, scan_hits);
        if tree_hits > 0 {
            assert_eq!(
                tree_interactions[0].primitive_index,
                scan_interactions[0].primitive_index
            );
            assert_relative_eq!(
                tree_interactions[0].distance,
                scan_interactions[0].distance,
                epsilon = 1e-5
            );
        }
    }
}

#[test]
fn empty_scene_answers_every_query() {
    let triangles: Vec<Triangle<f32>> = Vec::new();
    let sbvh = Sbvh::new(&SbvhConfig::default(), &triangles).unwrap();

    let mut ray = Ray::new(Point3::new(0.0, 0.0, 1.0), Unit::new_normalize(-Vector3::z()));
    let mut interactions = Vec::new();
    assert_eq!(sbvh.intersect(&triangles, &mut ray, &mut interactions, false, false), 0);
    assert_eq!(sbvh.intersect(&triangles, &mut ray, &mut interactions, true, false), 0);
    assert_eq!(sbvh.intersect(&triangles, &mut ray, &mut interactions, false, true), 0);

    let mut sphere = BoundingSphere::new(Point3::new(0.0, 0.0, 0.0), 1.0);
    assert!(sbvh.find_closest_point(&triangles, &mut sphere).is_none());
}
