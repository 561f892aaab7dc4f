use nalgebra::{Point3, Unit, Vector3};
use nearfield::prelude::*;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    println!("Building a scene of triangles around the origin...");

    // A ring of outward-facing triangles
    let mut triangles = Vec::new();
    for i in 0..64 {
        let angle = i as f32 / 64.0 * std::f32::consts::TAU;
        let (sin, cos) = angle.sin_cos();
        let center = Point3::new(cos * 5.0, sin * 5.0, 0.0);
        triangles.push(Triangle::new([
            Point3::new(center.x, center.y, -0.5),
            Point3::new(center.x - sin * 0.4, center.y + cos * 0.4, 0.5),
            Point3::new(center.x + sin * 0.4, center.y - cos * 0.4, 0.5),
        ]));
    }

    // Build the hierarchy with the surface area heuristic and log its stats
    let config = SbvhConfig::new(
        CostHeuristic::SurfaceArea,
        1e-5, // split_alpha
        4,    // leaf_size
        8,    // n_buckets
        8,    // n_bins
        false, // pack_leaves
        true,  // print_stats
    )?;
    let sbvh = Sbvh::new(&config, &triangles)?;
    println!(
        "Indexed {} triangles into {} nodes ({} leaves, depth {})",
        triangles.len(),
        sbvh.n_nodes(),
        sbvh.n_leaves(),
        sbvh.depth(),
    );

    // Shoot rays outward from the origin
    println!("\nTesting ray intersections...");
    for i in 0..4 {
        let angle = i as f32 / 4.0 * std::f32::consts::TAU + 0.02;
        let direction = Unit::new_normalize(Vector3::new(angle.cos(), angle.sin(), 0.0));
        let mut ray = Ray::new(Point3::new(0.0, 0.0, 0.0), direction);
        let mut interactions = Vec::new();

        if sbvh.intersect(&triangles, &mut ray, &mut interactions, false, false) > 0 {
            let hit = &interactions[0];
            println!(
                "Ray {i}: hit triangle {} at distance {:.3}",
                hit.primitive_index, hit.distance
            );
        } else {
            println!("Ray {i}: no intersection");
        }
    }

    // Occlusion query between two points
    let occluded = {
        let origin = Point3::new(0.0, 0.0, 0.0);
        let target = Point3::new(10.0, 0.1, 0.0);
        let direction = Unit::new_normalize(target - origin);
        let mut shadow_ray = Ray::bounded(origin, direction, (target - origin).norm());
        let mut interactions = Vec::new();
        sbvh.intersect(&triangles, &mut shadow_ray, &mut interactions, true, false) > 0
    };
    println!("\nPath to (10, 0.1, 0) is {}", if occluded { "blocked" } else { "clear" });

    // Closest point on the ring
    println!("\nFinding closest points...");
    for point in [Point3::new(3.0, 0.0, 0.0), Point3::new(0.0, 7.0, 0.0)] {
        let mut sphere = BoundingSphere::new(point, 5.0);
        match sbvh.find_closest_point(&triangles, &mut sphere) {
            Some(interaction) => println!(
                "Closest to ({:.1}, {:.1}, {:.1}): triangle {} at distance {:.3}",
                point.x, point.y, point.z, interaction.primitive_index, interaction.distance
            ),
            None => println!("Nothing within reach of {point}"),
        }
    }

    Ok(())
}
