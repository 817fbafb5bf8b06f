//! Hit-testing: map a tap (as a ray or a direction in globe space) back to
//! the node under it.

use crate::record::PlacedNode;
use crate::vec3::{angular_distance, dot, sub, try_normalize, Vec3};

/// Nearest node whose bounding sphere (radius `node_size / 2`) is hit by the
/// ray from `origin` along `direction`. Hits behind the origin are ignored.
pub fn pick_ray(nodes: &[PlacedNode], origin: Vec3, direction: Vec3) -> Option<&PlacedNode> {
    let dir = try_normalize(direction)?;
    if !origin.is_finite() {
        return None;
    }

    nodes
        .iter()
        .filter_map(|node| {
            ray_sphere_distance(origin, dir, node.position(), node.node_size() / 2.0)
                .map(|t| (t, node))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, node)| node)
}

/// Node closest in angle to `direction` (from the globe center), if it lies
/// within `max_angle` radians.
pub fn pick_direction(nodes: &[PlacedNode], direction: Vec3, max_angle: f64) -> Option<&PlacedNode> {
    try_normalize(direction)?;

    nodes
        .iter()
        .map(|node| (angular_distance(node.position(), direction), node))
        .filter(|(angle, _)| *angle <= max_angle)
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, node)| node)
}

/// Distance along a unit ray to the first intersection with a sphere.
fn ray_sphere_distance(origin: Vec3, dir: Vec3, center: Vec3, radius: f64) -> Option<f64> {
    let oc = sub(origin, center);
    let b = dot(oc, dir);
    let c = dot(oc, oc) - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let root = discriminant.sqrt();
    let near = -b - root;
    let far = -b + root;
    // Origin inside the sphere counts as a hit at distance 0
    if near >= 0.0 {
        Some(near)
    } else if far >= 0.0 {
        Some(0.0)
    } else {
        None
    }
}
