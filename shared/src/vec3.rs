/// 3D vector utilities for positions in globe space.
/// The globe is centered at the origin; +Y points at the north pole.

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn from_array(a: [f64; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }

    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// Shorthand constructor
pub fn vec3(x: f64, y: f64, z: f64) -> Vec3 {
    Vec3::new(x, y, z)
}

/// Dot product
pub fn dot(a: Vec3, b: Vec3) -> f64 {
    a.x * b.x + a.y * b.y + a.z * b.z
}

/// Vector length
pub fn length(v: Vec3) -> f64 {
    dot(v, v).sqrt()
}

/// Normalize vector to unit length. Returns `None` for (near) zero vectors,
/// which have no direction.
pub fn try_normalize(v: Vec3) -> Option<Vec3> {
    let len = length(v);
    if len < 1e-10 || !len.is_finite() {
        return None;
    }
    Some(scale(v, 1.0 / len))
}

/// Scale vector by scalar
pub fn scale(v: Vec3, s: f64) -> Vec3 {
    Vec3::new(v.x * s, v.y * s, v.z * s)
}

/// Add two vectors
pub fn add(a: Vec3, b: Vec3) -> Vec3 {
    Vec3::new(a.x + b.x, a.y + b.y, a.z + b.z)
}

/// Subtract vectors (a - b)
pub fn sub(a: Vec3, b: Vec3) -> Vec3 {
    Vec3::new(a.x - b.x, a.y - b.y, a.z - b.z)
}

/// Euclidean distance between two points
pub fn distance(a: Vec3, b: Vec3) -> f64 {
    length(sub(a, b))
}

/// Angle between two directions in radians. Inputs need not be unit length;
/// a zero vector is treated as being opposite to everything.
pub fn angular_distance(a: Vec3, b: Vec3) -> f64 {
    match (try_normalize(a), try_normalize(b)) {
        (Some(a), Some(b)) => dot(a, b).clamp(-1.0, 1.0).acos(),
        _ => std::f64::consts::PI,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn assert_vec3_close(actual: Vec3, expected: Vec3) {
        assert!(
            distance(actual, expected) < 1e-9,
            "Expected {:?} to be close to {:?}",
            actual,
            expected
        );
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "Expected {} to be close to {}",
            actual,
            expected
        );
    }

    #[test]
    fn dot_orthogonal_is_zero() {
        assert_eq!(dot(vec3(1.0, 0.0, 0.0), vec3(0.0, 1.0, 0.0)), 0.0);
    }

    #[test]
    fn length_of_3_4_0_is_5() {
        assert_eq!(length(vec3(3.0, 4.0, 0.0)), 5.0);
    }

    #[test]
    fn normalize_returns_unit_vector() {
        let v = try_normalize(vec3(3.0, 4.0, 0.0)).unwrap();
        assert_close(length(v), 1.0);
        assert_vec3_close(v, vec3(0.6, 0.8, 0.0));
    }

    #[test]
    fn normalize_zero_has_no_direction() {
        assert!(try_normalize(Vec3::ZERO).is_none());
        assert!(try_normalize(vec3(f64::NAN, 0.0, 0.0)).is_none());
    }

    #[test]
    fn add_sub_scale() {
        let a = vec3(1.0, 2.0, 3.0);
        let b = vec3(4.0, 5.0, 6.0);
        assert_vec3_close(add(a, b), vec3(5.0, 7.0, 9.0));
        assert_vec3_close(sub(b, a), vec3(3.0, 3.0, 3.0));
        assert_vec3_close(scale(a, 2.0), vec3(2.0, 4.0, 6.0));
    }

    #[test]
    fn angular_distance_ignores_magnitude() {
        assert_close(angular_distance(vec3(5.0, 0.0, 0.0), vec3(0.0, 0.2, 0.0)), FRAC_PI_2);
        assert_close(angular_distance(vec3(1.0, 0.0, 0.0), vec3(-3.0, 0.0, 0.0)), PI);
        assert_close(angular_distance(vec3(0.0, 2.0, 0.0), vec3(0.0, 1.0, 0.0)), 0.0);
    }

    #[test]
    fn array_conversion() {
        let v = Vec3::from_array([1.5, -2.0, 0.25]);
        assert_eq!(v.to_array(), [1.5, -2.0, 0.25]);
        assert!(v.is_finite());
        assert!(!vec3(f64::INFINITY, 0.0, 0.0).is_finite());
    }
}
