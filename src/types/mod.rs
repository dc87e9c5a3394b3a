//! Shared geometric types used throughout the library.

mod bounds;

pub use bounds::{BoundingBox, BoundingSphere};

use glam::{Vec2, Vec3};

/// Default tolerance used when matching vertex attributes.
pub const EPSILON: f32 = 0.0001;

/// Compare two scalars within `epsilon`.
#[inline]
pub fn approx_eq(a: f32, b: f32, epsilon: f32) -> bool {
    (a - b).abs() <= epsilon
}

/// Componentwise comparison of two vectors within `epsilon`.
#[inline]
pub fn vec3_approx_eq(a: Vec3, b: Vec3, epsilon: f32) -> bool {
    (a - b).abs().max_element() <= epsilon
}

/// Componentwise comparison of two texture coordinates within `epsilon`.
#[inline]
pub fn vec2_approx_eq(a: Vec2, b: Vec2, epsilon: f32) -> bool {
    (a - b).abs().max_element() <= epsilon
}

/// Plane through three points wound counter-clockwise.
///
/// Returns the unit normal and the signed distance of the plane from the
/// origin. Collinear points yield a zero normal.
pub fn plane_from_points(p0: Vec3, p1: Vec3, p2: Vec3) -> (Vec3, f32) {
    let normal = (p1 - p0).cross(p2 - p0).normalize_or_zero();
    (normal, normal.dot(p0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_vec3_approx_eq() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        assert!(vec3_approx_eq(a, a + Vec3::splat(EPSILON * 0.5), EPSILON));
        assert!(!vec3_approx_eq(a, a + Vec3::new(0.0, EPSILON * 2.0, 0.0), EPSILON));
    }

    #[test]
    fn test_vec2_approx_eq() {
        assert!(vec2_approx_eq(Vec2::new(0.5, 0.5), Vec2::new(0.50005, 0.5), EPSILON));
        assert!(!vec2_approx_eq(Vec2::new(0.5, 0.5), Vec2::new(0.5, 0.6), EPSILON));
    }

    #[test]
    fn test_plane_from_points() {
        let (normal, dist) = plane_from_points(
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::new(1.0, 0.0, 2.0),
            Vec3::new(0.0, 1.0, 2.0),
        );
        assert_relative_eq!(normal.z, 1.0);
        assert_relative_eq!(dist, 2.0);

        // Reversed winding flips the plane
        let (flipped, flipped_dist) = plane_from_points(
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::new(0.0, 1.0, 2.0),
            Vec3::new(1.0, 0.0, 2.0),
        );
        assert_relative_eq!(flipped.z, -1.0);
        assert_relative_eq!(flipped_dist, -2.0);
    }

    #[test]
    fn test_plane_from_collinear_points() {
        let (normal, _) = plane_from_points(Vec3::ZERO, Vec3::X, Vec3::X * 2.0);
        assert_eq!(normal, Vec3::ZERO);
    }
}
