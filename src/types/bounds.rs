//! Axis-aligned boxes and bounding spheres.

use glam::Vec3;
use serde::Serialize;

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl BoundingBox {
    pub fn new(min: [f32; 3], max: [f32; 3]) -> Self {
        Self { min, max }
    }

    pub fn from_points(points: impl Iterator<Item = Vec3>) -> Option<Self> {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        let mut has_points = false;

        for p in points {
            has_points = true;
            min = min.min(p);
            max = max.max(p);
        }

        if has_points {
            Some(Self {
                min: min.to_array(),
                max: max.to_array(),
            })
        } else {
            None
        }
    }

    pub fn dimensions(&self) -> [f32; 3] {
        (self.max_vec() - self.min_vec()).to_array()
    }

    pub fn center(&self) -> [f32; 3] {
        ((self.min_vec() + self.max_vec()) * 0.5).to_array()
    }

    pub fn min_vec(&self) -> Vec3 {
        Vec3::from_array(self.min)
    }

    pub fn max_vec(&self) -> Vec3 {
        Vec3::from_array(self.max)
    }

    /// Check whether a point lies inside the box (boundary included).
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min_vec()).all() && point.cmple(self.max_vec()).all()
    }
}

/// A bounding sphere.
///
/// Built with a single refinement pass: the result encloses every point but is
/// generally a little larger than the minimal sphere. The outcome depends only
/// on the input order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingSphere {
    pub center: [f32; 3],
    pub radius: f32,
}

impl BoundingSphere {
    pub fn new(center: [f32; 3], radius: f32) -> Self {
        Self { center, radius }
    }

    pub fn center_vec(&self) -> Vec3 {
        Vec3::from_array(self.center)
    }

    /// Compute an enclosing sphere for a point set.
    ///
    /// Seeds the sphere with the most distant pair of per-axis extreme points,
    /// then grows it towards every point that falls outside.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let first = *points.first()?;

        // Extreme points per axis: [min, max] for x, y, z
        let mut extremes = [[first; 2]; 3];
        for &p in points {
            for axis in 0..3 {
                if p[axis] < extremes[axis][0][axis] {
                    extremes[axis][0] = p;
                }
                if p[axis] > extremes[axis][1][axis] {
                    extremes[axis][1] = p;
                }
            }
        }

        // The axis whose extremes are farthest apart gives the initial diameter
        let mut dia = extremes[0];
        let mut span_sq = extremes[0][0].distance_squared(extremes[0][1]);
        for pair in &extremes[1..] {
            let candidate = pair[0].distance_squared(pair[1]);
            if candidate > span_sq {
                span_sq = candidate;
                dia = *pair;
            }
        }

        let mut center = (dia[0] + dia[1]) * 0.5;
        let mut radius_sq = dia[1].distance_squared(center);
        let mut radius = radius_sq.sqrt();

        for &p in points {
            let dist_sq = p.distance_squared(center);
            if dist_sq > radius_sq {
                let dist = dist_sq.sqrt();
                let new_radius = (radius + dist) * 0.5;
                let shift = dist - new_radius;

                center = (center * new_radius + p * shift) / dist;
                radius = new_radius;
                radius_sq = radius * radius;
            }
        }

        Some(Self {
            center: center.to_array(),
            radius,
        })
    }

    /// Check whether a point lies inside the sphere, allowing `epsilon` slack.
    pub fn contains(&self, point: Vec3, epsilon: f32) -> bool {
        point.distance(self.center_vec()) <= self.radius + epsilon
    }
}
