//! Ray casting against the globe.

use glam::Vec3;

/// A ray with a normalized direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Returns `None` when the direction cannot be normalized.
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        let direction = direction.try_normalize()?;
        origin.is_finite().then_some(Self { origin, direction })
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Nearest intersection in front of the ray origin with a sphere centered
/// at the origin.
pub fn intersect_sphere(ray: &Ray, radius: f32) -> Option<Vec3> {
    // |o + t d|^2 = r^2 with |d| = 1
    let b = ray.origin.dot(ray.direction);
    let c = ray.origin.length_squared() - radius * radius;
    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }

    let root = discriminant.sqrt();
    let near = -b - root;
    let far = -b + root;
    let t = if near >= 0.0 {
        near
    } else if far >= 0.0 {
        // Origin inside the sphere
        far
    } else {
        return None;
    };

    Some(ray.at(t))
}
