//! Sphere primitive for ray tracing.

use ember_math::{Ray, Vec3};

/// A sphere primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    center: Vec3,
    radius: f64,
}

impl Sphere {
    /// Create a new sphere.
    pub fn new(center: Vec3, radius: f64) -> Self {
        Self { center, radius }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Distance along `ray` to the nearer intersection root.
    ///
    /// The direction does not need to be normalized. The returned root can be
    /// negative (sphere behind the origin, or origin inside the sphere); the
    /// farther root is never reported. Returns `None` when the discriminant is
    /// not strictly positive, so tangent rays miss.
    pub fn intersect(&self, ray: &Ray) -> Option<f64> {
        let oc = ray.origin() - self.center;
        let a = ray.direction().dot(ray.direction());
        let b = oc.dot(ray.direction());
        let c = oc.dot(oc) - self.radius * self.radius;

        let discriminant = b * b - a * c;
        if discriminant > 0.0 {
            Some((-b - discriminant.sqrt()) / a)
        } else {
            None
        }
    }

    /// Outward unit normal at `point`, which is assumed to lie on the surface.
    pub fn normal_at(&self, point: Vec3) -> Vec3 {
        (point - self.center).normalize()
    }
}
