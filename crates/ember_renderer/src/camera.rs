//! Camera for ray generation.

use ember_math::{Ray, Vec3};

/// Pinhole camera looking through a planar view rectangle.
///
/// The rectangle is given by three of its corners; image coordinates
/// `(x, y)` in [0, 1) are mapped onto it affinely.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    origin: Vec3,
    topleft: Vec3,
    topright: Vec3,
    bottomleft: Vec3,

    // Cached edge vectors of the view rectangle
    xd: Vec3,
    yd: Vec3,
}

impl Camera {
    /// Create a camera at `origin` looking through the rectangle spanned by
    /// `topleft`, `topright` and `bottomleft`.
    pub fn new(origin: Vec3, topleft: Vec3, topright: Vec3, bottomleft: Vec3) -> Self {
        Self {
            origin,
            topleft,
            topright,
            bottomleft,
            xd: topright - topleft,
            yd: bottomleft - topleft,
        }
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    pub fn topleft(&self) -> Vec3 {
        self.topleft
    }

    pub fn topright(&self) -> Vec3 {
        self.topright
    }

    pub fn bottomleft(&self) -> Vec3 {
        self.bottomleft
    }

    /// Generate the primary ray through image coordinates `(x, y)`.
    ///
    /// Coordinates are not clamped; values outside [0, 1) extrapolate past
    /// the edges of the view rectangle.
    pub fn get_ray(&self, x: f64, y: f64) -> Ray {
        let point = self.topleft + self.xd * x + self.yd * y;
        Ray::new(self.origin, (point - self.origin).normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_camera() -> Camera {
        Camera::new(
            Vec3::ZERO,
            Vec3::new(-1.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, -1.0),
        )
    }

    #[test]
    fn test_camera_corners() {
        let camera = test_camera();

        let ray = camera.get_ray(0.0, 0.0);
        assert_eq!(ray.origin, Vec3::ZERO);
        assert!((ray.direction - Vec3::new(-1.0, 1.0, 1.0).normalize()).length() < 1e-12);

        let ray = camera.get_ray(1.0, 0.0);
        assert!((ray.direction - Vec3::new(1.0, 1.0, 1.0).normalize()).length() < 1e-12);

        let ray = camera.get_ray(0.0, 1.0);
        assert!((ray.direction - Vec3::new(-1.0, 1.0, -1.0).normalize()).length() < 1e-12);
    }

    #[test]
    fn test_camera_center_ray() {
        let camera = test_camera();
        let ray = camera.get_ray(0.5, 0.5);

        assert!((ray.direction - Vec3::Y).length() < 1e-12);
        assert!((ray.direction.length() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_camera_extrapolates() {
        let camera = test_camera();

        // x = 1.5 lies half a rectangle width past the right edge
        let ray = camera.get_ray(1.5, 0.5);
        let expected = Vec3::new(2.0, 1.0, 0.0).normalize();
        assert!((ray.direction - expected).length() < 1e-12);
    }
}
