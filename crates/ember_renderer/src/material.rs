//! Material trait for surface scattering.

use ember_math::{gen_f64, random_direction_in_hemisphere, Color, Ray, Vec3};
use rand::RngCore;

/// Trait for materials that describe how light interacts with surfaces.
///
/// A material picks the outgoing direction of a path; the integrator then
/// attenuates whatever radiance comes back along it by `color()` and adds
/// `emission()`.
pub trait Material: Send + Sync {
    /// Scatter direction for `ray_in` hitting a surface with outward `normal`.
    fn reflect(&self, ray_in: &Ray, normal: Vec3, rng: &mut dyn RngCore) -> Vec3;

    /// Multiplicative attenuation applied per bounce.
    fn color(&self) -> Color;

    /// Light emitted by the surface.
    ///
    /// Most materials return black (no emission).
    fn emission(&self) -> Color {
        Color::ZERO
    }
}

/// Diffuse material, optionally emissive.
#[derive(Debug, Clone, Copy)]
pub struct Diffuse {
    color: Color,
    emission: Color,
}

impl Diffuse {
    /// Create a non-emissive diffuse material.
    pub fn new(color: Color) -> Self {
        Self::emissive(color, Color::ZERO)
    }

    /// Create a diffuse material that also emits light.
    pub fn emissive(color: Color, emission: Color) -> Self {
        Self { color, emission }
    }
}

impl Material for Diffuse {
    fn reflect(&self, _ray_in: &Ray, normal: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        random_direction_in_hemisphere(normal, rng)
    }

    fn color(&self) -> Color {
        self.color
    }

    fn emission(&self) -> Color {
        self.emission
    }
}

/// Metal (perfect mirror) material.
#[derive(Debug, Clone, Copy)]
pub struct Metal {
    color: Color,
}

impl Metal {
    /// Create a new Metal material with the given tint.
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl Material for Metal {
    fn reflect(&self, ray_in: &Ray, normal: Vec3, _rng: &mut dyn RngCore) -> Vec3 {
        reflect(ray_in.direction(), normal)
    }

    fn color(&self) -> Color {
        self.color
    }
}

/// Dielectric (glass) material.
///
/// Chooses between reflection and refraction with probability given by the
/// Fresnel reflectance plus a constant `reflection_bias`.
#[derive(Debug, Clone, Copy)]
pub struct Glass {
    color: Color,
    /// Index of refraction
    ior: f64,
    reflection_bias: f64,
}

impl Glass {
    /// Create a new Glass material.
    ///
    /// - `ior`: Index of refraction (1.0 = air, 1.5 = glass, 2.4 = diamond)
    /// - `reflection_bias`: added to the Fresnel reflectance before sampling
    pub fn new(color: Color, ior: f64, reflection_bias: f64) -> Self {
        Self {
            color,
            ior,
            reflection_bias,
        }
    }

    pub fn ior(&self) -> f64 {
        self.ior
    }

    pub fn reflection_bias(&self) -> f64 {
        self.reflection_bias
    }

    /// Indices of refraction on the (internal, external) side of the surface.
    ///
    /// Rays are always treated as entering the glass from air, including
    /// rays leaving it.
    fn indices(&self) -> (f64, f64) {
        (self.ior, 1.0)
    }

    /// Cosine of the refracted angle for incidence cosine `theta1`.
    ///
    /// NaN under total internal reflection.
    fn refracted_cosine(&self, theta1: f64) -> f64 {
        let (internal, external) = self.indices();
        let eta = external / internal;
        (1.0 - (eta * eta) * (1.0 - theta1 * theta1)).sqrt()
    }

    /// Fresnel reflectance `rs² + rp²` at incidence cosine `theta1`.
    ///
    /// The s and p terms are summed without averaging, so the result lies in
    /// [0, 2]. NaN whenever the refracted cosine is NaN.
    pub fn reflectance(&self, theta1: f64) -> f64 {
        let (internal, external) = self.indices();
        let theta2 = self.refracted_cosine(theta1);

        let rs = (external * theta1 - internal * theta2) / (external * theta1 + internal * theta2);
        let rp = (internal * theta1 - external * theta2) / (internal * theta1 + external * theta2);
        rs * rs + rp * rp
    }
}

impl Material for Glass {
    fn reflect(&self, ray_in: &Ray, normal: Vec3, rng: &mut dyn RngCore) -> Vec3 {
        let direction = ray_in.direction();
        let theta1 = direction.dot(normal).abs();
        let (internal, external) = self.indices();
        let eta = external / internal;
        let theta2 = self.refracted_cosine(theta1);

        if gen_f64(rng) < self.reflectance(theta1) + self.reflection_bias {
            direction + normal * (theta1 * 2.0)
        } else {
            (direction + normal * theta1) * eta + normal * -theta2
        }
    }

    fn color(&self) -> Color {
        self.color
    }
}

/// Reflect a vector about a normal.
#[inline]
fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - n * (2.0 * v.dot(n))
}
