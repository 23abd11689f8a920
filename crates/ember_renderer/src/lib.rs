//! Ember renderer - progressive CPU path tracing
//!
//! A Monte Carlo path tracer for scenes made of spheres with diffuse, metal
//! and glass materials. Each [`Renderer`] owns its scene, its random source
//! and an accumulation buffer that gains one sample per pixel per call to
//! [`Renderer::iterate`].

mod camera;
mod material;
mod renderer;
mod scene;
mod sphere;

pub use camera::Camera;
pub use material::{Diffuse, Glass, Material, Metal};
pub use renderer::{path_trace, RenderConfig, Renderer};
pub use scene::{Body, Hit, OutputSize, Scene};
pub use sphere::Sphere;

/// Re-export Vec3 and common math types from ember_math
pub use ember_math::{Color, Ray, Vec3};
