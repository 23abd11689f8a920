//! Ember math types.
//!
//! Everything is double precision: the demo scene builds its walls out of
//! spheres with a radius around 1e7, and the ray offset used by the
//! integrator is 1e-7 of the hit distance.

// Re-export glam for convenience
pub use glam;

/// Point, direction and RGB colour all share this type.
pub use glam::DVec3 as Vec3;

/// RGB colour (channels conventionally 0-1 before accumulation).
pub type Color = Vec3;

mod ray;
mod sampling;

pub use ray::Ray;
pub use sampling::{gen_f64, random_direction_in_hemisphere, random_in_box};
