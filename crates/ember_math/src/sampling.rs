//! Random sampling helpers.
//!
//! All randomness goes through an explicit `RngCore` so renders can be
//! reproduced from a seed.

use crate::Vec3;
use rand::{Rng, RngCore};

/// Uniform sample in [0, 1).
#[inline]
pub fn gen_f64(rng: &mut dyn RngCore) -> f64 {
    rng.gen::<f64>()
}

/// Random vector with each component drawn independently from [-1.5, 1.0).
///
/// This is a perturbation source, not a uniform ball sampler: the box is
/// off-centre, so directions built from it lean towards negative axes.
pub fn random_in_box(rng: &mut dyn RngCore) -> Vec3 {
    Vec3::new(
        gen_f64(rng) * 2.5 - 1.5,
        gen_f64(rng) * 2.5 - 1.5,
        gen_f64(rng) * 2.5 - 1.5,
    )
}

/// Random direction biased towards `normal`: `(random_in_box + normal).normalize()`.
///
/// Not cosine weighted and not strictly confined to the hemisphere.
pub fn random_direction_in_hemisphere(normal: Vec3, rng: &mut dyn RngCore) -> Vec3 {
    (random_in_box(rng) + normal).normalize()
}
