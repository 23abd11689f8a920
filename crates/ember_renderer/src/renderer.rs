//! Core path tracing renderer.
//!
//! Implements progressive Monte Carlo path tracing with:
//! - Recursive ray tracing with a hard bounce limit
//! - One jittered primary ray per pixel per iteration
//! - A persistent per-pixel accumulation buffer

use crate::Scene;
use ember_math::{gen_f64, Color, Ray};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

/// Relative nudge applied to the hit distance when spawning the next ray.
const RAY_OFFSET: f64 = 1e-7;

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Deepest recursion level that still traces; deeper calls return black
    pub max_depth: u32,
    /// Seed for the renderer's random source (None = from entropy)
    pub seed: Option<u64>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_depth: 5,
            seed: None,
        }
    }
}

impl RenderConfig {
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Compute the radiance carried back along `ray`.
///
/// `depth` counts bounces so far, starting at 0 for primary rays.
pub fn path_trace(
    ray: &Ray,
    scene: &Scene,
    depth: u32,
    config: &RenderConfig,
    rng: &mut dyn RngCore,
) -> Color {
    if depth > config.max_depth {
        return Color::ZERO;
    }

    // Background is black
    let Some(hit) = scene.nearest_hit(ray) else {
        return Color::ZERO;
    };

    let point = ray.at(hit.t);
    let normal = hit.body.shape.normal_at(point);
    let material = &hit.body.material;
    let direction = material.reflect(ray, normal, rng);

    // Continuing rays (refraction) start just past the surface, bounced rays
    // just before it, so the next search cannot hit the same point again.
    let origin = if direction.dot(ray.direction()) > 0.0 {
        ray.at(hit.t * (1.0 + RAY_OFFSET))
    } else {
        ray.at(hit.t * (1.0 - RAY_OFFSET))
    };

    let incoming = path_trace(&Ray::new(origin, direction), scene, depth + 1, config, rng);
    incoming * material.color() + material.emission()
}

/// Progressive renderer owning one scene, one random source and the
/// accumulation buffer for the full frame.
pub struct Renderer<R: RngCore = StdRng> {
    scene: Scene,
    config: RenderConfig,
    buffer: Vec<Color>,
    iterations: u32,
    rng: R,
}

impl Renderer<StdRng> {
    /// Create a renderer seeded from `config.seed`, or from entropy.
    pub fn new(scene: Scene, config: RenderConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(scene, config, rng)
    }
}

impl<R: RngCore> Renderer<R> {
    /// Create a renderer drawing from an explicit random source.
    pub fn with_rng(scene: Scene, config: RenderConfig, rng: R) -> Self {
        let output = scene.output();
        log::debug!(
            "Renderer created: {}x{}, {} bodies, max depth {}",
            output.width,
            output.height,
            scene.objects().len(),
            config.max_depth
        );

        Self {
            buffer: vec![Color::ZERO; output.pixel_count()],
            scene,
            config,
            iterations: 0,
            rng,
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Accumulated radiance per pixel, row-major.
    pub fn buffer(&self) -> &[Color] {
        &self.buffer
    }

    /// Iterations accumulated since the last clear.
    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    /// Trace `ray` starting at recursion level `depth`.
    pub fn path_tracing(&mut self, ray: &Ray, depth: u32) -> Color {
        path_trace(ray, &self.scene, depth, &self.config, &mut self.rng)
    }

    /// Add one jittered sample per pixel into the buffer.
    ///
    /// The vertical jitter is drawn once per iteration and the horizontal
    /// jitter once per row, so every pixel in a row shares the same offset.
    pub fn iterate(&mut self) {
        let output = self.scene.output();
        let w = output.width as f64;
        let h = output.height as f64;

        let mut pixels = self.buffer.iter_mut();
        let y0 = gen_f64(&mut self.rng) / h;
        for row in 0..output.height {
            let y = y0 + row as f64 / h;
            let x0 = gen_f64(&mut self.rng) / w;
            for col in 0..output.width {
                let x = x0 + col as f64 / w;
                let ray = self.scene.camera().get_ray(x, y);
                let color = path_trace(&ray, &self.scene, 0, &self.config, &mut self.rng);
                if let Some(pixel) = pixels.next() {
                    *pixel += color;
                }
            }
        }

        self.iterations += 1;
    }

    /// Reset every pixel of the accumulation buffer to black.
    pub fn clear_buffer(&mut self) {
        self.buffer.fill(Color::ZERO);
        self.iterations = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Body, Camera, Diffuse, Glass, Metal, OutputSize, Sphere};
    use ember_math::Vec3;

    fn camera() -> Camera {
        Camera::new(
            Vec3::ZERO,
            Vec3::new(-1.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, -1.0),
        )
    }

    /// A huge white emitter filling the whole view.
    fn light_wall_scene(width: u32, height: u32) -> Scene {
        Scene::new(
            OutputSize::new(width, height),
            camera(),
            vec![Body::new(
                Sphere::new(Vec3::new(0.0, 1e4 + 10.0, 0.0), 1e4),
                Diffuse::emissive(Color::ONE, Color::ONE),
            )],
        )
    }

    fn mixed_scene() -> Scene {
        Scene::new(
            OutputSize::new(6, 4),
            camera(),
            vec![
                Body::new(
                    Sphere::new(Vec3::new(0.0, 3.0, 0.0), 1.0),
                    Glass::new(Color::ONE, 1.5, 0.1),
                ),
                Body::new(
                    Sphere::new(Vec3::new(1.5, 4.0, 0.0), 0.8),
                    Metal::new(Color::new(0.8, 0.8, 0.8)),
                ),
                Body::new(
                    Sphere::new(Vec3::new(0.0, 1e4 + 10.0, 0.0), 1e4),
                    Diffuse::emissive(Color::new(0.9, 0.9, 0.9), Color::new(1.0, 0.8, 0.6)),
                ),
            ],
        )
    }

    #[test]
    fn test_depth_cutoff_returns_black() {
        let scene = light_wall_scene(2, 2);
        let config = RenderConfig::default();
        let mut rng = StdRng::seed_from_u64(1);

        let ray = scene.camera().get_ray(0.5, 0.5);
        let color = path_trace(&ray, &scene, config.max_depth + 1, &config, &mut rng);
        assert_eq!(color, Color::ZERO);
    }

    #[test]
    fn test_emitter_at_depth_zero() {
        let scene = light_wall_scene(8, 8);
        let config = RenderConfig::default().with_max_depth(0);
        let mut rng = StdRng::seed_from_u64(2);

        for i in 0..8 {
            for j in 0..8 {
                let ray = scene.camera().get_ray(i as f64 / 8.0, j as f64 / 8.0);
                let color = path_trace(&ray, &scene, 0, &config, &mut rng);
                assert_eq!(color, Color::ONE);
            }
        }
    }

    #[test]
    fn test_empty_scene_is_black() {
        let scene = Scene::new(OutputSize::new(4, 4), camera(), Vec::new());
        let mut renderer = Renderer::new(scene, RenderConfig::default().with_seed(3));

        for &(x, y) in &[(0.0, 0.0), (0.5, 0.5), (0.9, 0.1)] {
            let ray = renderer.scene().camera().get_ray(x, y);
            assert_eq!(renderer.path_tracing(&ray, 0), Color::ZERO);
        }

        renderer.iterate();
        assert!(renderer.buffer().iter().all(|c| *c == Color::ZERO));
    }

    #[test]
    fn test_emission_attenuated_by_earlier_bounce() {
        // Mirror in front of an emitter behind the camera: the light is seen
        // through the mirror and tinted by it.
        let scene = Scene::new(
            OutputSize::new(1, 1),
            camera(),
            vec![
                Body::new(
                    Sphere::new(Vec3::new(0.0, 1e4 + 5.0, 0.0), 1e4),
                    Metal::new(Color::new(0.5, 0.25, 1.0)),
                ),
                Body::new(
                    Sphere::new(Vec3::new(0.0, -1e4 - 5.0, 0.0), 1e4),
                    Diffuse::emissive(Color::ONE, Color::ONE),
                ),
            ],
        );
        let config = RenderConfig::default().with_max_depth(1);
        let mut rng = StdRng::seed_from_u64(4);

        let ray = Ray::new(Vec3::ZERO, Vec3::Y);
        let color = path_trace(&ray, &scene, 0, &config, &mut rng);
        assert_eq!(color, Color::new(0.5, 0.25, 1.0));
    }

    #[test]
    fn test_iterate_accumulates() {
        let mut renderer = Renderer::new(
            light_wall_scene(5, 3),
            RenderConfig::default().with_max_depth(0).with_seed(5),
        );

        assert_eq!(renderer.buffer().len(), 15);
        for _ in 0..4 {
            renderer.iterate();
        }

        assert_eq!(renderer.iterations(), 4);
        assert!(renderer.buffer().iter().all(|c| *c == Color::splat(4.0)));
    }

    #[test]
    fn test_clear_then_iterate_matches_fresh() {
        let config = RenderConfig::default().with_max_depth(0);

        let mut fresh = Renderer::new(light_wall_scene(4, 4), config.clone().with_seed(6));
        for _ in 0..3 {
            fresh.iterate();
        }

        let mut reused = Renderer::new(light_wall_scene(4, 4), config.with_seed(7));
        for _ in 0..5 {
            reused.iterate();
        }
        reused.clear_buffer();
        assert_eq!(reused.iterations(), 0);
        assert!(reused.buffer().iter().all(|c| *c == Color::ZERO));
        for _ in 0..3 {
            reused.iterate();
        }

        assert_eq!(fresh.buffer(), reused.buffer());
    }

    #[test]
    fn test_same_seed_same_image() {
        let config = RenderConfig::default().with_seed(1234);
        let mut a = Renderer::new(mixed_scene(), config.clone());
        let mut b = Renderer::new(mixed_scene(), config);

        for _ in 0..3 {
            a.iterate();
            b.iterate();
        }

        assert_eq!(a.buffer(), b.buffer());
        assert!(a.buffer().iter().any(|c| c.length() > 0.0));
    }

    #[test]
    fn test_explicit_rng() {
        let config = RenderConfig::default();
        let mut a = Renderer::with_rng(mixed_scene(), config.clone(), StdRng::seed_from_u64(8));
        let mut b = Renderer::with_rng(mixed_scene(), config, StdRng::seed_from_u64(8));

        a.iterate();
        b.iterate();
        assert_eq!(a.buffer(), b.buffer());
    }

    #[test]
    fn test_demo_room_renders_light() {
        let scene = Scene::demo_room(OutputSize::new(16, 12));
        let mut renderer = Renderer::new(scene, RenderConfig::default().with_seed(99));

        for _ in 0..4 {
            renderer.iterate();
        }

        let total: f64 = renderer.buffer().iter().map(|c| c.x + c.y + c.z).sum();
        assert!(total > 0.0);
        assert!(renderer.buffer().iter().all(|c| c.x >= 0.0 && c.y >= 0.0 && c.z >= 0.0));
    }
}
