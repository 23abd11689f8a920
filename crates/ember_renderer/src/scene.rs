//! Scene description: output size, camera and the list of bodies.

use crate::{Camera, Diffuse, Glass, Material, Metal, Sphere};
use ember_math::{Color, Ray, Vec3};

/// Output image resolution in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSize {
    pub width: u32,
    pub height: u32,
}

impl OutputSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total number of pixels.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// A sphere paired with the material covering it.
pub struct Body {
    pub shape: Sphere,
    pub material: Box<dyn Material>,
}

impl Body {
    pub fn new(shape: Sphere, material: impl Material + 'static) -> Self {
        Self {
            shape,
            material: Box::new(material),
        }
    }
}

/// Nearest intersection found by [`Scene::nearest_hit`].
pub struct Hit<'a> {
    pub body: &'a Body,
    pub t: f64,
}

/// Immutable scene: what to render and from where.
pub struct Scene {
    output: OutputSize,
    camera: Camera,
    objects: Vec<Body>,
}

impl Scene {
    /// Create a scene. `objects` order only matters for exact distance ties.
    pub fn new(output: OutputSize, camera: Camera, objects: Vec<Body>) -> Self {
        Self {
            output,
            camera,
            objects,
        }
    }

    pub fn output(&self) -> OutputSize {
        self.output
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn objects(&self) -> &[Body] {
        &self.objects
    }

    /// Closest body hit by `ray` at a strictly positive distance.
    ///
    /// On exact distance ties the body appearing later in the list wins.
    pub fn nearest_hit(&self, ray: &Ray) -> Option<Hit<'_>> {
        let mut closest_so_far = f64::INFINITY;
        let mut hit = None;

        for body in &self.objects {
            if let Some(t) = body.shape.intersect(ray) {
                if t > 0.0 && t <= closest_so_far {
                    closest_so_far = t;
                    hit = Some(body);
                }
            }
        }

        hit.map(|body| Hit {
            body,
            t: closest_so_far,
        })
    }

    /// Glass, metal and diffuse spheres inside a room whose walls are huge
    /// spheres, lit by an emissive ceiling and one small emissive sphere.
    pub fn demo_room(output: OutputSize) -> Self {
        // Radius of the wall spheres; walls sit at `WALL - offset` from centre
        const WALL: f64 = 10e6;

        let camera = Camera::new(
            Vec3::new(0.0, -0.5, -0.2),
            Vec3::new(-1.3, 1.0, 1.0),
            Vec3::new(1.3, 1.0, 1.0),
            Vec3::new(-1.3, 1.0, -1.0),
        );

        let objects = vec![
            // glass
            Body::new(
                Sphere::new(Vec3::new(1.0, 2.0, 0.0), 0.5),
                Glass::new(Color::ONE, 1.6, 0.2),
            ),
            Body::new(
                Sphere::new(Vec3::new(0.0, 0.9, -0.45), 0.05),
                Glass::new(Color::ONE, 2.0, 0.2),
            ),
            // metal
            Body::new(
                Sphere::new(Vec3::new(-1.1, 2.8, 0.0), 0.5),
                Metal::new(Color::new(0.7, 0.7, 0.7)),
            ),
            Body::new(
                Sphere::new(Vec3::new(0.0, 1.2, -0.3), 0.2),
                Metal::new(Color::new(1.0, 1.0, 0.1)),
            ),
            // diffuse
            Body::new(
                Sphere::new(Vec3::new(-0.4, 1.0, -0.4), 0.1),
                Diffuse::new(Color::new(0.5, 0.5, 1.0)),
            ),
            Body::new(
                Sphere::new(Vec3::new(0.4, 0.8, -0.4), 0.1),
                Diffuse::new(Color::new(1.0, 0.1, 1.0)),
            ),
            // small light
            Body::new(
                Sphere::new(Vec3::new(-0.1, 0.5, -0.44), 0.06),
                Diffuse::emissive(Color::new(1.0, 0.5, 1.0), Color::ONE),
            ),
            // floor
            Body::new(
                Sphere::new(Vec3::new(0.0, 2.0, -WALL), WALL - 0.5),
                Diffuse::new(Color::ONE),
            ),
            // back
            Body::new(
                Sphere::new(Vec3::new(0.0, WALL, 0.0), WALL - 4.5),
                Diffuse::new(Color::ONE),
            ),
            // left
            Body::new(
                Sphere::new(Vec3::new(-WALL, 2.0, 0.0), WALL - 1.9),
                Diffuse::new(Color::new(1.0, 0.5, 0.5)),
            ),
            // right
            Body::new(
                Sphere::new(Vec3::new(WALL, 2.0, 0.0), WALL - 1.9),
                Diffuse::new(Color::new(0.5, 1.0, 0.5)),
            ),
            // ceiling light
            Body::new(
                Sphere::new(Vec3::new(0.0, 2.0, WALL), WALL - 2.5),
                Diffuse::emissive(Color::ONE, Color::ONE),
            ),
            // front
            Body::new(
                Sphere::new(Vec3::new(0.0, -WALL, 0.0), WALL - 2.5),
                Diffuse::new(Color::ONE),
            ),
        ];

        Self::new(output, camera, objects)
    }
}
