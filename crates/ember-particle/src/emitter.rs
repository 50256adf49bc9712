//! Spawn-shape emitters.
//!
//! An emitter answers one question: where does a recycled particle start
//! and with what velocity. Lifetime, size, and color policy stay on the
//! effect, so emitters are pure shape distributions.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use glam::Vec3;

use crate::rng::ParticleRng;

/// Produces spawn (position, velocity) pairs for recycled particles.
///
/// Implementations are stateless aside from their shape parameters; the
/// effect owns the RNG and lends it out per spawn, which keeps a seeded
/// effect fully deterministic. Must be safely callable once per recycled
/// particle per frame.
pub trait Emitter: Send + Sync {
    /// Draws one spawn position/velocity pair from the shape's
    /// distribution.
    fn emit(&self, rng: &mut ParticleRng) -> (Vec3, Vec3);
}

/// Emits from the surface of a sphere, velocity pointing radially out.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SphereEmitter {
    /// Center of the sphere.
    pub center: Vec3,
    /// Sphere radius.
    pub radius: f32,
    /// Minimum outward speed.
    pub speed_min: f32,
    /// Maximum outward speed.
    pub speed_max: f32,
}

impl Default for SphereEmitter {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            radius: 1.0,
            speed_min: 10.0,
            speed_max: 20.0,
        }
    }
}

impl Emitter for SphereEmitter {
    fn emit(&self, rng: &mut ParticleRng) -> (Vec3, Vec3) {
        let dir = rng.unit_sphere();
        let speed = rng.range(self.speed_min, self.speed_max);
        (self.center + dir * self.radius, dir * speed)
    }
}

/// Emits uniformly from an axis-aligned box volume.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CubeEmitter {
    /// Center of the box.
    pub center: Vec3,
    /// Half-extents along each axis.
    pub half_extents: Vec3,
    /// Per-axis minimum initial velocity.
    pub velocity_min: Vec3,
    /// Per-axis maximum initial velocity.
    pub velocity_max: Vec3,
}

impl Default for CubeEmitter {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            half_extents: Vec3::ONE,
            velocity_min: Vec3::new(-1.0, 2.0, -1.0),
            velocity_max: Vec3::new(1.0, 5.0, 1.0),
        }
    }
}

impl Emitter for CubeEmitter {
    fn emit(&self, rng: &mut ParticleRng) -> (Vec3, Vec3) {
        let offset = rng.vec3_range(-self.half_extents, self.half_extents);
        let velocity = rng.vec3_range(self.velocity_min, self.velocity_max);
        (self.center + offset, velocity)
    }
}

/// Emits from a single point, velocity spread in a cone.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointEmitter {
    /// Emission origin.
    pub origin: Vec3,
    /// Cone axis.
    pub direction: Vec3,
    /// Cone half-angle in radians.
    pub spread: f32,
    /// Minimum initial speed.
    pub speed_min: f32,
    /// Maximum initial speed.
    pub speed_max: f32,
}

impl Default for PointEmitter {
    fn default() -> Self {
        Self {
            origin: Vec3::ZERO,
            direction: Vec3::Y,
            spread: std::f32::consts::FRAC_PI_4,
            speed_min: 1.0,
            speed_max: 2.0,
        }
    }
}

impl Emitter for PointEmitter {
    fn emit(&self, rng: &mut ParticleRng) -> (Vec3, Vec3) {
        // Uniform direction within the cone (cone along Z, then rotated).
        let cos_spread = self.spread.cos();
        let z = rng.range(cos_spread, 1.0);
        let phi = rng.next_f32() * std::f32::consts::TAU;
        let sin_theta = (1.0 - z * z).sqrt();

        let local = Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), z);
        let dir = rotate_to_direction(local, self.direction.normalize());

        let speed = rng.range(self.speed_min, self.speed_max);
        (self.origin, dir * speed)
    }
}

/// Rotates a Z-up vector into the basis of the given direction.
fn rotate_to_direction(v: Vec3, dir: Vec3) -> Vec3 {
    if dir.z.abs() > 0.999 {
        if dir.z > 0.0 {
            v
        } else {
            Vec3::new(v.x, -v.y, -v.z)
        }
    } else {
        let up = Vec3::Z;
        let right = up.cross(dir).normalize();
        let new_up = dir.cross(right);

        right * v.x + new_up * v.y + dir * v.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_emitter_spawns_on_surface() {
        let emitter = SphereEmitter {
            center: Vec3::new(1.0, 2.0, 3.0),
            radius: 5.0,
            ..Default::default()
        };
        let mut rng = ParticleRng::new(42);

        for _ in 0..100 {
            let (position, velocity) = emitter.emit(&mut rng);
            let radial = position - emitter.center;
            assert!((radial.length() - 5.0).abs() < 0.001);

            // Velocity points outward along the spawn radial.
            let alignment = radial.normalize().dot(velocity.normalize());
            assert!((alignment - 1.0).abs() < 0.001);

            let speed = velocity.length();
            assert!(speed >= emitter.speed_min && speed < emitter.speed_max);
        }
    }

    #[test]
    fn test_cube_emitter_spawns_in_volume() {
        let emitter = CubeEmitter {
            center: Vec3::new(0.0, 10.0, 0.0),
            half_extents: Vec3::new(1.0, 2.0, 3.0),
            ..Default::default()
        };
        let mut rng = ParticleRng::new(42);

        for _ in 0..100 {
            let (position, velocity) = emitter.emit(&mut rng);
            let offset = position - emitter.center;
            assert!(offset.x.abs() <= 1.0);
            assert!(offset.y.abs() <= 2.0);
            assert!(offset.z.abs() <= 3.0);

            assert!(velocity.x >= emitter.velocity_min.x && velocity.x < emitter.velocity_max.x);
            assert!(velocity.y >= emitter.velocity_min.y && velocity.y < emitter.velocity_max.y);
            assert!(velocity.z >= emitter.velocity_min.z && velocity.z < emitter.velocity_max.z);
        }
    }

    #[test]
    fn test_point_emitter_velocity_within_cone() {
        let emitter = PointEmitter {
            direction: Vec3::Y,
            spread: std::f32::consts::FRAC_PI_4,
            ..Default::default()
        };
        let mut rng = ParticleRng::new(42);

        for _ in 0..100 {
            let (position, velocity) = emitter.emit(&mut rng);
            assert_eq!(position, emitter.origin);

            let cos_angle = velocity.normalize().dot(Vec3::Y);
            assert!(cos_angle >= emitter.spread.cos() - 0.001);
        }
    }
}
