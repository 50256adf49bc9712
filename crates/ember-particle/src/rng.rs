//! Random number generation for particle spawning.

use glam::{Vec2, Vec3};

/// Seedable random number generator for particle effects.
///
/// Uses xorshift64, so a given seed always produces the same particle
/// streams. One generator lives on the effect and is lent to emitters
/// per spawn; emitters themselves stay stateless.
#[derive(Debug, Clone)]
pub struct ParticleRng {
    state: u64,
}

impl Default for ParticleRng {
    fn default() -> Self {
        Self::new(12345)
    }
}

impl ParticleRng {
    /// Creates a new RNG with the given seed.
    pub fn new(seed: u64) -> Self {
        // A zero state is absorbing for xorshift.
        Self {
            state: if seed == 0 { 0x9E37_79B9_7F4A_7C15 } else { seed },
        }
    }

    /// Returns a random u64.
    fn next_u64(&mut self) -> u64 {
        // xorshift64
        self.state ^= self.state << 13;
        self.state ^= self.state >> 7;
        self.state ^= self.state << 17;
        self.state
    }

    /// Returns a random f32 in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Returns a random f32 in [min, max).
    pub fn range(&mut self, min: f32, max: f32) -> f32 {
        min + self.next_f32() * (max - min)
    }

    /// Returns a random point component-wise in [min, max).
    pub fn vec3_range(&mut self, min: Vec3, max: Vec3) -> Vec3 {
        Vec3::new(
            self.range(min.x, max.x),
            self.range(min.y, max.y),
            self.range(min.z, max.z),
        )
    }

    /// Returns a random point on the unit sphere.
    pub fn unit_sphere(&mut self) -> Vec3 {
        // Rejection sampling keeps the distribution uniform.
        loop {
            let x = self.range(-1.0, 1.0);
            let y = self.range(-1.0, 1.0);
            let z = self.range(-1.0, 1.0);
            let len_sq = x * x + y * y + z * z;
            if len_sq > 0.0001 && len_sq <= 1.0 {
                return Vec3::new(x, y, z).normalize();
            }
        }
    }

    /// Returns a random point inside the unit sphere.
    pub fn inside_unit_sphere(&mut self) -> Vec3 {
        self.unit_sphere() * self.next_f32().powf(1.0 / 3.0)
    }

    /// Returns a random point on the unit circle (XY plane).
    pub fn unit_circle(&mut self) -> Vec2 {
        let angle = self.next_f32() * std::f32::consts::TAU;
        Vec2::new(angle.cos(), angle.sin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rng_bounds() {
        let mut rng = ParticleRng::new(42);

        for _ in 0..1000 {
            let v = rng.next_f32();
            assert!((0.0..1.0).contains(&v));
        }

        for _ in 0..1000 {
            let v = rng.range(5.0, 10.0);
            assert!((5.0..10.0).contains(&v));
        }
    }

    #[test]
    fn test_rng_deterministic_per_seed() {
        let mut a = ParticleRng::new(7);
        let mut b = ParticleRng::new(7);

        for _ in 0..100 {
            assert_eq!(a.next_f32(), b.next_f32());
        }
    }

    #[test]
    fn test_rng_zero_seed_still_advances() {
        let mut rng = ParticleRng::new(0);
        let first = rng.next_f32();
        let second = rng.next_f32();
        assert_ne!(first, second);
    }

    #[test]
    fn test_rng_unit_sphere() {
        let mut rng = ParticleRng::new(42);

        for _ in 0..100 {
            let v = rng.unit_sphere();
            assert!((v.length() - 1.0).abs() < 0.001);
        }
    }

    #[test]
    fn test_rng_inside_unit_sphere() {
        let mut rng = ParticleRng::new(42);

        for _ in 0..100 {
            let v = rng.inside_unit_sphere();
            assert!(v.length() <= 1.0 + 0.001);
        }
    }
}
