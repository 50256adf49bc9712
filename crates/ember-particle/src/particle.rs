//! Particle state and the fixed-capacity particle pool.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use glam::Vec3;

/// A single simulated particle.
///
/// `life_progress` is the particle's normalized age: it starts at 0 when
/// the particle is (re)emitted, grows monotonically while the particle is
/// alive, and the particle counts as dead once it reaches 1. The same
/// scalar indexes the effect's color table, so it is never observable
/// outside [0, 1].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Particle {
    /// Position in world space.
    pub position: Vec3,
    /// Velocity in units per second.
    pub velocity: Vec3,
    /// Total lifetime in seconds. Always positive.
    pub lifetime: f32,
    /// Normalized age in [0, 1].
    pub life_progress: f32,
    /// Render size hint.
    pub size: f32,
}

impl Default for Particle {
    /// A default particle is dead, waiting to be emitted into.
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            lifetime: 1.0,
            life_progress: 1.0,
            size: 1.0,
        }
    }
}

impl Particle {
    /// Returns true if the particle is still alive.
    pub fn is_alive(&self) -> bool {
        self.life_progress < 1.0
    }
}

/// Fixed-capacity pool of particles.
///
/// The pool's length is its capacity: every slot always holds a particle,
/// and dead particles are reset in place rather than removed. The only
/// operation that reallocates is [`ParticleBuffer::resize`].
#[derive(Debug, Clone)]
pub struct ParticleBuffer {
    slots: Vec<Particle>,
}

impl ParticleBuffer {
    /// Default capacity: small enough to debug, large enough to look
    /// like fireworks in release builds.
    pub const DEFAULT_CAPACITY: usize = if cfg!(debug_assertions) { 1000 } else { 100_000 };

    /// Creates a pool of `capacity` dead particles.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![Particle::default(); capacity],
        }
    }

    /// Returns the pool capacity (which is also its length).
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns true if the pool holds no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Returns the number of live particles.
    pub fn alive_count(&self) -> usize {
        self.slots.iter().filter(|p| p.is_alive()).count()
    }

    /// Returns the particles in pool order.
    pub fn as_slice(&self) -> &[Particle] {
        &self.slots
    }

    /// Returns the particles mutably, in pool order.
    pub fn as_mut_slice(&mut self) -> &mut [Particle] {
        &mut self.slots
    }

    /// Iterates the particles in pool order.
    pub fn iter(&self) -> std::slice::Iter<'_, Particle> {
        self.slots.iter()
    }

    /// Iterates the particles mutably, in pool order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Particle> {
        self.slots.iter_mut()
    }

    /// Reallocates the pool to hold exactly `capacity` dead particles,
    /// discarding all prior state.
    pub fn resize(&mut self, capacity: usize) {
        self.slots.clear();
        self.slots.resize(capacity, Particle::default());
    }
}

impl Default for ParticleBuffer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_particle_is_dead() {
        let p = Particle::default();
        assert!(!p.is_alive());
    }

    #[test]
    fn test_pool_starts_full_of_dead_slots() {
        let pool = ParticleBuffer::new(16);
        assert_eq!(pool.len(), 16);
        assert_eq!(pool.alive_count(), 0);
    }

    #[test]
    fn test_resize_discards_state() {
        let mut pool = ParticleBuffer::new(4);
        pool.as_mut_slice()[0].life_progress = 0.0;
        pool.as_mut_slice()[0].position = Vec3::splat(3.0);
        assert_eq!(pool.alive_count(), 1);

        pool.resize(8);
        assert_eq!(pool.len(), 8);
        assert_eq!(pool.alive_count(), 0);
        assert_eq!(pool.as_slice()[0].position, Vec3::ZERO);
    }
}
