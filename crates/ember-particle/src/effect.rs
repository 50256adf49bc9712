//! The particle effect core.
//!
//! [`ParticleEffect`] owns a fixed pool of particles and the vertex
//! buffer derived from it. Each frame the host calls [`ParticleEffect::update`]
//! (or [`ParticleEffect::build_vertex_buffer`] alone while paused) followed
//! by [`ParticleEffect::render`]. Updating integrates every particle under
//! the constant force, recycles the dead ones through the bound emitter,
//! and rebuilds the vertex buffer so the render sees post-integration
//! state.
//!
//! The model is single-threaded and frame-synchronous: only the effect
//! mutates its pool and vertex storage, and `resize` must not overlap an
//! in-flight update or render.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use std::sync::Arc;

use glam::{Vec3, Vec4};

use ember_easing::Interpolator;

use crate::emitter::Emitter;
use crate::error::{EffectError, EffectResult};
use crate::particle::{Particle, ParticleBuffer};
use crate::render::{Camera, DrawSubmission, RenderBackend, TextureHandle};
use crate::rng::ParticleRng;

/// Color-over-lifetime table, indexed by a particle's life progress.
pub type ColorInterpolator = Interpolator<Vec4>;

/// Fixed sprite-center coordinate written into every vertex; backends
/// that expand point sprites to quads own the corner coordinates.
const SPRITE_CENTER_UV: [f32; 2] = [0.5, 0.5];

/// Render-facing vertex, one per pool slot, regenerated every frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// World-space position.
    pub position: [f32; 3],
    /// Diffuse color with alpha.
    pub diffuse: [f32; 4],
    /// Sprite texture coordinate.
    pub tex0: [f32; 2],
}

/// Construction-time configuration for a [`ParticleEffect`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EffectConfig {
    /// Number of particle slots in the pool.
    pub capacity: usize,
    /// Constant acceleration applied to every particle.
    pub force: Vec3,
    /// Minimum lifetime assigned on (re)emission, in seconds. Must be
    /// positive.
    pub lifetime_min: f32,
    /// Maximum lifetime assigned on (re)emission, in seconds.
    pub lifetime_max: f32,
    /// Uniform sprite size in world units.
    pub particle_size: f32,
    /// RNG seed; the same seed reproduces the same effect exactly.
    pub seed: u64,
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self {
            capacity: ParticleBuffer::DEFAULT_CAPACITY,
            force: Vec3::new(0.0, -9.81, 0.0),
            lifetime_min: 3.0,
            lifetime_max: 5.0,
            particle_size: 1.0,
            seed: 12345,
        }
    }
}

impl EffectConfig {
    /// Validates the configuration.
    ///
    /// Degenerate values are rejected here rather than during update: a
    /// zero-length pool has nothing to simulate, and a non-positive
    /// lifetime would divide by zero when advancing life progress.
    pub fn validate(&self) -> EffectResult<()> {
        if self.capacity == 0 {
            return Err(EffectError::ZeroCapacity);
        }
        if !(self.lifetime_min > 0.0)
            || !(self.lifetime_max >= self.lifetime_min)
            || !self.lifetime_max.is_finite()
        {
            return Err(EffectError::InvalidLifetime {
                min: self.lifetime_min,
                max: self.lifetime_max,
            });
        }
        Ok(())
    }
}

/// A CPU-simulated particle effect.
///
/// The effect is the sole owner of its particle pool and vertex buffer;
/// the two are always the same length. The emitter and camera are
/// host-owned collaborators held as shared handles: set them with
/// [`ParticleEffect::set_emitter`] / [`ParticleEffect::set_camera`],
/// rebind them between frames at will, and the effect will never mutate
/// or outlive them. Operations that need an unbound collaborator fail
/// fast with an [`EffectError`].
pub struct ParticleEffect {
    particles: ParticleBuffer,
    vertices: Vec<Vertex>,
    colors: ColorInterpolator,
    emitter: Option<Arc<dyn Emitter>>,
    camera: Option<Arc<dyn Camera>>,
    texture: Option<TextureHandle>,
    force: Vec3,
    lifetime_min: f32,
    lifetime_max: f32,
    particle_size: f32,
    rng: ParticleRng,
}

impl ParticleEffect {
    /// Creates an effect with all particles dead, ready to be emitted.
    pub fn new(config: EffectConfig) -> EffectResult<Self> {
        config.validate()?;
        Ok(Self {
            particles: ParticleBuffer::new(config.capacity),
            vertices: vec![Vertex::default(); config.capacity],
            colors: ColorInterpolator::new(),
            emitter: None,
            camera: None,
            texture: None,
            force: config.force,
            lifetime_min: config.lifetime_min,
            lifetime_max: config.lifetime_max,
            particle_size: config.particle_size,
            rng: ParticleRng::new(config.seed),
        })
    }

    /// Binds the emitter used to (re)spawn particles.
    pub fn set_emitter(&mut self, emitter: Arc<dyn Emitter>) {
        self.emitter = Some(emitter);
    }

    /// Unbinds the emitter.
    pub fn clear_emitter(&mut self) {
        self.emitter = None;
    }

    /// Binds the camera read during [`ParticleEffect::render`].
    pub fn set_camera(&mut self, camera: Arc<dyn Camera>) {
        self.camera = Some(camera);
    }

    /// Unbinds the camera.
    pub fn clear_camera(&mut self) {
        self.camera = None;
    }

    /// Sets the sprite texture submitted with each draw.
    pub fn set_texture(&mut self, texture: TextureHandle) {
        self.texture = Some(texture);
    }

    /// Clears the sprite texture; the backend draws untextured points.
    pub fn clear_texture(&mut self) {
        self.texture = None;
    }

    /// Replaces the color-over-lifetime table (copied in by value).
    pub fn set_color_interpolator(&mut self, colors: ColorInterpolator) {
        self.colors = colors;
    }

    /// Returns the color-over-lifetime table.
    pub fn colors(&self) -> &ColorInterpolator {
        &self.colors
    }

    /// Sets the constant force vector.
    pub fn set_force(&mut self, force: Vec3) {
        self.force = force;
    }

    /// Returns the constant force vector.
    pub fn force(&self) -> Vec3 {
        self.force
    }

    /// Returns the pool capacity.
    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    /// Returns the particles in pool order.
    pub fn particles(&self) -> &[Particle] {
        self.particles.as_slice()
    }

    /// Returns the particles mutably, in pool order.
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        self.particles.as_mut_slice()
    }

    /// Returns the vertex buffer as last built.
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Returns the number of live particles.
    pub fn alive_count(&self) -> usize {
        self.particles.alive_count()
    }

    /// Reallocates the pool and vertex buffer to exactly `capacity`
    /// slots, discarding all prior particle state.
    ///
    /// Not a per-frame operation; must not overlap an in-flight update
    /// or render.
    pub fn resize(&mut self, capacity: usize) -> EffectResult<()> {
        if capacity == 0 {
            return Err(EffectError::ZeroCapacity);
        }
        self.particles.resize(capacity);
        self.vertices.clear();
        self.vertices.resize(capacity, Vertex::default());
        log::debug!("particle pool resized to {capacity}");
        Ok(())
    }

    /// Re-emits every dead particle through the bound emitter.
    ///
    /// Live particles are untouched. On a freshly constructed effect
    /// every slot is dead, so this primes the whole pool.
    pub fn emit_particles(&mut self) -> EffectResult<()> {
        let emitter = self.require_emitter()?;

        let rng = &mut self.rng;
        for particle in self.particles.iter_mut() {
            if !particle.is_alive() {
                respawn(
                    particle,
                    emitter.as_ref(),
                    rng,
                    self.lifetime_min,
                    self.lifetime_max,
                    self.particle_size,
                );
            }
        }
        Ok(())
    }

    /// Scatters every particle with pseudo-random state, bypassing the
    /// emitter.
    ///
    /// Seed utility for initial visual variety; not part of the
    /// steady-state loop. Life progress is randomized too so the pool
    /// does not die in lockstep.
    pub fn randomize_particles(&mut self) {
        let rng = &mut self.rng;
        for particle in self.particles.iter_mut() {
            particle.position = rng.inside_unit_sphere();
            particle.velocity = rng.unit_sphere() * rng.range(0.5, 4.0);
            particle.lifetime = rng.range(self.lifetime_min, self.lifetime_max);
            particle.life_progress = rng.next_f32();
            particle.size = self.particle_size;
        }
    }

    /// Advances the simulation by `dt` seconds and rebuilds the vertex
    /// buffer.
    ///
    /// Integration order is velocity-then-position (symplectic Euler).
    /// Particles whose life progress reaches 1 are recycled through the
    /// emitter within the same call, so no dead particle survives into
    /// the rendered frame. A `dt` spike spanning several lifetimes still
    /// recycles each particle once.
    ///
    /// `dt == 0` leaves all particle state unchanged.
    pub fn update(&mut self, dt: f32) -> EffectResult<()> {
        if dt < 0.0 || !dt.is_finite() {
            return Err(EffectError::InvalidDeltaTime(dt));
        }
        let emitter = self.require_emitter()?;

        if dt > 0.0 {
            let force = self.force;
            let rng = &mut self.rng;
            for particle in self.particles.iter_mut() {
                particle.velocity += force * dt;
                particle.position += particle.velocity * dt;
                particle.life_progress += dt / particle.lifetime;

                if particle.life_progress >= 1.0 {
                    respawn(
                        particle,
                        emitter.as_ref(),
                        rng,
                        self.lifetime_min,
                        self.lifetime_max,
                        self.particle_size,
                    );
                }
            }
        }

        self.build_vertex_buffer();
        Ok(())
    }

    /// Rebuilds the vertex buffer from current particle state.
    ///
    /// Pure projection with no simulation side effects; the host calls
    /// this instead of [`ParticleEffect::update`] when the simulation is
    /// paused but a redraw is still wanted. Writes one vertex per pool
    /// slot in pool order, so the buffer length always equals the pool
    /// capacity. Dead slots take the end-of-table color, which fades
    /// them out under the usual alpha-fading tables.
    pub fn build_vertex_buffer(&mut self) {
        for (vertex, particle) in self.vertices.iter_mut().zip(self.particles.iter()) {
            vertex.position = particle.position.to_array();
            vertex.diffuse = self.colors.get_value(particle.life_progress).to_array();
            vertex.tex0 = SPRITE_CENTER_UV;
        }
    }

    /// Submits the current vertex buffer to a render backend.
    ///
    /// Reads the bound camera's transforms; no simulation logic. Fails
    /// fast if no camera has been bound.
    pub fn render(&self, backend: &mut dyn RenderBackend) -> EffectResult<()> {
        let camera = self.camera.as_ref().ok_or_else(|| {
            log::warn!("render called with no camera bound");
            EffectError::NoCamera
        })?;

        backend.draw(&DrawSubmission {
            vertices: &self.vertices,
            view: camera.view(),
            projection: camera.projection(),
            particle_size: self.particle_size,
            texture: self.texture,
        })?;
        Ok(())
    }

    fn require_emitter(&self) -> EffectResult<Arc<dyn Emitter>> {
        self.emitter.clone().ok_or_else(|| {
            log::warn!("no emitter bound to the effect");
            EffectError::NoEmitter
        })
    }
}

/// Resets a dead particle through the emitter.
fn respawn(
    particle: &mut Particle,
    emitter: &dyn Emitter,
    rng: &mut ParticleRng,
    lifetime_min: f32,
    lifetime_max: f32,
    size: f32,
) {
    let (position, velocity) = emitter.emit(rng);
    particle.position = position;
    particle.velocity = velocity;
    particle.lifetime = rng.range(lifetime_min, lifetime_max);
    particle.life_progress = 0.0;
    particle.size = size;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::SphereEmitter;
    use crate::render::RenderError;
    use glam::Mat4;

    /// Emitter that always spawns the same pair; makes recycling
    /// observable.
    struct FixedEmitter {
        position: Vec3,
        velocity: Vec3,
    }

    impl Emitter for FixedEmitter {
        fn emit(&self, _rng: &mut ParticleRng) -> (Vec3, Vec3) {
            (self.position, self.velocity)
        }
    }

    struct TestCamera;

    impl Camera for TestCamera {
        fn view(&self) -> Mat4 {
            Mat4::from_translation(Vec3::new(0.0, 0.0, -100.0))
        }

        fn projection(&self) -> Mat4 {
            Mat4::perspective_rh(1.0, 1.0, 0.1, 1000.0)
        }
    }

    #[derive(Default)]
    struct RecordingBackend {
        vertex_counts: Vec<usize>,
        textures: Vec<Option<TextureHandle>>,
    }

    impl RenderBackend for RecordingBackend {
        fn draw(&mut self, submission: &DrawSubmission<'_>) -> Result<(), RenderError> {
            self.vertex_counts.push(submission.vertices.len());
            self.textures.push(submission.texture);
            Ok(())
        }
    }

    fn small_config() -> EffectConfig {
        EffectConfig {
            capacity: 4,
            lifetime_min: 1.0,
            lifetime_max: 1.0,
            ..Default::default()
        }
    }

    fn fixed_emitter() -> Arc<FixedEmitter> {
        Arc::new(FixedEmitter {
            position: Vec3::new(5.0, 5.0, 5.0),
            velocity: Vec3::new(0.0, 1.0, 0.0),
        })
    }

    #[test]
    fn test_config_rejects_zero_capacity() {
        let config = EffectConfig {
            capacity: 0,
            ..Default::default()
        };
        assert!(matches!(
            ParticleEffect::new(config),
            Err(EffectError::ZeroCapacity)
        ));
    }

    #[test]
    fn test_config_rejects_degenerate_lifetime() {
        for (min, max) in [(0.0, 1.0), (-1.0, 1.0), (2.0, 1.0), (f32::NAN, 1.0)] {
            let config = EffectConfig {
                lifetime_min: min,
                lifetime_max: max,
                ..Default::default()
            };
            assert!(
                matches!(config.validate(), Err(EffectError::InvalidLifetime { .. })),
                "expected rejection for [{min}, {max}]"
            );
        }
    }

    #[test]
    fn test_gravity_scenario_velocity_then_position() {
        let mut effect = ParticleEffect::new(EffectConfig {
            force: Vec3::new(0.0, -9.8, 0.0),
            ..small_config()
        })
        .unwrap();
        effect.set_emitter(fixed_emitter());

        for p in effect.particles_mut() {
            p.position = Vec3::ZERO;
            p.velocity = Vec3::ZERO;
            p.lifetime = 1.0;
            p.life_progress = 0.0;
        }

        effect.update(0.5).unwrap();

        for p in effect.particles() {
            assert!((p.velocity.y - (-4.9)).abs() < 0.001);
            assert!((p.position.y - (-2.45)).abs() < 0.001);
            assert!((p.life_progress - 0.5).abs() < 0.001);
        }
    }

    #[test]
    fn test_update_zero_dt_is_noop() {
        let mut effect = ParticleEffect::new(small_config()).unwrap();
        effect.set_emitter(fixed_emitter());
        effect.randomize_particles();

        let before = effect.particles().to_vec();
        effect.update(0.0).unwrap();
        assert_eq!(effect.particles(), &before[..]);
    }

    #[test]
    fn test_update_rejects_bad_dt() {
        let mut effect = ParticleEffect::new(small_config()).unwrap();
        effect.set_emitter(fixed_emitter());

        assert!(matches!(
            effect.update(-0.1),
            Err(EffectError::InvalidDeltaTime(_))
        ));
        assert!(matches!(
            effect.update(f32::NAN),
            Err(EffectError::InvalidDeltaTime(_))
        ));
        assert!(matches!(
            effect.update(f32::INFINITY),
            Err(EffectError::InvalidDeltaTime(_))
        ));
    }

    #[test]
    fn test_update_requires_emitter() {
        let mut effect = ParticleEffect::new(small_config()).unwrap();
        assert!(matches!(effect.update(0.016), Err(EffectError::NoEmitter)));
    }

    #[test]
    fn test_dead_particle_recycled_same_frame() {
        let mut effect = ParticleEffect::new(small_config()).unwrap();
        effect.set_emitter(fixed_emitter());

        for p in effect.particles_mut() {
            p.position = Vec3::ZERO;
            p.velocity = Vec3::ZERO;
            p.lifetime = 1.0;
            p.life_progress = 0.9;
        }

        effect.update(0.2).unwrap();

        for p in effect.particles() {
            assert_eq!(p.life_progress, 0.0);
            assert_eq!(p.position, Vec3::new(5.0, 5.0, 5.0));
            assert_eq!(p.velocity, Vec3::new(0.0, 1.0, 0.0));
        }
    }

    #[test]
    fn test_dt_spike_recycles_once() {
        let mut effect = ParticleEffect::new(small_config()).unwrap();
        effect.set_emitter(fixed_emitter());

        for p in effect.particles_mut() {
            p.lifetime = 1.0;
            p.life_progress = 0.0;
        }

        // Ten lifetimes in one step: still a single recycle.
        effect.update(10.0).unwrap();

        for p in effect.particles() {
            assert_eq!(p.life_progress, 0.0);
            assert_eq!(p.position, Vec3::new(5.0, 5.0, 5.0));
        }
    }

    #[test]
    fn test_life_progress_stays_in_range() {
        let mut effect = ParticleEffect::new(EffectConfig {
            capacity: 64,
            lifetime_min: 0.5,
            lifetime_max: 1.5,
            ..Default::default()
        })
        .unwrap();
        effect.set_emitter(Arc::new(SphereEmitter::default()));
        effect.emit_particles().unwrap();

        for _ in 0..200 {
            effect.update(0.05).unwrap();
            for p in effect.particles() {
                assert!((0.0..1.0).contains(&p.life_progress));
            }
        }
    }

    #[test]
    fn test_emit_particles_requires_emitter() {
        let mut effect = ParticleEffect::new(small_config()).unwrap();
        assert!(matches!(
            effect.emit_particles(),
            Err(EffectError::NoEmitter)
        ));
    }

    #[test]
    fn test_emit_particles_skips_live_ones() {
        let mut effect = ParticleEffect::new(small_config()).unwrap();
        effect.set_emitter(fixed_emitter());

        // One live particle parked away from the emitter's spawn point.
        let marker = Vec3::new(-7.0, 0.0, 0.0);
        {
            let particles = effect.particles_mut();
            particles[0].position = marker;
            particles[0].life_progress = 0.3;
        }

        effect.emit_particles().unwrap();

        let particles = effect.particles();
        assert_eq!(particles[0].position, marker);
        assert!((particles[0].life_progress - 0.3).abs() < 0.001);
        for p in &particles[1..] {
            assert_eq!(p.position, Vec3::new(5.0, 5.0, 5.0));
            assert_eq!(p.life_progress, 0.0);
        }
    }

    #[test]
    fn test_build_vertex_buffer_is_idempotent() {
        let mut effect = ParticleEffect::new(small_config()).unwrap();
        effect.set_emitter(Arc::new(SphereEmitter::default()));
        effect.set_color_interpolator(ember_easing::palettes::fireworks());
        effect.emit_particles().unwrap();
        effect.update(0.1).unwrap();

        effect.build_vertex_buffer();
        let first = effect.vertices().to_vec();
        effect.build_vertex_buffer();
        assert_eq!(effect.vertices(), &first[..]);
    }

    #[test]
    fn test_vertex_colors_follow_interpolator() {
        let mut effect = ParticleEffect::new(small_config()).unwrap();

        let mut colors = ColorInterpolator::new();
        colors.add_value(0.0, Vec4::new(1.0, 0.0, 0.0, 1.0));
        colors.add_value(1.0, Vec4::new(0.0, 0.0, 1.0, 1.0));
        effect.set_color_interpolator(colors);

        for p in effect.particles_mut() {
            p.life_progress = 0.5;
            p.position = Vec3::new(1.0, 2.0, 3.0);
        }
        effect.build_vertex_buffer();

        for v in effect.vertices() {
            assert_eq!(v.position, [1.0, 2.0, 3.0]);
            assert!((v.diffuse[0] - 0.5).abs() < 0.001);
            assert!(v.diffuse[1].abs() < 0.001);
            assert!((v.diffuse[2] - 0.5).abs() < 0.001);
        }
    }

    #[test]
    fn test_resize_keeps_buffers_in_lockstep() {
        let mut effect = ParticleEffect::new(small_config()).unwrap();
        assert_eq!(effect.capacity(), 4);
        assert_eq!(effect.vertices().len(), 4);

        effect.resize(9).unwrap();
        assert_eq!(effect.capacity(), 9);
        assert_eq!(effect.vertices().len(), 9);
        assert_eq!(effect.alive_count(), 0);

        assert!(matches!(effect.resize(0), Err(EffectError::ZeroCapacity)));
        assert_eq!(effect.capacity(), 9);
    }

    #[test]
    fn test_render_requires_camera() {
        let effect = ParticleEffect::new(small_config()).unwrap();
        let mut backend = RecordingBackend::default();
        assert!(matches!(
            effect.render(&mut backend),
            Err(EffectError::NoCamera)
        ));
        assert!(backend.vertex_counts.is_empty());
    }

    #[test]
    fn test_render_submits_full_buffer_and_texture() {
        let mut effect = ParticleEffect::new(small_config()).unwrap();
        effect.set_camera(Arc::new(TestCamera));
        effect.set_texture(TextureHandle(3));

        let mut backend = RecordingBackend::default();
        effect.render(&mut backend).unwrap();

        assert_eq!(backend.vertex_counts, vec![4]);
        assert_eq!(backend.textures, vec![Some(TextureHandle(3))]);
    }

    #[test]
    fn test_same_seed_reproduces_effect() {
        let run = || {
            let mut effect = ParticleEffect::new(EffectConfig {
                capacity: 32,
                seed: 99,
                ..Default::default()
            })
            .unwrap();
            effect.set_emitter(Arc::new(SphereEmitter::default()));
            effect.emit_particles().unwrap();
            for _ in 0..20 {
                effect.update(0.1).unwrap();
            }
            effect.particles().to_vec()
        };

        assert_eq!(run(), run());
    }
}
