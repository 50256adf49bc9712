//! CPU particle simulation for ember.
//!
//! A [`ParticleEffect`] owns a fixed-capacity pool of particles and the
//! vertex buffer derived from it. Each frame the host advances the
//! simulation, dead particles are recycled in place through a shape
//! [`Emitter`], and the live state is projected into [`Vertex`] records
//! for whatever [`RenderBackend`] the host plugs in.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ember_particle::{EffectConfig, ParticleEffect, SphereEmitter};
//!
//! let mut effect = ParticleEffect::new(EffectConfig {
//!     capacity: 1000,
//!     ..Default::default()
//! })?;
//! effect.set_color_interpolator(ember_easing::palettes::fireworks());
//! effect.set_emitter(Arc::new(SphereEmitter::default()));
//! effect.emit_particles()?;
//!
//! // Host loop: once per frame.
//! effect.update(1.0 / 60.0)?;
//! assert_eq!(effect.vertices().len(), 1000);
//! # Ok::<(), ember_particle::EffectError>(())
//! ```

mod effect;
mod emitter;
mod error;
mod particle;
mod render;
mod rng;

pub use effect::{ColorInterpolator, EffectConfig, ParticleEffect, Vertex};
pub use emitter::{CubeEmitter, Emitter, PointEmitter, SphereEmitter};
pub use error::{EffectError, EffectResult};
pub use particle::{Particle, ParticleBuffer};
pub use render::{Camera, DrawSubmission, RenderBackend, RenderError, TextureHandle};
pub use rng::ParticleRng;

// Re-export the interpolation types the effect API is built on.
pub use ember_easing::{Easing, Interpolator, Keyframe, Lerp};
