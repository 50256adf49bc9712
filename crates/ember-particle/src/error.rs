//! Effect error types.

use thiserror::Error;

use crate::render::RenderError;

/// Errors that can occur while configuring or driving a particle effect.
#[derive(Error, Debug)]
pub enum EffectError {
    /// An operation needed an emitter but none is bound.
    #[error("no emitter is bound to the effect")]
    NoEmitter,

    /// Render was called before a camera was bound.
    #[error("no camera is bound to the effect")]
    NoCamera,

    /// The particle pool cannot be empty.
    #[error("particle capacity must be non-zero")]
    ZeroCapacity,

    /// Lifetimes must be positive and the range ordered, or update would
    /// divide by zero.
    #[error("invalid lifetime range [{min}, {max}]")]
    InvalidLifetime {
        /// Configured minimum lifetime.
        min: f32,
        /// Configured maximum lifetime.
        max: f32,
    },

    /// Update was called with a negative or non-finite delta time.
    #[error("delta time must be non-negative and finite, got {0}")]
    InvalidDeltaTime(f32),

    /// A render backend failure, bubbled up unchanged.
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Result type for effect operations.
pub type EffectResult<T> = Result<T, EffectError>;
