//! Collaborator interfaces for drawing an effect.
//!
//! The effect itself never talks to a GPU. It reads view/projection
//! transforms from a [`Camera`] and hands the finished vertex buffer to a
//! [`RenderBackend`] sink; backends live in their own crates (see
//! `ember-gpu`) or in the host application.

use glam::Mat4;
use thiserror::Error;

use crate::effect::Vertex;

/// Read-only source of view and projection transforms.
///
/// The effect never mutates the camera; hosts own it and may rebind a
/// different camera between frames.
pub trait Camera: Send + Sync {
    /// World-to-view transform.
    fn view(&self) -> Mat4;
    /// View-to-clip transform.
    fn projection(&self) -> Mat4;
}

/// Opaque handle to a texture owned by a render backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(pub u64);

/// Everything a backend needs to draw one frame of an effect.
#[derive(Debug, Clone, Copy)]
pub struct DrawSubmission<'a> {
    /// One vertex per pool slot, in pool order.
    pub vertices: &'a [Vertex],
    /// World-to-view transform.
    pub view: Mat4,
    /// View-to-clip transform.
    pub projection: Mat4,
    /// Uniform sprite size in world units.
    pub particle_size: f32,
    /// Sprite texture; `None` draws untextured points.
    pub texture: Option<TextureHandle>,
}

/// Errors surfaced by render backends.
#[derive(Error, Debug)]
pub enum RenderError {
    /// The submission referenced a texture the backend does not know.
    #[error("unknown texture handle {0}")]
    UnknownTexture(u64),
    /// Backend-specific failure.
    #[error("render backend error: {0}")]
    Backend(String),
}

/// Sink that consumes a finished vertex buffer and issues the draw.
///
/// Backends report failures through [`RenderError`]; the effect bubbles
/// them up unchanged.
pub trait RenderBackend {
    /// Draws one frame of particle vertices.
    fn draw(&mut self, submission: &DrawSubmission<'_>) -> Result<(), RenderError>;
}
