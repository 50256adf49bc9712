//! Offscreen wgpu render backend for ember particle effects.
//!
//! Implements `ember-particle`'s [`RenderBackend`](ember_particle::RenderBackend)
//! sink with a headless wgpu pipeline: each particle vertex is expanded
//! into a camera-facing textured quad, drawn into an offscreen target,
//! and readable back as RGBA bytes for encoding or inspection.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ember_gpu::{GpuContext, PointSpriteRenderer};
//!
//! let ctx = Arc::new(GpuContext::new()?);
//! let mut renderer = PointSpriteRenderer::new(ctx, 512, 512)?;
//!
//! effect.render(&mut renderer)?;
//! let pixels = renderer.read_to_rgba8();
//! ```

mod context;
mod error;
mod renderer;
mod target;

pub use context::GpuContext;
pub use error::{GpuError, GpuResult};
pub use renderer::PointSpriteRenderer;
pub use target::RenderTarget;
