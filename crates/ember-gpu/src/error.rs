//! GPU error types.

use thiserror::Error;

/// Errors that can occur while bringing up or driving the GPU backend.
#[derive(Error, Debug)]
pub enum GpuError {
    /// Failed to request a GPU adapter.
    #[error("failed to request GPU adapter")]
    AdapterNotFound,

    /// Failed to request a GPU device.
    #[error("failed to request GPU device: {0}")]
    DeviceRequestFailed(#[from] wgpu::RequestDeviceError),

    /// Invalid render-target or texture dimensions.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Texture upload with mismatched pixel data.
    #[error("texture upload failed: {0}")]
    TextureError(String),
}

/// Result type for GPU operations.
pub type GpuResult<T> = Result<T, GpuError>;
