//! Offscreen render targets with CPU read-back.

use crate::GpuContext;
use crate::error::{GpuError, GpuResult};

/// Render-target pixel format. sRGB-encoded RGBA, which is what PNG
/// expects on read-back.
pub(crate) const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

const BYTES_PER_PIXEL: u32 = 4;

/// An offscreen color target that can be read back to the CPU.
pub struct RenderTarget {
    pub(crate) texture: wgpu::Texture,
    width: u32,
    height: u32,
}

impl RenderTarget {
    /// Creates a new offscreen render target.
    pub fn new(ctx: &GpuContext, width: u32, height: u32) -> GpuResult<Self> {
        if width == 0 || height == 0 {
            return Err(GpuError::InvalidDimensions(format!(
                "render target dimensions must be > 0, got {}x{}",
                width, height
            )));
        }

        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("ember_render_target"),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });

        Ok(Self {
            texture,
            width,
            height,
        })
    }

    /// Returns the target width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the target height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Creates a view for use as a color attachment.
    pub(crate) fn create_view(&self) -> wgpu::TextureView {
        self.texture
            .create_view(&wgpu::TextureViewDescriptor::default())
    }

    /// Reads the rendered pixels back as tightly packed RGBA bytes,
    /// row-major from the top-left.
    pub fn read_to_rgba8(&self, ctx: &GpuContext) -> Vec<u8> {
        let unpadded_row_bytes = self.width * BYTES_PER_PIXEL;
        let padded_row_bytes = padded_bytes_per_row(unpadded_row_bytes);

        let staging_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("ember_readback_buffer"),
            size: (padded_row_bytes * self.height) as u64,
            usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
            mapped_at_creation: false,
        });

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("ember_readback_encoder"),
            });

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &staging_buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(padded_row_bytes),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );

        ctx.queue.submit(Some(encoder.finish()));

        let buffer_slice = staging_buffer.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
            tx.send(result).unwrap();
        });

        ctx.device.poll(wgpu::Maintain::Wait);
        rx.recv().unwrap().unwrap();

        let data = buffer_slice.get_mapped_range();

        // Strip the row padding the copy alignment forced on us.
        let mut result =
            Vec::with_capacity((self.width * self.height * BYTES_PER_PIXEL) as usize);
        for row in 0..self.height {
            let start = (row * padded_row_bytes) as usize;
            result.extend_from_slice(&data[start..start + unpadded_row_bytes as usize]);
        }

        result
    }
}

/// Rounds a row byte count up to the copy alignment wgpu requires.
pub(crate) fn padded_bytes_per_row(unpadded: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    (unpadded + align - 1) / align * align
}
