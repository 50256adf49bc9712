//! Point-sprite particle renderer.
//!
//! Consumes the vertex buffer a `ParticleEffect` builds each frame and
//! draws it offscreen as camera-facing textured quads. The simulation
//! stays on the CPU; only the finished vertices cross to the GPU.

use std::collections::HashMap;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use ember_particle::{DrawSubmission, RenderBackend, RenderError, TextureHandle, Vertex};

use crate::GpuContext;
use crate::error::{GpuError, GpuResult};
use crate::target::{RenderTarget, TARGET_FORMAT};

/// Per-frame shader uniforms. Layout matches the WGSL `Uniforms` struct.
#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    size: f32,
    _pad: [f32; 3],
}

/// Offscreen render backend drawing particles as billboarded sprites.
///
/// Each particle vertex becomes one camera-facing quad, expanded in the
/// vertex shader; sprite textures are modulated by the per-particle
/// diffuse color and alpha-blended in pool order.
pub struct PointSpriteRenderer {
    ctx: Arc<GpuContext>,
    target: RenderTarget,
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    textures: HashMap<u64, wgpu::BindGroup>,
    next_texture_id: u64,
    white: wgpu::BindGroup,
    instance_buffer: wgpu::Buffer,
    instance_capacity: usize,
}

impl PointSpriteRenderer {
    /// Creates a renderer with an offscreen target of the given size.
    pub fn new(ctx: Arc<GpuContext>, width: u32, height: u32) -> GpuResult<Self> {
        let target = RenderTarget::new(&ctx, width, height)?;

        let shader = ctx
            .device
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some("particle_shader"),
                source: wgpu::ShaderSource::Wgsl(PARTICLE_SHADER.into()),
            });

        let uniform_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("particle_uniforms"),
            size: std::mem::size_of::<Uniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let uniform_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("particle_uniform_layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        let uniform_bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("particle_uniform_bind_group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let texture_layout = ctx
            .device
            .create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("particle_texture_layout"),
                entries: &[
                    wgpu::BindGroupLayoutEntry {
                        binding: 0,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Texture {
                            sample_type: wgpu::TextureSampleType::Float { filterable: true },
                            view_dimension: wgpu::TextureViewDimension::D2,
                            multisampled: false,
                        },
                        count: None,
                    },
                    wgpu::BindGroupLayoutEntry {
                        binding: 1,
                        visibility: wgpu::ShaderStages::FRAGMENT,
                        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                        count: None,
                    },
                ],
            });

        let sampler = ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("particle_sampler"),
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let pipeline_layout = ctx
            .device
            .create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("particle_pipeline_layout"),
                bind_group_layouts: &[&uniform_layout, &texture_layout],
                push_constant_ranges: &[],
            });

        let pipeline = ctx
            .device
            .create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some("particle_pipeline"),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: Some("vs_main"),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<Vertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &[
                            // position
                            wgpu::VertexAttribute {
                                format: wgpu::VertexFormat::Float32x3,
                                offset: 0,
                                shader_location: 0,
                            },
                            // diffuse
                            wgpu::VertexAttribute {
                                format: wgpu::VertexFormat::Float32x4,
                                offset: 12,
                                shader_location: 1,
                            },
                            // tex0
                            wgpu::VertexAttribute {
                                format: wgpu::VertexFormat::Float32x2,
                                offset: 28,
                                shader_location: 2,
                            },
                        ],
                    }],
                },
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: Some("fs_main"),
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                    targets: &[Some(wgpu::ColorTargetState {
                        format: TARGET_FORMAT,
                        blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                }),
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleStrip,
                    ..Default::default()
                },
                depth_stencil: None,
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
                cache: None,
            });

        // 1x1 white fallback so untextured submissions draw flat sprites.
        let white = Self::build_texture_bind_group(
            &ctx,
            &texture_layout,
            &sampler,
            1,
            1,
            &[255, 255, 255, 255],
        );

        let instance_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("particle_instances"),
            size: (std::mem::size_of::<Vertex>() * 1024) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Ok(Self {
            ctx,
            target,
            pipeline,
            uniform_buffer,
            uniform_bind_group,
            texture_layout,
            sampler,
            textures: HashMap::new(),
            next_texture_id: 1,
            white,
            instance_buffer,
            instance_capacity: 1024,
        })
    }

    /// Uploads an RGBA8 sprite texture and returns its handle.
    pub fn upload_texture(
        &mut self,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> GpuResult<TextureHandle> {
        if width == 0 || height == 0 {
            return Err(GpuError::InvalidDimensions(format!(
                "texture dimensions must be > 0, got {}x{}",
                width, height
            )));
        }
        let expected = (width * height * 4) as usize;
        if rgba.len() != expected {
            return Err(GpuError::TextureError(format!(
                "expected {} bytes for {}x{} RGBA, got {}",
                expected,
                width,
                height,
                rgba.len()
            )));
        }

        let bind_group = Self::build_texture_bind_group(
            &self.ctx,
            &self.texture_layout,
            &self.sampler,
            width,
            height,
            rgba,
        );

        let handle = TextureHandle(self.next_texture_id);
        self.next_texture_id += 1;
        self.textures.insert(handle.0, bind_group);
        Ok(handle)
    }

    /// Returns the offscreen target.
    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    /// Reads the last rendered frame back as tightly packed RGBA bytes.
    pub fn read_to_rgba8(&self) -> Vec<u8> {
        self.target.read_to_rgba8(&self.ctx)
    }

    fn build_texture_bind_group(
        ctx: &GpuContext,
        layout: &wgpu::BindGroupLayout,
        sampler: &wgpu::Sampler,
        width: u32,
        height: u32,
        rgba: &[u8],
    ) -> wgpu::BindGroup {
        let texture = ctx.device.create_texture_with_data(
            &ctx.queue,
            &wgpu::TextureDescriptor {
                label: Some("particle_sprite"),
                size: wgpu::Extent3d {
                    width,
                    height,
                    depth_or_array_layers: 1,
                },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            rgba,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("particle_sprite_bind_group"),
            layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        })
    }

    /// Grows the instance buffer if the submission outgrew it.
    fn ensure_instance_capacity(&mut self, count: usize) {
        if count <= self.instance_capacity {
            return;
        }
        let capacity = count.next_power_of_two();
        self.instance_buffer = self.ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("particle_instances"),
            size: (std::mem::size_of::<Vertex>() * capacity) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.instance_capacity = capacity;
    }
}

impl RenderBackend for PointSpriteRenderer {
    fn draw(&mut self, submission: &DrawSubmission<'_>) -> Result<(), RenderError> {
        if let Some(handle) = submission.texture {
            if !self.textures.contains_key(&handle.0) {
                return Err(RenderError::UnknownTexture(handle.0));
            }
        }

        let uniforms = Uniforms {
            view: submission.view.to_cols_array_2d(),
            proj: submission.projection.to_cols_array_2d(),
            size: submission.particle_size,
            _pad: [0.0; 3],
        };
        self.ctx
            .queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let count = submission.vertices.len();
        self.ensure_instance_capacity(count);
        if count > 0 {
            self.ctx.queue.write_buffer(
                &self.instance_buffer,
                0,
                bytemuck::cast_slice(submission.vertices),
            );
        }

        let sprite = match submission.texture {
            Some(handle) => &self.textures[&handle.0],
            None => &self.white,
        };

        let view = self.target.create_view();
        let mut encoder = self
            .ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("particle_encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("particle_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            if count > 0 {
                pass.set_pipeline(&self.pipeline);
                pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                pass.set_bind_group(1, sprite, &[]);
                pass.set_vertex_buffer(
                    0,
                    self.instance_buffer
                        .slice(..(std::mem::size_of::<Vertex>() * count) as u64),
                );
                // 4 strip corners per sprite, one instance per particle.
                pass.draw(0..4, 0..count as u32);
            }
        }

        self.ctx.queue.submit(Some(encoder.finish()));
        Ok(())
    }
}

// WGSL shader expanding each particle vertex into a camera-facing quad.
const PARTICLE_SHADER: &str = r#"
struct Uniforms {
    view: mat4x4<f32>,
    proj: mat4x4<f32>,
    size: f32,
}

@group(0) @binding(0) var<uniform> uniforms: Uniforms;
@group(1) @binding(0) var sprite_texture: texture_2d<f32>;
@group(1) @binding(1) var sprite_sampler: sampler;

struct VertexInput {
    @builtin(vertex_index) corner_index: u32,
    @location(0) position: vec3<f32>,
    @location(1) diffuse: vec4<f32>,
    @location(2) tex0: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) uv: vec2<f32>,
}

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    // Unit-quad corners in triangle-strip order.
    var corners = array<vec2<f32>, 4>(
        vec2<f32>(-0.5, -0.5),
        vec2<f32>(0.5, -0.5),
        vec2<f32>(-0.5, 0.5),
        vec2<f32>(0.5, 0.5),
    );
    let corner = corners[in.corner_index];

    // Billboard: offset the corner in view space so quads always face
    // the camera.
    var view_pos = uniforms.view * vec4<f32>(in.position, 1.0);
    view_pos = vec4<f32>(view_pos.xy + corner * uniforms.size, view_pos.z, view_pos.w);

    var out: VertexOutput;
    out.clip = uniforms.proj * view_pos;
    out.color = in.diffuse;
    // tex0 is the sprite-center UV; corners fan out to the quad edges.
    out.uv = in.tex0 + corner;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(sprite_texture, sprite_sampler, in.uv) * in.color;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_layout_matches_pipeline_offsets() {
        // The pipeline hard-codes these; keep them honest.
        assert_eq!(std::mem::size_of::<Vertex>(), 36);
        assert_eq!(std::mem::offset_of!(Vertex, position), 0);
        assert_eq!(std::mem::offset_of!(Vertex, diffuse), 12);
        assert_eq!(std::mem::offset_of!(Vertex, tex0), 28);
    }

    #[test]
    fn test_uniforms_are_pod_sized_for_wgsl() {
        // Two mat4x4 + size + padding, 16-byte aligned for uniform use.
        assert_eq!(std::mem::size_of::<Uniforms>(), 144);
    }
}
