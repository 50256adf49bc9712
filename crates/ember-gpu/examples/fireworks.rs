//! Offscreen fireworks demo.
//!
//! Simulates the classic fireworks effect on the CPU, renders frames
//! headlessly through the wgpu backend, and exports a handful of PNG
//! snapshots.
//!
//! Run with: `cargo run --example fireworks`

use std::sync::Arc;

use glam::Mat4;

use ember_gpu::{GpuContext, PointSpriteRenderer};
use ember_particle::{Camera, EffectConfig, ParticleBuffer, ParticleEffect, SphereEmitter};

/// Pivot camera: orbits the origin at a fixed distance and pitch.
struct OrbitCamera {
    distance: f32,
    pitch_degrees: f32,
    aspect: f32,
}

impl Camera for OrbitCamera {
    fn view(&self) -> Mat4 {
        Mat4::from_translation(glam::Vec3::new(0.0, 0.0, -self.distance))
            * Mat4::from_rotation_x(self.pitch_degrees.to_radians())
    }

    fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(60.0_f32.to_radians(), self.aspect, 0.1, 1000.0)
    }
}

/// Builds a soft circular sprite: white with a radial alpha falloff.
fn soft_sprite(size: u32) -> Vec<u8> {
    let mut rgba = Vec::with_capacity((size * size * 4) as usize);
    let center = (size as f32 - 1.0) / 2.0;
    for y in 0..size {
        for x in 0..size {
            let dx = (x as f32 - center) / center;
            let dy = (y as f32 - center) / center;
            let falloff = (1.0 - (dx * dx + dy * dy).sqrt()).clamp(0.0, 1.0);
            let alpha = (falloff * falloff * 255.0) as u8;
            rgba.extend_from_slice(&[255, 255, 255, alpha]);
        }
    }
    rgba
}

fn save_frame(renderer: &PointSpriteRenderer, width: u32, height: u32, path: &str) {
    let pixels = renderer.read_to_rgba8();
    match image::RgbaImage::from_raw(width, height, pixels) {
        Some(frame) => match frame.save(path) {
            Ok(_) => println!("Wrote {}", path),
            Err(e) => eprintln!("Failed to write {}: {}", path, e),
        },
        None => eprintln!("Frame buffer did not match {}x{}", width, height),
    }
}

fn main() {
    println!("Fireworks particle effect demo");

    let ctx = match GpuContext::new() {
        Ok(ctx) => Arc::new(ctx),
        Err(e) => {
            eprintln!("GPU unavailable: {}", e);
            return;
        }
    };
    println!("Rendering on {}", ctx.device_info());

    let width = 512u32;
    let height = 512u32;
    let mut renderer = match PointSpriteRenderer::new(ctx, width, height) {
        Ok(renderer) => renderer,
        Err(e) => {
            eprintln!("Failed to create renderer: {}", e);
            return;
        }
    };

    let sprite = soft_sprite(32);
    let sprite_handle = renderer
        .upload_texture(32, 32, &sprite)
        .expect("sprite dimensions are fixed");

    let mut effect = ParticleEffect::new(EffectConfig {
        capacity: ParticleBuffer::DEFAULT_CAPACITY,
        force: glam::Vec3::new(0.0, -9.81, 0.0),
        lifetime_min: 3.0,
        lifetime_max: 5.0,
        particle_size: 1.0,
        seed: 42,
    })
    .expect("demo config is valid");

    effect.set_color_interpolator(ember_easing::palettes::fireworks());
    effect.set_emitter(Arc::new(SphereEmitter {
        radius: 1.0,
        speed_min: 10.0,
        speed_max: 20.0,
        ..Default::default()
    }));
    effect.set_camera(Arc::new(OrbitCamera {
        distance: 100.0,
        pitch_degrees: 40.0,
        aspect: width as f32 / height as f32,
    }));
    effect.set_texture(sprite_handle);

    effect.emit_particles().expect("emitter is bound");
    println!(
        "Simulating {} particles...",
        ParticleBuffer::DEFAULT_CAPACITY
    );

    // Host loop: update then render, once per simulated frame.
    let dt = 1.0 / 60.0;
    for frame in 1..=150u32 {
        effect.update(dt).expect("emitter is bound and dt is valid");
        effect.render(&mut renderer).expect("camera is bound");

        if frame % 30 == 0 {
            save_frame(&renderer, width, height, &format!("fireworks_{:03}.png", frame));
        }
    }

    // Paused: rebuild the vertex buffer without advancing the simulation
    // and redraw the same state.
    effect.build_vertex_buffer();
    effect.render(&mut renderer).expect("camera is bound");
    save_frame(&renderer, width, height, "fireworks_paused.png");
}
