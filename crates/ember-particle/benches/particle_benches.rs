//! Benchmarks for particle simulation and vertex generation.

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use ember_particle::{EffectConfig, ParticleEffect, SphereEmitter};

fn effect_with_capacity(capacity: usize) -> ParticleEffect {
    let mut effect = ParticleEffect::new(EffectConfig {
        capacity,
        ..Default::default()
    })
    .unwrap();
    effect.set_color_interpolator(ember_easing::palettes::fireworks());
    effect.set_emitter(Arc::new(SphereEmitter::default()));
    effect.emit_particles().unwrap();
    effect
}

fn bench_update(c: &mut Criterion) {
    c.bench_function("update_10k_particles", |b| {
        let mut effect = effect_with_capacity(10_000);
        b.iter(|| {
            effect.update(0.016).unwrap();
            black_box(effect.vertices());
        })
    });

    c.bench_function("update_100k_particles", |b| {
        let mut effect = effect_with_capacity(100_000);
        b.iter(|| {
            effect.update(0.016).unwrap();
            black_box(effect.vertices());
        })
    });
}

fn bench_build_vertex_buffer(c: &mut Criterion) {
    c.bench_function("build_vertex_buffer_100k", |b| {
        let mut effect = effect_with_capacity(100_000);
        effect.update(0.016).unwrap();
        b.iter(|| {
            effect.build_vertex_buffer();
            black_box(effect.vertices());
        })
    });
}

criterion_group!(benches, bench_update, bench_build_vertex_buffer);
criterion_main!(benches);
