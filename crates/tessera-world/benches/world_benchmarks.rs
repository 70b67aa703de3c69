//! World throughput benchmarks.
//!
//! - create/destroy churn through the arena and handle table
//! - one update pass over a full world
//! - template-driven creation through the reflection registry
//!
//! Run with: `cargo bench --bench world_benchmarks`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;

use tessera_world::prelude::*;

// ---------------------------------------------------------------------------
// Benchmark component types
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Spin {
    angle: f32,
    speed: f32,
}

tessera_meta::reflect_class!(Spin as "Spin" { angle => "Angle", speed => "Speed" });

impl Component for Spin {
    fn update(&mut self, _ctx: &mut ComponentContext<'_>, delta_time: f32) {
        self.angle = (self.angle + self.speed * delta_time) % 360.0;
    }
}

fn install_registry() {
    static INSTALLED: std::sync::OnceLock<()> = std::sync::OnceLock::new();
    INSTALLED.get_or_init(|| {
        let mut registry = tessera_meta::MetaRegistry::new();
        tessera_world::register_builtins(&mut registry).register::<Spin>();
        registry.install().expect("registry installed once");
    });
}

fn spin_template() -> EntityTemplate {
    EntityTemplate::new()
        .with_component("TransformComponent", json!({ "Position": { "x": 1.0, "y": 2.0, "z": 3.0 } }))
        .with_component("Spin", json!({ "Speed": 90.0 }))
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_create_destroy_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_destroy_churn");
    for &count in &[100usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            let mut world = World::new();
            world.initialize(count);
            let mut handles = Vec::with_capacity(count);
            b.iter(|| {
                for _ in 0..count {
                    handles.push(world.create("", "churn"));
                }
                for handle in handles.drain(..) {
                    world.destroy(handle);
                }
                black_box(world.entity_count());
            });
        });
    }
    group.finish();
}

fn bench_update_pass(c: &mut Criterion) {
    install_registry();
    let mut group = c.benchmark_group("update_pass");
    for &count in &[100usize, 1_000, 10_000] {
        let mut world = World::new();
        world.register_component::<Spin>();
        world.initialize(count);
        let template = spin_template();
        for _ in 0..count {
            world.create_from_template(&template, "spinner");
        }
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| world.update(black_box(1.0 / 60.0)));
        });
    }
    group.finish();
}

fn bench_template_create(c: &mut Criterion) {
    install_registry();
    let template = spin_template();
    c.bench_function("template_create_1000", |b| {
        let mut world = World::new();
        world.register_component::<Spin>();
        world.initialize(1_000);
        b.iter(|| {
            for _ in 0..1_000 {
                black_box(world.create_from_template(&template, "spinner"));
            }
            for handle in world.live_handles() {
                world.destroy(handle);
            }
        });
    });
}

criterion_group!(
    benches,
    bench_create_destroy_churn,
    bench_update_pass,
    bench_template_create
);
criterion_main!(benches);
