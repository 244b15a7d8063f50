use criterion::{criterion_group, criterion_main, Criterion};
use lag_core::worker::WorkerCtx;
use lag_core::SlabLayout;
use lag_mesh::grid::RealGrid;
use lag_mesh::transform::SpectralTransform;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn sample_grid(nmesh: usize) -> RealGrid {
    let layout = SlabLayout::for_worker(0, 1, nmesh);
    let mut rng = StdRng::seed_from_u64(17);
    let data: Vec<f32> = (0..nmesh * nmesh * nmesh)
        .map(|_| rng.gen_range(-1.0f32..1.0))
        .collect();
    RealGrid::from_vec(layout, data).unwrap()
}

fn bench_forward_backward(c: &mut Criterion) {
    let ctx = WorkerCtx::solo();
    let nmesh = 32;
    let grid = sample_grid(nmesh);
    let transform = SpectralTransform::new(&ctx, nmesh).unwrap();

    c.bench_function("forward_32", |b| {
        b.iter(|| transform.forward(&grid, true).unwrap())
    });

    let spectrum = transform.forward(&grid, true).unwrap();
    c.bench_function("backward_32", |b| {
        b.iter(|| transform.backward(&spectrum).unwrap())
    });
}

criterion_group!(benches, bench_forward_backward);
criterion_main!(benches);
