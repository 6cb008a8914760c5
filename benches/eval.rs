use criterion::{
    black_box, criterion_group, criterion_main, BenchmarkId, Criterion,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use polylut::{FunctionContainer, LutParameters, Registry};

const SEED: u64 = 12345;
const ITERATIONS: usize = 10000;

fn benchmark_eval(c: &mut Criterion) {
    let mut group = c.benchmark_group("Table evaluation");

    let fc = FunctionContainer::new(|x: f64| x.sin());
    let registry = Registry::with_default_families();

    let mut rng = StdRng::seed_from_u64(SEED);
    let inputs: Vec<f64> = (0..ITERATIONS)
        .map(|_| rng.random_range(0.0..6.28))
        .collect();

    for step in [0.1, 0.01, 0.001] {
        let lut = registry
            .build(
                "UniformCubicInterpolation",
                &fc,
                LutParameters {
                    min_arg: 0.0,
                    max_arg: 6.28,
                    step_size: step,
                },
            )
            .unwrap();

        group.bench_function(BenchmarkId::new("cubic", step), |b| {
            let mut i = 0;
            b.iter(|| {
                i = (i + 1) % ITERATIONS;
                black_box(lut.eval(black_box(inputs[i])))
            });
        });
    }

    group.bench_function("direct sin", |b| {
        let mut i = 0;
        b.iter(|| {
            i = (i + 1) % ITERATIONS;
            black_box(black_box(inputs[i]).sin())
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_eval);
criterion_main!(benches);
