// Solver throughput: equation building, elimination, and candidate search.
//
// `exact_unique` measures the common case (kernel 0). `exact_kernel_12`
// forces a 4096-candidate search, once on the calling thread and once on
// the rayon pool.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use shiftback_prng::GeneratorState;
use shiftback_solver::{Observation, Solver, SolverConfig};

fn exact_outputs(seed: u64, n: usize) -> Vec<Observation> {
    let mut s = GeneratorState::from_seed(seed);
    (0..n)
        .filter_map(|_| {
            let v = s.to_double();
            s = s.forward();
            Observation::exact(v).ok()
        })
        .collect()
}

fn bench_exact_unique(c: &mut Criterion) {
    let mut group = c.benchmark_group("exact_unique");
    let solver = Solver::default();
    for n in [4usize, 10, 32] {
        let obs = exact_outputs(n as u64, n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &obs, |b, obs| {
            b.iter(|| black_box(solver.solve(obs)))
        });
    }
    group.finish();
}

fn bench_kernel_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("exact_kernel_12");
    let obs = exact_outputs(7, 3);
    for parallel in [false, true] {
        let solver = Solver::new(SolverConfig {
            parallel_verify: parallel,
            parallel_threshold: 1,
            ..SolverConfig::default()
        });
        let label = if parallel { "rayon" } else { "sequential" };
        group.bench_function(label, |b| b.iter(|| black_box(solver.solve(&obs))));
    }
    group.finish();
}

fn bench_fresh_tracker(c: &mut Criterion) {
    let obs = exact_outputs(11, 64);
    c.bench_function("fresh_tracker_64", |b| {
        b.iter(|| black_box(Solver::default().solve(&obs)))
    });
}

criterion_group!(
    benches,
    bench_exact_unique,
    bench_kernel_search,
    bench_fresh_tracker
);
criterion_main!(benches);
