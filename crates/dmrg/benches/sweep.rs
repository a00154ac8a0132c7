use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use dmrg::{AlgorithmKind, InitialGuess, Polarity, Schedule, SolverConfig};
use models::ModelKind;

fn bench_heisenberg_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("heisenberg_sweep");

    for &n in &[8usize, 16, 24] {
        let model = ModelKind::Heisenberg { jx: 1.0, jy: 1.0, jz: 1.0 };
        group.bench_with_input(BenchmarkId::new("bond_20", n), &n, |b, &n| {
            b.iter(|| {
                let (mpo, _) = model.build(n);
                let config = SolverConfig {
                    n,
                    d: 2,
                    max_bond_dim: Schedule::Scalar(20),
                    tol: Schedule::Scalar(1e-8),
                    max_iter: Schedule::Scalar(4),
                    min_iter: Schedule::Scalar(1),
                    initial_guess: InitialGuess::Constant01,
                    algorithm: AlgorithmKind::Arnoldi,
                    polarity: Polarity::Minimize,
                    preserve_state: false,
                    orthonormalize: false,
                    n_states: 1,
                    target_state: 0,
                    gauge_site_save: None,
                    gauge_site_load: None,
                    persist_path: None,
                    noise_amplitude: None,
                    exact_diag_ceiling: 12,
                };
                dmrg::run(mpo, &config).expect("solve should not fail")
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_heisenberg_sweep);
criterion_main!(benches);
