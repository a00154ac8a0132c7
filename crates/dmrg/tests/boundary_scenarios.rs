use dmrg::{AlgorithmKind, InitialGuess, Polarity, Schedule, SolverConfig};
use models::ModelKind;
use num_complex::Complex64;
use tn::mpo::MpoTerm;
use tn::C64;

fn base_config(n: usize, max_bond: usize) -> SolverConfig {
    SolverConfig {
        n,
        d: 2,
        max_bond_dim: Schedule::Scalar(max_bond),
        tol: Schedule::Scalar(1e-10),
        max_iter: Schedule::Scalar(30),
        min_iter: Schedule::Scalar(2),
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
    }
}

/// Brute-force dense contraction of a single MPO term, mirroring `mpo2mat`
/// from the reference implementation's comparator tooling. Independent of
/// the sweep engine; used as a ground-truth baseline for small chains.
fn mpo_to_dense(term: &MpoTerm) -> faer::Mat<C64> {
    let n = term.len();
    let dim = 1usize << n;
    let mut mat = faer::Mat::<C64>::zeros(dim, dim);

    for i in 0..dim {
        for j in 0..dim {
            let mut acc = vec![Complex64::new(1.0, 0.0)];
            for site in 0..n {
                let bi = (i >> (n - 1 - site)) & 1;
                let bj = (j >> (n - 1 - site)) & 1;
                match &term[site] {
                    None => {
                        if bi != bj {
                            acc = vec![Complex64::new(0.0, 0.0)];
                        }
                    }
                    Some(w) => {
                        let mut next = vec![Complex64::new(0.0, 0.0); w.br];
                        for bl in 0..w.bl {
                            if bl >= acc.len() {
                                continue;
                            }
                            for br in 0..w.br {
                                next[br] += acc[bl] * w.get(bl, br, bi, bj);
                            }
                        }
                        acc = next;
                    }
                }
            }
            mat.write(i, j, acc.iter().copied().sum());
        }
    }
    mat
}

/// Boundary scenario 1 (spec §8, scaled down from N=8 to N=5 to keep the
/// dense baseline's 32x32 diagonalization cheap): a tilted TASEP generator's
/// extremal eigenvalue under `algorithm=exact, polarity=maximize` must match
/// an independent brute-force dense diagonalization of the same MPO.
#[test]
fn tasep_exact_matches_dense_baseline() {
    let n = 5;
    let model = ModelKind::Tasep { alpha: 0.35, beta: 2.0 / 3.0, s: -10.0 };
    let (mpo, _) = model.build(n);

    let dense = mpo_to_dense(&mpo.terms[0]);
    let (vals, _) = tn::linalg::dense_eig(&dense);
    let baseline = vals
        .iter()
        .map(|v| v.re)
        .fold(f64::NEG_INFINITY, f64::max);

    let mut config = base_config(n, 1 << n);
    config.algorithm = AlgorithmKind::Exact;
    config.polarity = Polarity::Maximize;

    let report = dmrg::run(mpo, &config).expect("solve should not fail");
    assert!(
        (report.energy - baseline).abs() < 1e-6,
        "solver energy {} vs dense baseline {}",
        report.energy,
        baseline
    );
}

/// Boundary scenario 3 (spec §8), adapted to the open (non-periodic) chain
/// this implementation builds -- periodic DMRG is an explicit Non-goal, so
/// the periodic-boundary reference value does not apply here. For J=0 every
/// site decouples and the ground energy of -h*X is exactly -h per site.
#[test]
fn ising_zero_coupling_matches_decoupled_sites() {
    let n = 10;
    let model = ModelKind::Ising { h: 1.0, j: 0.0 };
    let (mpo, _) = model.build(n);

    let mut config = base_config(n, 10);
    config.max_bond_dim = Schedule::PerStage(vec![10, 20]);
    config.tol = Schedule::Scalar(1e-5);

    let report = dmrg::run(mpo, &config).expect("solve should not fail");
    assert!(
        (report.energy - (-(n as f64))).abs() < 1e-4,
        "energy = {}, expected {}",
        report.energy,
        -(n as f64)
    );
}

/// Boundary scenario 6 (spec §8, N reduced from 12 to 8 to keep the test
/// fast): per-stage energies along a growing bond-dimension schedule must be
/// non-increasing.
#[test]
fn bond_schedule_energies_are_non_increasing() {
    let n = 8;
    let model = ModelKind::Heisenberg { jx: 1.0, jy: 1.0, jz: 1.0 };

    let mut prev_energy = f64::INFINITY;
    for &m in &[2usize, 4, 8, 16] {
        let (mpo, _) = model.build(n);
        let config = base_config(n, m);
        let report = dmrg::run(mpo, &config).expect("solve should not fail");
        assert!(
            report.energy <= prev_energy + 1e-6,
            "energy increased going to bond dim {}: {} > {}",
            m,
            report.energy,
            prev_energy
        );
        prev_energy = report.energy;
    }
}
