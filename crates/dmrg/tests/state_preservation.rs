use dmrg::{AlgorithmKind, InitialGuess, Polarity, Schedule, SolverConfig};
use models::ModelKind;

/// `preserve_state` (spec §4.4) must not change the converged ground energy
/// for a well-separated ground state: the overlap-based lock should simply
/// find the same extremal vector the free-mode solver does.
#[test]
fn preserve_state_does_not_change_converged_ground_energy() {
    let n = 6;
    let model = ModelKind::Heisenberg { jx: 1.0, jy: 1.0, jz: 1.0 };

    let free_config = SolverConfig {
        n,
        d: 2,
        max_bond_dim: Schedule::Scalar(12),
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
    };
    let mut preserve_config = free_config.clone();
    preserve_config.preserve_state = true;

    let (mpo_a, _) = model.build(n);
    let (mpo_b, _) = model.build(n);
    let free = dmrg::run(mpo_a, &free_config).expect("free-mode solve should not fail");
    let preserved = dmrg::run(mpo_b, &preserve_config).expect("preserve-mode solve should not fail");

    assert!(
        (free.energy - preserved.energy).abs() < 1e-6,
        "free energy {} vs preserve-state energy {}",
        free.energy,
        preserved.energy
    );
}

/// `n_states > 1` with `orthonormalize` on should converge without error and
/// report a non-negative gap to the first excited state (spec §6).
#[test]
fn multi_state_rdm_path_reports_non_negative_gap() {
    let n = 6;
    let model = ModelKind::Heisenberg { jx: 1.0, jy: 1.0, jz: 1.0 };
    let (mpo, _) = model.build(n);

    let config = SolverConfig {
        n,
        d: 2,
        max_bond_dim: Schedule::Scalar(10),
        tol: Schedule::Scalar(1e-8),
        max_iter: Schedule::Scalar(20),
        min_iter: Schedule::Scalar(2),
        initial_guess: InitialGuess::Random(7),
        algorithm: AlgorithmKind::Arnoldi,
        polarity: Polarity::Minimize,
        preserve_state: false,
        orthonormalize: true,
        n_states: 2,
        target_state: 0,
        gauge_site_save: None,
        gauge_site_load: None,
        persist_path: None,
        noise_amplitude: None,
        exact_diag_ceiling: 12,
    };

    let report = dmrg::run(mpo, &config).expect("multi-state solve should not fail");
    assert_eq!(report.excited_energies.len(), 2);
    let gap = report.gap.expect("gap should be reported for n_states > 1");
    assert!(gap >= -1e-8, "gap should be non-negative, got {gap}");
}
