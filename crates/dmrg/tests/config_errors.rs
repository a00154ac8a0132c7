use dmrg::{AlgorithmKind, InitialGuess, Polarity, Schedule, SolverConfig};

fn base() -> SolverConfig {
    SolverConfig {
        n: 6,
        d: 2,
        max_bond_dim: Schedule::PerStage(vec![4, 8]),
        tol: Schedule::Scalar(1e-8),
        max_iter: Schedule::Scalar(10),
        min_iter: Schedule::Scalar(0),
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

/// Configuration errors are reported before any computation (spec §7):
/// mismatched schedule-vector lengths.
#[test]
fn mismatched_schedule_lengths_are_rejected() {
    let mut config = base();
    config.tol = Schedule::PerStage(vec![1e-8, 1e-9, 1e-10]);
    let err = config.resolve().expect_err("mismatched schedule lengths must fail");
    assert!(matches!(err, dmrg::DmrgError::Configuration(_)));
}

/// `algorithm = exact` above the exact-diagonalization ceiling is a
/// configuration error, not an attempt that exhausts memory (spec §7).
#[test]
fn exact_above_ceiling_is_rejected() {
    let mut config = base();
    config.algorithm = AlgorithmKind::Exact;
    config.n = 20;
    config.exact_diag_ceiling = 12;
    let err = config.resolve().expect_err("N above the exact ceiling must fail");
    assert!(matches!(err, dmrg::DmrgError::Configuration(_)));
}

/// `target_state` must be a valid index into the carried states.
#[test]
fn target_state_out_of_range_is_rejected() {
    let mut config = base();
    config.n_states = 2;
    config.target_state = 5;
    let err = config.resolve().expect_err("out-of-range target_state must fail");
    assert!(matches!(err, dmrg::DmrgError::Configuration(_)));
}
