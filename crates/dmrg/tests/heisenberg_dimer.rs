use dmrg::{InitialGuess, SolverConfig};
use models::ModelKind;

/// Boundary scenario 4 (spec §8): N=2 Heisenberg dimer singlet ground state,
/// energy = -3/4 * J with J=1.
#[test]
fn dimer_ground_energy_matches_singlet() {
    let model = ModelKind::Heisenberg { jx: 1.0, jy: 1.0, jz: 1.0 };
    let (mpo, _) = model.build(2);

    let config = SolverConfig {
        n: 2,
        d: 2,
        max_bond_dim: dmrg::Schedule::Scalar(8),
        tol: dmrg::Schedule::Scalar(1e-12),
        max_iter: dmrg::Schedule::Scalar(20),
        min_iter: dmrg::Schedule::Scalar(2),
        initial_guess: InitialGuess::Random(42),
        algorithm: dmrg::AlgorithmKind::Exact,
        polarity: dmrg::Polarity::Minimize,
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

    let report = dmrg::run(mpo, &config).expect("solve should not fail");
    assert!(
        (report.energy - (-0.75)).abs() < 1e-8,
        "energy = {}, expected -0.75",
        report.energy
    );
}
