use dmrg::persist::{load, save};
use dmrg::{AlgorithmKind, InitialGuess, Polarity, Schedule, SolverConfig};
use models::ModelKind;
use tn::{Mps, SeedPolicy};

/// Round-trip law (spec §8): save then load an MPS recovers tensors to
/// machine precision and preserves the gauge site.
#[test]
fn save_then_load_round_trips_mps() {
    let mut mps = Mps::generate(5, 2, 6, SeedPolicy::Random(11));
    mps.right_canonicalize(false).unwrap();

    let dir = std::env::temp_dir();
    let path = dir.join(format!("dmrg-test-snapshot-{}.json", std::process::id()));
    save(&mps, &path).expect("save should succeed");
    let loaded = load(&path).expect("load should succeed");
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.gauge, mps.gauge);
    assert_eq!(loaded.sites.len(), mps.sites.len());
    for (a, b) in mps.sites.iter().zip(loaded.sites.iter()) {
        assert_eq!(a.dl, b.dl);
        assert_eq!(a.dp, b.dp);
        assert_eq!(a.dr, b.dr);
        for (x, y) in a.data.iter().zip(b.data.iter()) {
            assert!((x - y).norm() < 1e-12, "tensor data mismatch after round trip");
        }
    }
}

/// `persist_path` + `gauge_site_load` resumes a run from a saved snapshot
/// (spec §6 "where to park the gauge between stages") rather than starting
/// from a fresh random guess.
#[test]
fn resuming_from_a_saved_snapshot_does_not_fail() {
    let n = 6;
    let model = ModelKind::Heisenberg { jx: 1.0, jy: 1.0, jz: 1.0 };

    let dir = std::env::temp_dir();
    let path = dir.join(format!("dmrg-test-resume-{}.json", std::process::id()));

    let (mpo_a, _) = model.build(n);
    let first_config = SolverConfig {
        n,
        d: 2,
        max_bond_dim: Schedule::Scalar(8),
        tol: Schedule::Scalar(1e-8),
        max_iter: Schedule::Scalar(10),
        min_iter: Schedule::Scalar(1),
        initial_guess: InitialGuess::Constant01,
        algorithm: AlgorithmKind::Arnoldi,
        polarity: Polarity::Minimize,
        preserve_state: false,
        orthonormalize: false,
        n_states: 1,
        target_state: 0,
        gauge_site_save: Some(3),
        gauge_site_load: None,
        persist_path: Some(path.to_string_lossy().into_owned()),
        noise_amplitude: None,
        exact_diag_ceiling: 12,
    };
    let first = dmrg::run(mpo_a, &first_config).expect("first solve should not fail");

    let (mpo_b, _) = model.build(n);
    let mut resume_config = first_config.clone();
    resume_config.gauge_site_load = Some(3);
    let resumed = dmrg::run(mpo_b, &resume_config).expect("resumed solve should not fail");

    std::fs::remove_file(&path).ok();
    assert!(
        (first.energy - resumed.energy).abs() < 1e-6,
        "resumed energy {} should match the already-converged snapshot's energy {}",
        resumed.energy,
        first.energy
    );
}
