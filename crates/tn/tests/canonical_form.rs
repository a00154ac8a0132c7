use tn::linalg::left_isometry_error;
use tn::{Mps, SeedPolicy, Truncation, C64};

#[test]
fn right_canonicalize_leaves_isometries_on_every_site_but_zero() {
    let mut mps = Mps::generate(6, 2, 8, SeedPolicy::Random(7));
    mps.right_canonicalize(false).expect("canonicalization should not hit isometry errors");
    assert_eq!(mps.gauge, 0);

    for i in 1..mps.n() {
        let m = mps.sites[i].to_matrix_right_grouped();
        // right-canonical: sum_sigma T T^dagger = I on the left bond, i.e.
        // the (dl, dp*dr) reshape has orthonormal ROWS.
        let mt = m.transpose().to_owned();
        let err = left_isometry_error(&mt);
        assert!(err < 1e-6, "site {i} right-isometry residual {err}");
    }
}

#[test]
fn move_gauge_right_then_left_round_trips_bond_dimension() {
    let mut mps = Mps::generate(5, 2, 4, SeedPolicy::Constant(0.1));
    mps.right_canonicalize(false).unwrap();
    let trunc = Truncation::new(4, 1e-12);

    for i in 0..4 {
        mps.move_gauge_right(i, trunc).unwrap();
    }
    assert_eq!(mps.gauge, 4);

    for i in (1..5).rev() {
        mps.move_gauge_left(i, trunc).unwrap();
    }
    assert_eq!(mps.gauge, 0);
}

#[test]
fn increase_bond_dimension_preserves_existing_block() {
    let mut mps = Mps::generate(4, 2, 2, SeedPolicy::Ones);
    let before = mps.sites.clone();

    let mut rng = rng::ONDRng::new(b"grow-test");
    mps.increase_bond_dimension(2, 6, None, &mut rng);

    for (site, old) in before.iter().enumerate() {
        let grown = &mps.sites[site];
        for l in 0..old.dl {
            for p in 0..old.dp {
                for r in 0..old.dr {
                    assert_eq!(grown.get(l, p, r), old.get(l, p, r));
                }
            }
        }
    }
    assert_eq!(mps.sites[0].dr, 2usize.min(6));
}

/// `state2mps` round-trip (spec §8): build an MPS from a dense state vector
/// on N <= 12 sites, recontract, recover psi to 1e-10.
#[test]
fn from_state_vector_then_to_state_vector_recovers_psi() {
    let d = 2usize;
    let n = 6usize;
    let mut rng = rng::ONDRng::new(b"state2mps-test");

    let dim = d.pow(n as u32);
    let mut psi = Vec::with_capacity(dim);
    for i in 0..dim {
        let ctx = (i as u64).to_be_bytes();
        psi.push(C64::new(rng.next_f64(&ctx) - 0.5, rng.next_f64(&ctx) - 0.25));
    }
    let norm: f64 = psi.iter().map(|c| c.norm_sqr()).sum::<f64>().sqrt();
    for c in psi.iter_mut() {
        *c /= norm;
    }

    let mps = Mps::from_state_vector(d, n, &psi).expect("state2mps should not fail");
    let recovered = mps.to_state_vector();

    assert_eq!(recovered.len(), psi.len());
    for (a, b) in psi.iter().zip(recovered.iter()) {
        assert!((a - b).norm() < 1e-10, "state vector mismatch: {a} vs {b}");
    }
}
