use models::heisenberg::heisenberg;
use num_complex::Complex64;
use tn::mpo::MpoTerm;
use tn::C64;

/// Contract a single MPO term into a dense `2^n x 2^n` matrix by brute force,
/// mirroring `mpo2mat` from the reference implementation's `mpo_tools.py`.
fn mpo_to_dense(term: &MpoTerm) -> Vec<Vec<C64>> {
    let n = term.len();
    let dim = 1usize << n;
    let mut mat = vec![vec![Complex64::new(0.0, 0.0); dim]; dim];

    for i in 0..dim {
        for j in 0..dim {
            // bond-index accumulator, start at the scalar boundary "1"
            let mut acc = vec![Complex64::new(1.0, 0.0)];
            for site in 0..n {
                let bi = (i >> (n - 1 - site)) & 1;
                let bj = (j >> (n - 1 - site)) & 1;
                match &term[site] {
                    None => {
                        // identity: only contributes when bi == bj, bond dim unchanged (1)
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
            mat[i][j] = acc.iter().copied().sum();
        }
    }
    mat
}

#[test]
fn heisenberg_dimer_matches_known_spectrum() {
    let mpo = heisenberg(2, 1.0, 1.0, 1.0);
    let term = &mpo.terms[0];
    let h = mpo_to_dense(term);

    // The N=2 isotropic Heisenberg Hamiltonian in the computational basis
    // |00>,|01>,|10>,|11> is exactly:
    //   diag(1/4, -1/4, -1/4, 1/4) plus an off-diagonal swap of weight 1/2
    // on the {|01>,|10>} block, giving eigenvalues {1/4,1/4,1/4,-3/4}.
    let expected = [
        [0.25, 0.0, 0.0, 0.0],
        [0.0, -0.25, 0.5, 0.0],
        [0.0, 0.5, -0.25, 0.0],
        [0.0, 0.0, 0.0, 0.25],
    ];
    for i in 0..4 {
        for j in 0..4 {
            let got = h[i][j];
            assert!(
                (got.re - expected[i][j]).abs() < 1e-10 && got.im.abs() < 1e-10,
                "H[{i}][{j}] = {got:?}, expected {}",
                expected[i][j]
            );
        }
    }
}
