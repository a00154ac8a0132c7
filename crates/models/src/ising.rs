use crate::operators::{identity, pauli_x, pauli_z, scale};
use tn::mpo::MpoTerm;
use tn::{Mpo, Tensor4};

/// Transverse-field Ising chain: H = -J * sum_i Z_i Z_{i+1} - h * sum_i X_i,
/// built as the standard bond-dimension-3 finite-state-automaton MPO
/// (Schollwöck's DMRG review, eq. 191-193).
pub fn ising(n: usize, h: f64, j: f64) -> Mpo {
    let id = identity();
    let z = pauli_z();
    let x = pauli_x();
    let minus_h_x = scale(&x, -h);
    let minus_j_z = scale(&z, -j);

    let bulk = || {
        Tensor4::from_blocks(
            3,
            3,
            2,
            &[
                ((0, 0), id.clone()),
                ((1, 0), z.clone()),
                ((2, 0), minus_h_x.clone()),
                ((2, 1), minus_j_z.clone()),
                ((2, 2), id.clone()),
            ],
        )
    };

    let left = Tensor4::from_blocks(1, 3, 2, &[
        ((0, 0), minus_h_x.clone()),
        ((0, 1), minus_j_z.clone()),
        ((0, 2), id.clone()),
    ]);
    let right = Tensor4::from_blocks(3, 1, 2, &[
        ((0, 0), id),
        ((1, 0), z),
        ((2, 0), minus_h_x),
    ]);

    let mut term: MpoTerm = Vec::with_capacity(n);
    term.push(Some(left));
    for _ in 1..n.saturating_sub(1) {
        term.push(Some(bulk()));
    }
    if n > 1 {
        term.push(Some(right));
    }
    Mpo::single(term)
}
