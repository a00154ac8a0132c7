use crate::operators::{identity, spin_x, spin_y, spin_z, scale};
use tn::mpo::MpoTerm;
use tn::{Mpo, Tensor4};

/// Heisenberg chain: H = sum_i (Jx Sx_i Sx_{i+1} + Jy Sy_i Sy_{i+1} + Jz Sz_i Sz_{i+1}),
/// built as the standard bond-dimension-5 MPO.
pub fn heisenberg(n: usize, jx: f64, jy: f64, jz: f64) -> Mpo {
    let id = identity();
    let sx = spin_x();
    let sy = spin_y();
    let sz = spin_z();

    let bulk = || {
        Tensor4::from_blocks(
            5,
            5,
            2,
            &[
                ((0, 0), id.clone()),
                ((1, 0), sx.clone()),
                ((2, 0), sy.clone()),
                ((3, 0), sz.clone()),
                ((4, 1), scale(&sx, jx)),
                ((4, 2), scale(&sy, jy)),
                ((4, 3), scale(&sz, jz)),
                ((4, 4), id.clone()),
            ],
        )
    };

    let left = Tensor4::from_blocks(1, 5, 2, &[
        ((0, 1), scale(&sx, jx)),
        ((0, 2), scale(&sy, jy)),
        ((0, 3), scale(&sz, jz)),
        ((0, 4), id.clone()),
    ]);
    let right = Tensor4::from_blocks(5, 1, 2, &[
        ((0, 0), id),
        ((1, 0), sx),
        ((2, 0), sy),
        ((3, 0), sz),
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

/// Uniform isotropic Heisenberg chain (Jx = Jy = Jz = j).
pub fn heisenberg_uniform(n: usize, j: f64) -> Mpo {
    heisenberg(n, j, j, j)
}
