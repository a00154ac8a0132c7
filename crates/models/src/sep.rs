use crate::operators::{annihilate, create, identity, occupation, scale, sub, vacancy};
use tn::mpo::MpoTerm;
use tn::{Mpo, Tensor4};
use num_complex::Complex64;

/// Tilted generator of the open asymmetric simple exclusion process, as used
/// to extract large-deviation current statistics via its extremal
/// eigenvalue. Hops to the right occur at rate `p`, to the left at rate `q`;
/// `s` tilts right/left hops by `exp(-s)`/`exp(s)` respectively. Boundary
/// rates: `alpha` injects a particle at the left end, `gamma` removes one
/// from the left end (reverse process), `beta` removes one from the right
/// end, `delta` injects one at the right end.
///
/// Built as a bond-dimension-6 finite-state-automaton MPO: one pass-through
/// channel, two pending two-site channels for the forward hop (gain/loss),
/// two for the backward hop, and a closing row/column.
pub fn sep(
    n: usize,
    alpha: f64,
    gamma: f64,
    beta: f64,
    delta: f64,
    p: f64,
    q: f64,
    s: f64,
) -> Mpo {
    let id = identity();
    let cm = annihilate();
    let cp = create();
    let nn = occupation();
    let vv = vacancy();

    let tilt_fwd = (-s).exp();
    let tilt_bwd = s.exp();

    let fwd_gain = scale(&cp, p * tilt_fwd);
    let fwd_loss = scale(&vv, -p);
    let bwd_gain = scale(&cm, q * tilt_bwd);
    let bwd_loss = scale(&nn, -q);

    let bulk = || {
        Tensor4::from_blocks(
            6,
            6,
            2,
            &[
                ((0, 0), id.clone()),
                ((1, 0), cm.clone()),
                ((2, 0), nn.clone()),
                ((3, 0), cp.clone()),
                ((4, 0), vv.clone()),
                ((5, 1), fwd_gain.clone()),
                ((5, 2), fwd_loss.clone()),
                ((5, 3), bwd_gain.clone()),
                ((5, 4), bwd_loss.clone()),
                ((5, 5), id.clone()),
            ],
        )
    };

    // Single-site boundary term for a reservoir injecting at rate `inj` and
    // extracting at rate `ext`: inj * (c+ - v) + ext * (c- - n).
    let boundary_term = |inj: f64, ext: f64| -> Vec<Complex64> {
        let mut out = vec![Complex64::new(0.0, 0.0); 4];
        let gain_in = scale(&cp, inj);
        let loss_in = scale(&vv, inj);
        let gain_out = scale(&cm, ext);
        let loss_out = scale(&nn, ext);
        let a = sub(&gain_in, &loss_in);
        let b = sub(&gain_out, &loss_out);
        for i in 0..4 {
            out[i] = a[i] + b[i];
        }
        out
    };

    let left = Tensor4::from_blocks(1, 6, 2, &[
        ((0, 0), boundary_term(alpha, gamma)),
        ((0, 1), cm.clone()),
        ((0, 2), nn.clone()),
        ((0, 3), cp.clone()),
        ((0, 4), vv.clone()),
        ((0, 5), id.clone()),
    ]);
    let right = Tensor4::from_blocks(6, 1, 2, &[
        ((0, 0), id),
        ((1, 0), fwd_gain),
        ((2, 0), fwd_loss),
        ((3, 0), bwd_gain),
        ((4, 0), bwd_loss),
        ((5, 0), boundary_term(delta, beta)),
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

/// Totally asymmetric exclusion process: a one-directional SEP special case
/// with injection `alpha` at the left, extraction `beta` at the right, unit
/// forward hop rate and no reverse process.
pub fn tasep(n: usize, alpha: f64, beta: f64, s: f64) -> Mpo {
    sep(n, alpha, 0.0, beta, 0.0, 1.0, 0.0, s)
}
