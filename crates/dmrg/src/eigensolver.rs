use crate::config::AlgorithmKind;
use crate::environment::EnvTensor;
use faer::Mat;
use tn::{Tensor3, Tensor4, C64};

/// Implicit local Hamiltonian action `H|x>`, summed across MPO terms, never
/// materializing the dense local operator (spec §5 "implicit matvec").
pub fn apply_h(
    l_envs: &[EnvTensor],
    w_sites: &[Option<&Tensor4>],
    r_envs: &[EnvTensor],
    x: &Tensor3,
) -> Tensor3 {
    let mut y = Tensor3::zeros(x.dl, x.dp, x.dr);
    for t in 0..l_envs.len() {
        let l = &l_envs[t];
        let r = &r_envs[t];
        match w_sites[t] {
            Some(w) => {
                for lp in 0..x.dl {
                    for sp in 0..x.dp {
                        for rp in 0..x.dr {
                            let mut acc = C64::new(0.0, 0.0);
                            for wl in 0..w.bl {
                                for l0 in 0..x.dl {
                                    let lval = l.get(lp, wl, l0);
                                    if lval == C64::new(0.0, 0.0) {
                                        continue;
                                    }
                                    for wr in 0..w.br {
                                        for s in 0..x.dp {
                                            let wval = w.get(wl, wr, sp, s);
                                            if wval == C64::new(0.0, 0.0) {
                                                continue;
                                            }
                                            for r0 in 0..x.dr {
                                                acc += lval
                                                    * wval
                                                    * x.get(l0, s, r0)
                                                    * r.get(rp, wr, r0);
                                            }
                                        }
                                    }
                                }
                            }
                            y.set(lp, sp, rp, y.get(lp, sp, rp) + acc);
                        }
                    }
                }
            }
            None => {
                for lp in 0..x.dl {
                    for sp in 0..x.dp {
                        for rp in 0..x.dr {
                            let mut acc = C64::new(0.0, 0.0);
                            for l0 in 0..x.dl {
                                let lval = l.get(lp, 0, l0);
                                if lval == C64::new(0.0, 0.0) {
                                    continue;
                                }
                                for r0 in 0..x.dr {
                                    acc += lval * x.get(l0, sp, r0) * r.get(rp, 0, r0);
                                }
                            }
                            y.set(lp, sp, rp, y.get(lp, sp, rp) + acc);
                        }
                    }
                }
            }
        }
    }
    y
}

fn flatten(x: &Tensor3) -> Vec<C64> {
    x.data.clone()
}

fn unflatten(v: &[C64], dl: usize, dp: usize, dr: usize) -> Tensor3 {
    Tensor3 {
        data: v.to_vec(),
        dl,
        dp,
        dr,
    }
}

fn dot(a: &[C64], b: &[C64]) -> C64 {
    a.iter().zip(b).map(|(x, y)| x.conj() * y).sum()
}

fn norm(a: &[C64]) -> f64 {
    dot(a, a).re.sqrt()
}

fn axpy(out: &mut [C64], alpha: C64, x: &[C64]) {
    for (o, xi) in out.iter_mut().zip(x) {
        *o += alpha * xi;
    }
}

/// Apply the implicit matvec to a flat vector, respecting the active
/// tensor's shape. `sign` is `-1.0` under `Polarity::Maximize` so every
/// Krylov/exact step diagonalizes `-H` and finds its smallest eigenvalue,
/// which is `H`'s largest (spec §9).
fn matvec(
    l_envs: &[EnvTensor],
    w_sites: &[Option<&Tensor4>],
    r_envs: &[EnvTensor],
    dl: usize,
    dp: usize,
    dr: usize,
    sign: f64,
    v: &[C64],
) -> Vec<C64> {
    let x = unflatten(v, dl, dp, dr);
    let mut y = flatten(&apply_h(l_envs, w_sites, r_envs, &x));
    if sign != 1.0 {
        for yi in y.iter_mut() {
            *yi *= sign;
        }
    }
    y
}

/// Build an `m`-dimensional Krylov subspace by Arnoldi iteration (Gram-Schmidt
/// orthogonalized, Hermitian in practice so this reduces to Lanczos), project
/// the implicit operator onto it, and diagonalize the small dense projection.
/// Mirrors the iterative-eigensolver-on-a-matvec pattern used throughout the
/// reference solver's `diag_tools`.
/// Diagonal of the (signed) local H, `H[i,i] = <e_i|H|e_i>`, used only by the
/// Davidson preconditioner.
fn local_diagonal(
    l_envs: &[EnvTensor],
    w_sites: &[Option<&Tensor4>],
    r_envs: &[EnvTensor],
    dl: usize,
    dp: usize,
    dr: usize,
    sign: f64,
) -> Vec<f64> {
    let dim = dl * dp * dr;
    let mut diag = Vec::with_capacity(dim);
    for i in 0..dim {
        let mut e_i = vec![C64::new(0.0, 0.0); dim];
        e_i[i] = C64::new(1.0, 0.0);
        let col = matvec(l_envs, w_sites, r_envs, dl, dp, dr, sign, &e_i);
        diag.push(col[i].re);
    }
    diag
}

#[allow(clippy::too_many_arguments)]
fn krylov_solve(
    l_envs: &[EnvTensor],
    w_sites: &[Option<&Tensor4>],
    r_envs: &[EnvTensor],
    dl: usize,
    dp: usize,
    dr: usize,
    sign: f64,
    precondition: bool,
    seed: &[C64],
    max_iter: usize,
    min_iter: usize,
    tol: f64,
) -> (f64, Vec<C64>) {
    let basis = krylov_basis(
        l_envs, w_sites, r_envs, dl, dp, dr, sign, precondition, seed, max_iter, min_iter, tol,
    );
    project_and_diagonalize(l_envs, w_sites, r_envs, dl, dp, dr, sign, &basis)
}

/// Same Krylov growth as `krylov_solve`, but returns `n_states` Ritz pairs
/// from the final projected subspace (spec §6 "n_states > 1").
#[allow(clippy::too_many_arguments)]
fn krylov_solve_n(
    l_envs: &[EnvTensor],
    w_sites: &[Option<&Tensor4>],
    r_envs: &[EnvTensor],
    dl: usize,
    dp: usize,
    dr: usize,
    sign: f64,
    precondition: bool,
    seed: &[C64],
    max_iter: usize,
    min_iter: usize,
    tol: f64,
    n_states: usize,
) -> Vec<(f64, Vec<C64>)> {
    let basis = krylov_basis(
        l_envs, w_sites, r_envs, dl, dp, dr, sign, precondition, seed, max_iter, min_iter, tol,
    );
    project_and_diagonalize_n(l_envs, w_sites, r_envs, dl, dp, dr, sign, &basis, n_states)
}

#[allow(clippy::too_many_arguments)]
fn krylov_basis(
    l_envs: &[EnvTensor],
    w_sites: &[Option<&Tensor4>],
    r_envs: &[EnvTensor],
    dl: usize,
    dp: usize,
    dr: usize,
    sign: f64,
    precondition: bool,
    seed: &[C64],
    max_iter: usize,
    min_iter: usize,
    tol: f64,
) -> Vec<Vec<C64>> {
    let dim = dl * dp * dr;
    let m = max_iter.max(min_iter).max(1).min(dim);
    let diag = if precondition {
        Some(local_diagonal(l_envs, w_sites, r_envs, dl, dp, dr, sign))
    } else {
        None
    };

    let mut basis: Vec<Vec<C64>> = Vec::with_capacity(m + 1);
    let n0 = norm(seed);
    let mut v0 = seed.to_vec();
    if n0 > 0.0 {
        for x in v0.iter_mut() {
            *x /= n0;
        }
    } else {
        v0 = vec![C64::new(0.0, 0.0); dim];
        if dim > 0 {
            v0[0] = C64::new(1.0, 0.0);
        }
    }
    basis.push(v0);

    let mut prev_ritz = f64::INFINITY;
    for iter in 0..m {
        let w = matvec(l_envs, w_sites, r_envs, dl, dp, dr, sign, &basis[iter]);
        let mut w_ortho = w;
        for b in &basis {
            let c = dot(b, &w_ortho);
            axpy(&mut w_ortho, -c, b);
        }
        let nw = norm(&w_ortho);
        let converged_dim_limit = nw < 1e-12 || basis.len() >= dim;

        let mut ritz_val = prev_ritz;
        if iter + 1 >= min_iter {
            let (val, _) =
                project_and_diagonalize(l_envs, w_sites, r_envs, dl, dp, dr, sign, &basis);
            ritz_val = val;
            if (val - prev_ritz).abs() < tol {
                prev_ritz = val;
                break;
            }
            prev_ritz = val;
        }
        if converged_dim_limit {
            break;
        }

        if let Some(d) = &diag {
            // Davidson correction: scale each residual component by
            // 1 / (diag_i - theta), guarding against a near-singular
            // denominator at the current Ritz estimate.
            for (x, di) in w_ortho.iter_mut().zip(d) {
                let denom = di - ritz_val;
                if denom.abs() > 1e-8 {
                    *x /= denom;
                }
            }
            for b in &basis {
                let c = dot(b, &w_ortho);
                axpy(&mut w_ortho, -c, b);
            }
        }

        let nw = norm(&w_ortho);
        if nw < 1e-12 {
            break;
        }
        for x in w_ortho.iter_mut() {
            *x /= nw;
        }
        basis.push(w_ortho);
    }

    basis
}

#[allow(clippy::too_many_arguments)]
fn project_and_diagonalize(
    l_envs: &[EnvTensor],
    w_sites: &[Option<&Tensor4>],
    r_envs: &[EnvTensor],
    dl: usize,
    dp: usize,
    dr: usize,
    sign: f64,
    basis: &[Vec<C64>],
) -> (f64, Vec<C64>) {
    let mut states = project_and_diagonalize_n(l_envs, w_sites, r_envs, dl, dp, dr, sign, basis, 1);
    states.remove(0)
}

/// Like `project_and_diagonalize`, but returns up to `n_states` Ritz pairs in
/// ascending order. Used both for single-state convergence tracking and for
/// the `n_states > 1` excited-state / RDM-truncation path (spec §6).
#[allow(clippy::too_many_arguments)]
fn project_and_diagonalize_n(
    l_envs: &[EnvTensor],
    w_sites: &[Option<&Tensor4>],
    r_envs: &[EnvTensor],
    dl: usize,
    dp: usize,
    dr: usize,
    sign: f64,
    basis: &[Vec<C64>],
    n_states: usize,
) -> Vec<(f64, Vec<C64>)> {
    let k = basis.len();
    let mut proj = Mat::<C64>::zeros(k, k);
    let mut hv = Vec::with_capacity(k);
    for b in basis {
        hv.push(matvec(l_envs, w_sites, r_envs, dl, dp, dr, sign, b));
    }
    for i in 0..k {
        for j in 0..k {
            proj.write(i, j, dot(&basis[i], &hv[j]));
        }
    }
    let (vals, vecs) = tn::linalg::dense_eig(&proj);
    let order = tn::linalg::sort_ascending_real(&vals, &vecs, true, 1e-8);

    let dim = dl * dp * dr;
    let mut out = Vec::with_capacity(n_states.min(order.len()).max(1));
    for &idx in order.iter().take(n_states.max(1)) {
        let mut full = vec![C64::new(0.0, 0.0); dim];
        for (c, b) in basis.iter().enumerate() {
            let coeff = vecs.read(c, idx);
            axpy(&mut full, coeff, b);
        }
        let n = norm(&full);
        if n > 0.0 {
            for x in full.iter_mut() {
                *x /= n;
            }
        }
        out.push((vals[idx].re, full));
    }
    out
}

/// Dense diagonalization of the full local block, used for `algorithm =
/// exact` on blocks small enough that materializing `H` is cheap.
fn exact_solve(
    l_envs: &[EnvTensor],
    w_sites: &[Option<&Tensor4>],
    r_envs: &[EnvTensor],
    dl: usize,
    dp: usize,
    dr: usize,
    sign: f64,
) -> (f64, Vec<C64>) {
    let mut states = exact_solve_n(l_envs, w_sites, r_envs, dl, dp, dr, sign, 1);
    states.remove(0)
}

#[allow(clippy::too_many_arguments)]
fn exact_solve_n(
    l_envs: &[EnvTensor],
    w_sites: &[Option<&Tensor4>],
    r_envs: &[EnvTensor],
    dl: usize,
    dp: usize,
    dr: usize,
    sign: f64,
    n_states: usize,
) -> Vec<(f64, Vec<C64>)> {
    let dim = dl * dp * dr;
    let mut h = Mat::<C64>::zeros(dim, dim);
    for j in 0..dim {
        let mut e_j = vec![C64::new(0.0, 0.0); dim];
        e_j[j] = C64::new(1.0, 0.0);
        let col = matvec(l_envs, w_sites, r_envs, dl, dp, dr, sign, &e_j);
        for i in 0..dim {
            h.write(i, j, col[i]);
        }
    }
    let (vals, vecs) = tn::linalg::dense_eig(&h);
    let order = tn::linalg::sort_ascending_real(&vals, &vecs, true, 1e-8);

    let mut out = Vec::with_capacity(n_states.min(order.len()).max(1));
    for &idx in order.iter().take(n_states.max(1)) {
        let mut vec = vec![C64::new(0.0, 0.0); dim];
        for i in 0..dim {
            vec[i] = vecs.read(i, idx);
        }
        out.push((vals[idx].re, vec));
    }
    out
}

/// Number of low-lying Ritz candidates considered for the overlap-based swap
/// in `preserve_state` mode (spec §4.4); small because the local block rarely
/// has more than a handful of near-degenerate levels worth checking.
const PRESERVE_CANDIDATES: usize = 4;

/// Solve the active-site local eigenproblem: dispatches on `algorithm`,
/// applies the `Maximize` polarity by negating the operator before and the
/// eigenvalue after. When `preserve_state` is set and `previous` is given,
/// the top `PRESERVE_CANDIDATES` Ritz pairs are computed and the one with
/// highest overlap to `previous` is returned instead of the bare extremal
/// pair; if no candidate clears overlap 0.98, `previous` is returned
/// unchanged and the second return value flags a state-tracking event (spec
/// §4.4, §7 "State-tracking event").
#[allow(clippy::too_many_arguments)]
pub fn solve_local(
    algorithm: AlgorithmKind,
    maximize: bool,
    l_envs: &[EnvTensor],
    w_sites: &[Option<&Tensor4>],
    r_envs: &[EnvTensor],
    seed: &Tensor3,
    max_iter: usize,
    min_iter: usize,
    tol: f64,
    preserve_state: bool,
    previous: Option<&Tensor3>,
) -> (f64, Tensor3, bool) {
    let dl = seed.dl;
    let dp = seed.dp;
    let dr = seed.dr;
    let sign = if maximize { -1.0 } else { 1.0 };

    if preserve_state {
        if let Some(prev) = previous {
            let candidates = match algorithm {
                AlgorithmKind::Arnoldi | AlgorithmKind::Davidson => krylov_solve_n(
                    l_envs,
                    w_sites,
                    r_envs,
                    dl,
                    dp,
                    dr,
                    sign,
                    algorithm == AlgorithmKind::Davidson,
                    &flatten(seed),
                    max_iter,
                    min_iter,
                    tol,
                    PRESERVE_CANDIDATES,
                ),
                AlgorithmKind::Exact => {
                    exact_solve_n(l_envs, w_sites, r_envs, dl, dp, dr, sign, PRESERVE_CANDIDATES)
                }
            };
            let prev_flat = flatten(prev);
            let mut best = 0usize;
            let mut best_overlap = 0.0f64;
            for (idx, (_, v)) in candidates.iter().enumerate() {
                let overlap = dot(&prev_flat, v).norm();
                if overlap > best_overlap {
                    best_overlap = overlap;
                    best = idx;
                }
            }
            if best_overlap > 0.98 {
                let (signed_energy, vec) = &candidates[best];
                return (sign * signed_energy, unflatten(vec, dl, dp, dr), false);
            }
            // Could not lock onto the guess: retain it, but report its
            // Rayleigh quotient under the physical (unsigned) operator
            // rather than an energy that belongs to a different state.
            tracing::warn!(
                overlap = best_overlap,
                "state-preservation could not lock onto guess; retaining previous state"
            );
            let hv = apply_h(l_envs, w_sites, r_envs, prev);
            let energy = dot(&prev_flat, &flatten(&hv)).re;
            return (energy, prev.clone(), true);
        }
    }

    let (signed_energy, vec) = match algorithm {
        AlgorithmKind::Arnoldi | AlgorithmKind::Davidson => krylov_solve(
            l_envs,
            w_sites,
            r_envs,
            dl,
            dp,
            dr,
            sign,
            algorithm == AlgorithmKind::Davidson,
            &flatten(seed),
            max_iter,
            min_iter,
            tol,
        ),
        AlgorithmKind::Exact => exact_solve(l_envs, w_sites, r_envs, dl, dp, dr, sign),
    };

    let energy = sign * signed_energy;
    let tensor = unflatten(&vec, dl, dp, dr);
    (energy, tensor, false)
}

/// Multi-root variant of `solve_local`, used when `n_states > 1`: returns up
/// to `n_states` (energy, local vector) pairs sharing one Krylov subspace, in
/// ascending physical-energy order (already polarity-corrected).
#[allow(clippy::too_many_arguments)]
pub fn solve_local_states(
    algorithm: AlgorithmKind,
    maximize: bool,
    l_envs: &[EnvTensor],
    w_sites: &[Option<&Tensor4>],
    r_envs: &[EnvTensor],
    seed: &Tensor3,
    max_iter: usize,
    min_iter: usize,
    tol: f64,
    n_states: usize,
) -> Vec<(f64, Tensor3)> {
    let dl = seed.dl;
    let dp = seed.dp;
    let dr = seed.dr;
    let sign = if maximize { -1.0 } else { 1.0 };

    let states = match algorithm {
        AlgorithmKind::Arnoldi | AlgorithmKind::Davidson => krylov_solve_n(
            l_envs,
            w_sites,
            r_envs,
            dl,
            dp,
            dr,
            sign,
            algorithm == AlgorithmKind::Davidson,
            &flatten(seed),
            max_iter,
            min_iter,
            tol,
            n_states,
        ),
        AlgorithmKind::Exact => {
            exact_solve_n(l_envs, w_sites, r_envs, dl, dp, dr, sign, n_states)
        }
    };

    states
        .into_iter()
        .map(|(e, v)| (sign * e, unflatten(&v, dl, dp, dr)))
        .collect()
}
