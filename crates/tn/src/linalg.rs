use crate::tensor::C64;
use crate::truncation::Truncation;
use faer::Mat;

/// Result of a bond-truncated SVD: `theta = U * diag(s) * V^dagger`, with at
/// most `trunc.max_bond` singular values kept and any value below
/// `trunc.cutoff` dropped.
pub struct TruncatedSvd {
    pub u: Mat<C64>,
    pub s: Vec<f64>,
    pub v: Mat<C64>,
}

/// Thin SVD of `theta` truncated to `trunc`. Always keeps at least one
/// singular value so that a collapsed block never produces a zero-size bond.
pub fn truncated_svd(theta: &Mat<C64>, trunc: Truncation) -> TruncatedSvd {
    let svd = theta.thin_svd();
    let s_diag = svd.s_diagonal();

    let mut kept = 0usize;
    for i in 0..s_diag.nrows() {
        let sv = s_diag.read(i).re;
        if sv > trunc.cutoff && kept < trunc.max_bond {
            kept += 1;
        }
    }
    if kept == 0 {
        kept = 1;
    }

    let u_full = svd.u();
    let v_full = svd.v();
    let u = u_full.submatrix(0, 0, u_full.nrows(), kept).to_owned();
    let v = v_full.submatrix(0, 0, v_full.nrows(), kept).to_owned();

    let mut s = Vec::with_capacity(kept);
    for i in 0..kept {
        s.push(s_diag.read(i).re);
    }

    TruncatedSvd { u, s, v }
}

/// Scale the columns of `u` by `s`, i.e. `u * diag(s)`.
pub fn scale_columns(u: &Mat<C64>, s: &[f64]) -> Mat<C64> {
    let mut out = Mat::<C64>::zeros(u.nrows(), u.ncols());
    for i in 0..u.nrows() {
        for j in 0..u.ncols() {
            out.write(i, j, u.read(i, j) * s[j]);
        }
    }
    out
}

/// `||A^dagger A - I||_F`, the right-isometry residual used to certify a
/// left-canonical tensor reshaped to (dl*dp, dr).
pub fn left_isometry_error(m: &Mat<C64>) -> f64 {
    let n = m.ncols();
    let mut err = 0.0;
    for i in 0..n {
        for j in 0..n {
            let mut acc = C64::new(0.0, 0.0);
            for k in 0..m.nrows() {
                acc += m.read(k, i).conj() * m.read(k, j);
            }
            let target = if i == j { 1.0 } else { 0.0 };
            let d = acc - C64::new(target, 0.0);
            err += d.norm_sqr();
        }
    }
    err.sqrt()
}

/// `||A A^dagger - I||_F`, the left-isometry residual for a right-canonical
/// tensor reshaped to (dl, dp*dr).
pub fn right_isometry_error(m: &Mat<C64>) -> f64 {
    let n = m.nrows();
    let mut err = 0.0;
    for i in 0..n {
        for j in 0..n {
            let mut acc = C64::new(0.0, 0.0);
            for k in 0..m.ncols() {
                acc += m.read(i, k) * m.read(j, k).conj();
            }
            let target = if i == j { 1.0 } else { 0.0 };
            let d = acc - C64::new(target, 0.0);
            err += d.norm_sqr();
        }
    }
    err.sqrt()
}

/// Dense eigendecomposition of a small square matrix, used both for the
/// `exact` local-solve algorithm and to diagonalize the small projected
/// subspace matrix inside Arnoldi/Davidson. Eigenvalues are NOT pre-sorted.
pub fn dense_eig(h: &Mat<C64>) -> (Vec<C64>, Mat<C64>) {
    let n = h.nrows();
    let eig = h.eigendecomposition::<C64>();
    let s = eig.s();
    let u = eig.u();

    let mut vals = Vec::with_capacity(n);
    for i in 0..n {
        vals.push(s.read(i, i));
    }
    (vals, u.to_owned())
}

/// Sort `(value, column)` pairs by ascending real part, keeping only
/// eigenpairs whose imaginary part is below `imag_tol` when `real_only` is
/// set. Ties are resolved by the stable order already present in `vals`.
pub fn sort_ascending_real(
    vals: &[C64],
    vecs: &Mat<C64>,
    real_only: bool,
    imag_tol: f64,
) -> Vec<usize> {
    let mut idx: Vec<usize> = (0..vals.len())
        .filter(|&i| !real_only || vals[i].im.abs() < imag_tol)
        .collect();
    idx.sort_by(|&a, &b| vals[a].re.partial_cmp(&vals[b].re).unwrap());
    let _ = vecs;
    idx
}
