use crate::linalg::{
    left_isometry_error, right_isometry_error, scale_columns, truncated_svd,
};
use crate::tensor::{Tensor3, C64};
use crate::truncation::{entanglement, Truncation};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SeedPolicy {
    Zeros,
    Ones,
    Random(u64),
    Constant(f64),
}

#[derive(Error, Debug)]
pub enum MpsError {
    #[error("site {site}: isometry check failed after gauge move, residual = {residual:.3e}")]
    IsometryViolation { site: usize, residual: f64 },
    #[error("site {site}: non-finite value found in tensor after {op}")]
    NonFinite { site: usize, op: &'static str },
}

/// Isometry tolerance from the canonical-form contract (spec §3, invariant 2).
pub const ISOMETRY_TOL: f64 = 1e-6;

/// Chain of rank-3 site tensors held in mixed-canonical form around a gauge
/// site.
#[derive(Clone, Debug)]
pub struct Mps {
    pub sites: Vec<Tensor3>,
    pub gauge: usize,
}

impl Mps {
    /// Allocate N tensors with bond dimension `b_i = min(d^i, d^(N-i), m)`,
    /// seeded per `policy`. The caller is responsible for breaking symmetry
    /// before the first solve if `policy` is `Zeros`.
    pub fn generate(n: usize, d: usize, m: usize, policy: SeedPolicy) -> Self {
        let bond = |i: usize| -> usize {
            let left = d.saturating_pow(i as u32).min(usize::MAX / 2);
            let right = d.saturating_pow((n - i) as u32).min(usize::MAX / 2);
            left.min(right).min(m)
        };

        let mut rng = match policy {
            SeedPolicy::Random(seed) => Some(rng::ONDRng::new(&seed.to_be_bytes())),
            _ => None,
        };

        let mut sites = Vec::with_capacity(n);
        for i in 0..n {
            let dl = bond(i);
            let dr = bond(i + 1);
            let t = match policy {
                SeedPolicy::Zeros => Tensor3::zeros(dl, d, dr),
                SeedPolicy::Ones => Tensor3::ones(dl, d, dr),
                SeedPolicy::Constant(c) => Tensor3::constant(dl, d, dr, c),
                SeedPolicy::Random(_) => Tensor3::random(dl, d, dr, rng.as_mut().unwrap()),
            };
            sites.push(t);
        }
        Self { sites, gauge: n / 2 }
    }

    pub fn n(&self) -> usize {
        self.sites.len()
    }

    /// Sweep the gauge from the right edge down to site 0, left-canonicalizing
    /// every site along the way (spec §4.1 `right_canonicalize`).
    ///
    /// `quirky_init` reproduces a model-specific symmetry trick from the
    /// source solver that replaces site 0 with an axis-swapped copy of site
    /// N-1 after canonicalization; it is off by default (spec §9).
    pub fn right_canonicalize(&mut self, quirky_init: bool) -> Result<(), MpsError> {
        for i in (1..self.n()).rev() {
            self.move_gauge_left_raw(i, None)?;
        }
        self.gauge = 0;
        if quirky_init {
            let last = self.sites[self.n() - 1].clone();
            self.sites[0] = Tensor3 {
                data: last.data,
                dl: last.dr,
                dp: last.dp,
                dr: last.dl,
            };
        }
        Ok(())
    }

    /// Move the gauge from site `i` to `i+1`: reshape, truncated SVD, install
    /// U as the new (left-canonical) T_i, fold s*V into T_{i+1}. Returns the
    /// kept singular values for entanglement/entropy reporting.
    pub fn move_gauge_right(&mut self, i: usize, trunc: Truncation) -> Result<Vec<f64>, MpsError> {
        assert!(i + 1 < self.n(), "move_gauge_right needs a right neighbor");
        let theta = self.sites[i].to_matrix_left_grouped();
        let svd = truncated_svd(&theta, trunc);

        let dl = self.sites[i].dl;
        let dp = self.sites[i].dp;
        let new_t = Tensor3::from_matrix_left_grouped(&svd.u.as_ref(), dl, dp);

        if new_t.has_non_finite() {
            return Err(MpsError::NonFinite { site: i, op: "move_gauge_right" });
        }
        let residual = left_isometry_error(&svd.u);
        if residual > ISOMETRY_TOL {
            return Err(MpsError::IsometryViolation { site: i, residual });
        }
        self.sites[i] = new_t;

        let sv = scale_columns(&svd.v, &svd.s);
        self.fold_into_next(i + 1, &sv);
        self.gauge = i + 1;
        Ok(svd.s)
    }

    /// Mirror of `move_gauge_right`: the gauge moves from site `i` to `i-1`.
    pub fn move_gauge_left(&mut self, i: usize, trunc: Truncation) -> Result<Vec<f64>, MpsError> {
        let s = self.move_gauge_left_raw(i, Some(trunc))?;
        self.gauge = i - 1;
        Ok(s)
    }

    fn move_gauge_left_raw(
        &mut self,
        i: usize,
        trunc: Option<Truncation>,
    ) -> Result<Vec<f64>, MpsError> {
        assert!(i >= 1, "move_gauge_left needs a left neighbor");
        let theta = self.sites[i].to_matrix_right_grouped();
        let trunc = trunc.unwrap_or(Truncation::new(theta.nrows().max(1), 0.0));
        let svd = truncated_svd(&theta, trunc);

        let dp = self.sites[i].dp;
        let dr = self.sites[i].dr;
        let new_t = Tensor3::from_matrix_right_grouped(&svd.v.as_ref(), dp, dr);

        if new_t.has_non_finite() {
            return Err(MpsError::NonFinite { site: i, op: "move_gauge_left" });
        }
        let residual = right_isometry_error(&svd.v);
        if residual > ISOMETRY_TOL {
            return Err(MpsError::IsometryViolation { site: i, residual });
        }
        self.sites[i] = new_t;

        let us = scale_columns(&svd.u, &svd.s);
        self.fold_into_prev(i - 1, &us);
        Ok(svd.s)
    }

    fn fold_into_next(&mut self, j: usize, sv: &faer::Mat<C64>) {
        let next = &self.sites[j];
        let mut out = Tensor3::zeros(sv.ncols(), next.dp, next.dr);
        for a in 0..sv.ncols() {
            for p in 0..next.dp {
                for r in 0..next.dr {
                    let mut acc = C64::new(0.0, 0.0);
                    for k in 0..sv.nrows() {
                        acc += sv.read(k, a) * next.get(k, p, r);
                    }
                    out.set(a, p, r, acc);
                }
            }
        }
        self.sites[j] = out;
    }

    fn fold_into_prev(&mut self, j: usize, us: &faer::Mat<C64>) {
        let prev = &self.sites[j];
        let mut out = Tensor3::zeros(prev.dl, prev.dp, us.ncols());
        for l in 0..prev.dl {
            for p in 0..prev.dp {
                for a in 0..us.ncols() {
                    let mut acc = C64::new(0.0, 0.0);
                    for k in 0..us.nrows() {
                        acc += prev.get(l, p, k) * us.read(k, a);
                    }
                    out.set(l, p, a, acc);
                }
            }
        }
        self.sites[j] = out;
    }

    /// Entanglement entropy and spectrum for the bond just truncated by a
    /// gauge move, from its kept singular values.
    pub fn entanglement_from(singular_values: &[f64]) -> (f64, Vec<f64>) {
        entanglement(singular_values)
    }

    /// Grow every bond to `min(d^i, d^(N-i), m_new)`, copying the existing
    /// block into the leading corner of a zero tensor and optionally
    /// perturbing the new subspace so the solver doesn't stall on an exactly
    /// orthogonal addition (spec §9).
    pub fn increase_bond_dimension(
        &mut self,
        d: usize,
        m_new: usize,
        noise_amplitude: Option<f64>,
        rng: &mut rng::ONDRng,
    ) {
        let n = self.n();
        let bond = |i: usize| -> usize {
            let left = d.saturating_pow(i as u32).min(usize::MAX / 2);
            let right = d.saturating_pow((n - i) as u32).min(usize::MAX / 2);
            left.min(right).min(m_new)
        };

        for i in 0..n {
            let dl_new = bond(i);
            let dr_new = bond(i + 1);
            let old = &self.sites[i];
            let mut grown = Tensor3::zeros(dl_new, old.dp, dr_new);
            for l in 0..old.dl {
                for p in 0..old.dp {
                    for r in 0..old.dr {
                        grown.set(l, p, r, old.get(l, p, r));
                    }
                }
            }
            if let Some(amp) = noise_amplitude {
                for l in 0..dl_new {
                    for p in 0..old.dp {
                        for r in 0..dr_new {
                            if l >= old.dl || r >= old.dr {
                                let ctx = [i as u8, l as u8, p as u8, r as u8];
                                let noise = rng.next_signed(&ctx, amp);
                                grown.set(l, p, r, grown.get(l, p, r) + C64::new(noise, 0.0));
                            }
                        }
                    }
                }
            }
            self.sites[i] = grown;
        }
    }

    /// Build an MPS from a dense state vector psi (length `d^n`), by
    /// repeated reshape-then-SVD splits off the left edge — the same
    /// reshape/fold idiom `move_gauge_left_raw` uses, just run site-by-site
    /// over a full vector instead of over an existing chain (spec §8
    /// `state2mps` round-trip law). No truncation is applied beyond
    /// dropping numerically-zero singular values, so `to_state_vector`
    /// recovers `psi` to machine precision for N small enough to hold
    /// densely (the spec bounds this at N <= 12).
    pub fn from_state_vector(d: usize, n: usize, psi: &[C64]) -> Result<Self, MpsError> {
        let total = d.checked_pow(n as u32).expect("d^n overflows usize");
        assert_eq!(psi.len(), total, "state vector length must be d^n");

        let mut sites = Vec::with_capacity(n);
        let mut dl = 1usize;
        let mut remainder = psi.to_vec();
        let mut remaining_dim = total;

        for i in 0..n {
            let remaining_sites = n - i;
            if remaining_sites == 1 {
                let mut t = Tensor3::zeros(dl, d, 1);
                for l in 0..dl {
                    for p in 0..d {
                        t.set(l, p, 0, remainder[l * d + p]);
                    }
                }
                if t.has_non_finite() {
                    return Err(MpsError::NonFinite { site: i, op: "from_state_vector" });
                }
                sites.push(t);
                break;
            }

            let cols_block = remaining_dim / dl;
            let next_cols = cols_block / d;

            let mut theta = faer::Mat::<C64>::zeros(dl * d, next_cols);
            for l in 0..dl {
                for s in 0..d {
                    for rest in 0..next_cols {
                        let c = s * next_cols + rest;
                        theta.write(l * d + s, rest, remainder[l * cols_block + c]);
                    }
                }
            }

            let cap = theta.nrows().min(theta.ncols()).max(1);
            let svd = truncated_svd(&theta, Truncation::new(cap, 1e-14));
            let kept = svd.s.len();

            let site = Tensor3::from_matrix_left_grouped(&svd.u.as_ref(), dl, d);
            if site.has_non_finite() {
                return Err(MpsError::NonFinite { site: i, op: "from_state_vector" });
            }
            sites.push(site);

            let v_scaled = scale_columns(&svd.v, &svd.s);
            let mut next_remainder = vec![C64::new(0.0, 0.0); kept * next_cols];
            for k in 0..kept {
                for c in 0..next_cols {
                    next_remainder[k * next_cols + c] = v_scaled.read(c, k);
                }
            }
            remainder = next_remainder;
            remaining_dim = kept * next_cols;
            dl = kept;
        }

        Ok(Self { sites, gauge: n - 1 })
    }

    /// Recontract the full chain into a dense state vector of length `d^n`
    /// (spec §8 `state2mps` round-trip law). Works for any gauge position,
    /// since it is a plain left-to-right contraction over every site rather
    /// than a canonical-form-dependent shortcut.
    pub fn to_state_vector(&self) -> Vec<C64> {
        let n = self.n();
        assert_eq!(self.sites[0].dl, 1, "leftmost bond must be trivial");
        assert_eq!(self.sites[n - 1].dr, 1, "rightmost bond must be trivial");

        let t0 = &self.sites[0];
        let mut partial = vec![C64::new(0.0, 0.0); t0.dp * t0.dr];
        for s in 0..t0.dp {
            for r in 0..t0.dr {
                partial[s * t0.dr + r] = t0.get(0, s, r);
            }
        }
        let mut rows = t0.dp;
        let mut cur_dr = t0.dr;

        for t in self.sites.iter().skip(1) {
            let new_rows = rows * t.dp;
            let mut next = vec![C64::new(0.0, 0.0); new_rows * t.dr];
            for prev_row in 0..rows {
                for s in 0..t.dp {
                    let out_row = prev_row * t.dp + s;
                    for r in 0..t.dr {
                        let mut acc = C64::new(0.0, 0.0);
                        for rp in 0..cur_dr {
                            acc += partial[prev_row * cur_dr + rp] * t.get(rp, s, r);
                        }
                        next[out_row * t.dr + r] = acc;
                    }
                }
            }
            partial = next;
            rows = new_rows;
            cur_dr = t.dr;
        }

        partial
    }
}
