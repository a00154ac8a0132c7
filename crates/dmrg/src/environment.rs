use tn::{Mpo, Mps, Tensor3, Tensor4, C64};

/// A partial contraction of `<psi|O|psi>`, indexed (bra bond, MPO virtual
/// bond, ket bond). Bra and ket are the same MPS; bra is conjugated.
#[derive(Clone, Debug)]
pub struct EnvTensor {
    pub data: Vec<C64>,
    pub bra: usize,
    pub mpo: usize,
    pub ket: usize,
}

impl EnvTensor {
    pub fn zeros(bra: usize, mpo: usize, ket: usize) -> Self {
        Self {
            data: vec![C64::new(0.0, 0.0); bra * mpo * ket],
            bra,
            mpo,
            ket,
        }
    }

    /// The scalar boundary environment, `1` on a 1x1x1 block.
    pub fn boundary() -> Self {
        let mut e = Self::zeros(1, 1, 1);
        e.set(0, 0, 0, C64::new(1.0, 0.0));
        e
    }

    #[inline]
    fn idx(&self, bra: usize, mpo: usize, ket: usize) -> usize {
        (bra * self.mpo + mpo) * self.ket + ket
    }

    pub fn get(&self, bra: usize, mpo: usize, ket: usize) -> C64 {
        self.data[self.idx(bra, mpo, ket)]
    }

    pub fn set(&mut self, bra: usize, mpo: usize, ket: usize, v: C64) {
        let i = self.idx(bra, mpo, ket);
        self.data[i] = v;
    }
}

/// Extend a left environment across site `a` (ket) / `conj(a)` (bra), through
/// MPO tensor `w` (or an implicit bond-1 identity when `w` is `None`).
fn contract_left(prev: &EnvTensor, a: &Tensor3, w: Option<&Tensor4>) -> EnvTensor {
    match w {
        Some(w) => {
            assert_eq!(prev.mpo, w.bl, "left environment / MPO bond mismatch");
            let mut out = EnvTensor::zeros(a.dr, w.br, a.dr);
            for bp in 0..a.dr {
                for wr in 0..w.br {
                    for kp in 0..a.dr {
                        let mut acc = C64::new(0.0, 0.0);
                        for b0 in 0..prev.bra {
                            for k0 in 0..prev.ket {
                                for wl in 0..w.bl {
                                    for sp in 0..a.dp {
                                        for s in 0..a.dp {
                                            let w_val = w.get(wl, wr, sp, s);
                                            if w_val == C64::new(0.0, 0.0) {
                                                continue;
                                            }
                                            acc += prev.get(b0, wl, k0)
                                                * a.get(b0, sp, bp).conj()
                                                * w_val
                                                * a.get(k0, s, kp);
                                        }
                                    }
                                }
                            }
                        }
                        out.set(bp, wr, kp, acc);
                    }
                }
            }
            out
        }
        None => {
            assert_eq!(prev.mpo, 1, "identity site requires bond-1 MPO environment");
            let mut out = EnvTensor::zeros(a.dr, 1, a.dr);
            for bp in 0..a.dr {
                for kp in 0..a.dr {
                    let mut acc = C64::new(0.0, 0.0);
                    for b0 in 0..prev.bra {
                        for k0 in 0..prev.ket {
                            for s in 0..a.dp {
                                acc += prev.get(b0, 0, k0) * a.get(b0, s, bp).conj() * a.get(k0, s, kp);
                            }
                        }
                    }
                    out.set(bp, 0, kp, acc);
                }
            }
            out
        }
    }
}

/// Mirror of `contract_left`, extending a right environment leftward across
/// site `a` through `w`.
fn contract_right(next: &EnvTensor, a: &Tensor3, w: Option<&Tensor4>) -> EnvTensor {
    match w {
        Some(w) => {
            assert_eq!(next.mpo, w.br, "right environment / MPO bond mismatch");
            let mut out = EnvTensor::zeros(a.dl, w.bl, a.dl);
            for bp in 0..a.dl {
                for wl in 0..w.bl {
                    for kp in 0..a.dl {
                        let mut acc = C64::new(0.0, 0.0);
                        for b0 in 0..next.bra {
                            for k0 in 0..next.ket {
                                for wr in 0..w.br {
                                    for sp in 0..a.dp {
                                        for s in 0..a.dp {
                                            let w_val = w.get(wl, wr, sp, s);
                                            if w_val == C64::new(0.0, 0.0) {
                                                continue;
                                            }
                                            acc += next.get(b0, wr, k0)
                                                * a.get(bp, sp, b0).conj()
                                                * w_val
                                                * a.get(kp, s, k0);
                                        }
                                    }
                                }
                            }
                        }
                        out.set(bp, wl, kp, acc);
                    }
                }
            }
            out
        }
        None => {
            assert_eq!(next.mpo, 1, "identity site requires bond-1 MPO environment");
            let mut out = EnvTensor::zeros(a.dl, 1, a.dl);
            for bp in 0..a.dl {
                for kp in 0..a.dl {
                    let mut acc = C64::new(0.0, 0.0);
                    for b0 in 0..next.bra {
                        for k0 in 0..next.ket {
                            for s in 0..a.dp {
                                acc += next.get(b0, 0, k0) * a.get(bp, s, b0).conj() * a.get(kp, s, k0);
                            }
                        }
                    }
                    out.set(bp, 0, kp, acc);
                }
            }
            out
        }
    }
}

/// Per-term stacks of left/right partial contractions, one pair of stacks
/// per summand of the MPO (spec §5 "environment cache").
pub struct EnvironmentCache {
    /// `l[t][i]` is built from sites `0..i` of term `t`; `l[t][0]` is the
    /// scalar boundary.
    pub l: Vec<Vec<EnvTensor>>,
    /// `r[t][i]` is built from sites `i..N` of term `t`; `r[t][N]` is the
    /// scalar boundary.
    pub r: Vec<Vec<EnvTensor>>,
}

impl EnvironmentCache {
    pub fn allocate(mpo: &Mpo) -> Self {
        let n_terms = mpo.n_terms();
        let n = mpo.n;
        let mut l = Vec::with_capacity(n_terms);
        let mut r = Vec::with_capacity(n_terms);
        for _ in 0..n_terms {
            let mut lt = Vec::with_capacity(n + 1);
            let mut rt = Vec::with_capacity(n + 1);
            lt.push(EnvTensor::boundary());
            for _ in 0..n {
                lt.push(EnvTensor::boundary());
            }
            for _ in 0..n {
                rt.push(EnvTensor::boundary());
            }
            rt.push(EnvTensor::boundary());
            l.push(lt);
            r.push(rt);
        }
        Self { l, r }
    }

    /// Build every right environment from the right edge inward, assuming
    /// `mps` is currently right-canonical past the gauge site (spec §5,
    /// mirrors the reference solver's initial `alloc_env`/`update_envR` pass).
    pub fn build_full_right(&mut self, mps: &Mps, mpo: &Mpo) {
        let n = mpo.n;
        for t in 0..mpo.n_terms() {
            self.r[t][n] = EnvTensor::boundary();
            for i in (0..n).rev() {
                let w = mpo.site(t, i);
                self.r[t][i] = contract_right(&self.r[t][i + 1], &mps.sites[i], w);
            }
        }
    }

    pub fn build_full_left(&mut self, mps: &Mps, mpo: &Mpo) {
        for t in 0..mpo.n_terms() {
            self.l[t][0] = EnvTensor::boundary();
            for i in 0..mpo.n {
                let w = mpo.site(t, i);
                self.l[t][i + 1] = contract_left(&self.l[t][i], &mps.sites[i], w);
            }
        }
    }

    /// Call after site `i` has become left-canonical (gauge moved to `i+1`)
    /// to extend `l[t][i]` into `l[t][i+1]`.
    pub fn update_left(&mut self, i: usize, mps: &Mps, mpo: &Mpo) {
        for t in 0..mpo.n_terms() {
            let w = mpo.site(t, i);
            self.l[t][i + 1] = contract_left(&self.l[t][i], &mps.sites[i], w);
        }
    }

    /// Call after site `i` has become right-canonical (gauge moved to `i-1`)
    /// to extend `r[t][i+1]` into `r[t][i]`.
    pub fn update_right(&mut self, i: usize, mps: &Mps, mpo: &Mpo) {
        for t in 0..mpo.n_terms() {
            let w = mpo.site(t, i);
            self.r[t][i] = contract_right(&self.r[t][i + 1], &mps.sites[i], w);
        }
    }
}
