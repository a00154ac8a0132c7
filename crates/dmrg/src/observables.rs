use tn::{Mps, Tensor3, C64};

fn left_env(sites: &[Tensor3], k: usize) -> Vec<C64> {
    let mut env = vec![C64::new(1.0, 0.0)];
    for a in &sites[0..k] {
        let mut next = vec![C64::new(0.0, 0.0); a.dr * a.dr];
        for l in 0..a.dl {
            for lp in 0..a.dl {
                let lval = env[l * a.dl + lp];
                for p in 0..a.dp {
                    for r in 0..a.dr {
                        let aval = a.get(l, p, r);
                        for rp in 0..a.dr {
                            next[r * a.dr + rp] += lval * aval * a.get(lp, p, rp).conj();
                        }
                    }
                }
            }
        }
        env = next;
    }
    env
}

fn right_env(sites: &[Tensor3], k: usize) -> Vec<C64> {
    let mut env = vec![C64::new(1.0, 0.0)];
    for a in sites[k + 1..].iter().rev() {
        let mut next = vec![C64::new(0.0, 0.0); a.dl * a.dl];
        for r in 0..a.dr {
            for rp in 0..a.dr {
                let rval = env[r * a.dr + rp];
                for p in 0..a.dp {
                    for l in 0..a.dl {
                        let aval = a.get(l, p, r);
                        for lp in 0..a.dl {
                            next[l * a.dl + lp] += aval * a.get(lp, p, rp).conj() * rval;
                        }
                    }
                }
            }
        }
        env = next;
    }
    env
}

/// Norm `<psi|psi>`; should stay within isometry tolerance of 1 on a properly
/// canonicalized chain, reported to catch drift after many sweeps.
pub fn norm_squared(mps: &Mps) -> f64 {
    let n = mps.n();
    let left = left_env(&mps.sites, n.saturating_sub(1));
    let a = &mps.sites[n - 1];
    let mut acc = C64::new(0.0, 0.0);
    for l in 0..a.dl {
        for lp in 0..a.dl {
            let lval = left[l * a.dl + lp];
            for p in 0..a.dp {
                for r in 0..a.dr {
                    acc += lval * a.get(l, p, r) * a.get(lp, p, r).conj();
                }
            }
        }
    }
    acc.re
}

/// `<psi| op |psi> / <psi|psi>` for a local operator acting at site `k`,
/// given as a flattened row-major `d x d` matrix (spec §6 "expectation
/// values").
pub fn expect_single_site(mps: &Mps, k: usize, op: &[C64]) -> f64 {
    let a = &mps.sites[k];
    let d = a.dp;
    assert_eq!(op.len(), d * d, "operator must be d x d");

    let left = left_env(&mps.sites, k);
    let right = right_env(&mps.sites, k);

    let mut numer = C64::new(0.0, 0.0);
    let mut denom = C64::new(0.0, 0.0);
    for p in 0..d {
        for pp in 0..d {
            let mut acc = C64::new(0.0, 0.0);
            for l in 0..a.dl {
                for lp in 0..a.dl {
                    let lval = left[l * a.dl + lp];
                    for r in 0..a.dr {
                        for rp in 0..a.dr {
                            let rval = right[r * a.dr + rp];
                            acc += lval * a.get(l, p, r) * a.get(lp, pp, rp).conj() * rval;
                        }
                    }
                }
            }
            numer += op[p * d + pp] * acc;
            if p == pp {
                denom += acc;
            }
        }
    }

    if denom.re.abs() < 1e-14 {
        return 0.0;
    }
    numer.re / denom.re
}

/// `<psi|H|psi> / <psi|psi>` by brute contraction over every MPO term, used
/// as an independent cross-check against the sweep's reported Ritz energy
/// (spec §6 "energy cross-check").
pub fn expect_energy(mps: &Mps, mpo: &tn::Mpo) -> f64 {
    let denom = norm_squared(mps);
    if denom.abs() < 1e-14 {
        return 0.0;
    }

    let mut total = C64::new(0.0, 0.0);
    for t in 0..mpo.n_terms() {
        let mut env = vec![C64::new(1.0, 0.0)]; // (bra, mpo=1, ket) flattened as bra*ket
        let mut mpo_bond = 1usize;
        for i in 0..mpo.n {
            let a = &mps.sites[i];
            match mpo.site(t, i) {
                Some(w) => {
                    assert_eq!(mpo_bond, w.bl);
                    let mut next2 = vec![C64::new(0.0, 0.0); a.dr * w.br * a.dr];
                    for wl in 0..w.bl {
                        for b0 in 0..a.dl {
                            for k0 in 0..a.dl {
                                let eval = env[(b0 * w.bl + wl) * a.dl + k0];
                                if eval == C64::new(0.0, 0.0) {
                                    continue;
                                }
                                for wr in 0..w.br {
                                    for s in 0..a.dp {
                                        for sp in 0..a.dp {
                                            let wv = w.get(wl, wr, sp, s);
                                            if wv == C64::new(0.0, 0.0) {
                                                continue;
                                            }
                                            for bp in 0..a.dr {
                                                for kp in 0..a.dr {
                                                    next2[(bp * w.br + wr) * a.dr + kp] += eval
                                                        * a.get(b0, sp, bp).conj()
                                                        * wv
                                                        * a.get(k0, s, kp);
                                                }
                                            }
                                        }
                                    }
                                }
                            }
                        }
                    }
                    env = next2;
                    mpo_bond = w.br;
                }
                None => {
                    let mut next = vec![C64::new(0.0, 0.0); a.dr * a.dr];
                    for b0 in 0..a.dl {
                        for k0 in 0..a.dl {
                            let eval = env[(b0 * mpo_bond + 0) * a.dl + k0];
                            if eval == C64::new(0.0, 0.0) {
                                continue;
                            }
                            for s in 0..a.dp {
                                for bp in 0..a.dr {
                                    for kp in 0..a.dr {
                                        next[bp * a.dr + kp] +=
                                            eval * a.get(b0, s, bp).conj() * a.get(k0, s, kp);
                                    }
                                }
                            }
                        }
                    }
                    env = next;
                    mpo_bond = 1;
                }
            }
        }
        total += env[0];
    }
    total.re / denom
}
