pub mod heisenberg;
pub mod ising;
pub mod operators;
pub mod sep;

use tn::{Mpo, C64};

/// Opaque-to-the-core model selector, consumed only by this crate. The DMRG
/// solver never switches behavior on these names directly; it only sees the
/// resulting `Mpo` and observable operator list.
#[derive(Clone, Debug)]
pub enum ModelKind {
    Ising { h: f64, j: f64 },
    Heisenberg { jx: f64, jy: f64, jz: f64 },
    Tasep { alpha: f64, beta: f64, s: f64 },
    Sep {
        alpha: f64,
        gamma: f64,
        beta: f64,
        delta: f64,
        p: f64,
        q: f64,
        s: f64,
    },
}

/// Single-site operators exposed for observable computation (spec §6),
/// keyed by name (e.g. "occupation", "spin_z").
pub struct ObservableSet {
    pub ops: Vec<(&'static str, Vec<C64>)>,
}

impl ModelKind {
    pub fn build(&self, n: usize) -> (Mpo, ObservableSet) {
        match *self {
            ModelKind::Ising { h, j } => (
                ising::ising(n, h, j),
                ObservableSet {
                    ops: vec![
                        ("spin_x", operators::spin_x()),
                        ("spin_z", operators::spin_z()),
                    ],
                },
            ),
            ModelKind::Heisenberg { jx, jy, jz } => (
                heisenberg::heisenberg(n, jx, jy, jz),
                ObservableSet {
                    ops: vec![
                        ("spin_x", operators::spin_x()),
                        ("spin_y", operators::spin_y()),
                        ("spin_z", operators::spin_z()),
                    ],
                },
            ),
            ModelKind::Tasep { alpha, beta, s } => (
                sep::tasep(n, alpha, beta, s),
                ObservableSet {
                    ops: vec![
                        ("occupation", operators::occupation()),
                        ("vacancy", operators::vacancy()),
                    ],
                },
            ),
            ModelKind::Sep { alpha, gamma, beta, delta, p, q, s } => (
                sep::sep(n, alpha, gamma, beta, delta, p, q, s),
                ObservableSet {
                    ops: vec![
                        ("occupation", operators::occupation()),
                        ("vacancy", operators::vacancy()),
                    ],
                },
            ),
        }
    }

    /// Whether the extremal physical eigenvalue of this model's generator is
    /// the *largest* (rather than smallest) eigenvalue of the MPO as built —
    /// true for the exclusion-process tilted generators (spec §9).
    pub fn maximize(&self) -> bool {
        matches!(self, ModelKind::Tasep { .. } | ModelKind::Sep { .. })
    }
}
