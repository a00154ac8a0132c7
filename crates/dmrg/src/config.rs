use crate::error::DmrgError;
use serde::{Deserialize, Serialize};
use tn::SeedPolicy;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlgorithmKind {
    Arnoldi,
    Davidson,
    Exact,
}

impl Default for AlgorithmKind {
    fn default() -> Self {
        AlgorithmKind::Arnoldi
    }
}

/// Sign convention for the local eigensolver (spec §9): `Minimize` hands the
/// iterative solver the MPO as-is and reports its smallest eigenvalue;
/// `Maximize` negates the operator internally so the *largest* physical
/// eigenvalue (e.g. an ASEP generator's SCGF) is found by the same
/// smallest-eigenvalue machinery, then negates the result back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Polarity {
    Minimize,
    Maximize,
}

impl Default for Polarity {
    fn default() -> Self {
        Polarity::Minimize
    }
}

/// A scalar option or a per-stage vector; schedule fields resolve to one
/// entry per bond-dimension stage.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Schedule<T> {
    Scalar(T),
    PerStage(Vec<T>),
}

impl<T: Clone> Schedule<T> {
    pub fn resolve(&self, stages: usize) -> Vec<T> {
        match self {
            Schedule::Scalar(v) => vec![v.clone(); stages],
            Schedule::PerStage(v) => v.clone(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SolverConfig {
    pub n: usize,
    #[serde(default = "default_d")]
    pub d: usize,
    #[serde(default = "default_max_bond_dim")]
    pub max_bond_dim: Schedule<usize>,
    #[serde(default = "default_tol")]
    pub tol: Schedule<f64>,
    #[serde(default = "default_max_iter")]
    pub max_iter: Schedule<usize>,
    #[serde(default = "default_min_iter")]
    pub min_iter: Schedule<usize>,
    #[serde(default)]
    pub initial_guess: InitialGuess,
    #[serde(default)]
    pub algorithm: AlgorithmKind,
    #[serde(default)]
    pub polarity: Polarity,
    #[serde(default)]
    pub preserve_state: bool,
    #[serde(default)]
    pub orthonormalize: bool,
    #[serde(default = "default_n_states")]
    pub n_states: usize,
    #[serde(default)]
    pub target_state: usize,
    #[serde(default)]
    pub gauge_site_save: Option<usize>,
    #[serde(default)]
    pub gauge_site_load: Option<usize>,
    #[serde(default)]
    pub persist_path: Option<String>,
    #[serde(default)]
    pub noise_amplitude: Option<f64>,
    /// Ceiling on N above which `algorithm = exact` is refused as a
    /// configuration error rather than left to exhaust memory (spec §7).
    #[serde(default = "default_exact_diag_ceiling")]
    pub exact_diag_ceiling: usize,
}

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub enum InitialGuess {
    Zeros,
    Ones,
    Random(u64),
    #[default]
    Constant01,
    Custom(CustomConstant),
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CustomConstant(pub f64);

impl InitialGuess {
    pub fn seed_policy(&self) -> SeedPolicy {
        match *self {
            InitialGuess::Zeros => SeedPolicy::Zeros,
            InitialGuess::Ones => SeedPolicy::Ones,
            InitialGuess::Random(seed) => SeedPolicy::Random(seed),
            InitialGuess::Constant01 => SeedPolicy::Constant(0.1),
            InitialGuess::Custom(CustomConstant(c)) => SeedPolicy::Constant(c),
        }
    }
}

fn default_d() -> usize {
    2
}
fn default_max_bond_dim() -> Schedule<usize> {
    Schedule::PerStage(vec![10, 50, 100])
}
fn default_tol() -> Schedule<f64> {
    Schedule::Scalar(1e-10)
}
fn default_max_iter() -> Schedule<usize> {
    Schedule::Scalar(10)
}
fn default_min_iter() -> Schedule<usize> {
    Schedule::Scalar(0)
}
fn default_n_states() -> usize {
    1
}
fn default_exact_diag_ceiling() -> usize {
    12
}

pub struct ResolvedSchedule {
    pub max_bond_dim: Vec<usize>,
    pub tol: Vec<f64>,
    pub max_iter: Vec<usize>,
    pub min_iter: Vec<usize>,
}

impl SolverConfig {
    /// Validate shapes and resolve schedule vectors before any computation
    /// begins (spec §7 "reported before any computation").
    pub fn resolve(&self) -> Result<ResolvedSchedule, DmrgError> {
        if self.n == 0 {
            return Err(DmrgError::configuration("N must be positive"));
        }
        if self.n_states == 0 {
            return Err(DmrgError::configuration("n_states must be positive"));
        }
        if self.target_state >= self.n_states {
            return Err(DmrgError::configuration(
                "target_state must be < n_states",
            ));
        }
        if self.algorithm == AlgorithmKind::Exact && self.n > self.exact_diag_ceiling {
            return Err(DmrgError::configuration(format!(
                "exact diagonalization requested for N={} exceeds ceiling {}",
                self.n, self.exact_diag_ceiling
            )));
        }

        let stages = match &self.max_bond_dim {
            Schedule::Scalar(_) => 1,
            Schedule::PerStage(v) => v.len(),
        };
        if stages == 0 {
            return Err(DmrgError::configuration("bond-dimension schedule is empty"));
        }

        let max_bond_dim = self.max_bond_dim.resolve(stages);
        let tol = self.tol.resolve(stages);
        let max_iter = self.max_iter.resolve(stages);
        let min_iter = self.min_iter.resolve(stages);

        for (name, len) in [
            ("tol", tol.len()),
            ("max_iter", max_iter.len()),
            ("min_iter", min_iter.len()),
        ] {
            if len != stages {
                return Err(DmrgError::configuration(format!(
                    "schedule vector '{name}' has length {len}, expected {stages} (from max_bond_dim)"
                )));
            }
        }

        Ok(ResolvedSchedule {
            max_bond_dim,
            tol,
            max_iter,
            min_iter,
        })
    }
}
