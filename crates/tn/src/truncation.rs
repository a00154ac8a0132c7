/// Bond truncation policy applied at every gauge-moving SVD.
#[derive(Clone, Copy, Debug)]
pub struct Truncation {
    pub max_bond: usize,
    pub cutoff: f64,
}

impl Truncation {
    pub fn new(max_bond: usize, cutoff: f64) -> Self {
        Self { max_bond, cutoff }
    }
}

/// Entanglement entropy S = -sum s_k^2 log2(s_k^2) across a cut, given the
/// (unnormalized) kept singular values. Returns the entropy and the
/// normalized entanglement spectrum {s_k^2}.
pub fn entanglement(singular_values: &[f64]) -> (f64, Vec<f64>) {
    let norm_sq: f64 = singular_values.iter().map(|s| s * s).sum();
    if norm_sq <= 0.0 {
        return (0.0, vec![0.0; singular_values.len()]);
    }
    let spectrum: Vec<f64> = singular_values
        .iter()
        .map(|s| (s * s) / norm_sq)
        .collect();
    let entropy = -spectrum
        .iter()
        .filter(|p| **p > 0.0)
        .map(|p| p * p.log2())
        .sum::<f64>();
    (entropy, spectrum)
}
