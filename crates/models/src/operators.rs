use tn::C64;

/// Dense qubit-space operators shared by every model constructor, flattened
/// row-major as `[o00, o01, o10, o11]`.
pub fn identity() -> Vec<C64> {
    let z = C64::new(0.0, 0.0);
    let o = C64::new(1.0, 0.0);
    vec![o, z, z, o]
}

pub fn pauli_x() -> Vec<C64> {
    let z = C64::new(0.0, 0.0);
    let o = C64::new(1.0, 0.0);
    vec![z, o, o, z]
}

pub fn pauli_y() -> Vec<C64> {
    let z = C64::new(0.0, 0.0);
    let i = C64::new(0.0, 1.0);
    vec![z, -i, i, z]
}

pub fn pauli_z() -> Vec<C64> {
    let z = C64::new(0.0, 0.0);
    let o = C64::new(1.0, 0.0);
    vec![o, z, z, -o]
}

/// Spin-1/2 operators S = sigma/2, used by the Heisenberg constructor.
pub fn spin_x() -> Vec<C64> {
    scale(&pauli_x(), 0.5)
}
pub fn spin_y() -> Vec<C64> {
    scale(&pauli_y(), 0.5)
}
pub fn spin_z() -> Vec<C64> {
    scale(&pauli_z(), 0.5)
}

/// Occupation number operator n = |1><1|.
pub fn occupation() -> Vec<C64> {
    let z = C64::new(0.0, 0.0);
    let o = C64::new(1.0, 0.0);
    vec![z, z, z, o]
}

/// Vacancy operator v = I - n = |0><0|.
pub fn vacancy() -> Vec<C64> {
    let z = C64::new(0.0, 0.0);
    let o = C64::new(1.0, 0.0);
    vec![o, z, z, z]
}

/// Annihilation (occupied -> empty): c^- = |0><1|.
pub fn annihilate() -> Vec<C64> {
    let z = C64::new(0.0, 0.0);
    let o = C64::new(1.0, 0.0);
    vec![z, o, z, z]
}

/// Creation (empty -> occupied): c^+ = |1><0|.
pub fn create() -> Vec<C64> {
    let z = C64::new(0.0, 0.0);
    let o = C64::new(1.0, 0.0);
    vec![z, z, o, z]
}

pub fn scale(op: &[C64], s: f64) -> Vec<C64> {
    op.iter().map(|v| v * s).collect()
}

pub fn add(a: &[C64], b: &[C64]) -> Vec<C64> {
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

pub fn sub(a: &[C64], b: &[C64]) -> Vec<C64> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}
