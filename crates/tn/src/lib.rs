pub mod linalg;
pub mod mpo;
pub mod mps;
pub mod tensor;
pub mod truncation;

pub use mpo::{Mpo, MpoTerm};
pub use mps::{Mps, MpsError, SeedPolicy};
pub use tensor::{Tensor3, Tensor4, C64};
pub use truncation::Truncation;
