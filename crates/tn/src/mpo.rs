use crate::tensor::Tensor4;

/// One summand of an MPO: a site tensor per site, or `None` meaning the
/// identity acts at that site (spec §3).
pub type MpoTerm = Vec<Option<Tensor4>>;

/// An MPO is the sum of one or more terms. The core only ever contracts the
/// shapes it is given; model constructors (in the `models` crate) are
/// external collaborators that build `Mpo` values.
#[derive(Clone, Debug)]
pub struct Mpo {
    pub terms: Vec<MpoTerm>,
    pub n: usize,
}

impl Mpo {
    pub fn single(term: MpoTerm) -> Self {
        let n = term.len();
        Self { terms: vec![term], n }
    }

    pub fn sum(terms: Vec<MpoTerm>) -> Self {
        let n = terms.first().map(|t| t.len()).unwrap_or(0);
        for t in &terms {
            assert_eq!(t.len(), n, "all MPO terms must have the same length");
        }
        Self { terms, n }
    }

    pub fn n_terms(&self) -> usize {
        self.terms.len()
    }

    /// `None` means the identity acts at `site` for this term.
    pub fn site(&self, term: usize, site: usize) -> Option<&Tensor4> {
        self.terms[term][site].as_ref()
    }

    /// Boundary tensors must carry virtual extent 1 (spec §4.2 contract).
    pub fn check_boundaries(&self) -> bool {
        for term in &self.terms {
            if let Some(first) = term.first().and_then(|w| w.as_ref()) {
                if first.bl != 1 {
                    return false;
                }
            }
            if let Some(last) = term.last().and_then(|w| w.as_ref()) {
                if last.br != 1 {
                    return false;
                }
            }
        }
        true
    }
}
