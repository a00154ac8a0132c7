use num_complex::Complex64;
use serde::{Deserialize, Serialize};

pub type C64 = Complex64;

/// A rank-3 MPS site tensor indexed (left bond, physical, right bond).
///
/// Boundary bonds have extent 1; `dp` is the local physical dimension `d`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tensor3 {
    pub data: Vec<C64>,
    pub dl: usize,
    pub dp: usize,
    pub dr: usize,
}

impl Tensor3 {
    pub fn zeros(dl: usize, dp: usize, dr: usize) -> Self {
        Self {
            data: vec![C64::new(0.0, 0.0); dl * dp * dr],
            dl,
            dp,
            dr,
        }
    }

    pub fn ones(dl: usize, dp: usize, dr: usize) -> Self {
        Self {
            data: vec![C64::new(1.0, 0.0); dl * dp * dr],
            dl,
            dp,
            dr,
        }
    }

    pub fn constant(dl: usize, dp: usize, dr: usize, c: f64) -> Self {
        Self {
            data: vec![C64::new(c, 0.0); dl * dp * dr],
            dl,
            dp,
            dr,
        }
    }

    pub fn random(dl: usize, dp: usize, dr: usize, rng: &mut rng::ONDRng) -> Self {
        let mut t = Self::zeros(dl, dp, dr);
        for (i, v) in t.data.iter_mut().enumerate() {
            let ctx = i.to_be_bytes();
            *v = C64::new(rng.next_f64(&ctx), 0.0);
        }
        t
    }

    #[inline]
    fn idx(&self, l: usize, p: usize, r: usize) -> usize {
        (l * self.dp + p) * self.dr + r
    }

    pub fn get(&self, l: usize, p: usize, r: usize) -> C64 {
        self.data[self.idx(l, p, r)]
    }

    pub fn set(&mut self, l: usize, p: usize, r: usize, v: C64) {
        let i = self.idx(l, p, r);
        self.data[i] = v;
    }

    /// Reshape (dl, dp, dr) -> (dl*dp, dr), grouping the left bond with the
    /// physical index. Used ahead of a right-moving gauge SVD.
    pub fn to_matrix_left_grouped(&self) -> faer::Mat<C64> {
        let rows = self.dl * self.dp;
        let mut m = faer::Mat::<C64>::zeros(rows, self.dr);
        for l in 0..self.dl {
            for p in 0..self.dp {
                for r in 0..self.dr {
                    m.write(l * self.dp + p, r, self.get(l, p, r));
                }
            }
        }
        m
    }

    pub fn from_matrix_left_grouped(m: &faer::MatRef<'_, C64>, dl: usize, dp: usize) -> Self {
        let dr = m.ncols();
        let mut t = Self::zeros(dl, dp, dr);
        for l in 0..dl {
            for p in 0..dp {
                for r in 0..dr {
                    t.set(l, p, r, m.read(l * dp + p, r));
                }
            }
        }
        t
    }

    /// Reshape (dl, dp, dr) -> (dl, dp*dr), grouping the physical index with
    /// the right bond. Used ahead of a left-moving gauge SVD.
    pub fn to_matrix_right_grouped(&self) -> faer::Mat<C64> {
        let cols = self.dp * self.dr;
        let mut m = faer::Mat::<C64>::zeros(self.dl, cols);
        for l in 0..self.dl {
            for p in 0..self.dp {
                for r in 0..self.dr {
                    m.write(l, p * self.dr + r, self.get(l, p, r));
                }
            }
        }
        m
    }

    pub fn from_matrix_right_grouped(m: &faer::MatRef<'_, C64>, dp: usize, dr: usize) -> Self {
        let dl = m.nrows();
        let mut t = Self::zeros(dl, dp, dr);
        for l in 0..dl {
            for p in 0..dp {
                for r in 0..dr {
                    t.set(l, p, r, m.read(l, p * dr + r));
                }
            }
        }
        t
    }

    pub fn has_non_finite(&self) -> bool {
        self.data.iter().any(|v| !v.re.is_finite() || !v.im.is_finite())
    }
}

/// A rank-4 MPO site tensor indexed (left virtual, right virtual, physical
/// out, physical in), i.e. `W[b_{i-1}, b_i, sigma, sigma']`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Tensor4 {
    pub data: Vec<C64>,
    pub bl: usize,
    pub br: usize,
    pub dp: usize,
}

impl Tensor4 {
    pub fn zeros(bl: usize, br: usize, dp: usize) -> Self {
        Self {
            data: vec![C64::new(0.0, 0.0); bl * br * dp * dp],
            bl,
            br,
            dp,
        }
    }

    #[inline]
    fn idx(&self, bl: usize, br: usize, s: usize, sp: usize) -> usize {
        ((bl * self.br + br) * self.dp + s) * self.dp + sp
    }

    pub fn get(&self, bl: usize, br: usize, s: usize, sp: usize) -> C64 {
        self.data[self.idx(bl, br, s, sp)]
    }

    pub fn set(&mut self, bl: usize, br: usize, s: usize, sp: usize, v: C64) {
        let i = self.idx(bl, br, s, sp);
        self.data[i] = v;
    }

    /// Build a single-channel block from a dense `dp x dp` operator placed at
    /// `(bl, br)`, used by model constructors assembling the finite-state
    /// operator automaton one block at a time.
    pub fn from_blocks(bl: usize, br: usize, dp: usize, blocks: &[((usize, usize), Vec<C64>)]) -> Self {
        let mut t = Self::zeros(bl, br, dp);
        for ((b, c), op) in blocks {
            assert_eq!(op.len(), dp * dp, "block operator must be dp x dp");
            for s in 0..dp {
                for sp in 0..dp {
                    t.set(*b, *c, s, sp, op[s * dp + sp]);
                }
            }
        }
        t
    }
}
