use super::BasisError;

/// Integer factorial. Exact for n <= 20; the assembly paths never ask for
/// more (the largest use is the moment-integration denominator (a+b+c+2)!).
pub fn factorial(n: usize) -> u64 {
    (1..=n as u64).product()
}

/// The 1D Silvester interpolation polynomial family of a fixed order N.
///
/// `P_m(ξ) = Π_{p=0}^{m-1} (N·ξ − p) / m!` for 1 <= m <= N, and `P_0 ≡ 1`.
/// `P_m` has m equally spaced zeros at ξ = 0, 1/N, ..., (m−1)/N and value 1
/// at the interpolation node ξ = m/N. Products of three members over the
/// barycentric coordinates of a triangle form the element shape functions
/// (see [TriShapeFn](super::TriShapeFn)).
#[derive(Clone, Copy, Debug)]
pub struct SilvesterPolynomial {
    order: usize,
}

impl SilvesterPolynomial {
    pub fn new(order: usize) -> Result<Self, BasisError> {
        if order < 1 {
            Err(BasisError::InvalidOrder(order))
        } else {
            Ok(Self { order })
        }
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Evaluate `P_index` at ξ. Fails if `index` exceeds the family order.
    pub fn evaluate(&self, index: usize, ksi: f64) -> Result<f64, BasisError> {
        if index > self.order {
            Err(BasisError::IndexOutOfRange {
                index,
                order: self.order,
            })
        } else {
            Ok(self.eval_raw(index, ksi))
        }
    }

    /// Evaluate `dP_index/dξ` at ξ. Fails if `index` exceeds the family order.
    pub fn evaluate_deriv(&self, index: usize, ksi: f64) -> Result<f64, BasisError> {
        if index > self.order {
            Err(BasisError::IndexOutOfRange {
                index,
                order: self.order,
            })
        } else {
            Ok(self.deriv_raw(index, ksi))
        }
    }

    // callers must guarantee m <= order
    pub(crate) fn eval_raw(&self, m: usize, ksi: f64) -> f64 {
        if m == 0 {
            return 1.0;
        }

        let n = self.order as f64;
        let mut product = 1.0;
        for p in 0..m {
            product *= n * ksi - p as f64;
        }

        product / factorial(m) as f64
    }

    // d/dξ of the product above: (N/m!)·Σ_j Π_{p≠j} (N·ξ − p)
    pub(crate) fn deriv_raw(&self, m: usize, ksi: f64) -> f64 {
        if m == 0 {
            return 0.0;
        }

        let n = self.order as f64;
        let mut sum = 0.0;
        for j in 0..m {
            let mut product = 1.0;
            for p in (0..m).filter(|&p| p != j) {
                product *= n * ksi - p as f64;
            }
            sum += product;
        }

        n * sum / factorial(m) as f64
    }
}
