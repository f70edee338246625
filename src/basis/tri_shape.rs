use super::{BasisError, SilvesterPolynomial};
use smallvec::SmallVec;

/// Number of basis functions (interpolation nodes) on a triangle of the given
/// polynomial order: (n+1)(n+2)/2.
pub fn num_basis_functions(order: usize) -> usize {
    (order + 1) * (order + 2) / 2
}

/// Canonical enumeration of the exponent triples (I, J, K), I + J + K = n,
/// defining the element's basis functions. Ordering is fixed because
/// downstream matrix rows and columns depend on it: the three vertex modes
/// first, then the edge-interior modes edge by edge, then the interior modes.
///
/// Orders 1–3 produce the 3-, 6- and 10-mode layouts used by the elemental
/// matrix tables.
pub fn basis_indices(order: usize) -> SmallVec<[[usize; 3]; 10]> {
    let n = order;
    let mut tuples = SmallVec::new();

    tuples.push([n, 0, 0]);
    tuples.push([0, n, 0]);
    tuples.push([0, 0, n]);

    // edge-interior modes: (v1, v2), (v2, v3), (v3, v1)
    for q in 1..n {
        tuples.push([n - q, q, 0]);
    }
    for q in 1..n {
        tuples.push([0, n - q, q]);
    }
    for q in 1..n {
        tuples.push([q, 0, n - q]);
    }

    // interior modes: all exponents >= 1
    for i in (1..=n.saturating_sub(2)).rev() {
        for j in (1..=(n - i).saturating_sub(1)).rev() {
            let k = n - i - j;
            if k >= 1 {
                tuples.push([i, j, k]);
            }
        }
    }

    tuples
}

/// 2D triangular shape function of a fixed order, built as a product of three
/// 1D [SilvesterPolynomial] members over the barycentric coordinates
/// (ξ, η, 1−ξ−η) of the reference triangle.
#[derive(Clone, Copy, Debug)]
pub struct TriShapeFn {
    poly: SilvesterPolynomial,
}

impl TriShapeFn {
    pub fn new(order: usize) -> Result<Self, BasisError> {
        Ok(Self {
            poly: SilvesterPolynomial::new(order)?,
        })
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.poly.order()
    }

    #[inline]
    pub fn num_basis_functions(&self) -> usize {
        num_basis_functions(self.order())
    }

    /// Exponent triple of the basis function at `index` in the canonical
    /// enumeration. Fails for `index` beyond the element's mode count.
    pub fn basis_index(&self, index: usize) -> Result<[usize; 3], BasisError> {
        let tuples = basis_indices(self.order());
        tuples
            .get(index)
            .copied()
            .ok_or(BasisError::BasisIndexOutOfRange {
                index,
                num_basis: tuples.len(),
            })
    }

    fn check_exponents(&self, i: usize, j: usize, k: usize) -> Result<(), BasisError> {
        if i + j + k > self.order() {
            Err(BasisError::ExponentSumTooLarge {
                i,
                j,
                k,
                order: self.order(),
            })
        } else {
            Ok(())
        }
    }

    /// `P_i(ξ)·P_j(η)·P_k(1−ξ−η)`
    pub fn evaluate(
        &self,
        i: usize,
        j: usize,
        k: usize,
        ksi: f64,
        eta: f64,
    ) -> Result<f64, BasisError> {
        self.check_exponents(i, j, k)?;
        Ok(self.eval_raw(i, j, k, ksi, eta))
    }

    /// ∂/∂ξ of [evaluate](Self::evaluate). The third barycentric argument
    /// contributes −P_i·P_j·P_k' through the chain rule (∂ζ/∂ξ = −1).
    pub fn deriv_ksi(
        &self,
        i: usize,
        j: usize,
        k: usize,
        ksi: f64,
        eta: f64,
    ) -> Result<f64, BasisError> {
        self.check_exponents(i, j, k)?;
        Ok(self.deriv_ksi_raw(i, j, k, ksi, eta))
    }

    /// ∂/∂η of [evaluate](Self::evaluate). ∂ζ/∂η = −1 as well, so the same
    /// −P_i·P_j·P_k' term appears here.
    pub fn deriv_eta(
        &self,
        i: usize,
        j: usize,
        k: usize,
        ksi: f64,
        eta: f64,
    ) -> Result<f64, BasisError> {
        self.check_exponents(i, j, k)?;
        Ok(self.deriv_eta_raw(i, j, k, ksi, eta))
    }

    pub(crate) fn eval_raw(&self, i: usize, j: usize, k: usize, ksi: f64, eta: f64) -> f64 {
        let zeta = 1.0 - ksi - eta;
        self.poly.eval_raw(i, ksi) * self.poly.eval_raw(j, eta) * self.poly.eval_raw(k, zeta)
    }

    pub(crate) fn deriv_ksi_raw(&self, i: usize, j: usize, k: usize, ksi: f64, eta: f64) -> f64 {
        let zeta = 1.0 - ksi - eta;
        let p = &self.poly;

        p.deriv_raw(i, ksi) * p.eval_raw(j, eta) * p.eval_raw(k, zeta)
            - p.eval_raw(i, ksi) * p.eval_raw(j, eta) * p.deriv_raw(k, zeta)
    }

    pub(crate) fn deriv_eta_raw(&self, i: usize, j: usize, k: usize, ksi: f64, eta: f64) -> f64 {
        let zeta = 1.0 - ksi - eta;
        let p = &self.poly;

        p.eval_raw(i, ksi) * p.deriv_raw(j, eta) * p.eval_raw(k, zeta)
            - p.eval_raw(i, ksi) * p.eval_raw(j, eta) * p.deriv_raw(k, zeta)
    }

    fn batch<'p>(
        &self,
        i: usize,
        j: usize,
        k: usize,
        ksi: &'p [f64],
        eta: &'p [f64],
        op: BatchOp,
    ) -> Result<BatchEval<'p>, BasisError> {
        self.check_exponents(i, j, k)?;
        if ksi.len() != eta.len() {
            return Err(BasisError::MismatchedBatchLengths {
                ksi: ksi.len(),
                eta: eta.len(),
            });
        }

        Ok(BatchEval {
            shape: *self,
            i,
            j,
            k,
            ksi_points: ksi,
            eta_points: eta,
            cursor: 0,
            op,
        })
    }

    /// Lazy elementwise evaluation over equal-length ξ/η sequences. The
    /// returned iterator is finite and restartable (it is `Clone`, and
    /// [BatchEval::restart] rewinds it in place).
    pub fn evaluate_batch<'p>(
        &self,
        i: usize,
        j: usize,
        k: usize,
        ksi: &'p [f64],
        eta: &'p [f64],
    ) -> Result<BatchEval<'p>, BasisError> {
        self.batch(i, j, k, ksi, eta, BatchOp::Value)
    }

    /// Batch form of [deriv_ksi](Self::deriv_ksi).
    pub fn deriv_ksi_batch<'p>(
        &self,
        i: usize,
        j: usize,
        k: usize,
        ksi: &'p [f64],
        eta: &'p [f64],
    ) -> Result<BatchEval<'p>, BasisError> {
        self.batch(i, j, k, ksi, eta, BatchOp::DerivKsi)
    }

    /// Batch form of [deriv_eta](Self::deriv_eta).
    pub fn deriv_eta_batch<'p>(
        &self,
        i: usize,
        j: usize,
        k: usize,
        ksi: &'p [f64],
        eta: &'p [f64],
    ) -> Result<BatchEval<'p>, BasisError> {
        self.batch(i, j, k, ksi, eta, BatchOp::DerivEta)
    }
}

#[derive(Clone, Copy, Debug)]
enum BatchOp {
    Value,
    DerivKsi,
    DerivEta,
}

/// Lazy batch evaluation of one shape function (or one of its partials) over
/// a point sequence. Yields one value per (ξ, η) pair, in order.
#[derive(Clone, Debug)]
pub struct BatchEval<'p> {
    shape: TriShapeFn,
    i: usize,
    j: usize,
    k: usize,
    ksi_points: &'p [f64],
    eta_points: &'p [f64],
    cursor: usize,
    op: BatchOp,
}

impl BatchEval<'_> {
    /// Rewind to the first point, allowing the sequence to be traversed again.
    pub fn restart(&mut self) {
        self.cursor = 0;
    }
}

impl Iterator for BatchEval<'_> {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.cursor >= self.ksi_points.len() {
            return None;
        }

        let ksi = self.ksi_points[self.cursor];
        let eta = self.eta_points[self.cursor];
        self.cursor += 1;

        Some(match self.op {
            BatchOp::Value => self.shape.eval_raw(self.i, self.j, self.k, ksi, eta),
            BatchOp::DerivKsi => self.shape.deriv_ksi_raw(self.i, self.j, self.k, ksi, eta),
            BatchOp::DerivEta => self.shape.deriv_eta_raw(self.i, self.j, self.k, ksi, eta),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.ksi_points.len() - self.cursor;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for BatchEval<'_> {}
