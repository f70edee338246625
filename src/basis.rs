mod silvester;
mod tri_shape;

pub use silvester::{factorial, SilvesterPolynomial};
pub use tri_shape::{basis_indices, num_basis_functions, BatchEval, TriShapeFn};

use crate::error::ErrorCategory;
use std::fmt;

/// Contract violations raised by the shape-function evaluators. All of these
/// are input errors: the caller supplied an index, order, or batch shape the
/// polynomial family cannot accept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BasisError {
    /// Silvester family requires order ≥ 1
    InvalidOrder(usize),
    /// Polynomial index exceeds the family order
    IndexOutOfRange { index: usize, order: usize },
    /// Exponent triple (i, j, k) with i + j + k > order
    ExponentSumTooLarge {
        i: usize,
        j: usize,
        k: usize,
        order: usize,
    },
    /// Batch evaluation given ξ and η sequences of different lengths
    MismatchedBatchLengths { ksi: usize, eta: usize },
    /// Basis-function index beyond the element's mode count
    BasisIndexOutOfRange { index: usize, num_basis: usize },
}

impl BasisError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Input
    }
}

impl fmt::Display for BasisError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidOrder(order) => {
                write!(f, "Silvester polynomial order must be >= 1; got {}!", order)
            }
            Self::IndexOutOfRange { index, order } => write!(
                f,
                "Silvester polynomial index {} exceeds family order {}!",
                index, order
            ),
            Self::ExponentSumTooLarge { i, j, k, order } => write!(
                f,
                "Triangular shape function indices ({}, {}, {}) sum beyond order {}!",
                i, j, k, order
            ),
            Self::MismatchedBatchLengths { ksi, eta } => write!(
                f,
                "Batch evaluation requires equal-length coordinate sequences; got {} ksi and {} eta values!",
                ksi, eta
            ),
            Self::BasisIndexOutOfRange { index, num_basis } => write!(
                f,
                "Basis function index {} out of range; element has {} modes!",
                index, num_basis
            ),
        }
    }
}

impl std::error::Error for BasisError {}
