use nalgebra::DMatrix;
use std::fmt;

use super::analytic::{analytic_supported, fill_matrix_grad, fill_matrix_nn, GradComponent};
use super::geometry::{ElementGeometry, GeometryError, TriInvariants};
use crate::basis::{basis_indices, num_basis_functions, BasisError, TriShapeFn};
use crate::error::ErrorCategory;
use crate::quadrature::{QuadratureError, QuadratureTable, RefDomain};

/// The three elemental matrix families of the solver
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatrixFamily {
    /// <∂N_i/∂x, ∂N_j/∂x>
    NxNx,
    /// <∂N_i/∂y, ∂N_j/∂y>
    NyNy,
    /// <N_i, N_j>
    NN,
}

impl fmt::Display for MatrixFamily {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NxNx => write!(f, "N_NxNx"),
            Self::NyNy => write!(f, "N_NyNy"),
            Self::NN => write!(f, "N_NN"),
        }
    }
}

/// Failures of elemental matrix assembly.
#[derive(Clone, Debug, PartialEq)]
pub enum SolverError {
    Geometry(GeometryError),
    Basis(BasisError),
    Quadrature(QuadratureError),
    /// The analytic filler has no tables for this order combination
    AnalyticOrderUnsupported {
        basis_order: usize,
        coefficient_order: usize,
    },
    /// Basis order must be >= 1
    InvalidBasisOrder(usize),
    /// Coefficient-matrix index beyond the family's matrix count
    MatrixIndexOutOfRange { index: usize, num_matrices: usize },
    /// Accessor called before the family's setup_* populated it
    MatrixNotAssembled(MatrixFamily),
    /// The requested orders imply more matrix storage than is allocatable
    AllocationTooLarge {
        basis_order: usize,
        coefficient_order: usize,
    },
}

impl SolverError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Geometry(err) => err.category(),
            Self::Basis(err) => err.category(),
            Self::Quadrature(err) => err.category(),
            Self::AnalyticOrderUnsupported { .. } => ErrorCategory::FeatureNotImplemented,
            Self::InvalidBasisOrder(_)
            | Self::MatrixIndexOutOfRange { .. }
            | Self::MatrixNotAssembled(_) => ErrorCategory::Input,
            Self::AllocationTooLarge { .. } => ErrorCategory::MemoryOverflow,
        }
    }
}

impl fmt::Display for SolverError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Geometry(err) => err.fmt(f),
            Self::Basis(err) => err.fmt(f),
            Self::Quadrature(err) => err.fmt(f),
            Self::AnalyticOrderUnsupported {
                basis_order,
                coefficient_order,
            } => write!(
                f,
                "No analytic tables for basis order {} with coefficient order {}; use the numeric path!",
                basis_order, coefficient_order
            ),
            Self::InvalidBasisOrder(order) => {
                write!(f, "Basis function order must be >= 1; got {}!", order)
            }
            Self::MatrixIndexOutOfRange {
                index,
                num_matrices,
            } => write!(
                f,
                "Coefficient matrix index {} out of range; the family holds {} matrices!",
                index, num_matrices
            ),
            Self::MatrixNotAssembled(family) => {
                write!(f, "{} has not been assembled; call its setup first!", family)
            }
            Self::AllocationTooLarge {
                basis_order,
                coefficient_order,
            } => write!(
                f,
                "Matrix storage for basis order {} with coefficient order {} exceeds the allocation limit!",
                basis_order, coefficient_order
            ),
        }
    }
}

impl std::error::Error for SolverError {}

impl From<GeometryError> for SolverError {
    fn from(err: GeometryError) -> Self {
        Self::Geometry(err)
    }
}

impl From<BasisError> for SolverError {
    fn from(err: BasisError) -> Self {
        Self::Basis(err)
    }
}

impl From<QuadratureError> for SolverError {
    fn from(err: QuadratureError) -> Self {
        Self::Quadrature(err)
    }
}

const MAX_MATRIX_ENTRIES: usize = 1 << 28;

fn tri_count(order: usize) -> Option<usize> {
    order
        .checked_add(1)?
        .checked_mul(order.checked_add(2)?)
        .map(|n| n / 2)
}

/// Basis/coefficient mode counts with an allocation guard: the total entry
/// count across the family must be representable and within the limit.
fn checked_dims(basis_order: usize, coefficient_order: usize) -> Result<(usize, usize), SolverError> {
    let too_large = SolverError::AllocationTooLarge {
        basis_order,
        coefficient_order,
    };

    let nb = tri_count(basis_order).ok_or(too_large.clone())?;
    let num_matrices = tri_count(coefficient_order).ok_or(too_large.clone())?;

    let total = nb
        .checked_mul(nb)
        .and_then(|sq| sq.checked_mul(num_matrices))
        .ok_or(too_large.clone())?;
    if total > MAX_MATRIX_ENTRIES {
        return Err(too_large);
    }

    Ok((nb, num_matrices))
}

/// Per-element assembler for the three matrix families over one triangle.
///
/// The solver borrows its geometry provider for its whole lifetime; the
/// provider must outlive the solver and is never mutated. Geometry invariants
/// are derived once, on the first `setup_*` call, and reused by later calls.
/// Each `setup_*` call clears and repopulates its own family, so a single
/// instance must not be shared across threads mid-assembly; distinct
/// elements (distinct instances) are independent.
#[derive(Debug)]
pub struct SolverTriangle<'g, G: ElementGeometry> {
    geometry: &'g G,
    basis_order: usize,
    coefficient_order: usize,
    invariants: Option<TriInvariants>,
    n_nxnx: Vec<DMatrix<f64>>,
    n_nyny: Vec<DMatrix<f64>>,
    n_nn: Vec<DMatrix<f64>>,
}

impl<'g, G: ElementGeometry> SolverTriangle<'g, G> {
    /// Bind a solver to one geometry provider and one order pair. The
    /// geometry itself is validated lazily, on the first `setup_*` call.
    pub fn new(
        geometry: &'g G,
        basis_order: usize,
        coefficient_order: usize,
    ) -> Result<Self, SolverError> {
        if basis_order < 1 {
            return Err(SolverError::InvalidBasisOrder(basis_order));
        }
        checked_dims(basis_order, coefficient_order)?;

        Ok(Self {
            geometry,
            basis_order,
            coefficient_order,
            invariants: None,
            n_nxnx: Vec::new(),
            n_nyny: Vec::new(),
            n_nn: Vec::new(),
        })
    }

    #[inline]
    pub fn basis_order(&self) -> usize {
        self.basis_order
    }

    #[inline]
    pub fn coefficient_order(&self) -> usize {
        self.coefficient_order
    }

    #[inline]
    pub fn num_basis_functions(&self) -> usize {
        num_basis_functions(self.basis_order)
    }

    #[inline]
    pub fn num_coefficient_matrices(&self) -> usize {
        num_basis_functions(self.coefficient_order)
    }

    /// Change the basis order; previously assembled matrices are discarded.
    pub fn set_basis_order(&mut self, basis_order: usize) -> Result<(), SolverError> {
        if basis_order < 1 {
            return Err(SolverError::InvalidBasisOrder(basis_order));
        }
        checked_dims(basis_order, self.coefficient_order)?;

        self.basis_order = basis_order;
        self.clear_matrices();
        Ok(())
    }

    /// Change the coefficient order; previously assembled matrices are
    /// discarded.
    pub fn set_coefficient_order(&mut self, coefficient_order: usize) -> Result<(), SolverError> {
        checked_dims(self.basis_order, coefficient_order)?;

        self.coefficient_order = coefficient_order;
        self.clear_matrices();
        Ok(())
    }

    /// Rebind to another geometry provider; invariants and matrices are
    /// discarded.
    pub fn set_geometry(&mut self, geometry: &'g G) {
        self.geometry = geometry;
        self.invariants = None;
        self.clear_matrices();
    }

    fn clear_matrices(&mut self) {
        self.n_nxnx.clear();
        self.n_nyny.clear();
        self.n_nn.clear();
    }

    /// The element's geometry invariants, derived on first use and memoized.
    pub fn invariants(&mut self) -> Result<TriInvariants, SolverError> {
        if let Some(invariants) = self.invariants {
            return Ok(invariants);
        }

        let invariants = TriInvariants::compute(self.geometry)?;
        self.invariants = Some(invariants);
        Ok(invariants)
    }

    /// Assemble the `N_NxNx` family: one matrix of <∂N_i/∂x, ∂N_j/∂x>
    /// inner products per coefficient basis function.
    pub fn setup_nxnx(&mut self, force_numerical: bool) -> Result<(), SolverError> {
        self.setup_family(MatrixFamily::NxNx, force_numerical)
    }

    /// Assemble the `N_NyNy` family: one matrix of <∂N_i/∂y, ∂N_j/∂y>
    /// inner products per coefficient basis function.
    pub fn setup_nyny(&mut self, force_numerical: bool) -> Result<(), SolverError> {
        self.setup_family(MatrixFamily::NyNy, force_numerical)
    }

    /// Assemble the `N_NN` family: one matrix of <N_i, N_j> inner products
    /// per coefficient basis function.
    pub fn setup_nn(&mut self, force_numerical: bool) -> Result<(), SolverError> {
        self.setup_family(MatrixFamily::NN, force_numerical)
    }

    fn setup_family(
        &mut self,
        family: MatrixFamily,
        force_numerical: bool,
    ) -> Result<(), SolverError> {
        checked_dims(self.basis_order, self.coefficient_order)?;
        let invariants = self.invariants()?;

        let basis_order = self.basis_order;
        let coefficient_order = self.coefficient_order;
        let matrices = match family {
            MatrixFamily::NxNx => &mut self.n_nxnx,
            MatrixFamily::NyNy => &mut self.n_nyny,
            MatrixFamily::NN => &mut self.n_nn,
        };

        if analytic_supported(basis_order, coefficient_order) && !force_numerical {
            match family {
                MatrixFamily::NN => {
                    fill_matrix_nn(&invariants, basis_order, coefficient_order, matrices)
                }
                MatrixFamily::NxNx => fill_matrix_grad(
                    &invariants,
                    basis_order,
                    coefficient_order,
                    GradComponent::X,
                    matrices,
                ),
                MatrixFamily::NyNy => fill_matrix_grad(
                    &invariants,
                    basis_order,
                    coefficient_order,
                    GradComponent::Y,
                    matrices,
                ),
            }
        } else {
            fill_numeric(&invariants, basis_order, coefficient_order, family, matrices)
        }
    }

    pub fn matrix_nxnx(&self, index: usize) -> Result<&DMatrix<f64>, SolverError> {
        self.matrix(MatrixFamily::NxNx, index)
    }

    pub fn matrix_nyny(&self, index: usize) -> Result<&DMatrix<f64>, SolverError> {
        self.matrix(MatrixFamily::NyNy, index)
    }

    pub fn matrix_nn(&self, index: usize) -> Result<&DMatrix<f64>, SolverError> {
        self.matrix(MatrixFamily::NN, index)
    }

    fn matrix(&self, family: MatrixFamily, index: usize) -> Result<&DMatrix<f64>, SolverError> {
        let matrices = match family {
            MatrixFamily::NxNx => &self.n_nxnx,
            MatrixFamily::NyNy => &self.n_nyny,
            MatrixFamily::NN => &self.n_nn,
        };

        if matrices.is_empty() {
            return Err(SolverError::MatrixNotAssembled(family));
        }

        matrices.get(index).ok_or(SolverError::MatrixIndexOutOfRange {
            index,
            num_matrices: matrices.len(),
        })
    }
}

/// Numeric assembly of one family: quadrature of degree
/// `coefficient_order + 2·basis_order` (exact for a product of two basis
/// gradients times a coefficient mode), reference gradients mapped to
/// physical through the inverse Jacobian, and the signed determinant as the
/// area-element factor. `N_NN` takes plain products with the determinant
/// factor only.
fn fill_numeric(
    invariants: &TriInvariants,
    basis_order: usize,
    coefficient_order: usize,
    family: MatrixFamily,
    matrices: &mut Vec<DMatrix<f64>>,
) -> Result<(), SolverError> {
    let nb = num_basis_functions(basis_order);
    let num_matrices = num_basis_functions(coefficient_order);
    matrices.clear();
    matrices.resize(num_matrices, DMatrix::zeros(nb, nb));

    let table = QuadratureTable::for_domain(RefDomain::Triangle);
    let degree = coefficient_order + 2 * basis_order;
    let num_points = table.num_points_for_poly_order(degree);

    let ksi = table.ksi_coordinates(num_points)?;
    let eta = table.eta_coordinates(num_points)?;
    let weights = table.weights(num_points);

    let shape = TriShapeFn::new(basis_order)?;
    let ji = invariants.jacobian_inv;

    // per-mode samples at every quadrature point: plain values for N_NN, the
    // requested physical gradient component otherwise
    let modes = basis_indices(basis_order);
    let mut samples: Vec<Vec<f64>> = Vec::with_capacity(modes.len());
    for &[i, j, k] in modes.iter() {
        let values: Vec<f64> = match family {
            MatrixFamily::NN => shape.evaluate_batch(i, j, k, ksi, eta)?.collect(),
            MatrixFamily::NxNx | MatrixFamily::NyNy => {
                let col = match family {
                    MatrixFamily::NxNx => 0,
                    _ => 1,
                };
                let dksi = shape.deriv_ksi_batch(i, j, k, ksi, eta)?;
                let deta = shape.deriv_eta_batch(i, j, k, ksi, eta)?;
                dksi.zip(deta)
                    .map(|(dk, de)| ji.u[col] * dk + ji.v[col] * de)
                    .collect()
            }
        };
        samples.push(values);
    }

    let coeff_samples: Vec<Vec<f64>> = if coefficient_order == 0 {
        vec![vec![1.0; weights.len()]]
    } else {
        let coeff_shape = TriShapeFn::new(coefficient_order)?;
        let mut all = Vec::with_capacity(num_matrices);
        for &[i, j, k] in basis_indices(coefficient_order).iter() {
            all.push(coeff_shape.evaluate_batch(i, j, k, ksi, eta)?.collect());
        }
        all
    };

    let det = invariants.det_jacobian;
    for (k, matrix) in matrices.iter_mut().enumerate() {
        for i in 0..nb {
            for j in i..nb {
                let mut sum = 0.0;
                for (q, weight) in weights.iter().enumerate() {
                    sum += weight * coeff_samples[k][q] * samples[i][q] * samples[j][q];
                }

                let value = sum * det;
                matrix[(i, j)] = value;
                matrix[(j, i)] = value;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::geometry::TriGeometry;
    use crate::space::Point3;

    const AGREEMENT_ACCURACY: f64 = 1e-13;

    fn reference_triangle() -> TriGeometry {
        TriGeometry::new([
            Point3::new(1.0, -0.5, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-0.5, 2.0, 0.0),
        ])
    }

    fn assemble(
        solver: &mut SolverTriangle<TriGeometry>,
        family: MatrixFamily,
        force_numerical: bool,
    ) -> Vec<DMatrix<f64>> {
        match family {
            MatrixFamily::NxNx => solver.setup_nxnx(force_numerical).unwrap(),
            MatrixFamily::NyNy => solver.setup_nyny(force_numerical).unwrap(),
            MatrixFamily::NN => solver.setup_nn(force_numerical).unwrap(),
        }

        (0..solver.num_coefficient_matrices())
            .map(|k| match family {
                MatrixFamily::NxNx => solver.matrix_nxnx(k).unwrap().clone(),
                MatrixFamily::NyNy => solver.matrix_nyny(k).unwrap().clone(),
                MatrixFamily::NN => solver.matrix_nn(k).unwrap().clone(),
            })
            .collect()
    }

    #[test]
    fn analytic_and_numeric_paths_agree() {
        let geo = reference_triangle();

        for basis_order in 1..=3 {
            for coefficient_order in 0..=1 {
                let mut solver =
                    SolverTriangle::new(&geo, basis_order, coefficient_order).unwrap();

                for family in [MatrixFamily::NN, MatrixFamily::NxNx, MatrixFamily::NyNy] {
                    let analytic = assemble(&mut solver, family, false);
                    let numeric = assemble(&mut solver, family, true);

                    for (a_mat, n_mat) in analytic.iter().zip(numeric.iter()) {
                        let scale = a_mat.iter().fold(0.0f64, |acc, v| acc.max(v.abs()));
                        assert!(scale > 0.0);

                        for (a, n) in a_mat.iter().zip(n_mat.iter()) {
                            if a.abs() >= 0.1 * scale {
                                assert!(
                                    ((a - n) / a).abs() < AGREEMENT_ACCURACY,
                                    "order ({}, {}), {}: {} vs {}",
                                    basis_order,
                                    coefficient_order,
                                    family,
                                    a,
                                    n
                                );
                            } else {
                                assert!(
                                    (a - n).abs() < AGREEMENT_ACCURACY * scale,
                                    "order ({}, {}), {}: {} vs {}",
                                    basis_order,
                                    coefficient_order,
                                    family,
                                    a,
                                    n
                                );
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn structural_zeros_match_exactly() {
        // c₃ = 0 for the reference triangle, so every N_NyNy entry touching
        // the third vertex mode of the order-1 basis is exactly zero on both
        // paths
        let geo = reference_triangle();
        let mut solver = SolverTriangle::new(&geo, 1, 0).unwrap();

        let analytic = assemble(&mut solver, MatrixFamily::NyNy, false);
        let numeric = assemble(&mut solver, MatrixFamily::NyNy, true);

        for idx in 0..3 {
            assert_eq!(analytic[0][(2, idx)], 0.0);
            assert_eq!(analytic[0][(idx, 2)], 0.0);
            assert_eq!(numeric[0][(2, idx)], 0.0);
            assert_eq!(numeric[0][(idx, 2)], 0.0);
        }
    }

    #[test]
    fn order_one_mass_diagonal_is_delta_over_six() {
        let geo = reference_triangle();
        let mut solver = SolverTriangle::new(&geo, 1, 0).unwrap();
        solver.setup_nn(false).unwrap();

        let delta = solver.invariants().unwrap().delta;
        assert!((delta - 1.125).abs() < 1e-14);

        let m = solver.matrix_nn(0).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { delta / 6.0 } else { delta / 12.0 };
                assert!((m[(i, j)] - expected).abs() < 1e-14);
            }
        }
    }

    #[test]
    fn populated_matrices_are_symmetric() {
        let geo = reference_triangle();
        let mut solver = SolverTriangle::new(&geo, 3, 1).unwrap();

        for family in [MatrixFamily::NN, MatrixFamily::NxNx, MatrixFamily::NyNy] {
            for force in [false, true] {
                for matrix in assemble(&mut solver, family, force) {
                    for i in 0..matrix.nrows() {
                        for j in 0..i {
                            assert_eq!(matrix[(i, j)], matrix[(j, i)]);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn order_four_routes_to_the_numeric_path() {
        let geo = reference_triangle();

        // the analytic entry point rejects the order outright...
        let invariants = TriInvariants::compute(&geo).unwrap();
        let mut direct = Vec::new();
        let err = fill_matrix_nn(&invariants, 4, 0, &mut direct).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::FeatureNotImplemented);

        // ...while setup_* silently takes the numeric path
        let mut solver = SolverTriangle::new(&geo, 4, 0).unwrap();
        solver.setup_nn(false).unwrap();

        let m = solver.matrix_nn(0).unwrap();
        assert_eq!(m.nrows(), 15);
        for i in 0..m.nrows() {
            for j in 0..i {
                assert_eq!(m[(i, j)], m[(j, i)]);
            }
        }

        // total mass equals the element area: Σ_ij ∫N_i N_j = ∫(ΣN)² = Δ
        let total: f64 = m.iter().sum();
        assert!((total - invariants.delta).abs() < 1e-13);
    }

    #[test]
    fn accessors_enforce_assembly_and_range() {
        let geo = reference_triangle();
        let mut solver = SolverTriangle::new(&geo, 2, 1).unwrap();

        assert!(matches!(
            solver.matrix_nn(0),
            Err(SolverError::MatrixNotAssembled(MatrixFamily::NN))
        ));

        solver.setup_nn(false).unwrap();
        assert_eq!(solver.num_coefficient_matrices(), 3);
        assert!(solver.matrix_nn(2).is_ok());
        assert!(matches!(
            solver.matrix_nn(3),
            Err(SolverError::MatrixIndexOutOfRange {
                index: 3,
                num_matrices: 3
            })
        ));

        // the other families remain unassembled
        assert!(solver.matrix_nxnx(0).is_err());
    }

    #[test]
    fn order_setters_discard_stale_matrices() {
        let geo = reference_triangle();
        let mut solver = SolverTriangle::new(&geo, 1, 0).unwrap();
        solver.setup_nn(false).unwrap();
        assert!(solver.matrix_nn(0).is_ok());

        solver.set_basis_order(2).unwrap();
        assert!(matches!(
            solver.matrix_nn(0),
            Err(SolverError::MatrixNotAssembled(_))
        ));

        solver.setup_nn(false).unwrap();
        assert_eq!(solver.matrix_nn(0).unwrap().nrows(), 6);
    }

    #[test]
    fn geometry_rebinding_resets_invariants() {
        let geo = reference_triangle();
        let unit = TriGeometry::new([
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ]);

        let mut solver = SolverTriangle::new(&geo, 1, 0).unwrap();
        assert!((solver.invariants().unwrap().delta - 1.125).abs() < 1e-14);

        solver.set_geometry(&unit);
        assert!((solver.invariants().unwrap().delta - 0.5).abs() < 1e-14);
    }

    #[test]
    fn invalid_orders_are_rejected() {
        let geo = reference_triangle();

        assert!(matches!(
            SolverTriangle::new(&geo, 0, 0),
            Err(SolverError::InvalidBasisOrder(0))
        ));

        let err = SolverTriangle::new(&geo, 100_000_000, 0).unwrap_err();
        assert!(matches!(err, SolverError::AllocationTooLarge { .. }));
        assert_eq!(err.category(), ErrorCategory::MemoryOverflow);
    }

    #[test]
    fn geometry_errors_surface_through_setup() {
        let skewed = TriGeometry::new([
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 0.0),
        ]);

        let mut solver = SolverTriangle::new(&skewed, 1, 0).unwrap();
        let err = solver.setup_nn(false).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Geometry);

        let curved = TriGeometry::with_order(
            [
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            3,
        );
        let mut solver = SolverTriangle::new(&curved, 1, 0).unwrap();
        let err = solver.setup_nxnx(false).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::FeatureNotImplemented);
    }
}
