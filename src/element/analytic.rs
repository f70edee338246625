//! Closed-form elemental matrices for the analytic path.
//!
//! Every entry of the three matrix families is a rational multiple of the
//! signed area Δ (mass) or a rational quadratic form in the edge projections
//! over 4Δ (gradient products). The rational tables are produced once by
//! exact symbolic integration over the reference triangle (the Silvester
//! basis is expanded into barycentric monomials and integrated with the
//! moment identity ∫ L₁^a L₂^b L₃^c dA = 2Δ·a!b!c!/(a+b+c+2)!) and cached
//! as static data. The fill functions below are pure maps from the geometry
//! invariants onto matrices.
//!
//! One table family serves both stiffness-like matrices: the closed forms
//! for N_NxNx and N_NyNy are identical under b ↔ c.

use nalgebra::DMatrix;
use once_cell::sync::Lazy;

use super::geometry::TriInvariants;
use super::solver::SolverError;
use crate::basis::{basis_indices, factorial, num_basis_functions};

/// Which gradient component a stiffness-like family integrates
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GradComponent {
    /// ∂/∂x products, weighted by the b projections
    X,
    /// ∂/∂y products, weighted by the c projections
    Y,
}

/// Fill the mass-matrix family `N_NN` from the closed-form tables:
/// `M^(k)_ij = table[k][i][j] · Δ`.
///
/// Only `basis_order` 1–3 with `coefficient_order` 0–1 have tables; anything
/// else is a feature-not-implemented error. `setup_nn` never trips this (it
/// routes unsupported combinations to the numeric integrator); it is only
/// reachable by calling the filler directly.
pub fn fill_matrix_nn(
    invariants: &TriInvariants,
    basis_order: usize,
    coefficient_order: usize,
    matrices: &mut Vec<DMatrix<f64>>,
) -> Result<(), SolverError> {
    let tables = tables_for(basis_order, coefficient_order)?;
    let nb = num_basis_functions(basis_order);
    resize_family(matrices, num_basis_functions(coefficient_order), nb);

    for (k, matrix) in matrices.iter_mut().enumerate() {
        for i in 0..nb {
            for j in i..nb {
                let value = tables.nn[k][i][j] * invariants.delta;
                matrix[(i, j)] = value;
                matrix[(j, i)] = value;
            }
        }
    }

    Ok(())
}

/// Fill a stiffness-like family (`N_NxNx` or `N_NyNy`) from the closed-form
/// tables: `S^(k)_ij = Σ_{s,t} B_s B_t · table[k][i][j][s][t] / (4Δ)` with
/// B = b (x component) or c (y component).
///
/// Same order gating as [fill_matrix_nn].
pub fn fill_matrix_grad(
    invariants: &TriInvariants,
    basis_order: usize,
    coefficient_order: usize,
    component: GradComponent,
    matrices: &mut Vec<DMatrix<f64>>,
) -> Result<(), SolverError> {
    let tables = tables_for(basis_order, coefficient_order)?;
    let nb = num_basis_functions(basis_order);
    resize_family(matrices, num_basis_functions(coefficient_order), nb);

    let proj = match component {
        GradComponent::X => invariants.b,
        GradComponent::Y => invariants.c,
    };
    let scale = 1.0 / (4.0 * invariants.delta);

    for (k, matrix) in matrices.iter_mut().enumerate() {
        for i in 0..nb {
            for j in i..nb {
                let quad_form = &tables.grad[k][i][j];
                let mut value = 0.0;
                for s in 0..3 {
                    for t in 0..3 {
                        value += proj[s] * proj[t] * quad_form[s][t];
                    }
                }
                value *= scale;

                matrix[(i, j)] = value;
                matrix[(j, i)] = value;
            }
        }
    }

    Ok(())
}

pub(super) fn analytic_supported(basis_order: usize, coefficient_order: usize) -> bool {
    (1..=3).contains(&basis_order) && coefficient_order <= 1
}

fn tables_for(
    basis_order: usize,
    coefficient_order: usize,
) -> Result<&'static ElementTables, SolverError> {
    if !analytic_supported(basis_order, coefficient_order) {
        return Err(SolverError::AnalyticOrderUnsupported {
            basis_order,
            coefficient_order,
        });
    }
    Ok(&TABLES[basis_order - 1][coefficient_order])
}

fn resize_family(matrices: &mut Vec<DMatrix<f64>>, num_matrices: usize, num_basis: usize) {
    matrices.clear();
    matrices.resize(num_matrices, DMatrix::zeros(num_basis, num_basis));
}

/// The cached rational data of one (basis order, coefficient order) pair
struct ElementTables {
    /// `nn[k][i][j]`: ∫ N_i N_j T_k dA over Δ
    nn: Vec<Vec<Vec<f64>>>,
    /// `grad[k][i][j][s][t]`: ∫ (∂N_i/∂L_s)(∂N_j/∂L_t) T_k dA over Δ
    grad: Vec<Vec<Vec<[[f64; 3]; 3]>>>,
}

static TABLES: Lazy<[[ElementTables; 2]; 3]> = Lazy::new(|| {
    [
        [build_tables(1, 0), build_tables(1, 1)],
        [build_tables(2, 0), build_tables(2, 1)],
        [build_tables(3, 0), build_tables(3, 1)],
    ]
});

fn build_tables(order: usize, coefficient_order: usize) -> ElementTables {
    let modes = basis_indices(order);
    let nb = modes.len();

    let basis: Vec<BaryPoly> = modes
        .iter()
        .map(|&[i, j, k]| shape_poly(order, i, j, k))
        .collect();
    let derivs: Vec<[BaryPoly; 3]> = basis
        .iter()
        .map(|p| [p.deriv(0), p.deriv(1), p.deriv(2)])
        .collect();

    let coeff_fns: Vec<BaryPoly> = if coefficient_order == 0 {
        vec![BaryPoly::constant(1.0)]
    } else {
        basis_indices(coefficient_order)
            .iter()
            .map(|&[i, j, k]| shape_poly(coefficient_order, i, j, k))
            .collect()
    };

    let mut nn = vec![vec![vec![0.0; nb]; nb]; coeff_fns.len()];
    let mut grad = vec![vec![vec![[[0.0f64; 3]; 3]; nb]; nb]; coeff_fns.len()];

    for (k, coeff_fn) in coeff_fns.iter().enumerate() {
        for i in 0..nb {
            for j in 0..nb {
                nn[k][i][j] = basis[i]
                    .product(&basis[j])
                    .product(coeff_fn)
                    .moment_over_delta();

                for s in 0..3 {
                    for t in 0..3 {
                        grad[k][i][j][s][t] = derivs[i][s]
                            .product(&derivs[j][t])
                            .product(coeff_fn)
                            .moment_over_delta();
                    }
                }
            }
        }
    }

    ElementTables { nn, grad }
}

/// `N = P_i(L₁)·P_j(L₂)·P_k(L₃)` expanded into barycentric monomials
fn shape_poly(order: usize, i: usize, j: usize, k: usize) -> BaryPoly {
    silvester_axis(order, i, 0)
        .product(&silvester_axis(order, j, 1))
        .product(&silvester_axis(order, k, 2))
}

/// One Silvester member `Π_{p<m}(N·L − p)/m!` expanded along a single
/// barycentric axis. The expansion coefficients are exact for the table
/// orders (integer products over divisors 1, 2 and 6).
fn silvester_axis(order: usize, m: usize, axis: usize) -> BaryPoly {
    let n = order as f64;
    let mut coeffs = vec![1.0];
    for p in 0..m {
        let mut next = vec![0.0; coeffs.len() + 1];
        for (d, coeff) in coeffs.iter().enumerate() {
            next[d + 1] += coeff * n;
            next[d] -= coeff * p as f64;
        }
        coeffs = next;
    }

    let m_fact = factorial(m) as f64;
    let terms = coeffs
        .iter()
        .enumerate()
        .filter(|(_, coeff)| **coeff != 0.0)
        .map(|(d, coeff)| {
            let mut exp = [0usize; 3];
            exp[axis] = d;
            (exp, coeff / m_fact)
        })
        .collect();

    BaryPoly { terms }
}

/// A polynomial in the three barycentric coordinates, kept as a flat term
/// list. Term counts stay tiny (the largest product here has a few dozen
/// monomials), so merging by linear search is fine.
#[derive(Clone, Debug)]
struct BaryPoly {
    terms: Vec<([usize; 3], f64)>,
}

impl BaryPoly {
    fn constant(value: f64) -> Self {
        Self {
            terms: vec![([0, 0, 0], value)],
        }
    }

    fn product(&self, other: &Self) -> Self {
        let mut terms: Vec<([usize; 3], f64)> = Vec::new();
        for (ea, ca) in &self.terms {
            for (eb, cb) in &other.terms {
                let exp = [ea[0] + eb[0], ea[1] + eb[1], ea[2] + eb[2]];
                let coeff = ca * cb;
                match terms.iter_mut().find(|(e, _)| *e == exp) {
                    Some((_, existing)) => *existing += coeff,
                    None => terms.push((exp, coeff)),
                }
            }
        }
        Self { terms }
    }

    /// Formal partial with respect to one barycentric coordinate
    fn deriv(&self, axis: usize) -> Self {
        let terms = self
            .terms
            .iter()
            .filter(|(exp, _)| exp[axis] > 0)
            .map(|(exp, coeff)| {
                let mut d_exp = *exp;
                d_exp[axis] -= 1;
                (d_exp, coeff * exp[axis] as f64)
            })
            .collect();
        Self { terms }
    }

    /// ∫ over the physical triangle, divided by the signed area:
    /// Σ coeff · 2·a!b!c!/(a+b+c+2)!
    fn moment_over_delta(&self) -> f64 {
        self.terms
            .iter()
            .map(|([a, b, c], coeff)| {
                coeff * 2.0 * factorial(*a) as f64 * factorial(*b) as f64 * factorial(*c) as f64
                    / factorial(a + b + c + 2) as f64
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::geometry::TriGeometry;
    use crate::space::Point3;

    const ACCURACY: f64 = 1e-14;

    fn reference_invariants() -> TriInvariants {
        TriInvariants::compute(&TriGeometry::new([
            Point3::new(1.0, -0.5, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-0.5, 2.0, 0.0),
        ]))
        .unwrap()
    }

    #[test]
    fn order_one_mass_matrix_closed_form() {
        let inv = reference_invariants();
        let mut matrices = Vec::new();
        fill_matrix_nn(&inv, 1, 0, &mut matrices).unwrap();

        assert_eq!(matrices.len(), 1);
        let m = &matrices[0];
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j {
                    inv.delta / 6.0
                } else {
                    inv.delta / 12.0
                };
                assert!((m[(i, j)] - expected).abs() < ACCURACY);
            }
        }
    }

    #[test]
    fn order_one_stiffness_closed_form() {
        let inv = reference_invariants();

        let mut x_matrices = Vec::new();
        fill_matrix_grad(&inv, 1, 0, GradComponent::X, &mut x_matrices).unwrap();
        let mut y_matrices = Vec::new();
        fill_matrix_grad(&inv, 1, 0, GradComponent::Y, &mut y_matrices).unwrap();

        for i in 0..3 {
            for j in 0..3 {
                let sx = inv.b[i] * inv.b[j] / (4.0 * inv.delta);
                let sy = inv.c[i] * inv.c[j] / (4.0 * inv.delta);
                assert!((x_matrices[0][(i, j)] - sx).abs() < ACCURACY);
                assert!((y_matrices[0][(i, j)] - sy).abs() < ACCURACY);
            }
        }

        // c₃ = 0 for this triangle: the N_NyNy row and column of the third
        // vertex vanish identically
        for idx in 0..3 {
            assert_eq!(y_matrices[0][(2, idx)], 0.0);
            assert_eq!(y_matrices[0][(idx, 2)], 0.0);
        }
    }

    #[test]
    fn linear_coefficient_mass_entries() {
        // ∫ L_k L_i L_j over the element: Δ/10 (all equal), Δ/30 (two equal),
        // Δ/60 (all distinct)
        let inv = reference_invariants();
        let mut matrices = Vec::new();
        fill_matrix_nn(&inv, 1, 1, &mut matrices).unwrap();

        assert_eq!(matrices.len(), 3);
        for k in 0..3 {
            for i in 0..3 {
                for j in 0..3 {
                    let distinct = [k, i, j]
                        .iter()
                        .collect::<std::collections::HashSet<_>>()
                        .len();
                    let expected = match distinct {
                        1 => inv.delta / 10.0,
                        2 => inv.delta / 30.0,
                        _ => inv.delta / 60.0,
                    };
                    assert!((matrices[k][(i, j)] - expected).abs() < ACCURACY);
                }
            }
        }
    }

    #[test]
    fn order_two_mass_matrix_reference_entries() {
        // classic P2 entries: diag(vertex) = Δ/30, vertex-vertex = -Δ/180,
        // vertex vs its own edges = 0, vertex vs opposite edge = -Δ/45,
        // diag(edge) = 8Δ/45
        let inv = reference_invariants();
        let mut matrices = Vec::new();
        fill_matrix_nn(&inv, 2, 0, &mut matrices).unwrap();
        let m = &matrices[0];

        assert!((m[(0, 0)] - inv.delta / 30.0).abs() < ACCURACY);
        assert!((m[(0, 1)] - -inv.delta / 180.0).abs() < ACCURACY);
        // mode 3 = edge (v1, v2), mode 5 = edge (v3, v1): adjacent to v1
        assert!(m[(0, 3)].abs() < ACCURACY);
        assert!(m[(0, 5)].abs() < ACCURACY);
        // mode 4 = edge (v2, v3): opposite v1
        assert!((m[(0, 4)] - -inv.delta / 45.0).abs() < ACCURACY);
        assert!((m[(3, 3)] - 8.0 * inv.delta / 45.0).abs() < ACCURACY);
    }

    #[test]
    fn unsupported_orders_are_gated() {
        let inv = reference_invariants();
        let mut matrices = Vec::new();

        assert!(matches!(
            fill_matrix_nn(&inv, 4, 0, &mut matrices),
            Err(SolverError::AnalyticOrderUnsupported {
                basis_order: 4,
                coefficient_order: 0
            })
        ));
        assert!(matches!(
            fill_matrix_grad(&inv, 2, 2, GradComponent::X, &mut matrices),
            Err(SolverError::AnalyticOrderUnsupported { .. })
        ));
    }

    #[test]
    fn silvester_expansion_matches_direct_evaluation() {
        use crate::basis::SilvesterPolynomial;

        for order in 1..=3 {
            let family = SilvesterPolynomial::new(order).unwrap();
            for m in 0..=order {
                let poly = silvester_axis(order, m, 0);
                for x in [0.0f64, 0.2, 0.5, 0.75, 1.0] {
                    let expanded: f64 = poly
                        .terms
                        .iter()
                        .map(|([a, _, _], coeff)| coeff * x.powi(*a as i32))
                        .sum();
                    assert!((expanded - family.evaluate(m, x).unwrap()).abs() < ACCURACY);
                }
            }
        }
    }
}
