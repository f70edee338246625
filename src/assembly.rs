use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::element::{ElementGeometry, SolverError, SolverTriangle};

/// The three assembled matrix families of one element, moved out of the
/// solver so per-element results can be collected across threads.
#[derive(Clone, Debug)]
pub struct ElementMatrices {
    pub nn: Vec<DMatrix<f64>>,
    pub nxnx: Vec<DMatrix<f64>>,
    pub nyny: Vec<DMatrix<f64>>,
}

/// Assemble all three matrix families for every geometry in the slice.
///
/// Elements are independent, so the work is parallelized over the Rayon
/// global threadpool; the output order matches the input order. The first
/// failing element aborts the whole call.
pub fn assemble_elements<G>(
    geometries: &[G],
    basis_order: usize,
    coefficient_order: usize,
    force_numerical: bool,
) -> Result<Vec<ElementMatrices>, SolverError>
where
    G: ElementGeometry + Sync,
{
    geometries
        .par_iter()
        .map(|geometry| assemble_element(geometry, basis_order, coefficient_order, force_numerical))
        .collect()
}

/// Single-element assembly of all three families
pub fn assemble_element<G: ElementGeometry>(
    geometry: &G,
    basis_order: usize,
    coefficient_order: usize,
    force_numerical: bool,
) -> Result<ElementMatrices, SolverError> {
    let mut solver = SolverTriangle::new(geometry, basis_order, coefficient_order)?;

    solver.setup_nn(force_numerical)?;
    solver.setup_nxnx(force_numerical)?;
    solver.setup_nyny(force_numerical)?;

    let num_matrices = solver.num_coefficient_matrices();
    let mut matrices = ElementMatrices {
        nn: Vec::with_capacity(num_matrices),
        nxnx: Vec::with_capacity(num_matrices),
        nyny: Vec::with_capacity(num_matrices),
    };

    for k in 0..num_matrices {
        matrices.nn.push(solver.matrix_nn(k)?.clone());
        matrices.nxnx.push(solver.matrix_nxnx(k)?.clone());
        matrices.nyny.push(solver.matrix_nyny(k)?.clone());
    }

    Ok(matrices)
}
