mod analytic;
mod geometry;
mod solver;

pub use analytic::{fill_matrix_grad, fill_matrix_nn, GradComponent};
pub use geometry::{ElementGeometry, ElementType, GeometryError, TriGeometry, TriInvariants};
pub use solver::{MatrixFamily, SolverError, SolverTriangle};
