pub mod assembly;
pub mod basis;
pub mod element;
pub mod error;
pub mod quadrature;
pub mod space;

#[cfg(feature = "json_export")]
pub mod export;

pub use assembly::{assemble_element, assemble_elements, ElementMatrices};
pub use basis::{SilvesterPolynomial, TriShapeFn};
pub use element::{
    ElementGeometry, ElementType, MatrixFamily, SolverTriangle, TriGeometry, TriInvariants,
};
pub use error::ErrorCategory;
pub use quadrature::{QuadratureTable, RefDomain};
pub use space::{M2D, Point3, V2D};

#[cfg(test)]
mod tests {
    #[test]
    fn it_works() {
        let result = 2 + 2;
        assert_eq!(result, 4);
    }
}
